/// Имена клавиш, которые служба медиаклавиш передаёт в `MediaPlayerKeyPressed`
pub const MEDIA_PLAYER_KEYS: &[&str] = &[
    "Play",
    "Pause",
    "Stop",
    "Previous",
    "Next",
    "Rewind",
    "FastForward",
    "Repeat",
    "Shuffle",
];

/// Проверить, что имя медиаклавиши известно службе
pub fn is_media_player_key(name: &str) -> bool {
    MEDIA_PLAYER_KEYS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys() {
        assert!(is_media_player_key("Previous"));
        assert!(is_media_player_key("Play"));
        // Имена чувствительны к регистру, как и в сигнале
        assert!(!is_media_player_key("previous"));
        assert!(!is_media_player_key("VolumeDown"));
    }
}
