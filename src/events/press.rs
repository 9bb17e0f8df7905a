use serde::{Deserialize, Serialize};
use std::fmt;

/// Источник нажатия кнопки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressSource {
    /// Устройство ввода evdev (активная сессия)
    Foreground,
    /// Медиаклавиши через D-Bus (работают и при заблокированном экране)
    Background,
    /// Эмуляция в режиме сухого запуска
    Emulated,
}

impl PressSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressSource::Foreground => "foreground",
            PressSource::Background => "background",
            PressSource::Emulated => "emulated",
        }
    }
}

impl fmt::Display for PressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Кандидат на нажатие: одно физическое нажатие может прийти
/// из обоих источников, дубликаты отсекает детектор.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressEvent {
    pub source: PressSource,
    pub timestamp: std::time::Instant,
}

impl PressEvent {
    pub fn new(source: PressSource) -> Self {
        Self {
            source,
            timestamp: std::time::Instant::now(),
        }
    }
}

impl fmt::Display for PressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "press[{}] ({}ms ago)",
            self.source,
            self.timestamp.elapsed().as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_source_names() {
        assert_eq!(PressSource::Foreground.to_string(), "foreground");
        assert_eq!(PressSource::Background.to_string(), "background");
        assert_eq!(PressSource::Emulated.as_str(), "emulated");
    }

    #[test]
    fn test_press_event_display() {
        let event = PressEvent::new(PressSource::Background);
        assert!(event.to_string().starts_with("press[background]"));
    }
}
