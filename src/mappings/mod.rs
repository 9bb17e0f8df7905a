pub mod key_name_to_evdev_code;
pub mod media_player_keys;

pub use key_name_to_evdev_code::KeyNameToEvdevCode;
pub use media_player_keys::is_media_player_key;
