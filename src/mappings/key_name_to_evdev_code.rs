use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Преобразование имён клавиш в evdev коды
/// Отвечает за трансляцию имени клавиши-триггера из конфигурации в код evdev
pub struct KeyNameToEvdevCode;

// Клавиши, которые имеет смысл использовать как скрытый триггер
static KEY_TABLE: &[(&str, u16)] = &[
    // Громкость и питание
    ("volumedown", 114),   // KEY_VOLUMEDOWN
    ("volumeup", 115),     // KEY_VOLUMEUP
    ("mute", 113),         // KEY_MUTE
    ("power", 116),        // KEY_POWER
    ("camera", 212),       // KEY_CAMERA

    // Медиаклавиши
    ("playpause", 164),    // KEY_PLAYPAUSE
    ("nextsong", 163),     // KEY_NEXTSONG
    ("previoussong", 165), // KEY_PREVIOUSSONG
    ("stopcd", 166),       // KEY_STOPCD

    // Системные
    ("printscreen", 99),   // KEY_SYSRQ
    ("scrolllock", 70),    // KEY_SCROLLLOCK
    ("pause", 119),        // KEY_PAUSE
    ("esc", 1),            // KEY_ESC
    ("space", 57),         // KEY_SPACE
    ("enter", 28),         // KEY_ENTER

    // Функциональные
    ("f1", 59),
    ("f2", 60),
    ("f3", 61),
    ("f4", 62),
    ("f5", 63),
    ("f6", 64),
    ("f7", 65),
    ("f8", 66),
    ("f9", 67),
    ("f10", 68),
    ("f11", 87),
    ("f12", 88),
];

static NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> =
    Lazy::new(|| KEY_TABLE.iter().copied().collect());

static CODE_TO_NAME: Lazy<HashMap<u16, &'static str>> =
    Lazy::new(|| KEY_TABLE.iter().map(|&(name, code)| (code, name)).collect());

impl KeyNameToEvdevCode {
    /// Получить evdev код клавиши по её имени
    pub fn translate(key_name: &str) -> Result<u16, String> {
        let normalized = key_name.trim().to_lowercase();
        let normalized = normalized.strip_prefix("key_").unwrap_or(&normalized);

        NAME_TO_CODE
            .get(normalized)
            .copied()
            .ok_or_else(|| format!("Неизвестная клавиша: '{}'", key_name))
    }

    /// Обратное преобразование для логов
    pub fn reverse_translate(keycode: u16) -> Option<&'static str> {
        CODE_TO_NAME.get(&keycode).copied()
    }
}
