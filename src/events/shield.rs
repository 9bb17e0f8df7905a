use serde_json::Value;
use std::fmt;

/// Имя события срабатывания SOS в канале приложения
pub const VOLUME_SOS_TRIGGERED: &str = "onVolumeSosTriggered";
/// Имя события смены состояния экрана
pub const SCREEN_STATE: &str = "screenState";

/// Исходящие уведомления для слоя приложения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldEvent {
    VolumeSosTriggered,
    ScreenState { on: bool },
}

impl ShieldEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ShieldEvent::VolumeSosTriggered => VOLUME_SOS_TRIGGERED,
            ShieldEvent::ScreenState { .. } => SCREEN_STATE,
        }
    }

    /// Полезная нагрузка события (у триггера её нет)
    pub fn value(&self) -> Value {
        match self {
            ShieldEvent::VolumeSosTriggered => Value::Null,
            ShieldEvent::ScreenState { on } => Value::Bool(*on),
        }
    }
}

impl fmt::Display for ShieldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShieldEvent::VolumeSosTriggered => write!(f, "{}", self.name()),
            ShieldEvent::ScreenState { on } => {
                write!(f, "{}({})", self.name(), if *on { "on" } else { "off" })
            }
        }
    }
}
