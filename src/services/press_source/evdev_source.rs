use crate::config::Config;
use crate::error::{Result, SosError};
use crate::events::{PressEvent, PressSource};
use crate::mappings::KeyNameToEvdevCode;
use crate::services::volume_sos::PressGate;
use crate::trace_if_enabled;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType, InputEvent, KeyCode};
use std::sync::Arc;
use tracing::{error, info};

use super::r#trait::PressSourceTrait;

/// Сколько ошибок чтения подряд терпим, прежде чем считать устройство потерянным
const MAX_READ_ERRORS: u32 = 10;

/// Нажатия кнопки с устройства ввода. Устройство не захватывается
/// эксклюзивно: обычная регулировка громкости продолжает работать.
pub struct EvdevPressSource {
    config: Arc<Config>,
    gate: Arc<PressGate>,
    trigger_key: KeyCode,
}

impl EvdevPressSource {
    pub fn new(config: Arc<Config>, gate: Arc<PressGate>) -> Result<Self> {
        info!("Инициализация EvdevPressSource");

        let code = KeyNameToEvdevCode::translate(&config.input.trigger_key)
            .map_err(SosError::InvalidArgument)?;

        Ok(Self {
            config,
            gate,
            trigger_key: KeyCode::new(code),
        })
    }

    async fn run_impl(self) -> Result<()> {
        let device_path =
            DeviceFinder::find_trigger_device(&self.config.input.device_path, self.trigger_key)?;

        let device = Device::open(&device_path).map_err(|e| {
            SosError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        info!(
            "EvdevPressSource слушает {:?} ({}), клавиша {}",
            device_path,
            device.name().unwrap_or("Unknown"),
            KeyNameToEvdevCode::reverse_translate(self.trigger_key.code()).unwrap_or("?")
        );

        let mut events = device.into_event_stream()?;
        let mut read_errors = 0;

        loop {
            let event = match events.next_event().await {
                Ok(event) => {
                    read_errors = 0;
                    event
                }
                Err(e) => {
                    read_errors += 1;
                    error!("Ошибка чтения событий: {}", e);
                    if read_errors >= MAX_READ_ERRORS {
                        return Err(SosError::Io(e));
                    }
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    continue;
                }
            };

            if Self::is_trigger_press(&event, self.trigger_key) {
                trace_if_enabled!("evdev: нажатие {:?}", self.trigger_key);
                self.gate.handle_press(&PressEvent::new(PressSource::Foreground));
            }
        }
    }

    /// Только нажатие (value = 1): отпускание и автоповтор не считаются
    fn is_trigger_press(event: &InputEvent, trigger_key: KeyCode) -> bool {
        event.event_type() == EventType::KEY
            && event.code() == trigger_key.code()
            && event.value() == 1
    }
}

#[async_trait::async_trait]
impl PressSourceTrait for EvdevPressSource {
    fn kind(&self) -> PressSource {
        PressSource::Foreground
    }

    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

impl Drop for EvdevPressSource {
    fn drop(&mut self) {
        info!("EvdevPressSource завершает работу");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY.0, code.code(), value)
    }

    #[test]
    fn test_only_key_down_of_trigger_counts() {
        let key = KeyCode::KEY_VOLUMEDOWN;

        assert!(EvdevPressSource::is_trigger_press(&key_event(key, 1), key));
        assert!(!EvdevPressSource::is_trigger_press(&key_event(key, 0), key));
        assert!(!EvdevPressSource::is_trigger_press(&key_event(key, 2), key));
        assert!(!EvdevPressSource::is_trigger_press(
            &key_event(KeyCode::KEY_VOLUMEUP, 1),
            key
        ));
        assert!(!EvdevPressSource::is_trigger_press(
            &InputEvent::new(EventType::SYNCHRONIZATION.0, 0, 0),
            key
        ));
    }
}
