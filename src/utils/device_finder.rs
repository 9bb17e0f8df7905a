use crate::error::{Result, SosError};
use evdev::KeyCode;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти устройство ввода, которое сообщает о клавише-триггере
    pub fn find_trigger_device(device_path: &str, key: KeyCode) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                SosError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        // Автопоиск среди /dev/input/event*
        Self::auto_find(key)
    }

    fn auto_find(key: KeyCode) -> Result<PathBuf> {
        info!("Начинаем автопоиск устройства с клавишей {:?}...", key);

        let mut candidates: Vec<(PathBuf, u32)> = evdev::enumerate()
            .filter_map(|(path, device)| {
                let name = device.name().unwrap_or("Unknown").to_string();
                let has_key = device
                    .supported_keys()
                    .map_or(false, |keys| keys.contains(key));

                if has_key {
                    let priority = Self::device_priority(&name);
                    info!("Найдено устройство: {:?} ({}, приоритет: {})", path, name, priority);
                    Some((path, priority))
                } else {
                    debug!("Устройство {:?} ({}) не сообщает о {:?}", path, name, key);
                    None
                }
            })
            .collect();

        // Сортируем по приоритету, при равенстве - по пути для стабильности
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        match candidates.into_iter().next() {
            Some((path, _)) => Ok(path),
            None => SosError::device_not_found(format!(
                "Не найдено доступное устройство с клавишей {:?}. \
                 Убедитесь, что пользователь добавлен в группу 'input'",
                key
            )),
        }
    }

    /// Кнопки громкости обычно приходят с отдельного "Consumer Control" устройства
    fn device_priority(name: &str) -> u32 {
        let name = name.to_lowercase();
        if name.contains("consumer control") || name.contains("button") {
            100
        } else if name.contains("keyboard") {
            50
        } else {
            10
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_device_with_specific_path() {
        // Тест с несуществующим путем
        let result = DeviceFinder::find_trigger_device("/non/existent/path", KeyCode::KEY_VOLUMEDOWN);
        assert!(matches!(result, Err(SosError::DeviceNotFound(_))));
    }

    #[test]
    fn test_device_priority() {
        assert_eq!(DeviceFinder::device_priority("Logitech USB Receiver Consumer Control"), 100);
        assert_eq!(DeviceFinder::device_priority("gpio-keys Power Button"), 100);
        assert_eq!(DeviceFinder::device_priority("AT Translated Set 2 keyboard"), 50);
        assert_eq!(DeviceFinder::device_priority("Video Bus"), 10);
    }
}
