use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::mappings::{is_media_player_key, KeyNameToEvdevCode};
use crate::services::pattern_detector::{DEBOUNCE_MS, PRESS_COUNT, WINDOW_MS};

/// Имя файла сокета канала методов при `socket_path = "auto"`
pub const DEFAULT_SOCKET_NAME: &str = "volume-sos.sock";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub pattern: PatternConfig,
    pub input: InputConfig,
    pub media_keys: MediaKeysConfig,
    pub screen: ScreenConfig,
    pub sms: SmsConfig,
    pub channel: ChannelConfig,
    pub volume_sos: VolumeSosConfig,
    pub dry_run: DryRunConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Параметры распознавания жеста
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternConfig {
    pub press_count: usize,
    pub window_ms: u64,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub enabled: bool,
    pub device_path: String,
    pub trigger_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaKeysConfig {
    pub enabled: bool,
    pub application: String,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmsConfig {
    pub modem_path: String,
    pub max_parts: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub socket_path: String,
    pub event_buffer: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VolumeSosConfig {
    pub auto_enable: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DryRunConfig {
    pub interval_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            press_count: PRESS_COUNT,
            window_ms: WINDOW_MS,
            debounce_ms: DEBOUNCE_MS,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device_path: "auto".to_string(),
            trigger_key: "volumedown".to_string(),
        }
    }
}

impl Default for MediaKeysConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            application: "volume-sos".to_string(),
            key: "Previous".to_string(),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            modem_path: "auto".to_string(),
            max_parts: 10,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            socket_path: "auto".to_string(),
            event_buffer: 16,
        }
    }
}

impl Default for DryRunConfig {
    fn default() -> Self {
        Self { interval_ms: 10_000 }
    }
}

impl ChannelConfig {
    /// Путь к сокету: явный или `$XDG_RUNTIME_DIR/volume-sos.sock`
    pub fn resolve_socket_path(&self) -> PathBuf {
        if self.socket_path != "auto" {
            return PathBuf::from(&self.socket_path);
        }

        std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir())
            .unwrap_or_else(std::env::temp_dir)
            .join(DEFAULT_SOCKET_NAME)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("VOLUME_SOS_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация параметров жеста
        if self.pattern.press_count == 0 {
            anyhow::bail!("press_count должно быть больше 0");
        }

        if self.pattern.window_ms == 0 {
            anyhow::bail!("window_ms должно быть больше 0");
        }

        if self.pattern.debounce_ms >= self.pattern.window_ms {
            anyhow::bail!(
                "debounce_ms ({}) должно быть меньше window_ms ({})",
                self.pattern.debounce_ms,
                self.pattern.window_ms
            );
        }

        // Валидация источников нажатий
        if let Err(e) = KeyNameToEvdevCode::translate(&self.input.trigger_key) {
            anyhow::bail!("Неверная клавиша-триггер: {}", e);
        }

        if self.input.device_path.is_empty() {
            anyhow::bail!("device_path не может быть пустым (используйте \"auto\")");
        }

        if self.media_keys.application.is_empty() {
            anyhow::bail!("media_keys.application не может быть пустым");
        }

        if !is_media_player_key(&self.media_keys.key) {
            anyhow::bail!("Неизвестная медиаклавиша: {}", self.media_keys.key);
        }

        if self.sms.max_parts == 0 {
            anyhow::bail!("sms.max_parts должно быть больше 0");
        }

        if self.channel.event_buffer == 0 {
            anyhow::bail!("channel.event_buffer должно быть больше 0");
        }

        if self.dry_run.interval_ms < 500 {
            anyhow::bail!("dry_run.interval_ms должно быть минимум 500");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pattern.press_count, 3);
        assert_eq!(config.pattern.window_ms, 2000);
        assert_eq!(config.pattern.debounce_ms, 300);
        assert!(!config.volume_sos.auto_enable);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pattern.debounce_ms = config.pattern.window_ms;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pattern.press_count = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.trigger_key = "not-a-key".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sms.max_parts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.media_keys.key = "VolumeDown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pattern]\npress_count = 4\n\n[volume_sos]\nauto_enable = true\n\n[channel]\nsocket_path = \"/tmp/x.sock\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.pattern.press_count, 4);
        assert_eq!(config.pattern.window_ms, 2000);
        assert!(config.volume_sos.auto_enable);
        assert_eq!(config.input.trigger_key, "volumedown");
        assert_eq!(config.channel.resolve_socket_path(), PathBuf::from("/tmp/x.sock"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.pattern, PatternConfig::default());
        assert_eq!(config.media_keys.key, "Previous");
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pattern]\nwindow_ms = 100\ndebounce_ms = 300").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_auto_socket_path_name() {
        let path = ChannelConfig::default().resolve_socket_path();
        assert_eq!(path.file_name().unwrap(), DEFAULT_SOCKET_NAME);
    }
}
