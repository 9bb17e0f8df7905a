use crate::config::Config;
use crate::error::Result;
use crate::events::PressSource;
use crate::services::volume_sos::PressGate;
use std::sync::Arc;
use tracing::{info, warn};

/// Trait for press sources that feed the pattern detector
#[async_trait::async_trait]
pub trait PressSourceTrait {
    /// Which input path this source represents
    fn kind(&self) -> PressSource;

    /// Run the source until it fails or the task is aborted
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory: real sources (evdev + media keys) or a single emulator in dry-run mode.
/// A source that cannot be created is logged and skipped; the rest keep working.
pub fn create_press_sources(
    config: Arc<Config>,
    gate: Arc<PressGate>,
    dry_run: bool,
) -> Vec<Box<dyn PressSourceTrait + Send>> {
    let mut sources: Vec<Box<dyn PressSourceTrait + Send>> = Vec::new();

    if dry_run {
        sources.push(Box::new(super::dry_run_source::DryRunPressSource::new(
            config, gate,
        )));
        return sources;
    }

    if config.input.enabled {
        match super::evdev_source::EvdevPressSource::new(config.clone(), gate.clone()) {
            Ok(source) => sources.push(Box::new(source)),
            Err(e) => warn!("Источник evdev недоступен: {}", e),
        }
    } else {
        info!("Источник evdev отключен в конфигурации");
    }

    if config.media_keys.enabled {
        sources.push(Box::new(super::media_key_source::MediaKeyPressSource::new(
            config, gate,
        )));
    } else {
        info!("Источник медиаклавиш отключен в конфигурации");
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dispatcher::EventDispatcher;
    use crate::utils::MonotonicClock;

    fn gate(config: &Config) -> Arc<PressGate> {
        Arc::new(PressGate::new(
            config,
            Arc::new(EventDispatcher::new(4)),
            Arc::new(MonotonicClock::new()),
        ))
    }

    #[test]
    fn test_dry_run_creates_single_emulator() {
        let config = Arc::new(Config::default());
        let sources = create_press_sources(config.clone(), gate(&config), true);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].kind(), PressSource::Emulated);
    }

    #[test]
    fn test_disabled_sources_are_skipped() {
        let mut config = Config::default();
        config.input.enabled = false;
        config.media_keys.enabled = false;
        let config = Arc::new(config);

        assert!(create_press_sources(config.clone(), gate(&config), false).is_empty());
    }

    #[test]
    fn test_media_keys_only() {
        let mut config = Config::default();
        config.input.enabled = false;
        let config = Arc::new(config);

        let sources = create_press_sources(config.clone(), gate(&config), false);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].kind(), PressSource::Background);
    }
}
