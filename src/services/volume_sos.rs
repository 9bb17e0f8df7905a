use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::debug_if_enabled;
use crate::events::{PressEvent, PressSource};
use crate::services::dispatcher::EventDispatcher;
use crate::services::pattern_detector::PatternDetector;
use crate::services::press_source::create_press_sources;
use crate::utils::Clock;

/// Единая точка входа для всех источников нажатий.
/// Источники не отсекают дубликаты сами - это делает детектор.
pub struct PressGate {
    detector: PatternDetector,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock>,
}

impl PressGate {
    pub fn new(config: &Config, dispatcher: Arc<EventDispatcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            detector: PatternDetector::new(config.pattern),
            dispatcher,
            clock,
        }
    }

    pub fn detector(&self) -> &PatternDetector {
        &self.detector
    }

    /// Обработать нажатие; `true`, если оно завершило SOS-жест
    pub fn handle_press(&self, event: &PressEvent) -> bool {
        let now = self.clock.now_ms();
        debug_if_enabled!("Нажатие от {} в {}мс", event.source, now);

        if self.detector.observe_press(now) {
            // Уведомление уходит уже после освобождения блокировки детектора
            self.dispatcher.dispatch_trigger();
            return true;
        }

        false
    }
}

/// Включение и выключение функции: состояние детектора и запущенные источники
pub struct VolumeSos {
    config: Arc<Config>,
    gate: Arc<PressGate>,
    dry_run: bool,
    active_sources: DashMap<PressSource, JoinHandle<()>>,
    lifecycle: Mutex<()>,
}

impl VolumeSos {
    pub fn new(
        config: Arc<Config>,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn Clock>,
        dry_run: bool,
    ) -> Self {
        info!("Инициализация VolumeSos (dry_run: {})", dry_run);

        let gate = Arc::new(PressGate::new(&config, dispatcher, clock));

        Self {
            config,
            gate,
            dry_run,
            active_sources: DashMap::new(),
            lifecycle: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub fn gate(&self) -> &Arc<PressGate> {
        &self.gate
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.gate.detector().is_enabled()
    }

    /// Число источников, которые сейчас работают
    pub fn active_source_count(&self) -> usize {
        self.active_sources
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }

    /// Включить: чистое состояние детектора и запуск источников.
    /// Повторный вызов сохраняет состояние детектора и перезапускает только
    /// завершившиеся источники (нет устройства, не было службы медиаклавиш).
    /// `true`, если что-то изменилось. Должен вызываться из tokio runtime.
    pub fn enable(&self) -> bool {
        let _guard = self.lifecycle.lock();

        let fresh = self.gate.detector().enable();
        if fresh {
            let settings = self.gate.detector().settings();
            info!(
                "Volume SOS включен: {} нажатий за {}мс (дебаунс {}мс)",
                settings.press_count, settings.window_ms, settings.debounce_ms
            );
        } else if !self.needs_restart() {
            debug_if_enabled!("Volume SOS уже включен");
            return false;
        }

        let spawned = self.spawn_missing_sources();
        if !fresh {
            info!("Перезапущено источников нажатий: {}", spawned);
        }

        fresh || spawned > 0
    }

    fn needs_restart(&self) -> bool {
        self.active_sources.is_empty()
            || self.active_sources.iter().any(|entry| entry.value().is_finished())
    }

    /// Запустить источники, для которых нет работающей задачи
    fn spawn_missing_sources(&self) -> usize {
        let sources = create_press_sources(self.config.clone(), self.gate.clone(), self.dry_run);
        if sources.is_empty() {
            warn!("Нет ни одного источника нажатий - жест не будет распознан");
        }

        let mut spawned = 0;
        for source in sources {
            let kind = source.kind();
            let running = self
                .active_sources
                .get(&kind)
                .map_or(false, |handle| !handle.is_finished());
            if running {
                continue;
            }

            let handle = tokio::spawn(async move {
                if let Err(e) = source.run().await {
                    warn!("Источник нажатий {} остановлен: {}", kind, e);
                }
            });

            if let Some(previous) = self.active_sources.insert(kind, handle) {
                previous.abort();
            }
            spawned += 1;
        }

        spawned
    }

    /// Выключить: сначала детектор (нажатия "в полёте" уже ничего не сделают),
    /// затем остановка источников
    pub fn disable(&self) -> bool {
        let _guard = self.lifecycle.lock();

        let was_enabled = self.gate.detector().disable();

        let kinds: Vec<PressSource> = self
            .active_sources
            .iter()
            .map(|entry| *entry.key())
            .collect();

        for kind in kinds {
            if let Some((_, handle)) = self.active_sources.remove(&kind) {
                handle.abort();
                debug_if_enabled!("Источник нажатий {} остановлен", kind);
            }
        }

        if was_enabled {
            info!("Volume SOS выключен");
        }

        was_enabled
    }
}

impl Drop for VolumeSos {
    fn drop(&mut self) {
        for entry in self.active_sources.iter() {
            entry.value().abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ShieldEvent;
    use crate::utils::clock::ManualClock;

    fn quiet_config() -> Arc<Config> {
        let mut config = Config::default();
        config.input.enabled = false;
        config.media_keys.enabled = false;
        Arc::new(config)
    }

    fn setup(dry_run: bool) -> (VolumeSos, Arc<EventDispatcher>, Arc<ManualClock>) {
        let dispatcher = Arc::new(EventDispatcher::new(8));
        let clock = Arc::new(ManualClock::default());
        let sos = VolumeSos::new(quiet_config(), dispatcher.clone(), clock.clone(), dry_run);
        (sos, dispatcher, clock)
    }

    fn press_at(sos: &VolumeSos, clock: &ManualClock, now: u64) -> bool {
        clock.set(now);
        sos.gate().handle_press(&PressEvent::new(PressSource::Foreground))
    }

    #[tokio::test]
    async fn test_presses_ignored_until_enabled() {
        let (sos, dispatcher, clock) = setup(false);
        let mut events = dispatcher.subscribe();

        assert!(!sos.is_enabled());
        for t in [0, 700, 1500] {
            assert!(!press_at(&sos, &clock, t));
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_gesture_dispatches_trigger() {
        let (sos, dispatcher, clock) = setup(false);
        let mut events = dispatcher.subscribe();

        assert!(sos.enable());
        assert!(!press_at(&sos, &clock, 0));
        assert!(!press_at(&sos, &clock, 100));
        assert!(!press_at(&sos, &clock, 700));
        assert!(press_at(&sos, &clock, 1900));

        assert_eq!(events.try_recv().unwrap(), ShieldEvent::VolumeSosTriggered);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disable_discards_state_and_blocks_presses() {
        let (sos, _dispatcher, clock) = setup(false);

        sos.enable();
        press_at(&sos, &clock, 0);
        press_at(&sos, &clock, 500);

        assert!(sos.disable());
        assert!(!sos.disable());
        assert!(!press_at(&sos, &clock, 1000));

        assert!(sos.enable());
        assert!(!press_at(&sos, &clock, 1100));
        assert_eq!(sos.gate().detector().pending_presses(), 1);
    }

    #[tokio::test]
    async fn test_enable_is_idempotent() {
        let (sos, _dispatcher, _clock) = setup(false);
        assert!(sos.enable());
        assert!(!sos.enable());
        assert!(sos.is_enabled());
        assert_eq!(sos.active_source_count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_enable_restarts_failed_sources() {
        let mut config = Config::default();
        config.input.device_path = "/non/existent/event0".to_string();
        config.media_keys.enabled = false;
        let dispatcher = Arc::new(EventDispatcher::new(8));
        let clock = Arc::new(ManualClock::default());
        let sos = VolumeSos::new(Arc::new(config), dispatcher, clock.clone(), false);

        assert!(sos.enable());
        press_at(&sos, &clock, 0);

        // Источник evdev сразу падает: устройства нет
        for _ in 0..100 {
            if sos.active_source_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(sos.active_source_count(), 0);

        // Повторное включение перезапускает источник, но не трогает окно
        assert!(sos.enable());
        assert_eq!(sos.gate().detector().pending_presses(), 1);
    }

    #[tokio::test]
    async fn test_presses_from_both_sources_share_one_gesture() {
        let (sos, dispatcher, clock) = setup(false);
        let mut events = dispatcher.subscribe();
        sos.enable();

        // Нажатия разных кнопок (громкость и медиаклавиша) складываются в один жест
        let presses = [
            (0, PressSource::Foreground),
            (600, PressSource::Foreground),
            (1200, PressSource::Background),
        ];
        let mut fired = Vec::new();
        for (now, source) in presses {
            clock.set(now);
            fired.push(sos.gate().handle_press(&PressEvent::new(source)));
        }

        assert_eq!(fired, vec![false, false, true]);
        assert_eq!(events.try_recv().unwrap(), ShieldEvent::VolumeSosTriggered);
    }

    #[tokio::test]
    async fn test_dry_run_sources_follow_lifecycle() {
        let (sos, _dispatcher, _clock) = setup(true);

        sos.enable();
        assert_eq!(sos.active_source_count(), 1);

        sos.disable();
        assert_eq!(sos.active_source_count(), 0);
    }
}
