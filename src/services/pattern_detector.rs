//! Распознавание жеста "N нажатий за окно времени" с дебаунсом.
//!
//! Одно физическое нажатие может прийти дважды (evdev и медиаклавиши
//! сообщают о нём независимо), поэтому сначала отсекаются дубликаты
//! ближе `debounce_ms` к последнему принятому нажатию, а уже принятые
//! нажатия считаются в окне `window_ms`. После срабатывания окно
//! очищается: для повторного триггера нужна новая серия.

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::config::PatternConfig;
use crate::trace_if_enabled;

/// Нажатий в серии
pub const PRESS_COUNT: usize = 3;
/// Окно распознавания серии
pub const WINDOW_MS: u64 = 2000;
/// Нажатия ближе этого интервала считаются дубликатами
pub const DEBOUNCE_MS: u64 = 300;

/// Состояние детектора; существует только пока функция включена
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetectorState {
    last_accepted: Option<u64>,
    // Строго возрастающие отметки принятых нажатий
    window: SmallVec<[u64; 4]>,
}

impl DetectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Учесть нажатие в момент `now` (мс). `true` - серия распознана.
    pub fn observe(&mut self, now: u64, settings: &PatternConfig) -> bool {
        if let Some(last) = self.last_accepted {
            if now < last {
                if last - now <= settings.window_ms {
                    // Гонка источников или небольшой откат часов
                    trace_if_enabled!("Нажатие {}мс раньше последнего - дубликат", last - now);
                    return false;
                }
                // Часы откатились дальше окна: старые отметки бессмысленны
                trace_if_enabled!("Откат часов на {}мс - сброс состояния", last - now);
                *self = Self::default();
            } else if now - last < settings.debounce_ms {
                trace_if_enabled!("Дребезг: {}мс после последнего нажатия", now - last);
                return false;
            }
        }

        self.last_accepted = Some(now);

        let stale = self
            .window
            .iter()
            .take_while(|&&t| now - t > settings.window_ms)
            .count();
        self.window.drain(..stale);

        self.window.push(now);

        if self.window.len() >= settings.press_count {
            self.window.clear();
            return true;
        }

        false
    }

    #[cfg(test)]
    pub fn last_accepted(&self) -> Option<u64> {
        self.last_accepted
    }

    #[cfg(test)]
    pub fn window(&self) -> &[u64] {
        &self.window
    }
}

/// Потокобезопасный детектор: вся последовательность
/// дебаунс-очистка-добавление-проверка выполняется под одной блокировкой.
/// `None` внутри означает, что функция выключена.
pub struct PatternDetector {
    settings: PatternConfig,
    state: Mutex<Option<DetectorState>>,
}

impl PatternDetector {
    pub fn new(settings: PatternConfig) -> Self {
        Self {
            settings,
            state: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &PatternConfig {
        &self.settings
    }

    /// Включить с чистым состоянием. `false`, если уже включен.
    pub fn enable(&self) -> bool {
        let mut state = self.state.lock();
        if state.is_some() {
            return false;
        }
        *state = Some(DetectorState::new());
        true
    }

    /// Выключить и забыть все отметки. `false`, если уже выключен.
    pub fn disable(&self) -> bool {
        self.state.lock().take().is_some()
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Учесть нажатие; на выключенном детекторе всегда `false`
    pub fn observe_press(&self, now: u64) -> bool {
        match self.state.lock().as_mut() {
            Some(state) => state.observe(now, &self.settings),
            None => false,
        }
    }

    /// Сколько принятых нажатий сейчас в окне
    #[cfg(test)]
    pub fn pending_presses(&self) -> usize {
        self.state
            .lock()
            .as_ref()
            .map_or(0, |state| state.window().len())
    }
}
