//! Источники нажатий кнопки-триггера.
//!
//! Каждый источник только сообщает о нажатиях в `PressGate` и не принимает
//! решений: одно физическое нажатие может прийти из двух источников сразу,
//! дубликаты отсекает детектор.

mod dry_run_source;
mod evdev_source;
mod media_key_source;
mod r#trait;

pub use self::r#trait::create_press_sources;
