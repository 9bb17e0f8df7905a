use tokio::sync::broadcast;
use tracing::info;

use crate::debug_if_enabled;
use crate::events::ShieldEvent;

/// Доставка уведомлений слою приложения.
///
/// Отправка без ожидания: если сейчас никто не слушает, событие
/// теряется. Очереди и повторов нет - жест можно повторить.
pub struct EventDispatcher {
    sender: broadcast::Sender<ShieldEvent>,
}

impl EventDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShieldEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Сообщить о распознанном SOS-жесте
    pub fn dispatch_trigger(&self) -> usize {
        info!("🚨 SOS-жест распознан, уведомляем приложение");
        self.dispatch(ShieldEvent::VolumeSosTriggered)
    }

    pub fn dispatch_screen_state(&self, on: bool) -> usize {
        self.dispatch(ShieldEvent::ScreenState { on })
    }

    /// Возвращает число получателей; 0 - событие отброшено
    fn dispatch(&self, event: ShieldEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => {
                debug_if_enabled!("Событие {} доставлено {} слушателям", event, receivers);
                receivers
            }
            Err(_) => {
                debug_if_enabled!("Нет слушателей, событие {} отброшено", event);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_without_listener_is_dropped() {
        let dispatcher = EventDispatcher::new(4);
        assert_eq!(dispatcher.listener_count(), 0);
        assert_eq!(dispatcher.dispatch_trigger(), 0);

        // Подписавшийся позже не получает старые события
        let mut receiver = dispatcher.subscribe();
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_reaches_every_listener() {
        let dispatcher = EventDispatcher::new(4);
        let mut first = dispatcher.subscribe();
        let mut second = dispatcher.subscribe();

        assert_eq!(dispatcher.dispatch_trigger(), 2);
        assert_eq!(dispatcher.dispatch_screen_state(false), 2);

        for receiver in [&mut first, &mut second] {
            assert_eq!(receiver.try_recv().unwrap(), ShieldEvent::VolumeSosTriggered);
            assert_eq!(receiver.try_recv().unwrap(), ShieldEvent::ScreenState { on: false });
        }
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let dispatcher = EventDispatcher::new(0);
        let mut receiver = dispatcher.subscribe();
        dispatcher.dispatch_trigger();
        assert_eq!(receiver.try_recv().unwrap(), ShieldEvent::VolumeSosTriggered);
    }
}
