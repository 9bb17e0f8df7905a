//! Состояние экрана: запрос, пробуждение и поток событий вкл/выкл.
//!
//! Экран считается выключенным, пока активна заставка сессии
//! (`org.freedesktop.ScreenSaver`).

use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use zbus::{Connection, Proxy};

use crate::config::Config;
use crate::error::Result;
use crate::services::dispatcher::EventDispatcher;

const SCREENSAVER_DESTINATION: &str = "org.freedesktop.ScreenSaver";
const SCREENSAVER_PATH: &str = "/org/freedesktop/ScreenSaver";
const SCREENSAVER_INTERFACE: &str = "org.freedesktop.ScreenSaver";

#[async_trait::async_trait]
pub trait ScreenMonitor: Send + Sync {
    async fn is_screen_on(&self) -> Result<bool>;

    async fn wake_up_screen(&self) -> Result<()>;

    /// Публиковать смены состояния, пока не оборвётся источник
    async fn watch(&self, dispatcher: Arc<EventDispatcher>) -> Result<()>;
}

/// Factory function to create a screen monitor based on the dry_run flag
pub fn create_screen_monitor(config: &Config, dry_run: bool) -> Arc<dyn ScreenMonitor> {
    if dry_run {
        Arc::new(DryRunScreenMonitor::new(config.dry_run.interval_ms))
    } else {
        Arc::new(DbusScreenMonitor::new())
    }
}

pub struct DbusScreenMonitor {
    connection: OnceCell<Connection>,
}

impl DbusScreenMonitor {
    pub fn new() -> Self {
        info!("Инициализация DbusScreenMonitor");
        Self {
            connection: OnceCell::new(),
        }
    }

    async fn proxy(&self) -> Result<Proxy<'static>> {
        let connection = self.connection.get_or_try_init(Connection::session).await?;

        let proxy = Proxy::new(
            connection,
            SCREENSAVER_DESTINATION,
            SCREENSAVER_PATH,
            SCREENSAVER_INTERFACE,
        )
        .await?;

        Ok(proxy)
    }
}

impl Default for DbusScreenMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ScreenMonitor for DbusScreenMonitor {
    async fn is_screen_on(&self) -> Result<bool> {
        let active: bool = self.proxy().await?.call("GetActive", &()).await?;
        Ok(!active)
    }

    async fn wake_up_screen(&self) -> Result<()> {
        self.proxy().await?.call_method("SimulateUserActivity", &()).await?;
        info!("Экран разбужен");
        Ok(())
    }

    async fn watch(&self, dispatcher: Arc<EventDispatcher>) -> Result<()> {
        let proxy = self.proxy().await?;
        let mut signals = proxy.receive_signal("ActiveChanged").await?;

        info!("Отслеживание состояния экрана через D-Bus запущено");

        while let Some(message) = signals.next().await {
            let body = message.body();
            match body.deserialize::<(bool,)>() {
                Ok((active,)) => {
                    let on = !active;
                    info!("Экран {}", if on { "включен" } else { "выключен" });
                    dispatcher.dispatch_screen_state(on);
                }
                Err(e) => debug!("Не удалось разобрать ActiveChanged: {}", e),
            }
        }

        warn!("Поток сигналов ScreenSaver завершился");
        Ok(())
    }
}

/// Эмуляция: экран переключается каждые `interval_ms`
pub struct DryRunScreenMonitor {
    on: AtomicBool,
    interval_ms: u64,
}

impl DryRunScreenMonitor {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            on: AtomicBool::new(true),
            interval_ms,
        }
    }
}

#[async_trait::async_trait]
impl ScreenMonitor for DryRunScreenMonitor {
    async fn is_screen_on(&self) -> Result<bool> {
        Ok(self.on.load(Ordering::SeqCst))
    }

    async fn wake_up_screen(&self) -> Result<()> {
        info!("[DRY RUN] Пробуждение экрана");
        self.on.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn watch(&self, dispatcher: Arc<EventDispatcher>) -> Result<()> {
        info!("Dry-run режим - состояние экрана эмулируется");

        let mut ticker = interval(Duration::from_millis(self.interval_ms));
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let on = !self.on.fetch_xor(true, Ordering::SeqCst);
            info!("[DRY RUN] Экран {}", if on { "включен" } else { "выключен" });
            dispatcher.dispatch_screen_state(on);
        }
    }
}
