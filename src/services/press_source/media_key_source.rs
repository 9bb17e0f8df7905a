use crate::config::Config;
use crate::error::Result;
use crate::events::{PressEvent, PressSource};
use crate::services::volume_sos::PressGate;
use crate::{debug_if_enabled, sos_error};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zbus::{Connection, Proxy};

use super::r#trait::PressSourceTrait;

const MEDIA_KEYS_DESTINATION: &str = "org.gnome.SettingsDaemon.MediaKeys";
const MEDIA_KEYS_PATH: &str = "/org/gnome/SettingsDaemon/MediaKeys";
const MEDIA_KEYS_INTERFACE: &str = "org.gnome.SettingsDaemon.MediaKeys";

/// Нажатия через службу медиаклавиш сессии. Служба доставляет их и при
/// заблокированном экране, но только для медиаклавиш, поэтому слушаем одну
/// настроенную клавишу (по умолчанию `Previous`).
///
/// Это другая физическая кнопка, чем у источника evdev, а детектор общий:
/// два нажатия громкости и одно `Previous` тоже завершают жест.
pub struct MediaKeyPressSource {
    config: Arc<Config>,
    gate: Arc<PressGate>,
}

impl MediaKeyPressSource {
    pub fn new(config: Arc<Config>, gate: Arc<PressGate>) -> Self {
        info!("Инициализация MediaKeyPressSource");
        Self { config, gate }
    }

    async fn run_impl(self) -> Result<()> {
        let application = self.config.media_keys.application.as_str();
        let key = self.config.media_keys.key.as_str();

        info!("Подключение к службе медиаклавиш через D-Bus");

        let connection = Connection::session().await?;
        let proxy = Proxy::new(
            &connection,
            MEDIA_KEYS_DESTINATION,
            MEDIA_KEYS_PATH,
            MEDIA_KEYS_INTERFACE,
        )
        .await?;

        // Подписка до захвата, чтобы не потерять первое нажатие
        let mut signals = proxy.receive_signal("MediaPlayerKeyPressed").await?;

        proxy
            .call_method("GrabMediaPlayerKeys", &(application, 0u32))
            .await
            .map_err(|e| sos_error!(service_unavailable, "Служба медиаклавиш недоступна: {}", e))?;

        // Задачу обычно прерывают через abort, поэтому захват снимается в Drop
        let _grab = MediaKeysGrab {
            proxy: proxy.clone(),
            application: application.to_string(),
        };

        info!("MediaKeyPressSource активен: приложение '{}', клавиша '{}'", application, key);

        while let Some(message) = signals.next().await {
            let body = message.body();
            let (sender_app, pressed_key): (String, String) = match body.deserialize() {
                Ok(args) => args,
                Err(e) => {
                    debug!("Не удалось разобрать MediaPlayerKeyPressed: {}", e);
                    continue;
                }
            };

            if Self::is_trigger(&sender_app, &pressed_key, application, key) {
                self.gate.handle_press(&PressEvent::new(PressSource::Background));
            } else {
                debug_if_enabled!("Медиаклавиша '{}' для '{}' пропущена", pressed_key, sender_app);
            }
        }

        warn!("Поток сигналов медиаклавиш завершился");
        Ok(())
    }

    fn is_trigger(sender_app: &str, pressed_key: &str, application: &str, key: &str) -> bool {
        sender_app == application && pressed_key == key
    }
}

/// Снимает захват медиаклавиш при любом завершении источника
struct MediaKeysGrab {
    proxy: Proxy<'static>,
    application: String,
}

impl Drop for MediaKeysGrab {
    fn drop(&mut self) {
        // Вне runtime вызвать D-Bus нельзя; захват снимется вместе с соединением
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let proxy = self.proxy.clone();
        let application = std::mem::take(&mut self.application);
        runtime.spawn(async move {
            match proxy
                .call_method("ReleaseMediaPlayerKeys", &(application.as_str(),))
                .await
            {
                Ok(_) => debug!("Захват медиаклавиш снят"),
                Err(e) => debug!("ReleaseMediaPlayerKeys не удался: {}", e),
            }
        });
    }
}

#[async_trait::async_trait]
impl PressSourceTrait for MediaKeyPressSource {
    fn kind(&self) -> PressSource {
        PressSource::Background
    }

    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

impl Drop for MediaKeyPressSource {
    fn drop(&mut self) {
        info!("MediaKeyPressSource завершает работу");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configured_key_for_our_application() {
        assert!(MediaKeyPressSource::is_trigger("volume-sos", "Previous", "volume-sos", "Previous"));
        assert!(!MediaKeyPressSource::is_trigger("volume-sos", "Next", "volume-sos", "Previous"));
        assert!(!MediaKeyPressSource::is_trigger("rhythmbox", "Previous", "volume-sos", "Previous"));
    }
}
