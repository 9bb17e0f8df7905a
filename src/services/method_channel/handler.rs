use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::SosError;
use crate::events::method::{
    DISABLE_VOLUME_SOS, ENABLE_VOLUME_SOS, IS_SCREEN_ON, SEND_SMS, WAKE_UP_SCREEN,
};
use crate::events::{ErrorCode, MethodCall, MethodError, MethodResult};
use crate::services::screen_monitor::ScreenMonitor;
use crate::services::sms::SmsSender;
use crate::services::volume_sos::VolumeSos;

/// Разбор вызовов канала по именам методов
pub struct ShieldMethodHandler {
    volume_sos: Arc<VolumeSos>,
    screen: Arc<dyn ScreenMonitor>,
    sms: Arc<dyn SmsSender>,
}

impl ShieldMethodHandler {
    pub fn new(
        volume_sos: Arc<VolumeSos>,
        screen: Arc<dyn ScreenMonitor>,
        sms: Arc<dyn SmsSender>,
    ) -> Self {
        Self {
            volume_sos,
            screen,
            sms,
        }
    }

    pub async fn handle(&self, call: &MethodCall) -> MethodResult {
        debug!("Вызов метода '{}' (id {})", call.method, call.id);

        match call.method.as_str() {
            IS_SCREEN_ON => self
                .screen
                .is_screen_on()
                .await
                .map(Value::Bool)
                .map_err(|e| MethodError::failed(ErrorCode::ScreenError, e.to_string())),

            WAKE_UP_SCREEN => self
                .screen
                .wake_up_screen()
                .await
                .map(|_| Value::Null)
                .map_err(|e| MethodError::failed(ErrorCode::WakeError, e.to_string())),

            SEND_SMS => self.send_sms(call).await,

            ENABLE_VOLUME_SOS => {
                if self.volume_sos.enable() {
                    info!("SOS по кнопке громкости включен по запросу");
                }
                Ok(Value::Bool(true))
            }

            DISABLE_VOLUME_SOS => {
                if self.volume_sos.disable() {
                    info!("SOS по кнопке громкости выключен по запросу");
                }
                Ok(Value::Bool(true))
            }

            other => {
                debug!("Метод '{}' не реализован", other);
                Err(MethodError::NotImplemented(other.to_string()))
            }
        }
    }

    async fn send_sms(&self, call: &MethodCall) -> MethodResult {
        let (Some(phone), Some(message)) = (
            call.argument::<String>("phone"),
            call.argument::<String>("message"),
        ) else {
            return Err(MethodError::failed(
                ErrorCode::InvalidArgs,
                "Phone or message missing",
            ));
        };

        match self.sms.send(&phone, &message).await {
            Ok(_) => Ok(Value::Bool(true)),
            Err(e) => {
                warn!("Не удалось отправить SMS: {}", e);
                Err(MethodError::failed(sms_error_code(&e), e.to_string()))
            }
        }
    }
}

fn sms_error_code(error: &SosError) -> ErrorCode {
    match error.code() {
        ErrorCode::Internal => ErrorCode::SmsError,
        code => code,
    }
}
