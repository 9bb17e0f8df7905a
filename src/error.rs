use thiserror::Error;

use crate::events::ErrorCode;

#[derive(Error, Debug)]
pub enum SosError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Ошибка сериализации: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Неверные аргументы: {0}")]
    InvalidArgument(String),

    #[error("Ошибка отправки SMS: {0}")]
    Sms(String),
}

impl SosError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(SosError::DeviceNotFound(msg.into()))
    }

    /// Код ошибки для ответа по каналу методов
    pub fn code(&self) -> ErrorCode {
        match self {
            SosError::InvalidArgument(_) | SosError::Json(_) => ErrorCode::InvalidArgs,
            SosError::Permission(_) => ErrorCode::PermissionDenied,
            SosError::Sms(_) => ErrorCode::SmsError,
            _ => ErrorCode::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, SosError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! sos_error {
    (device_not_found, $($arg:tt)*) => {
        $crate::error::SosError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::SosError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::SosError::ServiceUnavailable(format!($($arg)*))
    };
    (invalid_argument, $($arg:tt)*) => {
        $crate::error::SosError::InvalidArgument(format!($($arg)*))
    };
    (sms, $($arg:tt)*) => {
        $crate::error::SosError::Sms(format!($($arg)*))
    };
}
