//! Протокол канала методов: один JSON-объект на строку.
//!
//! Входящие вызовы `{"id":1,"method":"sendSms","arguments":{...}}`,
//! исходящие ответы и события различаются по полю `type`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::ShieldEvent;

pub const IS_SCREEN_ON: &str = "isScreenOn";
pub const WAKE_UP_SCREEN: &str = "wakeUpScreen";
pub const SEND_SMS: &str = "sendSms";
pub const ENABLE_VOLUME_SOS: &str = "enableVolumeSos";
pub const DISABLE_VOLUME_SOS: &str = "disableVolumeSos";

/// Коды ошибок, понятные слою приложения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "INVALID_ARGS")]
    InvalidArgs,
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied,
    #[serde(rename = "SMS_ERR")]
    SmsError,
    #[serde(rename = "WAKE_ERR")]
    WakeError,
    #[serde(rename = "SCREEN_ERR")]
    ScreenError,
    #[serde(rename = "INTERNAL")]
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::InvalidArgs => "INVALID_ARGS",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::SmsError => "SMS_ERR",
            ErrorCode::WakeError => "WAKE_ERR",
            ErrorCode::ScreenError => "SCREEN_ERR",
            ErrorCode::Internal => "INTERNAL",
        };
        f.write_str(code)
    }
}

/// Входящий вызов метода
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    #[serde(default)]
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    #[cfg(test)]
    pub fn new(id: u64, method: impl Into<String>, arguments: Value) -> Self {
        Self {
            id,
            method: method.into(),
            arguments,
        }
    }

    /// Достать именованный аргумент; `None`, если его нет или тип не подходит
    pub fn argument<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.arguments
            .get(key)
            .filter(|value| !value.is_null())
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Ошибка обработки вызова
#[derive(Debug, Clone, PartialEq)]
pub enum MethodError {
    NotImplemented(String),
    Failed { code: ErrorCode, message: String },
}

impl MethodError {
    pub fn failed(code: ErrorCode, message: impl Into<String>) -> Self {
        MethodError::Failed {
            code,
            message: message.into(),
        }
    }
}

pub type MethodResult = std::result::Result<Value, MethodError>;

/// Исходящее сообщение канала
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    Result {
        id: u64,
        value: Value,
    },
    Error {
        id: u64,
        code: ErrorCode,
        message: String,
    },
    NotImplemented {
        id: u64,
    },
    Event {
        name: String,
        value: Value,
    },
}

impl Outbound {
    pub fn reply(id: u64, result: MethodResult) -> Self {
        match result {
            Ok(value) => Outbound::Result { id, value },
            Err(MethodError::NotImplemented(_)) => Outbound::NotImplemented { id },
            Err(MethodError::Failed { code, message }) => Outbound::Error { id, code, message },
        }
    }

    pub fn event(event: ShieldEvent) -> Self {
        Outbound::Event {
            name: event.name().to_string(),
            value: event.value(),
        }
    }
}
