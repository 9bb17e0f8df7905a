//! Отправка SMS: проверка аргументов, разбиение на части и доставка
//! через модем.

mod dry_run;
mod modem_manager;
pub mod segments;

pub use self::dry_run::DryRunSmsSender;
pub use self::modem_manager::ModemManagerSmsSender;

use crate::config::Config;
use crate::error::Result;
use crate::sos_error;
use std::sync::Arc;

#[async_trait::async_trait]
pub trait SmsSender: Send + Sync {
    /// Отправить сообщение, вернуть число отправленных частей
    async fn send(&self, phone: &str, message: &str) -> Result<usize>;
}

/// Factory function to create an SMS sender based on the dry_run flag
pub fn create_sms_sender(config: &Config, dry_run: bool) -> Arc<dyn SmsSender> {
    if dry_run {
        Arc::new(DryRunSmsSender::new(config.sms.max_parts))
    } else {
        Arc::new(ModemManagerSmsSender::new(
            config.sms.modem_path.clone(),
            config.sms.max_parts,
        ))
    }
}

/// Проверить номер и текст, разбить текст на части
pub fn prepare(phone: &str, message: &str, max_parts: usize) -> Result<Vec<String>> {
    validate_phone(phone)?;

    if message.is_empty() {
        return Err(sos_error!(invalid_argument, "Пустое сообщение"));
    }

    let parts = segments::divide_message(message);
    if parts.len() > max_parts {
        return Err(sos_error!(
            invalid_argument,
            "Сообщение слишком длинное: {} частей при допустимых {}",
            parts.len(),
            max_parts
        ));
    }

    Ok(parts)
}

fn validate_phone(phone: &str) -> Result<()> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return Err(sos_error!(invalid_argument, "Номер '{}' не содержит цифр", phone));
    }

    let valid = phone.char_indices().all(|(i, c)| {
        c.is_ascii_digit() || c == ' ' || c == '-' || (c == '+' && i == 0)
    });

    if !valid {
        return Err(sos_error!(invalid_argument, "Недопустимый номер '{}'", phone));
    }

    Ok(())
}
