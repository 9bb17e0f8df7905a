use crate::error::Result;
use tracing::info;

use super::{prepare, SmsSender};

pub struct DryRunSmsSender {
    max_parts: usize,
}

impl DryRunSmsSender {
    pub fn new(max_parts: usize) -> Self {
        Self { max_parts }
    }
}

#[async_trait::async_trait]
impl SmsSender for DryRunSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<usize> {
        let parts = prepare(phone, message, self.max_parts)?;
        for (i, part) in parts.iter().enumerate() {
            info!("[DRY RUN] SMS {} часть {}/{}: {}", phone, i + 1, parts.len(), part);
        }
        Ok(parts.len())
    }
}
