use crate::config::Config;
use crate::error::Result;
use crate::events::{PressEvent, PressSource};
use crate::services::volume_sos::PressGate;
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration};
use tracing::info;

use super::r#trait::PressSourceTrait;

/// Пауза перед каждым эмулированным нажатием серии (мс).
/// Второе нажатие - дубликат первого, как при доставке из двух источников.
const SCRIPTED_BURST: &[u64] = &[0, 40, 600, 600];

pub struct DryRunPressSource {
    config: Arc<Config>,
    gate: Arc<PressGate>,
}

impl DryRunPressSource {
    pub fn new(config: Arc<Config>, gate: Arc<PressGate>) -> Self {
        info!("Инициализация DryRunPressSource");
        Self { config, gate }
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - нажатия кнопки эмулируются");

        let mut ticker = interval(Duration::from_millis(self.config.dry_run.interval_ms));
        // Первый тик мгновенный - пропускаем его, чтобы серия не шла сразу при включении
        ticker.tick().await;

        loop {
            ticker.tick().await;
            info!("Dry-run: эмулируем серию из {} нажатий", SCRIPTED_BURST.len());

            let mut matched = false;
            for &pause in SCRIPTED_BURST {
                sleep(Duration::from_millis(pause)).await;
                matched |= self.gate.handle_press(&PressEvent::new(PressSource::Emulated));
            }

            info!("Dry-run: серия {}", if matched { "распознана" } else { "не распознана" });
        }
    }
}

#[async_trait::async_trait]
impl PressSourceTrait for DryRunPressSource {
    fn kind(&self) -> PressSource {
        PressSource::Emulated
    }

    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
