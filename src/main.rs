use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::Config;
use services::{
    create_screen_monitor, create_sms_sender, EventDispatcher, MethodChannelServer,
    ShieldMethodHandler, VolumeSos,
};
use utils::MonotonicClock;

#[derive(Parser, Debug)]
#[command(name = "volume-sos")]
#[command(about = "SOS по трёхкратному нажатию кнопки громкости")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "volume-sos.toml")]
    config: String,

    /// Режим сухого запуска (нажатия, экран и SMS эмулируются)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации до логирования: уровень и формат берутся из неё
    let config = Arc::new(Config::load(&args.config)?);

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск volume-sos v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные устройства и службы не используются");
    } else {
        utils::permissions::check_permissions();
    }

    // Инициализация компонентов
    let dispatcher = Arc::new(EventDispatcher::new(config.channel.event_buffer));
    let volume_sos = Arc::new(VolumeSos::new(
        config.clone(),
        dispatcher.clone(),
        Arc::new(MonotonicClock::new()),
        args.dry_run,
    ));
    let screen = create_screen_monitor(&config, args.dry_run);
    let sms = create_sms_sender(&config, args.dry_run);
    let handler = Arc::new(ShieldMethodHandler::new(volume_sos.clone(), screen.clone(), sms));

    let socket_path = config.channel.resolve_socket_path();
    let server = MethodChannelServer::bind(&socket_path, handler, dispatcher.clone())?;

    info!("Все компоненты инициализированы");

    // Запуск сервисов
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Ошибка в MethodChannelServer: {}", e);
        }
    });

    let screen_handle = config.screen.enabled.then(|| {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            if let Err(e) = screen.watch(dispatcher).await {
                error!("Ошибка в ScreenMonitor: {}", e);
            }
        })
    });

    if config.volume_sos.auto_enable && volume_sos.enable() {
        info!(
            "Volume SOS включен при запуске, источников нажатий: {}",
            volume_sos.active_source_count()
        );
    }

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    volume_sos.disable();

    // Прерываем задачи: сервер удалит сокет в Drop
    server_handle.abort();
    if let Some(handle) = &screen_handle {
        handle.abort();
    }

    // Ожидаем завершения задач (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = server_handle.await;
        if let Some(handle) = screen_handle {
            let _ = handle.await;
        }
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("volume-sos завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        "pretty" => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
    }

    Ok(())
}
