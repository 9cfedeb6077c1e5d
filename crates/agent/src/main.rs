//! `vibration-agent` -- appliance vibration monitor daemon.
//!
//! Watches a vibration sensor on a Raspberry Pi GPIO pin, decides when the
//! appliance starts and stops, and sends the configured alerts.
//!
//! ```text
//! vibration-agent <config.toml>
//! ```
//!
//! `RUST_LOG` overrides the log filter and may be set in `.env`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibration_agent::channels::build_channels;
use vibration_agent::config::AppConfig;
use vibration_agent::heartbeat::{AlertSink, HeartbeatScheduler};
use vibration_agent::signal_source::GpioSignalSource;
use vibration_core::ActivityDetector;
use vibration_events::NotificationDispatcher;

const DEFAULT_FILTER: &str = "vibration_agent=info,vibration_events=info,vibration_core=info";
const VERBOSE_FILTER: &str = "vibration_agent=debug,vibration_events=debug,vibration_core=debug";

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let Some(config_path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        init_tracing(false);
        tracing::error!("No config file given. Usage: vibration-agent <config.toml>");
        std::process::exit(1);
    };

    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };
    init_tracing(config.main.verbose);

    let settings = config.detector_settings();
    tracing::info!(
        config = %config_path.display(),
        pin = config.main.sensor_pin,
        mode = %settings.mode,
        onset_secs = settings.onset_delay.as_secs(),
        decay_secs = settings.decay_delay.as_secs(),
        "Starting vibration monitor"
    );

    // --- Alert channels ---
    let dispatcher = Arc::new(NotificationDispatcher::new(
        build_channels(&config),
        config.send_timeout(),
    ));
    if dispatcher.is_empty() {
        tracing::warn!("No alert channels configured, transitions will only be logged");
    } else {
        tracing::info!(channels = ?dispatcher.channel_names(), "Alert channels ready");
    }

    let messages = config.messages();
    drop(dispatcher.spawn_dispatch(messages.boot.clone()));

    // --- Sensor ---
    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
    let _source = GpioSignalSource::start(config.main.sensor_pin, settings.mode, signal_tx)
        .context("Failed to set up the sensor input")?;

    // --- Heartbeat ---
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let mut detector = ActivityDetector::new(settings);
    let mut sink = AlertSink::new(Arc::clone(&dispatcher), messages);
    HeartbeatScheduler::new(config.heartbeat_interval())
        .run(&mut detector, &mut signal_rx, &mut sink, cancel)
        .await;

    tracing::info!(active = detector.is_active(), "Vibration monitor stopped");
    Ok(())
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn cancel_on_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
    token.cancel();
}
