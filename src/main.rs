//! # Lander Console
//!
//! Fly the lander simulation from a gamepad over UDP.
//!
//! The console sends throttle and roll commands to the lander, reads its
//! telemetry, republishes it to the dashboard and announces the end of the
//! session on a crash or a landing.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lander_console::config::{Config, LoggingConfig};
use lander_console::engine::{ConsoleEngine, SessionEnd};
use lander_console::input::{open_sampler, BoostSwitch};
use lander_console::link::ControlLink;
use lander_console::presentation::LogPresentation;

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for the lander console
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (command line path, `config/default.toml`, or built-in defaults)
///    - Set up logging
///    - Bind the UDP socket and open the input device
///
/// 2. **Session**
///    - Run control exchange, dashboard publish and status check on their periods
///    - Stop when the lander crashes or lands, or on Ctrl+C
///
/// 3. **Shutdown**
///    - Log link statistics
///    - Start a new session if `session.auto_restart` is set
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be read or is invalid
/// - The UDP socket cannot be bound
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO lander_console: Lander Console v0.1.0 starting...
/// INFO lander_console::link: Console socket bound to 0.0.0.0:51234
/// INFO lander_console: Lander at 192.168.0.13:65200, dashboard at 192.168.0.13:65300
/// INFO lander_console::engine: Session started (control 50ms, dashboard 1s, status 500ms)
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;

    let _log_guard = init_logging(&config.logging)?;

    info!("Lander Console v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Configuration loaded from {}", path);
    }

    let link = ControlLink::bind(&config.link)
        .await
        .context("Failed to set up the console link")?;
    info!("Lander at {}, dashboard at {}", link.lander(), link.dashboard());

    let boost = BoostSwitch::new();
    let sampler = open_sampler(&config.input, boost.clone());
    let presentation = Arc::new(LogPresentation::new());

    let mut engine = ConsoleEngine::from_config(&config, link, sampler, boost, presentation);

    info!("Press Ctrl+C to exit");

    loop {
        let end = engine.run(shutdown_signal()).await;
        let stats = engine.link().stats();
        info!(
            "Session ended ({:?}): {} commands sent, {} telemetry datagrams, {} dashboard frames, {} timeouts, {} send failures, {} receive failures, {} rejected telemetry lines",
            end,
            stats.lander_sent,
            stats.received,
            stats.dashboard_sent,
            stats.timeouts,
            stats.send_failures,
            stats.recv_failures,
            engine.rejected_lines()
        );

        match end {
            SessionEnd::Finished(_) if config.session.auto_restart => engine.reset(),
            _ => break,
        }
    }

    info!("Lander Console stopped");
    Ok(())
}

/// Load configuration from `path`, or from the default location
///
/// An explicit path must exist. The default path is optional: when it is
/// missing the built-in defaults are used.
fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load configuration from {}", path))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the configured level. When a log file is configured,
/// events are also written there through a background writer whose guard must
/// be held for the lifetime of the program.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = if config.file.is_empty() {
        (None, None)
    } else {
        let path = Path::new(&config.file);
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .with_context(|| format!("Log file path has no file name: {}", config.file))?;
        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler: run until the session ends on its own
        std::future::pending::<()>().await;
    }
}
