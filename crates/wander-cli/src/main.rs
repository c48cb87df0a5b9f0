//! `wander` – obstacle-avoidance behavior binary.
//!
//! Startup framing, in order:
//!
//! 1. Resolve the environment name from `WANDER_ENV` (default `dev`).
//! 2. Load the layered configuration (see [`config`]).
//! 3. Initialise structured logging (level, sink, and format from the
//!    config plus `RUST_LOG` / `WANDER_LOG_FORMAT=json` overrides).
//! 4. Construct the message bus and install the Ctrl-C handler.
//! 5. Optionally spawn the simulated subsystems ([`sim`]).
//! 6. Run the wander loop until Ctrl-C or a fatal error; the loop's own
//!    cleanup leaves the motors stopped on every exit path.

mod config;
mod sim;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriter;

use wander_behavior::{WanderConfig, WanderLoop};
use wander_bus::MessageBus;

#[tokio::main]
async fn main() {
    let env_name = std::env::var("WANDER_ENV").unwrap_or_else(|_| "dev".to_string());
    let cfg = match config::load(&env_name) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[wander] {e}; using default configuration");
            config::Config::default()
        }
    };

    init_logging(&cfg.logging);
    info!(environment = %env_name, "configuration loaded");

    // The endpoint a networked bus client would dial; the in-process
    // transport has nothing to connect to.
    info!(host = %cfg.bus.host, port = cfg.bus.port, "connecting to message bus");
    let bus = MessageBus::default();

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    if cfg.wander.simulate {
        info!("spawning simulated subsystems");
        sim::spawn_subsystems(&bus);
    }

    let loop_config = WanderConfig {
        distance_threshold: cfg.wander.distance_threshold,
        drive_speed: cfg.wander.drive_speed,
        turn_speed: cfg.wander.turn_speed,
        ..WanderConfig::default()
    };

    let mut wander = WanderLoop::new(bus, loop_config, shutdown);
    match wander.run().await {
        Ok(()) => info!("shutdown complete"),
        Err(e) => {
            error!(error = %e, "wander behavior failed");
            std::process::exit(1);
        }
    }
}

/// Initialise the global `tracing` subscriber.
///
/// The configured level is the default filter; `RUST_LOG` overrides it.
/// The sink is stderr unless a log file is configured (append mode; an
/// unopenable file falls back to stderr). `WANDER_LOG_FORMAT=json`
/// switches to newline-delimited JSON for log aggregators.
fn init_logging(cfg: &config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let json = std::env::var("WANDER_LOG_FORMAT").as_deref() == Ok("json");

    match cfg.file.as_deref() {
        Some(path) => {
            match std::fs::OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => init_with_writer(filter, json, Arc::new(file)),
                Err(e) => {
                    eprintln!("[wander] cannot open log file {path}: {e}; logging to stderr");
                    init_with_writer(filter, json, std::io::stderr);
                }
            }
        }
        None => init_with_writer(filter, json, std::io::stderr),
    }
}

fn init_with_writer<W>(filter: EnvFilter, json: bool, writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .compact()
            .init();
    }
}
