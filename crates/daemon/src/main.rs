// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Milo Agent Daemon (milod)
//!
//! Background process that receives user messages from the remote service,
//! dispatches them to per-session worker subprocesses, and streams replies
//! back in real time.
//!
//! Architecture:
//! - Background tasks: pub/sub subscriber, heartbeat/poll ticker, outbox
//!   flusher, orphan pollers — all feeding the event bus
//! - Engine loop: main task processing events sequentially

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;
use std::time::Duration;

use milo_daemon::lifecycle::{self, Config, LifecycleError, StartupResult};
use milo_daemon::tasks;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("milod {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("milod {}", env!("CARGO_PKG_VERSION"));
                println!("Milo Agent Daemon - routes user messages to per-session workers");
                println!();
                println!("USAGE:");
                println!("    milod");
                println!();
                println!("The daemon is configured through MILO_* environment variables");
                println!("(MILO_STATE_DIR, MILO_API_URL, MILO_API_KEY, MILO_WORKER_BIN, ...)");
                println!("and runs until it receives SIGTERM or SIGINT.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: milod [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Rotate the log if it has grown too large
    rotate_log_if_needed(&config.log_path);

    // Startup marker goes in before tracing, so failures are findable
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting milo daemon");

    let StartupResult {
        daemon,
        mut event_rx,
        event_tx,
        pubsub,
        remote,
        orphans,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            let version = std::fs::read_to_string(&config.version_path)
                .unwrap_or_default()
                .trim()
                .to_string();

            eprintln!("milod is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            if !version.is_empty() {
                let current = env!("CARGO_PKG_VERSION");
                if version == current {
                    eprintln!("  version: {version}");
                } else {
                    eprintln!("  version: {version} (outdated — current: {current})");
                }
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write synchronously; the non-blocking tracing writer may not
            // flush before exit.
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let runtime = Arc::clone(&daemon.runtime);

    // Background tasks
    tasks::spawn_pubsub_subscriber(pubsub.clone(), event_tx.clone());
    tasks::spawn_heartbeat(
        Arc::clone(&runtime),
        remote,
        pubsub,
        event_tx.clone(),
    );
    tasks::spawn_flusher(Arc::clone(&runtime));
    for (session_id, pid) in orphans {
        tasks::spawn_orphan_poller(
            Arc::clone(&runtime),
            session_id,
            pid,
            event_tx.clone(),
        );
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Daemon ready");

    // Signal ready for whoever started us (setup CLI, service manager)
    println!("READY");

    // Timer check interval. Created outside the loop: tokio::select!
    // re-evaluates branches each iteration, and a fresh sleep() would
    // reset on every event, starving the timers during activity.
    let mut timer_check = tokio::time::interval(Duration::from_secs(1));

    // Engine loop - processes events sequentially
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        if daemon.process_event(event).await {
                            info!("Shutdown requested via event");
                            break;
                        }
                    }
                    None => {
                        info!("Event bus closed, shutting down...");
                        break;
                    }
                }
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }

            _ = timer_check.tick() => {
                let now = std::time::Instant::now();
                let timer_events = {
                    let scheduler = daemon.runtime.scheduler();
                    let mut scheduler = scheduler.lock();
                    scheduler.fired_timers(now)
                };
                let mut shutdown = false;
                for event in timer_events {
                    if daemon.process_event(event).await {
                        shutdown = true;
                    }
                }
                if shutdown {
                    info!("Shutdown requested via timer event");
                    break;
                }
            }
        }
    }

    daemon.shutdown().await?;
    info!("Daemon stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (milod.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `milod.log` → `milod.log.1` → `milod.log.2` → `milod.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- milod: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- milod: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(
        file,
        "{}{}) ---\n",
        STARTUP_MARKER_PREFIX,
        std::process::id()
    )?;

    Ok(())
}

/// Write startup error synchronously so it is visible even if the process
/// exits before the async writer flushes.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
