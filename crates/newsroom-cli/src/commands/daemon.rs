use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use newsroom_core::{
    scheduler::{bootstrap_snapshot, BootstrapOutcome, SchedulerEvent, SchedulerService},
    AppConfig, CurationPipeline, CurationSnapshot, SnapshotStore,
};

fn pid_file_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("newsroom")
        .join("daemon.pid")
}

/// PID of a live daemon, clearing a stale PID file on the way
fn is_daemon_running() -> Option<u32> {
    let pid_path = pid_file_path();
    let contents = fs::read_to_string(&pid_path).ok()?;
    let pid: u32 = contents.trim().parse().ok()?;

    #[cfg(unix)]
    {
        let alive = std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if alive {
            return Some(pid);
        }
    }

    #[cfg(windows)]
    {
        return Some(pid);
    }

    let _ = fs::remove_file(&pid_path);
    None
}

fn write_pid_file() -> Result<()> {
    let pid_path = pid_file_path();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&pid_path, format!("{}\n", std::process::id()))
        .with_context(|| format!("cannot write {}", pid_path.display()))?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(pid_file_path());
}

/// Resolve once Ctrl+C or SIGTERM arrives
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Cannot listen for SIGTERM: {}", e),
        }
    }

    tokio::signal::ctrl_c().await.ok();
}

/// Start the daemon
pub async fn start(config: Arc<AppConfig>) -> Result<()> {
    if let Some(pid) = is_daemon_running() {
        println!("Daemon is already running (PID: {})", pid);
        return Ok(());
    }

    println!("Starting newsroom daemon...");

    let pipeline = Arc::new(CurationPipeline::from_config(&config)?);
    let store = Arc::new(SnapshotStore::new(
        config.snapshot_path(),
        CurationSnapshot::empty(config.category_names()),
    ));

    write_pid_file()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    match bootstrap_snapshot(&pipeline, &store).await {
        BootstrapOutcome::Loaded => println!("  Serving saved snapshot from {}", store.path().display()),
        BootstrapOutcome::Refreshed => println!("  Built a fresh snapshot"),
        BootstrapOutcome::Empty => println!("  Initial refresh failed; serving empty categories until the next cycle"),
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SchedulerEvent::SnapshotRefreshed { curated, failed_sources } => {
                    info!("Snapshot published: {} articles, {} failed sources", curated, failed_sources);
                }
                SchedulerEvent::Error { task, message } => {
                    warn!("Background {} failed: {}", task, message);
                }
            }
        }
    });

    let scheduler = SchedulerService::new(
        pipeline,
        Arc::clone(&store),
        Duration::from_secs(config.sync.refresh_interval_secs),
    )
    .with_event_sender(event_tx);

    println!(
        "Daemon started (PID: {}). Press Ctrl+C or run 'newsroom daemon stop' to stop.",
        std::process::id()
    );
    println!("  Refresh interval: {} seconds", config.sync.refresh_interval_secs);
    println!("  Categories: {}", config.category_names().join(", "));

    // Run scheduler (blocks until shutdown)
    scheduler.run(shutdown_rx).await;

    remove_pid_file();
    println!("Daemon stopped.");

    Ok(())
}

/// Stop the daemon
pub async fn stop() -> Result<()> {
    let Some(pid) = is_daemon_running() else {
        println!("Daemon is not running.");
        return Ok(());
    };

    println!("Stopping daemon (PID: {})...", pid);

    #[cfg(unix)]
    {
        use std::process::Command;
        let output = Command::new("kill").arg("-TERM").arg(pid.to_string()).output()?;

        if !output.status.success() {
            println!("Failed to stop daemon. You may need to kill it manually: kill {}", pid);
            return Ok(());
        }

        // Wait a moment for graceful shutdown
        tokio::time::sleep(Duration::from_secs(2)).await;

        if is_daemon_running().is_none() {
            println!("Daemon stopped successfully.");
        } else {
            let _ = Command::new("kill").arg("-9").arg(pid.to_string()).output();
            remove_pid_file();
            println!("Daemon forcefully terminated.");
        }
    }

    #[cfg(windows)]
    {
        println!("Please stop the daemon manually on Windows (PID: {})", pid);
    }

    Ok(())
}

/// Show daemon status
pub async fn status() -> Result<()> {
    match is_daemon_running() {
        Some(pid) => {
            println!("Daemon is running (PID: {})", pid);
            println!("PID file: {}", pid_file_path().display());
        }
        None => {
            println!("Daemon is not running.");
        }
    }

    Ok(())
}
