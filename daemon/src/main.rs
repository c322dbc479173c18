mod config;
mod detect;
mod error;
mod paths;
mod poller;
mod session;
mod sink;
mod state;
mod status;
mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::paths::AppPaths;
use crate::poller::{AlertText, PollContext, Poller};
use crate::session::SessionClient;
use crate::sink::DesktopSink;
use crate::state::NotificationState;
use crate::store::StateStore;

#[derive(Debug, Parser)]
#[command(name = "cherp-notify", version, about = "Desktop notifications for unread cherp.chat replies")]
struct Cli {
    /// Directory holding config, state, cookies and status files.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Seconds between checks; overrides the config file.
    #[arg(long)]
    interval: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll for unread replies (the default).
    Run,
    /// Prompt for credentials and store a fresh session, then exit.
    Login,
    /// Delete the stored session cookies, then exit.
    Logout,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
    // ── Data directory ────────────────────────────────────────────────────────
    let paths = AppPaths::resolve(cli.data_dir.as_deref())?;
    std::fs::create_dir_all(paths.root()).with_context(|| {
        format!("Failed to create data directory {}", paths.root().display())
    })?;

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = config::load_or_default(&paths.config_file()).unwrap_or_else(|e| {
        warn!("Config error (using defaults): {e:#}");
        config::Config::default()
    });

    // ── Session ───────────────────────────────────────────────────────────────
    let client = SessionClient::new(
        config.global.base_url(),
        Duration::from_secs(config.global.request_timeout_secs),
        paths.cookie_file(),
    )
    .context("Failed to set up HTTP client")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Logout => {
            client.forget().context("Failed to delete cookie file")?;
            info!("Stored session removed");
            return Ok(());
        }
        Command::Login => {
            session::ensure_session(&client, true)
                .await
                .context("Login failure, cannot continue")?;
            return Ok(());
        }
        Command::Run => {}
    }

    // ── Last known state ──────────────────────────────────────────────────────
    // Ahead of the login bootstrap, so a broken state file fails before any prompt.
    let store = StateStore::new(paths.state_file());
    let initial = load_initial_state(&store)?;
    info!(unread = initial.unread_count(), "Loaded notification state");

    session::ensure_session(&client, false)
        .await
        .context("Login failure, cannot continue")?;

    // ── Poll loop ─────────────────────────────────────────────────────────────
    let sink = Arc::new(DesktopSink::new(
        paths.status_file(),
        config.notification.desktop,
    ));
    let ctx = PollContext {
        source: Arc::new(client),
        sink: sink.clone(),
        store,
        alert: AlertText::from(&config.notification),
    };
    let interval = config.global.effective_interval(cli.interval);
    let poller = Poller::start(interval, initial, ctx);

    wait_for_shutdown().await;
    info!(unread = poller.snapshot().unread_count(), "Exiting...");

    let last = poller.stop().await;
    info!(unread = last.unread_count(), "Poll loop stopped");
    sink.mark_stopped();
    Ok(())
}

/// Last persisted snapshot, or the zero snapshot on first run.
fn load_initial_state(store: &StateStore) -> Result<NotificationState> {
    let loaded = store.load().with_context(|| {
        format!(
            "Stored notification state is unreadable; delete {} to start fresh",
            store.path().display()
        )
    })?;
    Ok(loaded.unwrap_or_default())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn wait_for_shutdown() {
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
            Err(e) => warn!(error = %e, "Cannot listen for SIGTERM; Ctrl+C only"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C; stopping now");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_file_starts_from_zero_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("notifstate.json"));
        assert!(load_initial_state(&store).unwrap().is_first_run());
    }

    #[test]
    fn saved_state_is_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("notifstate.json"));
        std::fs::write(store.path(), r#"{"chats":[{"id":"c1"}]}"#).unwrap();
        assert_eq!(load_initial_state(&store).unwrap().unread_count(), 1);
    }

    #[test]
    fn unreadable_state_file_is_fatal_and_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("notifstate.json"));
        std::fs::write(store.path(), r#"{"status":"error"}"#).unwrap();

        let err = load_initial_state(&store).unwrap_err();
        assert!(format!("{err:#}").contains("notifstate.json"));
    }
}
