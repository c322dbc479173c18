/// Periodic fetch → detect → react → persist loop.
///
/// A `Poller` owns one background task. The first cycle runs immediately;
/// each later cycle starts `interval` after the previous one finished, so two
/// fetches are never in flight at once. Stopping is cooperative: the stop
/// signal is observed between cycles only, and [`Poller::stop`] waits for a
/// running cycle (including its write to disk) before returning.
///
/// The loop is the single owner of the current snapshot. Other readers get
/// clones through [`Poller::snapshot`].
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::NotificationConfig;
use crate::detect::{detect, ChangeDecision};
use crate::session::UnreadSource;
use crate::sink::NotificationSink;
use crate::state::NotificationState;
use crate::status::Indicator;
use crate::store::StateStore;

/// Text used for the new-activity alert.
#[derive(Debug, Clone)]
pub struct AlertText {
    pub title: String,
    pub subtitle: String,
    pub body: String,
}

impl From<&NotificationConfig> for AlertText {
    fn from(cfg: &NotificationConfig) -> Self {
        Self {
            title: cfg.title.clone(),
            subtitle: cfg.subtitle.clone(),
            body: cfg.body.clone(),
        }
    }
}

/// Collaborators a cycle talks to.
pub struct PollContext {
    pub source: Arc<dyn UnreadSource>,
    pub sink: Arc<dyn NotificationSink>,
    pub store: StateStore,
    pub alert: AlertText,
}

/// Result of a single cycle, reported to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The fetch succeeded; `persisted` is false if the write to disk failed.
    Completed {
        decision: ChangeDecision,
        unread: usize,
        persisted: bool,
    },
    /// The fetch failed; nothing else happened this cycle.
    FetchFailed(String),
}

/// Runs one cycle against `previous`.
///
/// Returns the freshly fetched snapshot on success, which the caller must
/// adopt as the next `previous`. On fetch failure returns `None` and leaves
/// the sink's indicator and the store untouched.
pub async fn run_cycle(
    ctx: &PollContext,
    previous: &NotificationState,
) -> (CycleOutcome, Option<NotificationState>) {
    let current = match ctx.source.fetch_unread_summary().await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Fetching unread chats failed; retrying next interval");
            let outcome = CycleOutcome::FetchFailed(e.to_string());
            ctx.sink.cycle_finished(&outcome);
            return (outcome, None);
        }
    };

    let decision = detect(previous, &current);
    if let Some(line) = decision.describe() {
        info!(
            previous = previous.unread_count(),
            current = current.unread_count(),
            "{line}"
        );
    }

    if decision == ChangeDecision::NewActivity {
        ctx.sink
            .alert(&ctx.alert.title, &ctx.alert.subtitle, &ctx.alert.body);
    }
    let indicator = if current.unread_count() > 0 {
        Indicator::Unread
    } else {
        Indicator::Clear
    };
    ctx.sink.set_indicator(indicator);

    // Written even on NoChange so record contents stay current on disk.
    let persisted = match ctx.store.save(&current) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                path = %ctx.store.path().display(),
                error = %e,
                "Failed to persist notification state"
            );
            false
        }
    };

    let outcome = CycleOutcome::Completed {
        decision,
        unread: current.unread_count(),
        persisted,
    };
    ctx.sink.cycle_finished(&outcome);
    (outcome, Some(current))
}

/// A running poll loop.
pub struct Poller {
    /// Setting this to `true` asks the loop to exit before its next cycle.
    stop_tx: watch::Sender<bool>,
    snapshot_rx: watch::Receiver<NotificationState>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawns the loop. The first cycle starts without delay.
    pub fn start(interval: Duration, initial: NotificationState, ctx: PollContext) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());

        info!(interval_secs = interval.as_secs(), "Polling for unread chats...");
        let handle = tokio::spawn(run_loop(ctx, initial, interval, stop_rx, snapshot_tx));

        Poller {
            stop_tx,
            snapshot_rx,
            handle,
        }
    }

    /// Copy of the most recently committed snapshot.
    pub fn snapshot(&self) -> NotificationState {
        self.snapshot_rx.borrow().clone()
    }

    /// Signals the loop to stop and waits for it to exit.
    ///
    /// A cycle already running when this is called finishes, persistence
    /// included. Returns the last committed snapshot.
    pub async fn stop(self) -> NotificationState {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Poll task ended abnormally");
        }
        let last = self.snapshot_rx.borrow().clone();
        last
    }
}

async fn run_loop(
    ctx: PollContext,
    mut state: NotificationState,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
    snapshot_tx: watch::Sender<NotificationState>,
) {
    loop {
        if *stop_rx.borrow_and_update() {
            break;
        }

        let (_, fetched) = run_cycle(&ctx, &state).await;
        if let Some(next) = fetched {
            state = next;
            snapshot_tx.send_replace(state.clone());
        }

        tokio::select! {
            biased;
            res = stop_rx.changed() => {
                // A dropped sender counts as a stop request too.
                if res.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Poll loop exited");
}
