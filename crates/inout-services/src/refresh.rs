//! Live dashboard refresh
//!
//! Every load takes a ticket from a [`RefreshSequencer`]; only the newest
//! ticket may publish its result, so a slow load that finishes after a newer
//! one started is dropped. A period change aborts the load in flight and
//! starts over. Change notifications and manual refreshes that arrive while a
//! load runs are folded into a single follow-up load, so a steady stream of
//! changes still yields one update per completed load.

use crate::dashboard::{DashboardService, DashboardView};
use async_trait::async_trait;
use chrono::Utc;
use inout_core::{
    models::{DisplayPreferences, PeriodSelection},
    traits::ExternalProject,
    AppResult,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Monotonic refresh counter
#[derive(Debug, Default)]
pub struct RefreshSequencer {
    latest: AtomicU64,
}

impl RefreshSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh and get its sequence number
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `seq` is still the newest refresh
    pub fn is_current(&self, seq: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == seq
    }

    /// Sequence number of the newest refresh, 0 before the first
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// Why a refresh was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Connect,
    /// The watched period changed
    Subscribe,
    /// The client asked for a reload
    Client,
    /// A change notification arrived
    Change,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::Connect => "connect",
            RefreshTrigger::Subscribe => "subscribe",
            RefreshTrigger::Client => "client",
            RefreshTrigger::Change => "change",
        }
    }

    /// Whether the load in flight is obsolete once this arrives
    fn supersedes(&self) -> bool {
        matches!(self, RefreshTrigger::Connect | RefreshTrigger::Subscribe)
    }
}

/// The person watching a live dashboard
///
/// Asked before every load, so preference edits show up on the next update
/// and a revoked user stops receiving metrics.
#[async_trait]
pub trait DashboardViewer: Send + Sync {
    async fn preferences(&self) -> AppResult<DisplayPreferences>;
}

/// Result of one completed load
#[derive(Debug)]
pub struct RefreshOutcome {
    pub seq: u64,
    pub result: AppResult<DashboardView>,
}

#[derive(Default)]
struct LoopState {
    selection: PeriodSelection,
    /// A refresh was asked for while a load was running
    pending: bool,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    dashboard: Arc<DashboardService>,
    project: Arc<dyn ExternalProject>,
    table: String,
    viewer: Arc<dyn DashboardViewer>,
    sequencer: RefreshSequencer,
    state: Mutex<LoopState>,
    outbox: mpsc::UnboundedSender<RefreshOutcome>,
}

impl Shared {
    async fn load(&self, selection: &PeriodSelection) -> AppResult<DashboardView> {
        let prefs = self.viewer.preferences().await?;
        self.dashboard
            .load(self.project.as_ref(), &self.table, selection, &prefs, Utc::now())
            .await
    }

    /// Load until no refresh is pending, publishing each current result
    async fn run(self: Arc<Self>, mut seq: u64, mut selection: PeriodSelection) {
        loop {
            let result = self.load(&selection).await;

            let next = {
                let mut state = self.state.lock();
                if !self.sequencer.is_current(seq) {
                    debug!(seq, latest = self.sequencer.latest(), "Discarding stale refresh");
                    return;
                }
                if self.outbox.send(RefreshOutcome { seq, result }).is_err() {
                    state.task = None;
                    return;
                }
                if state.pending {
                    state.pending = false;
                    Some((self.sequencer.next(), state.selection))
                } else {
                    state.task = None;
                    None
                }
            };

            match next {
                Some((next_seq, next_selection)) => {
                    debug!(seq = next_seq, "Follow-up refresh started");
                    seq = next_seq;
                    selection = next_selection;
                }
                None => return,
            }
        }
    }
}

/// Refresh loop of one live dashboard
///
/// Results arrive on the receiver returned by [`LiveRefresher::new`]. Dropping
/// the refresher aborts the load in flight.
pub struct LiveRefresher {
    shared: Arc<Shared>,
}

impl LiveRefresher {
    pub fn new(
        dashboard: Arc<DashboardService>,
        project: Arc<dyn ExternalProject>,
        table: impl Into<String>,
        viewer: Arc<dyn DashboardViewer>,
        selection: PeriodSelection,
    ) -> (Self, mpsc::UnboundedReceiver<RefreshOutcome>) {
        let (outbox, results) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            dashboard,
            project,
            table: table.into(),
            viewer,
            sequencer: RefreshSequencer::new(),
            state: Mutex::new(LoopState {
                selection,
                ..LoopState::default()
            }),
            outbox,
        });
        (Self { shared }, results)
    }

    pub fn selection(&self) -> PeriodSelection {
        self.shared.state.lock().selection
    }

    /// Switch the watched period and reload for it
    pub fn subscribe(&self, selection: PeriodSelection) {
        let mut state = self.shared.state.lock();
        state.selection = selection;
        self.start(&mut state, RefreshTrigger::Subscribe);
    }

    /// Ask for a reload
    pub fn request(&self, trigger: RefreshTrigger) {
        let mut state = self.shared.state.lock();
        if trigger.supersedes() || state.task.is_none() {
            self.start(&mut state, trigger);
        } else {
            state.pending = true;
            debug!(trigger = trigger.as_str(), "Refresh folded into the running load");
        }
    }

    /// Abort the load in flight, if any
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        state.pending = false;
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    /// Sequence number of the newest load
    pub fn latest(&self) -> u64 {
        self.shared.sequencer.latest()
    }

    fn start(&self, state: &mut LoopState, trigger: RefreshTrigger) {
        if let Some(previous) = state.task.take() {
            previous.abort();
        }
        state.pending = false;

        let seq = self.shared.sequencer.next();
        let selection = state.selection;
        debug!(
            seq,
            trigger = trigger.as_str(),
            period = selection.period.as_str(),
            "Dashboard refresh started"
        );
        state.task = Some(tokio::spawn(self.shared.clone().run(seq, selection)));
    }
}

impl Drop for LiveRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_refresh_supersedes_older() {
        let seq = RefreshSequencer::new();
        let first = seq.next();
        let second = seq.next();

        assert!(second > first);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_only_period_changes_supersede() {
        assert!(RefreshTrigger::Subscribe.supersedes());
        assert!(RefreshTrigger::Connect.supersedes());
        assert!(!RefreshTrigger::Change.supersedes());
        assert!(!RefreshTrigger::Client.supersedes());
    }
}
