//! Metrics and dashboard services for Inout Metrics
//!
//! This crate turns the rows read from a user's external project into
//! everything the dashboard shows, and owns the small amount of shared state
//! the realtime path needs.
//!
//! # Architecture
//!
//! - The aggregator is a pure function of its inputs and never reads the clock
//! - Services take the external project as an argument; there is no global client
//! - All I/O-bound operations are instrumented with tracing
//!
//! # Services
//!
//! - `MetricsAggregator` - Counts, rates, peak hour and period-over-period changes
//! - `DashboardService` - Refresh cycle and report export
//! - `HistoryService` - Chat sessions, agent switch-off and agent prompt
//! - `ChangeHub` - Per-table change notifications
//! - `LiveRefresher` - Live dashboard loads, with stale results dropped

pub mod aggregator;
pub mod dashboard;
pub mod export;
pub mod format;
pub mod funnel;
pub mod history;
pub mod realtime;
pub mod refresh;
pub mod summary;

pub use aggregator::{percent_change, BaseMetrics, MetricsAggregator, MetricsReport};
pub use dashboard::{DashboardService, DashboardView};
pub use export::{ExportFile, ExportFormat, ReportExporter};
pub use funnel::{funnel_steps, FunnelStep};
pub use history::HistoryService;
pub use realtime::{ChangeEvent, ChangeHub, ChannelKey};
pub use refresh::{
    DashboardViewer, LiveRefresher, RefreshOutcome, RefreshSequencer, RefreshTrigger,
};
pub use summary::{comparative_summary, executive_summary, ComparisonLine};
