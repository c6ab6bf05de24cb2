//! Dashboard orchestration
//!
//! One refresh cycle: resolve the period, fetch the current and comparison
//! rows from the external project, normalise them and build everything the
//! dashboard renders from the resulting report.

use crate::aggregator::{MetricsAggregator, MetricsReport};
use crate::export::{ExportFile, ExportFormat, ReportExporter};
use crate::funnel::{funnel_steps, FunnelStep};
use crate::summary::{comparative_summary, executive_summary, period_label, ComparisonLine};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use inout_core::{
    models::{DateRange, DisplayPreferences, LeadBatch, PeriodSelection},
    traits::{ExternalProject, SortOrder},
    AppResult,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Everything one dashboard refresh produces
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub period: PeriodSelection,
    pub period_label: String,
    pub current_range: DateRange,
    pub previous_range: DateRange,
    pub report: MetricsReport,
    pub funnel: Vec<FunnelStep>,
    pub executive_summary: Vec<String>,
    pub comparative_summary: Vec<ComparisonLine>,
    pub preferences: DisplayPreferences,
}

/// Builds dashboard views and exports for one time zone
pub struct DashboardService {
    aggregator: MetricsAggregator,
    exporter: ReportExporter,
    max_rows: usize,
}

impl DashboardService {
    pub fn new(tz: Tz, max_rows: usize) -> Self {
        Self {
            aggregator: MetricsAggregator::new(tz),
            exporter: ReportExporter::new(tz),
            max_rows: max_rows.max(1),
        }
    }

    pub fn tz(&self) -> Tz {
        self.aggregator.tz()
    }

    /// Run one refresh cycle
    ///
    /// A failure reading the current period fails the refresh. A failure
    /// reading the comparison period only blanks the comparison.
    #[instrument(skip(self, project, prefs), fields(period = selection.period.as_str()))]
    pub async fn load(
        &self,
        project: &dyn ExternalProject,
        table: &str,
        selection: &PeriodSelection,
        prefs: &DisplayPreferences,
        now: DateTime<Utc>,
    ) -> AppResult<DashboardView> {
        let (current_range, previous_range) = selection.ranges(now, self.tz())?;

        let (current, previous) = futures::join!(
            project.fetch_leads(table, &current_range, SortOrder::Ascending, self.max_rows),
            project.fetch_leads(table, &previous_range, SortOrder::Ascending, self.max_rows),
        );

        let current = LeadBatch::from_rows(&current?);
        let previous = match previous {
            Ok(rows) => LeadBatch::from_rows(&rows),
            Err(e) => {
                warn!(error = %e, "Comparison period unavailable, using an empty set");
                LeadBatch::default()
            }
        };

        if current.skipped > 0 {
            warn!(skipped = current.skipped, "Rows without a usable created_at were ignored");
        }
        if previous.skipped > 0 {
            warn!(
                skipped = previous.skipped,
                "Comparison rows without a usable created_at were ignored"
            );
        }

        let report =
            self.aggregator
                .aggregate_batches(current, previous, current_range.period_days());

        info!(
            conversations = report.current.conversations,
            conversions = report.current.conversions,
            "Dashboard refreshed"
        );

        Ok(DashboardView {
            period: *selection,
            period_label: period_label(selection),
            current_range,
            previous_range,
            funnel: funnel_steps(&report.current, prefs),
            executive_summary: executive_summary(&report, selection),
            comparative_summary: comparative_summary(&report),
            preferences: *prefs,
            report,
        })
    }

    /// Fetch the period fresh and render it as a downloadable report
    #[instrument(skip(self, project, prefs), fields(period = selection.period.as_str()))]
    pub async fn export(
        &self,
        project: &dyn ExternalProject,
        table: &str,
        selection: &PeriodSelection,
        prefs: &DisplayPreferences,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> AppResult<ExportFile> {
        let range = selection.current_range(now, self.tz())?;
        let rows = project
            .fetch_leads(table, &range, SortOrder::Descending, self.max_rows)
            .await?;
        let batch = LeadBatch::from_rows(&rows);

        let file = self
            .exporter
            .render(format, &batch.records, selection, prefs, now)?;

        info!(
            rows = batch.records.len(),
            bytes = file.bytes.len(),
            file = %file.file_name,
            "Report generated"
        );
        Ok(file)
    }
}
