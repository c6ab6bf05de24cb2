//! Metrics aggregation
//!
//! Pure reduction of lead rows into the dashboard report. Nothing here reads
//! the clock or performs I/O; the local time zone used for hour buckets is
//! fixed when the aggregator is built.

use chrono::Timelike;
use chrono_tz::Tz;
use inout_core::models::{LeadBatch, LeadRecord};
use serde::Serialize;

/// Counts and rates for one row set
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct BaseMetrics {
    pub conversations: usize,
    pub conversions: usize,
    pub qualified: usize,
    pub disqualified: usize,
    pub lost_leads: usize,
    /// Percentage, 0 to 100
    pub conversion_rate: f64,
    /// Percentage, 0 to 100
    pub qualification_rate: f64,
    pub avg_conversion_time_ms: Option<f64>,
    /// Local hour (0-23) with the most rows
    pub peak_hour: Option<u32>,
    pub peak_hour_volume: usize,
}

/// Current period, comparison period and the changes between them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub current: BaseMetrics,
    pub previous: BaseMetrics,
    pub avg_daily_volume: f64,
    pub previous_avg_daily_volume: f64,
    pub conversations_change: f64,
    pub conversions_change: f64,
    pub qualified_change: f64,
    pub period_days: i64,
    /// Rows dropped at ingestion for lacking a usable creation timestamp
    pub skipped_rows: usize,
    /// Current rows, in the order they were fetched
    pub raw_data: Vec<LeadRecord>,
}

/// Percentage change from `previous` to `current`
///
/// A rise from zero counts as 100%; zero to zero is no change.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    (current - previous) / previous * 100.0
}

/// Builds [`MetricsReport`]s in a fixed time zone
#[derive(Debug, Clone, Copy)]
pub struct MetricsAggregator {
    tz: Tz,
}

impl MetricsAggregator {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Reduce one row set in a single pass
    pub fn base_metrics(&self, rows: &[LeadRecord]) -> BaseMetrics {
        let mut metrics = BaseMetrics::default();
        let mut hours = [0usize; 24];
        let mut conversion_total_ms: f64 = 0.0;
        let mut conversion_samples: usize = 0;

        for row in rows {
            metrics.conversations += 1;

            if row.converted {
                metrics.conversions += 1;
            } else {
                metrics.lost_leads += 1;
            }
            if row.qualified {
                metrics.qualified += 1;
            }
            if row.disqualified {
                metrics.disqualified += 1;
            }

            if let Some(ms) = row.conversion_time_ms() {
                conversion_total_ms += ms as f64;
                conversion_samples += 1;
            }

            let hour = row.created_at.with_timezone(&self.tz).hour() as usize;
            hours[hour] += 1;
        }

        if metrics.conversations > 0 {
            let total = metrics.conversations as f64;
            metrics.conversion_rate = metrics.conversions as f64 / total * 100.0;
            metrics.qualification_rate = metrics.qualified as f64 / total * 100.0;
        }

        if conversion_samples > 0 {
            metrics.avg_conversion_time_ms =
                Some(conversion_total_ms / conversion_samples as f64);
        }

        // first hour to reach the maximum keeps it
        for (hour, &count) in hours.iter().enumerate() {
            if count > metrics.peak_hour_volume {
                metrics.peak_hour = Some(hour as u32);
                metrics.peak_hour_volume = count;
            }
        }

        metrics
    }

    /// Build the report for a current and a comparison row set
    pub fn aggregate(
        &self,
        current: &[LeadRecord],
        previous: &[LeadRecord],
        period_days: i64,
    ) -> MetricsReport {
        let days = period_days.max(1);
        let cur = self.base_metrics(current);
        let prev = self.base_metrics(previous);

        MetricsReport {
            avg_daily_volume: cur.conversations as f64 / days as f64,
            previous_avg_daily_volume: prev.conversations as f64 / days as f64,
            conversations_change: percent_change(
                cur.conversations as f64,
                prev.conversations as f64,
            ),
            conversions_change: percent_change(cur.conversions as f64, prev.conversions as f64),
            qualified_change: percent_change(cur.qualified as f64, prev.qualified as f64),
            period_days: days,
            skipped_rows: 0,
            raw_data: current.to_vec(),
            current: cur,
            previous: prev,
        }
    }

    /// Same as [`aggregate`](Self::aggregate), carrying the ingestion skip count
    pub fn aggregate_batches(
        &self,
        current: LeadBatch,
        previous: LeadBatch,
        period_days: i64,
    ) -> MetricsReport {
        let mut report = self.aggregate(&current.records, &previous.records, period_days);
        report.skipped_rows = current.skipped;
        report.raw_data = current.records;
        report
    }
}
