//! Dashboard DTOs

use crate::dto::PeriodParams;
use inout_services::ExportFormat;
use serde::Deserialize;

/// Export query: a period plus the output format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(flatten)]
    pub period: PeriodParams,
    #[serde(default)]
    pub format: ExportFormat,
}
