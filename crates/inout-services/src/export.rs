//! Report export
//!
//! Builds the downloadable report for a period from freshly fetched rows:
//! an XLSX workbook with a summary sheet and a detail sheet, or the detail
//! rows alone as CSV.

use crate::aggregator::{BaseMetrics, MetricsAggregator};
use crate::format::fixed;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use inout_core::{
    models::{DisplayPreferences, LeadRecord, Period, PeriodSelection},
    AppError, AppResult,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Detail sheet headers, in column order
pub const DETAIL_HEADERS: [&str; 8] = [
    "ID",
    "Cliente ID",
    "Cliente Nome",
    "Data de Criação",
    "Qualificado",
    "Desqualificado",
    "Convertido",
    "Data de Conversão",
];

const DETAIL_WIDTHS: [f64; 8] = [40.0, 15.0, 25.0, 18.0, 12.0, 14.0, 12.0, 18.0];

const SUMMARY_SHEET: &str = "Resumo";
const DETAIL_SHEET: &str = "Dados";
const REPORT_TITLE: &str = "Relatório Inout Metrics";
const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Output format
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Get content type header value
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    /// Get file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

/// A generated report ready to download
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Slug identifying the period in the file name
pub fn file_label(selection: &PeriodSelection) -> String {
    match (selection.period, selection.custom) {
        (Period::Custom, Some(custom)) => format!(
            "personalizado-{}-a-{}",
            custom.start.format("%Y-%m-%d"),
            custom.end.format("%Y-%m-%d")
        ),
        (Period::Custom, None) => "personalizado".to_string(),
        (Period::Today, _) => "hoje".to_string(),
        (Period::Last7Days, _) => "7dias".to_string(),
        (Period::Last15Days, _) => "15dias".to_string(),
        (Period::Last30Days, _) => "30dias".to_string(),
        (Period::All, _) => "historico-completo".to_string(),
    }
}

/// Download file name for a period
pub fn file_name(selection: &PeriodSelection, format: ExportFormat) -> String {
    format!(
        "clarity-metrics-relatorio-{}.{}",
        file_label(selection),
        format.extension()
    )
}

/// Renders reports for one time zone
pub struct ReportExporter {
    aggregator: MetricsAggregator,
}

impl ReportExporter {
    pub fn new(tz: Tz) -> Self {
        Self {
            aggregator: MetricsAggregator::new(tz),
        }
    }

    fn tz(&self) -> Tz {
        self.aggregator.tz()
    }

    /// Render `rows` (newest first) in the requested format
    pub fn render(
        &self,
        format: ExportFormat,
        rows: &[LeadRecord],
        selection: &PeriodSelection,
        prefs: &DisplayPreferences,
        generated_at: DateTime<Utc>,
    ) -> AppResult<ExportFile> {
        let bytes = match format {
            ExportFormat::Xlsx => self.workbook(rows, selection, prefs, generated_at)?,
            ExportFormat::Csv => self.csv(rows)?,
        };

        Ok(ExportFile {
            file_name: file_name(selection, format),
            content_type: format.content_type(),
            bytes,
        })
    }

    /// Summary sheet rows as label / value pairs; empty labels are spacers
    pub fn summary_rows(
        &self,
        metrics: &BaseMetrics,
        selection: &PeriodSelection,
        prefs: &DisplayPreferences,
        generated_at: DateTime<Utc>,
    ) -> Vec<(String, Option<SummaryValue>)> {
        let text = |s: &str| Some(SummaryValue::Text(s.to_string()));
        let count = |n: usize| Some(SummaryValue::Count(n));
        let rate = |r: f64| Some(SummaryValue::Text(format!("{}%", fixed(r, 1))));

        let mut rows: Vec<(String, Option<SummaryValue>)> = vec![
            (REPORT_TITLE.to_string(), None),
            (String::new(), None),
            ("Período".to_string(), text(&file_label(selection).replace('-', " "))),
            (
                "Data de geração".to_string(),
                text(&self.local_time(generated_at)),
            ),
            (String::new(), None),
            ("RESUMO DE MÉTRICAS".to_string(), None),
            (String::new(), None),
        ];

        if prefs.show_conversas {
            rows.push(("Conversas Iniciadas".to_string(), count(metrics.conversations)));
        }
        if prefs.show_conversoes {
            rows.push(("Conversões Realizadas".to_string(), count(metrics.conversions)));
            rows.push(("Taxa de Conversão".to_string(), rate(metrics.conversion_rate)));
        }
        if prefs.show_qualificados {
            rows.push(("Leads Qualificados".to_string(), count(metrics.qualified)));
            rows.push((
                "Taxa de Qualificação".to_string(),
                rate(metrics.qualification_rate),
            ));
        }
        if prefs.show_desqualificados {
            rows.push(("Leads Desqualificados".to_string(), count(metrics.disqualified)));
        }
        rows.push(("Leads Perdidos".to_string(), count(metrics.lost_leads)));

        rows.push((String::new(), None));
        rows.push((String::new(), None));
        rows.push(("DADOS DETALHADOS".to_string(), None));
        rows
    }

    /// One detail row as display strings
    pub fn detail_row(&self, row: &LeadRecord) -> [String; 8] {
        let yes_no = |flag: bool| (if flag { "Sim" } else { "Não" }).to_string();
        [
            row.id.clone(),
            row.client_id.clone().unwrap_or_default(),
            row.client_name.clone().unwrap_or_default(),
            self.local_time(row.created_at),
            yes_no(row.qualified),
            yes_no(row.disqualified),
            yes_no(row.converted),
            row.converted_at
                .map(|t| self.local_time(t))
                .unwrap_or_default(),
        ]
    }

    fn local_time(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz())
            .format(DATE_TIME_FORMAT)
            .to_string()
    }

    fn workbook(
        &self,
        rows: &[LeadRecord],
        selection: &PeriodSelection,
        prefs: &DisplayPreferences,
        generated_at: DateTime<Utc>,
    ) -> AppResult<Vec<u8>> {
        let metrics = self.aggregator.base_metrics(rows);
        let mut workbook = Workbook::new();

        let summary = self
            .summary_sheet(&metrics, selection, prefs, generated_at)
            .map_err(export_error)?;
        workbook.push_worksheet(summary);

        if !rows.is_empty() {
            workbook.push_worksheet(self.detail_sheet(rows).map_err(export_error)?);
        }

        workbook.save_to_buffer().map_err(export_error)
    }

    fn summary_sheet(
        &self,
        metrics: &BaseMetrics,
        selection: &PeriodSelection,
        prefs: &DisplayPreferences,
        generated_at: DateTime<Utc>,
    ) -> Result<Worksheet, XlsxError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(SUMMARY_SHEET)?;
        sheet.set_column_width(0, 28)?;
        sheet.set_column_width(1, 24)?;

        let bold = Format::new().set_bold();

        for (i, (label, value)) in self
            .summary_rows(metrics, selection, prefs, generated_at)
            .into_iter()
            .enumerate()
        {
            let row = i as u32;
            match value {
                None if !label.is_empty() => {
                    sheet.write_string_with_format(row, 0, &label, &bold)?;
                }
                None => {}
                Some(value) => {
                    sheet.write_string(row, 0, &label)?;
                    match value {
                        SummaryValue::Count(n) => sheet.write_number(row, 1, n as f64)?,
                        SummaryValue::Text(s) => sheet.write_string(row, 1, &s)?,
                    };
                }
            }
        }

        Ok(sheet)
    }

    fn detail_sheet(&self, rows: &[LeadRecord]) -> Result<Worksheet, XlsxError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(DETAIL_SHEET)?;

        let header = Format::new().set_bold();
        for (col, (title, width)) in DETAIL_HEADERS.iter().zip(DETAIL_WIDTHS).enumerate() {
            let col = col as u16;
            sheet.write_string_with_format(0, col, *title, &header)?;
            sheet.set_column_width(col, width)?;
        }

        for (i, record) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            for (col, cell) in self.detail_row(record).iter().enumerate() {
                sheet.write_string(row, col as u16, cell)?;
            }
        }

        Ok(sheet)
    }

    fn csv(&self, rows: &[LeadRecord]) -> AppResult<Vec<u8>> {
        let mut out = Vec::new();

        writeln!(&mut out, "{}", DETAIL_HEADERS.join(","))?;
        for record in rows {
            let cells: Vec<String> = self
                .detail_row(record)
                .iter()
                .map(|c| csv_field(c))
                .collect();
            writeln!(&mut out, "{}", cells.join(","))?;
        }

        Ok(out)
    }
}

/// Value column of a summary row
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryValue {
    Count(usize),
    Text(String),
}

fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn export_error(err: XlsxError) -> AppError {
    AppError::Export(err.to_string())
}
