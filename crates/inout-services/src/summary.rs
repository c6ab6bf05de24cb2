//! Text summaries of a metrics report
//!
//! Two renderings in Brazilian Portuguese: the executive summary (a few
//! sentences describing the current period) and the comparative summary
//! (one line per metric against the previous period).

use crate::aggregator::MetricsReport;
use crate::format::{count_br, duration, fixed, hour, hour_range, number_br};
use inout_core::models::{Period, PeriodSelection};
use serde::Serialize;

const NO_VALUE: &str = "—";

/// Period phrase opening the executive summary
pub fn executive_period_text(selection: &PeriodSelection) -> String {
    match (selection.period, selection.custom) {
        (Period::Custom, Some(custom)) => format!(
            "De {} a {}",
            custom.start.format("%d/%m/%Y"),
            custom.end.format("%d/%m/%Y")
        ),
        (Period::Today, _) => "Hoje".to_string(),
        (Period::Last7Days, _) => "Nos últimos 7 dias".to_string(),
        (Period::Last15Days, _) => "Nos últimos 15 dias".to_string(),
        (Period::Last30Days, _) => "Nos últimos 30 dias".to_string(),
        (Period::All, _) => "Em todo o período".to_string(),
        (Period::Custom, None) => "No período personalizado".to_string(),
    }
}

/// Short period label used in headings
pub fn period_label(selection: &PeriodSelection) -> String {
    match (selection.period, selection.custom) {
        (Period::Custom, Some(custom)) => format!(
            "{} a {}",
            custom.start.format("%d/%m/%Y"),
            custom.end.format("%d/%m/%Y")
        ),
        (Period::Today, _) => "Hoje".to_string(),
        (Period::Last7Days, _) => "Últimos 7 dias".to_string(),
        (Period::Last15Days, _) => "Últimos 15 dias".to_string(),
        (Period::Last30Days, _) => "Últimos 30 dias".to_string(),
        (Period::All, _) => "Todo o período".to_string(),
        (Period::Custom, None) => "Período selecionado".to_string(),
    }
}

fn change_text(change: f64, label: &str) -> String {
    if change == 0.0 {
        return String::new();
    }
    let direction = if change > 0.0 { "aumento" } else { "queda" };
    format!(
        ", representando {} de {}% em {}",
        direction,
        fixed(change.abs(), 0),
        label
    )
}

/// Executive summary paragraphs; empty when no conversation was started
pub fn executive_summary(report: &MetricsReport, selection: &PeriodSelection) -> Vec<String> {
    let current = &report.current;
    if current.conversations == 0 {
        return Vec::new();
    }

    let mut parts = Vec::with_capacity(4);

    parts.push(format!(
        "{}, {} conversas foram iniciadas{}.",
        executive_period_text(selection),
        count_br(current.conversations),
        change_text(report.conversations_change, "conversas")
    ));

    parts.push(format!(
        "{}% dos leads foram qualificados e {}% resultaram em conversão{}.",
        fixed(current.qualification_rate, 0),
        fixed(current.conversion_rate, 0),
        change_text(report.conversions_change, "conversões")
    ));

    if current.lost_leads > 0 {
        let lost_pct = current.lost_leads as f64 / current.conversations as f64 * 100.0;
        parts.push(format!(
            "{} leads ({}%) não foram convertidos.",
            count_br(current.lost_leads),
            fixed(lost_pct, 0)
        ));
    }

    if report.avg_daily_volume > 0.0 && selection.period != Period::Today {
        let peak = current
            .peak_hour
            .map(|h| {
                format!(
                    " O pico de atividade ocorre entre {} e {}.",
                    hour(h),
                    hour((h + 2) % 24)
                )
            })
            .unwrap_or_default();
        parts.push(format!(
            "Média de {} conversas por dia.{}",
            fixed(report.avg_daily_volume, 1),
            peak
        ));
    }

    parts
}

/// Which direction of change is good for a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Higher,
    Lower,
}

impl Trend {
    /// Whether moving from `previous` to `current` is a regression
    pub fn is_regression(&self, current: f64, previous: f64) -> bool {
        if current == previous {
            return false;
        }
        match self {
            Trend::Higher => current < previous,
            Trend::Lower => current > previous,
        }
    }
}

/// One metric compared against the previous period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonLine {
    pub label: &'static str,
    pub current: String,
    pub previous: String,
    pub change: String,
    pub trend: Trend,
    pub is_regression: bool,
}

/// `Var: ±delta (±pct%)`
pub fn change_label(current: f64, previous: f64, decimals: usize, unit: &str) -> String {
    let delta = current - previous;
    let pct = crate::aggregator::percent_change(current, previous);

    format!(
        "Var: {}{}{} ({}{}%)",
        sign(delta),
        number_br(delta.abs(), decimals),
        unit,
        sign(pct),
        number_br(pct.abs(), 1)
    )
}

fn sign(value: f64) -> &'static str {
    if value > 0.0 {
        "+"
    } else if value < 0.0 {
        "-"
    } else {
        ""
    }
}

fn unavailable_change() -> String {
    format!("Var: {}", NO_VALUE)
}

struct Line {
    label: &'static str,
    current: String,
    previous: String,
    change: String,
    current_value: f64,
    previous_value: f64,
    trend: Trend,
}

impl Line {
    fn counted(label: &'static str, current: usize, previous: usize, trend: Trend) -> Self {
        let (c, p) = (current as f64, previous as f64);
        Self {
            label,
            current: count_br(current),
            previous: count_br(previous),
            change: change_label(c, p, 0, ""),
            current_value: c,
            previous_value: p,
            trend,
        }
    }

    fn rate(label: &'static str, current: f64, previous: f64) -> Self {
        Self {
            label,
            current: format!("{}%", number_br(current, 1)),
            previous: format!("{}%", number_br(previous, 1)),
            change: change_label(current, previous, 1, " p.p."),
            current_value: current,
            previous_value: previous,
            trend: Trend::Higher,
        }
    }

    fn finish(self) -> ComparisonLine {
        ComparisonLine {
            is_regression: self.trend.is_regression(self.current_value, self.previous_value),
            label: self.label,
            current: self.current,
            previous: self.previous,
            change: self.change,
            trend: self.trend,
        }
    }
}

fn conversion_time_line(current: Option<f64>, previous: Option<f64>) -> Line {
    let current = current.filter(|ms| *ms > 0.0);
    let previous = previous.filter(|ms| *ms > 0.0);
    let render = |v: Option<f64>| v.map(duration).unwrap_or_else(|| NO_VALUE.to_string());

    Line {
        label: "Tempo Médio até Conversão",
        current: render(current),
        previous: render(previous),
        change: match (current, previous) {
            (Some(c), Some(p)) => change_label(c, p, 0, ""),
            _ => unavailable_change(),
        },
        current_value: current.unwrap_or(0.0),
        previous_value: previous.unwrap_or(0.0),
        trend: Trend::Lower,
    }
}

fn peak_line(report: &MetricsReport) -> Line {
    let render = |peak: Option<u32>, volume: usize| {
        peak.map(|h| format!("{} ({} leads)", hour_range(h), count_br(volume)))
            .unwrap_or_else(|| NO_VALUE.to_string())
    };
    let (cur, prev) = (&report.current, &report.previous);
    let (c, p) = (cur.peak_hour_volume as f64, prev.peak_hour_volume as f64);

    Line {
        label: "Pico de volume",
        current: render(cur.peak_hour, cur.peak_hour_volume),
        previous: render(prev.peak_hour, prev.peak_hour_volume),
        change: if cur.peak_hour.is_some() && prev.peak_hour.is_some() {
            change_label(c, p, 0, "")
        } else {
            unavailable_change()
        },
        current_value: c,
        previous_value: p,
        trend: Trend::Higher,
    }
}

/// Every metric against the previous period, in display order
pub fn comparative_summary(report: &MetricsReport) -> Vec<ComparisonLine> {
    let (cur, prev) = (&report.current, &report.previous);

    let lines = vec![
        Line::counted(
            "Novas Conversas Iniciada",
            cur.conversations,
            prev.conversations,
            Trend::Higher,
        ),
        Line::counted("Conversões", cur.conversions, prev.conversions, Trend::Higher),
        Line::counted("Leads Qualificados", cur.qualified, prev.qualified, Trend::Higher),
        Line::counted(
            "Leads Desqualificados",
            cur.disqualified,
            prev.disqualified,
            Trend::Lower,
        ),
        Line::counted("Leads Perdidos", cur.lost_leads, prev.lost_leads, Trend::Lower),
        Line::rate("Taxa de Conversão", cur.conversion_rate, prev.conversion_rate),
        Line::rate(
            "Taxa de Qualificação",
            cur.qualification_rate,
            prev.qualification_rate,
        ),
        conversion_time_line(cur.avg_conversion_time_ms, prev.avg_conversion_time_ms),
        Line {
            label: "Média diária de conversas",
            current: number_br(report.avg_daily_volume, 1),
            previous: number_br(report.previous_avg_daily_volume, 1),
            change: change_label(
                report.avg_daily_volume,
                report.previous_avg_daily_volume,
                1,
                "",
            ),
            current_value: report.avg_daily_volume,
            previous_value: report.previous_avg_daily_volume,
            trend: Trend::Higher,
        },
        peak_line(report),
    ];

    lines.into_iter().map(Line::finish).collect()
}
