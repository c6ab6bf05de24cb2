//! Funnel steps shown under the metric cards

use crate::aggregator::BaseMetrics;
use inout_core::models::DisplayPreferences;
use serde::Serialize;

pub const STEP_CONVERSATIONS: &str = "Novas Conversas Iniciada";
pub const STEP_QUALIFIED: &str = "Leads Qualificados";
pub const STEP_CONVERSIONS: &str = "Conversões";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelStep {
    pub label: &'static str,
    pub value: usize,
}

/// Steps in funnel order, skipping the ones the user hid
pub fn funnel_steps(metrics: &BaseMetrics, prefs: &DisplayPreferences) -> Vec<FunnelStep> {
    [
        (prefs.show_conversas, STEP_CONVERSATIONS, metrics.conversations),
        (prefs.show_qualificados, STEP_QUALIFIED, metrics.qualified),
        (prefs.show_conversoes, STEP_CONVERSIONS, metrics.conversions),
    ]
    .into_iter()
    .filter(|(shown, _, _)| *shown)
    .map(|(_, label, value)| FunnelStep { label, value })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> BaseMetrics {
        BaseMetrics {
            conversations: 40,
            qualified: 12,
            conversions: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_funnel_order() {
        let steps = funnel_steps(&metrics(), &DisplayPreferences::default());
        let labels: Vec<_> = steps.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![STEP_CONVERSATIONS, STEP_QUALIFIED, STEP_CONVERSIONS]);
        assert_eq!(steps[2].value, 5);
    }

    #[test]
    fn test_hidden_steps_are_dropped() {
        let prefs = DisplayPreferences {
            show_qualificados: false,
            ..Default::default()
        };
        let steps = funnel_steps(&metrics(), &prefs);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1], FunnelStep { label: STEP_CONVERSIONS, value: 5 });
    }
}
