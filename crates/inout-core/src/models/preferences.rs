//! Display preferences
//!
//! Four toggles controlling which metric cards and funnel steps are shown.

use serde::{Deserialize, Serialize};

/// Per-user display toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub show_conversas: bool,
    pub show_conversoes: bool,
    pub show_qualificados: bool,
    pub show_desqualificados: bool,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            show_conversas: true,
            show_conversoes: true,
            show_qualificados: true,
            show_desqualificados: true,
        }
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub show_conversas: Option<bool>,
    pub show_conversoes: Option<bool>,
    pub show_qualificados: Option<bool>,
    pub show_desqualificados: Option<bool>,
}

impl DisplayPreferences {
    /// Apply a partial update
    pub fn merge(self, update: PreferencesUpdate) -> Self {
        Self {
            show_conversas: update.show_conversas.unwrap_or(self.show_conversas),
            show_conversoes: update.show_conversoes.unwrap_or(self.show_conversoes),
            show_qualificados: update.show_qualificados.unwrap_or(self.show_qualificados),
            show_desqualificados: update
                .show_desqualificados
                .unwrap_or(self.show_desqualificados),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let merged = DisplayPreferences::default().merge(PreferencesUpdate {
            show_conversoes: Some(false),
            ..Default::default()
        });
        assert!(merged.show_conversas);
        assert!(!merged.show_conversoes);
        assert!(merged.show_qualificados);
        assert!(merged.show_desqualificados);
    }
}
