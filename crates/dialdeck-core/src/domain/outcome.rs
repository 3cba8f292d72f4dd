use crate::domain::ids::{ContactId, OutcomeId};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeLabel {
    pub label: String,
    pub bg_color: String,
    pub text_color: String,
    pub sort_order: i32,
}

impl OutcomeLabel {
    pub fn new(label: &str, bg_color: &str, text_color: &str, sort_order: i32) -> Self {
        Self {
            label: label.trim().to_string(),
            bg_color: bg_color.trim().to_string(),
            text_color: text_color.trim().to_string(),
            sort_order,
        }
    }

    /// Colors are display hints passed through as given.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.label.trim().is_empty() {
            return Err(CoreError::EmptyOutcomeLabel);
        }
        Ok(())
    }

    /// Stricter check for hand-written catalogs: both colors must be `#rgb`
    /// or `#rrggbb`.
    pub fn validate_colors(&self) -> Result<(), CoreError> {
        for value in [&self.bg_color, &self.text_color] {
            if !is_hex_color(value) {
                return Err(CoreError::InvalidOutcomeColor {
                    label: self.label.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Validated, display-ordered set of outcome labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct OutcomeCatalog {
    labels: Vec<OutcomeLabel>,
}

impl OutcomeCatalog {
    pub fn new(labels: Vec<OutcomeLabel>) -> Result<Self, CoreError> {
        let mut seen = HashSet::new();
        for label in &labels {
            label.validate()?;
            if !seen.insert(label.label.to_lowercase()) {
                return Err(CoreError::DuplicateOutcomeLabel(label.label.clone()));
            }
        }
        let mut labels = labels;
        labels.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.label.cmp(&b.label))
        });
        Ok(Self { labels })
    }

    pub fn find(&self, label: &str) -> Option<&OutcomeLabel> {
        let wanted = label.trim();
        self.labels
            .iter()
            .find(|item| item.label.eq_ignore_ascii_case(wanted))
    }

    pub fn labels(&self) -> &[OutcomeLabel] {
        &self.labels
    }

    pub fn get(&self, index: usize) -> Option<&OutcomeLabel> {
        self.labels.get(index)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn into_labels(self) -> Vec<OutcomeLabel> {
        self.labels
    }
}

pub fn default_outcome_labels() -> Vec<OutcomeLabel> {
    vec![
        OutcomeLabel::new("Interested", "#dcfce7", "#166534", 10),
        OutcomeLabel::new("Call Back", "#dbeafe", "#1e40af", 20),
        OutcomeLabel::new("Not Interested", "#fee2e2", "#991b1b", 30),
        OutcomeLabel::new("No Answer", "#f3f4f6", "#374151", 40),
        OutcomeLabel::new("Left Voicemail", "#fef9c3", "#854d0e", 50),
        OutcomeLabel::new("Wrong Number", "#ffedd5", "#9a3412", 60),
        OutcomeLabel::new("Do Not Call", "#1f2937", "#f9fafb", 70),
    ]
}

/// An outcome ready to be sent. The id stays the same across resends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeDraft {
    pub id: OutcomeId,
    pub contact_id: ContactId,
    pub caller_id: String,
    pub outcome: String,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl OutcomeDraft {
    pub fn into_recorded(self, recorded_at: i64) -> CallOutcome {
        CallOutcome {
            id: self.id,
            contact_id: self.contact_id,
            caller_id: self.caller_id,
            outcome: self.outcome,
            notes: self.notes,
            recorded_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub id: OutcomeId,
    pub contact_id: ContactId,
    pub caller_id: String,
    pub outcome: String,
    pub notes: Option<String>,
    pub recorded_at: i64,
}

pub fn normalize_notes(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|ch| ch.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::{default_outcome_labels, normalize_notes, OutcomeCatalog, OutcomeLabel};
    use crate::error::CoreError;

    #[test]
    fn catalog_sorts_by_order_then_label() {
        let catalog = OutcomeCatalog::new(vec![
            OutcomeLabel::new("Zeta", "#fff", "#000", 1),
            OutcomeLabel::new("Alpha", "#fff", "#000", 2),
            OutcomeLabel::new("Beta", "#fff", "#000", 1),
        ])
        .unwrap();
        let names: Vec<&str> = catalog.labels().iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Zeta", "Alpha"]);
    }

    #[test]
    fn catalog_rejects_case_insensitive_duplicates() {
        let err = OutcomeCatalog::new(vec![
            OutcomeLabel::new("No Answer", "#fff", "#000", 1),
            OutcomeLabel::new("no answer", "#fff", "#000", 2),
        ])
        .unwrap_err();
        assert_eq!(err, CoreError::DuplicateOutcomeLabel("no answer".to_string()));
    }

    #[test]
    fn catalog_keeps_colors_as_given() {
        let catalog = OutcomeCatalog::new(vec![OutcomeLabel::new(
            "Busy",
            "bg-red-100",
            "red",
            1,
        )])
        .unwrap();
        assert_eq!(catalog.labels()[0].bg_color, "bg-red-100");
        assert_eq!(catalog.labels()[0].text_color, "red");
    }

    #[test]
    fn catalog_rejects_blank_label() {
        let err = OutcomeCatalog::new(vec![OutcomeLabel::new("  ", "#fff", "#000", 1)])
            .unwrap_err();
        assert_eq!(err, CoreError::EmptyOutcomeLabel);
    }

    #[test]
    fn color_check_wants_hex() {
        let label = OutcomeLabel::new("Busy", "red", "#000", 1);
        assert!(matches!(
            label.validate_colors(),
            Err(CoreError::InvalidOutcomeColor { .. })
        ));
        assert!(OutcomeLabel::new("Busy", "#fee2e2", "#000", 1)
            .validate_colors()
            .is_ok());
    }

    #[test]
    fn find_ignores_case_and_whitespace() {
        let catalog = OutcomeCatalog::new(default_outcome_labels()).unwrap();
        let found = catalog.find("  not interested ").unwrap();
        assert_eq!(found.label, "Not Interested");
        assert!(catalog.find("Maybe").is_none());
    }

    #[test]
    fn notes_are_trimmed_and_blank_is_none() {
        assert_eq!(normalize_notes(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(normalize_notes(Some("   ")), None);
        assert_eq!(normalize_notes(None), None);
    }
}
