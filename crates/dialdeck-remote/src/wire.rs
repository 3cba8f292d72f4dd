use dialdeck_core::domain::{Contact, ContactId, OutcomeCatalog, OutcomeDraft, OutcomeLabel};
use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, Result};

/// Backend ids arrive as numbers or strings depending on the table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    pub fn into_contact_id(self) -> Result<ContactId> {
        let raw = match self {
            RawId::Int(value) => value.to_string(),
            RawId::Text(value) => value,
        };
        Ok(ContactId::new(&raw)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProspectWire {
    pub id: RawId,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl ProspectWire {
    pub fn into_contact(self) -> Result<Contact> {
        let id = self.id.into_contact_id()?;
        let display_name = self
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string());
        Ok(Contact {
            id,
            display_name,
            phone: non_empty(self.phone),
            company: non_empty(self.company),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRequest<'a> {
    pub contact_id: &'a str,
    pub caller_id: &'a str,
    pub outcome: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
}

impl<'a> From<&'a OutcomeDraft> for OutcomeRequest<'a> {
    fn from(draft: &'a OutcomeDraft) -> Self {
        Self {
            contact_id: draft.contact_id.as_str(),
            caller_id: &draft.caller_id,
            outcome: &draft.outcome,
            notes: draft.notes.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeLabelWire {
    pub label: String,
    pub bg_color: String,
    pub text_color: String,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl From<&OutcomeLabel> for OutcomeLabelWire {
    fn from(label: &OutcomeLabel) -> Self {
        Self {
            label: label.label.clone(),
            bg_color: label.bg_color.clone(),
            text_color: label.text_color.clone(),
            sort_order: Some(label.sort_order),
        }
    }
}

pub fn catalog_from_wire(items: Vec<OutcomeLabelWire>) -> Result<OutcomeCatalog> {
    let labels = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            OutcomeLabel::new(
                &item.label,
                &item.bg_color,
                &item.text_color,
                item.sort_order.unwrap_or(index as i32),
            )
        })
        .collect();
    OutcomeCatalog::new(labels).map_err(|err| RemoteError::Decode(err.to_string()))
}

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub identity: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
