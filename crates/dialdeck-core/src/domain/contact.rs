use crate::domain::ids::ContactId;
use crate::domain::phone::normalize_dial_number;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// A prospect as it appears on the calling list. Fetched, never owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub display_name: String,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl Contact {
    pub fn dial_number(&self) -> Result<String, CoreError> {
        match self.phone.as_deref() {
            Some(phone) => normalize_dial_number(phone),
            None => Err(CoreError::EmptyPhoneNumber),
        }
    }

    pub fn label(&self) -> String {
        match self.company.as_deref().map(str::trim) {
            Some(company) if !company.is_empty() => {
                format!("{} ({})", self.display_name, company)
            }
            _ => self.display_name.clone(),
        }
    }
}
