use anyhow::Result;
use dialdeck_core::domain::ContactId;
use dialdeck_core::time::format_timestamp_datetime;

use crate::error::invalid_input;

pub fn parse_contact_id(raw: &str) -> Result<ContactId> {
    ContactId::new(raw).map_err(|_| invalid_input("contact id cannot be empty"))
}

pub fn format_optional_timestamp(ts: Option<i64>) -> String {
    ts.map(format_timestamp_datetime)
        .unwrap_or_else(|| "-".to_string())
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|value| !value.is_empty()).unwrap_or("-")
}
