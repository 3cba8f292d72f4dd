use crate::error::CoreError;

const MIN_DIAL_DIGITS: usize = 3;
const MAX_DIAL_DIGITS: usize = 15;

/// Reduces a human-entered number to what the telephony capability dials:
/// an optional leading `+` followed by digits. Extensions are dropped.
pub fn normalize_dial_number(value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyPhoneNumber);
    }

    let mut out = String::new();
    let mut digits = 0usize;

    if trimmed.starts_with('+') {
        out.push('+');
    }

    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            out.push(ch);
            digits += 1;
            continue;
        }

        if matches!(ch, 'x' | 'X' | '#' | ';' | ',') {
            break;
        }

        if ch.is_ascii_alphabetic() {
            return Err(CoreError::InvalidPhoneNumber(trimmed.to_string()));
        }
    }

    if !(MIN_DIAL_DIGITS..=MAX_DIAL_DIGITS).contains(&digits) {
        return Err(CoreError::InvalidPhoneNumber(trimmed.to_string()));
    }

    Ok(out)
}

/// DTMF accepts digits, `*`, `#` and `w` (half-second pause).
pub fn validate_dtmf(digits: &str) -> Result<&str, CoreError> {
    if digits.is_empty()
        || !digits
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '*' | '#' | 'w' | 'W'))
    {
        return Err(CoreError::InvalidDigits(digits.to_string()));
    }
    Ok(digits)
}
