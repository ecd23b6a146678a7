//! Common validation rules, usable as `#[validate(custom(function = ...))]` hooks.

use chrono::{DateTime, Utc};
use validator::ValidationError;

lazy_static::lazy_static! {
    static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?[0-9]{7,20}$").unwrap();
}

/// Rejects empty and whitespace-only strings.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("هذا الحقل مطلوب".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Rejects timestamps that are not strictly in the future.
pub fn validate_future_timestamp(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    validate_future_timestamp_at(value, Utc::now())
}

/// Same as [`validate_future_timestamp`] with an explicit reference time.
pub fn validate_future_timestamp_at(
    value: &DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if *value > now {
        Ok(())
    } else {
        let mut err = ValidationError::new("future_timestamp");
        err.message = Some("تاريخ الانتهاء يجب أن يكون في المستقبل".into());
        Err(err)
    }
}

/// Digits with an optional leading `+`, 7 to 20 digits long.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let normalized: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if PHONE_REGEX.is_match(&normalized) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("رقم الهاتف غير صالح".into());
        Err(err)
    }
}
