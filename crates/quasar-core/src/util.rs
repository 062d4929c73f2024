use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};

/// Display format used in notification and system messages.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format(DEFAULT_DATETIME_FORMAT).to_string()
}

pub fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn is_past(value: &DateTime<Utc>) -> bool {
    *value < Utc::now()
}

pub fn is_future(value: &DateTime<Utc>) -> bool {
    *value > Utc::now()
}

/// Whole days from `from` to `to`; negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Trimmed and lowercased; inner whitespace is kept as given.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Stable positive id for a normalized name: the first eight bytes of its
/// SHA-256 digest with the sign bit cleared.
pub fn stable_id(normalized: &str) -> i64 {
    let digest = Sha256::digest(normalized.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) & (i64::MAX as u64)) as i64
}
