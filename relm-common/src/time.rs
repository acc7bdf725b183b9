//! Date utilities

use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Today's date in the local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` release date
pub fn parse_release_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        Error::InvalidInput(format!(
            "release date `{}` is not YYYY-MM-DD: {}",
            value.trim(),
            e
        ))
    })
}
