use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::consts::DATE_FORMAT;
use crate::error::AppError;

static NAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(\d{4})-(\d{2})-(\d{2})_").expect("date pattern is a valid regex")
});

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    // Try YYYYMMDD
    if s.len() == 8
        && let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d")
    {
        return Ok(d);
    }
    // Try YYYY-MM-DD
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(d);
    }
    Err(AppError::InvalidDate {
        input: s.to_string(),
    })
}

/// Recording date embedded in a file name as `_YYYY-MM-DD_`.
pub(crate) fn extract_date(name: &str) -> Option<NaiveDate> {
    let caps = NAME_DATE.captures(name)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

/// Inclusive date range; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DateFilter {
    pub(crate) since: Option<NaiveDate>,
    pub(crate) until: Option<NaiveDate>,
}

impl DateFilter {
    pub(crate) fn new(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        Self { since, until }
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        if let Some(s) = self.since
            && date < s
        {
            return false;
        }
        if let Some(u) = self.until
            && date > u
        {
            return false;
        }
        true
    }

    /// Names without an embedded date always pass.
    pub(crate) fn admits_name(&self, name: &str) -> bool {
        extract_date(name).is_none_or(|date| self.contains(date))
    }
}
