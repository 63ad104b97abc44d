use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};

pub const TASKS_PREFIX: &str = "tasks_";
pub const JOURNAL_PREFIX: &str = "journal_";
pub const MONTHLY_PREFIX: &str = "monthly_";

/// Canonical `YYYY-MM-DD` key for one calendar day.
pub fn day_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Canonical `YYYY-MM` key shared by every day of a month.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Long header label, e.g. "Tuesday, January 5, 2025". Never used as a key.
pub fn display_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{:04}-{:02}", year, month))
}

pub fn tasks_key(date: NaiveDate) -> String {
    format!("{}{}", TASKS_PREFIX, day_key(date))
}

pub fn journal_key(date: NaiveDate) -> String {
    format!("{}{}", JOURNAL_PREFIX, day_key(date))
}

pub fn monthly_key(date: NaiveDate) -> String {
    format!("{}{}", MONTHLY_PREFIX, month_key(date))
}

pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let raw = input.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date (use YYYY-MM-DD): {}", raw))
}

pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let raw = input.trim();
    let date = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid month (use YYYY-MM): {}", raw))?;
    Ok((date.year(), date.month()))
}
