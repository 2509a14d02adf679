use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Timelike};

/// Sortable form used in the store: lexical order equals chronological order.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Format accepted on the command line for range bounds.
pub const CLI_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time, truncated to microseconds so it survives a
/// round trip through the canonical form.
///
/// Known limitation: wall-clock stamps repeat during a daylight-saving
/// fall-back, so rows from that hour do not sort in the order they were taken
/// and range queries across it are ambiguous.
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    let micros = now.nanosecond() / 1_000;
    now.with_nanosecond(micros * 1_000).unwrap_or(now)
}

pub fn to_canonical(ts: &NaiveDateTime) -> String {
    ts.format(CANONICAL_FORMAT).to_string()
}

pub fn parse_cli_datetime(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), CLI_FORMAT)
        .with_context(|| format!("expected date in format YYYY-MM-DD HH:MM:SS, got {:?}", s))
}

/// Rewrite an ISO-8601 bound (`YYYY-MM-DDTHH:MM:SS[.fff]`) into the
/// canonical form, so `2024-02-01T00:00:00` still matches a row stamped at
/// exactly that instant.
pub fn normalize_bound(s: &str) -> Result<String> {
    let ts: NaiveDateTime = s
        .trim()
        .parse()
        .with_context(|| format!("expected ISO-8601 timestamp, got {:?}", s))?;
    Ok(to_canonical(&ts))
}

/// Convert a command line date straight into a store range bound.
pub fn cli_to_canonical(s: &str) -> Result<String> {
    parse_cli_datetime(s).map(|ts| to_canonical(&ts))
}
