use clap::Parser;

use crate::timestamp;

/// Probe a website and report its availability from recorded attempts.
#[derive(Debug, Parser)]
#[command(name = "availability-probe", version)]
pub struct Cli {
    /// Url of the website that should be monitored
    #[arg(short, long)]
    pub url: String,

    /// Create the database needed to save the access attempts
    #[arg(long)]
    pub create_db: bool,

    /// Probe the website once and record the result
    #[arg(long)]
    pub check_website: bool,

    /// Number of times the website should be requested in one check
    #[arg(long, default_value_t = 1)]
    pub retry_attempts: u32,

    /// Seconds to wait between two attempts (overrides the config file)
    #[arg(long)]
    pub delay: Option<u64>,

    /// Start of the reporting window, format: YYYY-MM-DD HH:MM:SS
    #[arg(long, requires = "end_date", value_parser = parse_range_bound)]
    pub start_date: Option<String>,

    /// End of the reporting window, format: YYYY-MM-DD HH:MM:SS
    #[arg(long, requires = "start_date", value_parser = parse_range_bound)]
    pub end_date: Option<String>,

    /// Database file name inside the store directory
    #[arg(long, env = "MONITOR_DB_NAME")]
    pub db_name: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "MONITOR_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Both range bounds, already in canonical form.
    pub fn range(&self) -> Option<(&str, &str)> {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }
}

fn parse_range_bound(s: &str) -> Result<String, String> {
    timestamp::cli_to_canonical(s).map_err(|e| e.to_string())
}
