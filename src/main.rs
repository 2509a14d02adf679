use availability_probe::cli::Cli;
use availability_probe::config::{parse_log_level, MonitorConfig};
use availability_probe::{Availability, AttemptStore, Prober, Report, ReqwestClient};

use clap::Parser;
use tracing::{debug, info_span};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config first to get log level
    let config = MonitorConfig::load().await?;
    let log_level = match &cli.log_level {
        Some(level) => parse_log_level(level)?,
        None => config.get_tracing_level()?,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        format!("availability_probe={}", log_level.as_str().to_lowercase()).parse()?,
    );

    // Reports go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    debug!("Parsed arguments: {:?}", cli);

    let mut location = config.store_location();
    if let Some(name) = &cli.db_name {
        location.file = name.clone();
    }
    let mut store = AttemptStore::new(location, info_span!("store"));

    if cli.create_db {
        store.initialize();
    }

    store.connect();

    if cli.check_website {
        let delay = cli.delay.map(std::time::Duration::from_secs).unwrap_or_else(|| config.retry_delay());
        let prober = Prober::new(ReqwestClient::new()?, info_span!("prober", url = %cli.url));
        let record = prober.probe(&cli.url, cli.retry_attempts, delay).await;
        store.append(&record);
    }

    let mut totals = store.aggregate(&cli.url);
    if let Some((start, end)) = cli.range() {
        totals = store.aggregate_in_range(&cli.url, start, end);
    }

    let report = Report {
        url: &cli.url,
        availability: Availability::from_aggregate(totals, cli.create_db),
    };
    println!("{}", report);

    Ok(())
}
