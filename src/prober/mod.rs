use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::time::sleep;
use tracing::{error, info, warn, Instrument, Span};

use crate::timestamp;

pub mod http;

pub use http::ReqwestClient;

/// Delay between two attempts of one probe cycle when none is configured.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Per-request timeout, independent of the retry delay.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a whole probe cycle, persisted as one row.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub url: String,
    pub timestamp: NaiveDateTime,
    pub elapsed_seconds: Option<f64>,
    pub status_code: Option<u16>,
    pub successful_attempts: u32,
    pub retry_attempts_requested: u32,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
}

/// A response as seen by the prober. Body is never read.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub elapsed: Duration,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
}

/// Network capability the prober depends on.
/// Any `Err` is treated as a transport failure.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

pub struct Prober<C> {
    client: C,
    span: Span,
}

impl<C: HttpClient> Prober<C> {
    pub fn new(client: C, span: Span) -> Self {
        Self { client, span }
    }

    /// Run one probe cycle of up to `max_attempts` GET requests against `url`.
    ///
    /// A transport failure ends the cycle early: the record then carries no
    /// elapsed time, and status/headers/cookies of the latest response received
    /// before the failure (if any).
    pub async fn probe(&self, url: &str, max_attempts: u32, delay: Duration) -> AttemptRecord {
        self.run_cycle(url, max_attempts, delay)
            .instrument(self.span.clone())
            .await
    }

    async fn run_cycle(&self, url: &str, max_attempts: u32, delay: Duration) -> AttemptRecord {
        let mut record = AttemptRecord {
            url: url.to_string(),
            timestamp: timestamp::now(),
            elapsed_seconds: None,
            status_code: None,
            successful_attempts: 0,
            retry_attempts_requested: max_attempts,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        };

        for attempt in 1..=max_attempts {
            let is_last = attempt == max_attempts;

            match self.client.get(url).await {
                Ok(resp) => {
                    record.elapsed_seconds = Some(resp.elapsed.as_secs_f64());
                    record.status_code = Some(resp.status);
                    record.headers = resp.headers;
                    record.cookies = resp.cookies;

                    if resp.status == 200 {
                        record.successful_attempts += 1;
                        info!("Site {} is online, time elapsed: {:?}", url, resp.elapsed);
                    } else {
                        warn!("Attempt {} failed with status code: {}", attempt, resp.status);
                    }

                    if !is_last {
                        sleep(delay).await;
                    }
                }
                Err(e) => {
                    error!("Error: {:#} at attempt: {}", e, attempt);
                    if !is_last {
                        sleep(delay).await;
                    }
                    record.elapsed_seconds = None;
                    return record;
                }
            }
        }

        record
    }
}
