use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use tokio::time::{Duration, Instant};

use super::{HttpClient, HttpResponse, REQUEST_TIMEOUT};

/// `HttpClient` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("availability-probe/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let start = Instant::now();
        let resp = self.client.get(url).send().await?;
        // measured until the response head is in, the body is never read
        let elapsed = start.elapsed();

        Ok(HttpResponse {
            status: resp.status().as_u16(),
            elapsed,
            headers: header_map(resp.headers()),
            cookies: cookie_map(&resp),
        })
    }
}

/// Flatten headers into name -> value, joining repeated names with ", ".
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

fn cookie_map(resp: &Response) -> BTreeMap<String, String> {
    resp.cookies()
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}
