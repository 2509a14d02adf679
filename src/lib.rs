//! Single-URL availability probe.
//!
//! A probe cycle issues up to N GET requests against one URL and produces one
//! [`AttemptRecord`]; records are appended to a SQLite log and summed per URL
//! to derive an availability percentage.

pub mod cli;
pub mod config;
pub mod prober;
pub mod report;
pub mod store;
pub mod timestamp;

pub use config::MonitorConfig;
pub use prober::{AttemptRecord, HttpClient, HttpResponse, Prober, ReqwestClient};
pub use report::{Availability, Report};
pub use store::{Aggregate, AttemptStore, InitOutcome, StoreLocation};
