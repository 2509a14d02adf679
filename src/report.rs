use std::fmt;

use crate::store::Aggregate;

/// What an invocation tells the user about a URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    /// Percentage of requested attempts that returned 200.
    Percentage(f64),
    NoSuccessfulAttempts,
    StoreCreationTriggered,
    NotFound,
}

impl Availability {
    pub fn from_aggregate(agg: Aggregate, store_created: bool) -> Self {
        if agg.successful > 0 && agg.requested > 0 {
            Availability::Percentage(agg.successful as f64 / agg.requested as f64 * 100.0)
        } else if agg.requested > 0 {
            Availability::NoSuccessfulAttempts
        } else if store_created {
            Availability::StoreCreationTriggered
        } else {
            Availability::NotFound
        }
    }
}

/// Renders the line printed for `url`.
pub struct Report<'a> {
    pub url: &'a str,
    pub availability: Availability,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.availability {
            Availability::Percentage(pct) => {
                write!(f, "Availability of the webpage {} is: {:.2}%.", self.url, pct)
            }
            Availability::NoSuccessfulAttempts => {
                write!(f, "There are no successful attempts recorded for {}.", self.url)
            }
            Availability::StoreCreationTriggered => {
                write!(f, "Database creation triggered. See logs for more details.")
            }
            Availability::NotFound => write!(f, "Website {} not found in the database.", self.url),
        }
    }
}
