/// Site status definitions for tracking crawl progress
///
/// A site is `Crawling` while its job runs and ends in exactly one of the
/// terminal states.
use serde::Serialize;
use std::fmt;

/// Lifecycle status of a site record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    /// A crawl of the site is in progress
    Crawling,

    /// The crawl finished on its own
    Indexed,

    /// The crawl was interrupted or failed; see the site's last error
    Failed,
}

impl SiteStatus {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Crawling)
    }

    /// Returns true if moving from `self` to `next` is allowed within a crawl run
    pub fn can_transition_to(&self, next: SiteStatus) -> bool {
        matches!(
            (self, next),
            (Self::Crawling, Self::Indexed) | (Self::Crawling, Self::Failed)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Crawling => "CRAWLING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "CRAWLING" => Some(Self::Crawling),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
