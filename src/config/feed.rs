use super::parse_env;
use crate::response::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use std::time::Duration;

pub const DEFAULT_POLL_SECONDS: u64 = 30;

/// Settings for the per-session notification feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub poll_interval: Duration,
    pub limit: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECONDS),
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        let seconds: u64 = parse_env("FEED_POLL_SECONDS", DEFAULT_POLL_SECONDS).max(1);
        let limit: u64 = parse_env("FEED_LIMIT", DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        Self {
            poll_interval: Duration::from_secs(seconds),
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_polls_every_thirty_seconds() {
        let cfg = FeedConfig::default();
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));
        assert_eq!(cfg.limit, 20);
    }
}
