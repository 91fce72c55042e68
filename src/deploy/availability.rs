// ABOUTME: Post-activation availability check against the service's public domain.
// ABOUTME: Polls once per interval until the status matches or the deadline passes.

use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_STATUS_PATH: &str = "/";
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(120);
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How an availability check ended.
///
/// `Unreachable` means the deadline passed without any HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Ready { status: u16 },
    TimedOut { last_status: Option<u16> },
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityCheck {
    /// Required status. `None` accepts anything below 500.
    pub expected_status: Option<u16>,
    pub path: String,
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for AvailabilityCheck {
    fn default() -> Self {
        Self {
            expected_status: None,
            path: DEFAULT_STATUS_PATH.to_string(),
            timeout: DEFAULT_STATUS_TIMEOUT,
            interval: POLL_INTERVAL,
        }
    }
}

impl AvailabilityCheck {
    pub fn is_satisfied(&self, status: u16) -> bool {
        match self.expected_status {
            Some(expected) => status == expected,
            None => status < 500,
        }
    }

    /// Probe URL for `domain`. Wildcard prefixes are dropped; a domain that
    /// already has a scheme is used as given.
    pub fn url(&self, domain: &str) -> String {
        let domain = domain.strip_prefix("*.").unwrap_or(domain);
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        let base = if domain.contains("://") {
            domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{domain}")
        };
        format!("{base}{path}")
    }

    pub async fn poll(&self, domain: &str) -> Availability {
        let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => return Availability::Unreachable(e.to_string()),
        };
        self.poll_with(&client, domain).await
    }

    pub async fn poll_with(&self, client: &reqwest::Client, domain: &str) -> Availability {
        let url = self.url(domain);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut last_status = None;
        let mut last_error = None;
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    tracing::debug!(%url, ?last_status, ?last_error, "availability check timed out");
                    return match (last_status, last_error) {
                        (None, Some(error)) => Availability::Unreachable(error),
                        (last_status, _) => Availability::TimedOut { last_status },
                    };
                }
                _ = ticker.tick() => {
                    match client.get(&url).send().await {
                        Ok(response) => {
                            let status = response.status().as_u16();
                            tracing::debug!(%url, status, "availability check");
                            if self.is_satisfied(status) {
                                return Availability::Ready { status };
                            }
                            last_status = Some(status);
                        }
                        // DNS for a new domain may still be propagating
                        Err(e) => {
                            tracing::debug!(%url, "availability check failed: {e}");
                            last_error = Some(e.to_string());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_anything_below_500() {
        let check = AvailabilityCheck::default();
        assert!(check.is_satisfied(200));
        assert!(check.is_satisfied(404));
        assert!(!check.is_satisfied(503));
    }

    #[test]
    fn explicit_status_must_match() {
        let check = AvailabilityCheck {
            expected_status: Some(204),
            ..Default::default()
        };
        assert!(check.is_satisfied(204));
        assert!(!check.is_satisfied(200));
    }

    #[test]
    fn url_strips_wildcards_and_keeps_schemes() {
        let check = AvailabilityCheck {
            path: "health".to_string(),
            ..Default::default()
        };
        assert_eq!(check.url("*.example.com"), "https://example.com/health");
        assert_eq!(
            check.url("http://127.0.0.1:8080"),
            "http://127.0.0.1:8080/health"
        );
    }
}
