//! Single-attempt HTTP fetching.
//!
//! [`HttpFetcher`] performs one GET per call; retry policy lives in
//! [`super::retry`]. Every failure mode — transport, timeout, DNS, TLS,
//! non-2xx status, usage-policy violation — is captured as a
//! `FetchOutcome::Failure` description and never propagates as an error.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::types::FetchOutcome;

use super::robots;

/// Baseline User-Agent sent with every request.
const BASE_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Failure description for usage-policy violations.
pub const DISALLOWED_MESSAGE: &str = "Use of image disallowed by X-Robots-Tag directive";

/// One fetch attempt for a url. Implementations must be infallible at the
/// type level: outcomes, not errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a single fetch attempt.
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// `reqwest`-backed fetcher applying the per-attempt timeout, the
/// (optionally token-suffixed) User-Agent, and the usage-policy header check.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    user_agent: String,
    user_agent_token: Option<String>,
    disallowed_directives: HashSet<String>,
}

impl HttpFetcher {
    /// Build a fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Self {
        let user_agent_token = config.normalized_user_agent_token();
        let user_agent = match &user_agent_token {
            Some(token) => format!(
                "{BASE_USER_AGENT} (compatible; {token}; +https://github.com/imgshard/imgshard)"
            ),
            None => BASE_USER_AGENT.to_string(),
        };
        Self {
            client: reqwest::Client::new(),
            timeout: config.timeout(),
            user_agent,
            user_agent_token,
            disallowed_directives: config.disallowed_directives(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let request = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failure(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Failure(format!("HTTP error {status}"));
        }

        if robots::is_disallowed(
            response.headers(),
            self.user_agent_token.as_deref(),
            &self.disallowed_directives,
        ) {
            return FetchOutcome::Failure(DISALLOWED_MESSAGE.to_string());
        }

        match response.bytes().await {
            Ok(bytes) => FetchOutcome::Success(bytes.to_vec()),
            Err(e) => FetchOutcome::Failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_normalized_token() {
        let fetcher = HttpFetcher::new(&FetchConfig {
            user_agent_token: Some(" MyBot ".to_string()),
            ..Default::default()
        });
        assert!(fetcher.user_agent.starts_with(BASE_USER_AGENT));
        assert!(fetcher.user_agent.contains("compatible; mybot;"));
        assert_eq!(fetcher.user_agent_token.as_deref(), Some("mybot"));
    }

    #[test]
    fn test_user_agent_without_token_is_baseline() {
        let fetcher = HttpFetcher::new(&FetchConfig::default());
        assert_eq!(fetcher.user_agent, BASE_USER_AGENT);
        assert!(fetcher.user_agent_token.is_none());
    }

    #[tokio::test]
    async fn test_unresolvable_host_becomes_failure_outcome() {
        let fetcher = HttpFetcher::new(&FetchConfig {
            timeout_ms: 2_000,
            ..Default::default()
        });
        match fetcher.fetch("http://nonexistent.invalid/image.jpg").await {
            FetchOutcome::Failure(message) => assert!(!message.is_empty()),
            FetchOutcome::Success(_) => panic!("expected failure for unresolvable host"),
        }
    }
}
