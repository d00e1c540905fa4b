//! Usage-policy (`X-Robots-Tag`) response header checks.
//!
//! Header semantics: each header value is split on the first colon into an
//! optional scoping agent token and a comma-separated directive list; each
//! directive is trimmed and lowercased before comparison. A header disallows
//! the fetch when one of its directives is in the configured disallowed set
//! and the header is either unscoped or scoped to the caller's own token
//! (case-insensitive). Malformed headers are logged and skipped — only
//! unambiguous matches block.

use reqwest::header::HeaderMap;
use std::collections::HashSet;

/// Name of the usage-policy response header.
pub const ROBOTS_HEADER: &str = "x-robots-tag";

/// Whether `headers` carry an X-Robots-Tag directive disallowing usage.
pub fn is_disallowed(
    headers: &HeaderMap,
    user_agent_token: Option<&str>,
    disallowed: &HashSet<String>,
) -> bool {
    if disallowed.is_empty() {
        return false;
    }
    for value in headers.get_all(ROBOTS_HEADER) {
        let Ok(value) = value.to_str() else {
            tracing::warn!("Failed to parse X-Robots-Tag: non-UTF8 header value");
            continue;
        };
        if header_value_disallows(value, user_agent_token, disallowed) {
            return true;
        }
    }
    false
}

/// Whether a single header value names a disallowed directive applicable to
/// the caller.
fn header_value_disallows(
    value: &str,
    user_agent_token: Option<&str>,
    disallowed: &HashSet<String>,
) -> bool {
    let (scope, directive_list) = match value.split_once(':') {
        Some((token, rest)) => (Some(token.trim().to_lowercase()), rest),
        None => (None, value),
    };

    let applies = match (&scope, user_agent_token) {
        (None, _) => true,
        (Some(scope), Some(token)) => scope == token,
        (Some(_), None) => false,
    };
    if !applies {
        return false;
    }

    directive_list
        .split(',')
        .map(|d| d.trim().to_lowercase())
        .any(|d| disallowed.contains(&d))
}
