// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core data model for per-user contribution fetching.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Kind of GitHub account, as reported by the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum UserKind {
    #[default]
    User,
    Organization,
}

/// Identity of one account in a batch. Logins are unique per batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserHandle {
    pub login: String,
    #[serde(default)]
    pub kind: UserKind,
}

impl UserHandle {
    pub fn user(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            kind: UserKind::User,
        }
    }
}

/// Contribution count for one user on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyContribution {
    pub date: NaiveDate,
    pub count: u64,
}

/// One user's daily contribution counts over a fixed [start, end] window.
///
/// The sequence is ordered by date and may have gaps: a day with no activity
/// is an implicit zero, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSeries {
    pub handle: UserHandle,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DailyContribution>,
}

impl UserSeries {
    /// Total contributions across the whole window.
    pub fn total(&self) -> u64 {
        self.days.iter().map(|d| d.count).sum()
    }
}

/// Why a fetch failed.
#[derive(Debug, Clone, Error)]
pub enum FetchErrorKind {
    #[error("unknown login")]
    UnknownLogin,
    #[error("permission denied")]
    PermissionDenied,
    #[error("rate limited")]
    RateLimited,
    #[error("server error (HTTP {status})")]
    Server { status: u16 },
    #[error("unexpected HTTP status {status}")]
    Http { status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl FetchErrorKind {
    /// Whether another attempt could plausibly succeed.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            FetchErrorKind::RateLimited
                | FetchErrorKind::Server { .. }
                | FetchErrorKind::Network(_)
        )
    }
}

/// A per-user fetch failure, recorded in the batch outcome map.
#[derive(Debug, Clone, Error)]
#[error("fetch failed for '{login}': {kind}")]
pub struct FetchError {
    pub login: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(login: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            login: login.into(),
            kind,
        }
    }

    pub fn retryable(&self) -> bool {
        self.kind.retryable()
    }
}

/// Result of fetching one user. Partial failure is expected: a batch maps
/// every dispatched login to exactly one of these.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(UserSeries),
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn series(&self) -> Option<&UserSeries> {
        match self {
            FetchOutcome::Success(series) => Some(series),
            FetchOutcome::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

impl From<Result<UserSeries, FetchError>> for FetchOutcome {
    fn from(result: Result<UserSeries, FetchError>) -> Self {
        match result {
            Ok(series) => FetchOutcome::Success(series),
            Err(err) => FetchOutcome::Failed(err),
        }
    }
}

/// Retry timing for transient fetch failures.
///
/// Delays are parameterized so tests can run retry-exhaustion scenarios
/// without wall-clock waits.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff delay before retrying after `attempt` (0-based)
    /// failed, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// A policy with zero delays, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_total() {
        let series = UserSeries {
            handle: UserHandle::user("alice"),
            start: date(2025, 1, 1),
            end: date(2025, 1, 3),
            days: vec![
                DailyContribution {
                    date: date(2025, 1, 1),
                    count: 3,
                },
                DailyContribution {
                    date: date(2025, 1, 3),
                    count: 4,
                },
            ],
        };
        assert_eq!(series.total(), 7);
    }

    #[test]
    fn test_error_retryability() {
        assert!(FetchErrorKind::RateLimited.retryable());
        assert!(FetchErrorKind::Server { status: 502 }.retryable());
        assert!(FetchErrorKind::Network("timed out".into()).retryable());

        assert!(!FetchErrorKind::UnknownLogin.retryable());
        assert!(!FetchErrorKind::PermissionDenied.retryable());
        assert!(!FetchErrorKind::Http { status: 418 }.retryable());
        assert!(!FetchErrorKind::InvalidResponse("bad json".into()).retryable());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for(10), Duration::from_millis(350));
    }

    #[test]
    fn test_user_handle_accepts_search_record() {
        let handle: UserHandle =
            serde_json::from_str(r#"{"login": "octocat", "kind": "User"}"#).unwrap();
        assert_eq!(handle.login, "octocat");
        assert_eq!(handle.kind, UserKind::User);
    }
}
