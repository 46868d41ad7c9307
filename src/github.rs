// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GitHub API client for fetching per-user contribution calendars.

use crate::fetch::{
    DailyContribution, FetchError, FetchErrorKind, RetryPolicy, UserHandle, UserSeries,
};
use crate::limiter::TokenBucket;
use chrono::NaiveDate;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// The contribution calendar query. Authentication is delegated: the token
/// is whatever the environment provides, typically minted by `gh auth`.
const CONTRIBUTIONS_QUERY: &str = "\
query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
    }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
struct ContributionCalendar {
    weeks: Vec<CalendarWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<CalendarDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    date: String, // YYYY-MM-DD format
    contribution_count: u64,
}

/// Fetches one user's daily contribution counts for a date range.
///
/// Transient failures retry with exponential backoff up to the policy's
/// attempt ceiling; permanent failures (unknown login, permission denied)
/// fail fast. An optional shared token bucket keeps the whole worker pool
/// under the API quota.
pub struct GithubFetcher {
    client: reqwest::Client,
    endpoint: String,
    auth_header: String,
    retry: RetryPolicy,
    limiter: Option<Arc<TokenBucket>>,
}

impl GithubFetcher {
    pub fn new(retry: RetryPolicy, limiter: Option<Arc<TokenBucket>>) -> Self {
        let auth_header = std::env::var("GITHUB_TOKEN")
            .map(|token| format!("Bearer {}", token))
            .unwrap_or_default();

        Self {
            client: reqwest::Client::new(),
            endpoint: GITHUB_GRAPHQL_URL.to_string(),
            auth_header,
            retry,
            limiter,
        }
    }

    /// Point the fetcher at a different GraphQL endpoint (tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fetch the contribution series for one login over [start, end].
    pub async fn fetch(
        &self,
        handle: &UserHandle,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UserSeries, FetchError> {
        if handle.login.is_empty() {
            return Err(FetchError::new(
                "",
                FetchErrorKind::InvalidRequest("empty login".into()),
            ));
        }
        if start > end {
            return Err(FetchError::new(
                &handle.login,
                FetchErrorKind::InvalidRequest(format!("start {} is after end {}", start, end)),
            ));
        }

        fetch_with_retry(&handle.login, &self.retry, |attempt| async move {
            if let Some(limiter) = &self.limiter {
                limiter.acquire().await;
            }
            debug!(login = %handle.login, attempt, "fetching contribution calendar");
            self.fetch_once(handle, start, end).await
        })
        .await
    }

    async fn fetch_once(
        &self,
        handle: &UserHandle,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UserSeries, FetchError> {
        let login = handle.login.as_str();
        let body = serde_json::json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": {
                "login": login,
                "from": format!("{}T00:00:00Z", start),
                "to": format!("{}T23:59:59Z", end),
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("User-Agent", "contribution-trends-collector")
            .header("Accept", "application/vnd.github.v3+json")
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .map_err(|err| FetchError::new(login, classify_transport_error(&err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(
                login,
                classify_status(status.as_u16(), &body),
            ));
        }

        let parsed: GraphQlResponse = response.json().await.map_err(|err| {
            FetchError::new(
                login,
                FetchErrorKind::InvalidResponse(format!("bad GraphQL payload: {}", err)),
            )
        })?;

        if let Some(first) = parsed.errors.as_ref().and_then(|errors| errors.first()) {
            return Err(FetchError::new(login, classify_graphql_error(first)));
        }

        let user = parsed
            .data
            .and_then(|data| data.user)
            .ok_or_else(|| FetchError::new(login, FetchErrorKind::UnknownLogin))?;

        let calendar = user.contributions_collection.contribution_calendar;
        let mut days = Vec::new();
        for week in calendar.weeks {
            for day in week.contribution_days {
                let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").map_err(|err| {
                    FetchError::new(
                        login,
                        FetchErrorKind::InvalidResponse(format!(
                            "bad calendar date '{}': {}",
                            day.date, err
                        )),
                    )
                })?;
                // The calendar is week-aligned, so it can overhang the
                // requested window on both sides.
                if date < start || date > end {
                    continue;
                }
                days.push(DailyContribution {
                    date,
                    count: day.contribution_count,
                });
            }
        }
        days.sort_by_key(|day| day.date);

        Ok(UserSeries {
            handle: handle.clone(),
            start,
            end,
            days,
        })
    }
}

/// Run `attempt_fn` until it succeeds, returns a permanent error, or the
/// retry ceiling is reached. Exhaustion surfaces the last (retryable) error.
pub async fn fetch_with_retry<F, Fut>(
    login: &str,
    policy: &RetryPolicy,
    mut attempt_fn: F,
) -> Result<UserSeries, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<UserSeries, FetchError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match attempt_fn(attempt).await {
            Ok(series) => return Ok(series),
            Err(err) if err.retryable() && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    login,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient fetch failure, backing off: {}",
                    err.kind
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn classify_transport_error(err: &reqwest::Error) -> FetchErrorKind {
    if err.is_timeout() {
        FetchErrorKind::Network("request timed out".into())
    } else {
        FetchErrorKind::Network(err.to_string())
    }
}

fn classify_status(status: u16, body: &str) -> FetchErrorKind {
    match status {
        429 => FetchErrorKind::RateLimited,
        403 if body.to_ascii_lowercase().contains("rate limit") => FetchErrorKind::RateLimited,
        401 | 403 => FetchErrorKind::PermissionDenied,
        404 => FetchErrorKind::UnknownLogin,
        500..=599 => FetchErrorKind::Server { status },
        _ => FetchErrorKind::Http { status },
    }
}

fn classify_graphql_error(err: &GraphQlError) -> FetchErrorKind {
    match err.error_type.as_deref() {
        Some("NOT_FOUND") => FetchErrorKind::UnknownLogin,
        Some("RATE_LIMITED") => FetchErrorKind::RateLimited,
        Some("FORBIDDEN") => FetchErrorKind::PermissionDenied,
        _ => FetchErrorKind::InvalidResponse(err.message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fake_series(login: &str) -> UserSeries {
        UserSeries {
            handle: UserHandle::user(login),
            start: date(2025, 1, 1),
            end: date(2025, 1, 2),
            days: vec![DailyContribution {
                date: date(2025, 1, 1),
                count: 1,
            }],
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_third_attempt() {
        let calls = Cell::new(0u32);
        let result = fetch_with_retry("alice", &RetryPolicy::immediate(3), |_| {
            calls.set(calls.get() + 1);
            let attempt = calls.get();
            async move {
                if attempt < 3 {
                    Err(FetchError::new("alice", FetchErrorKind::RateLimited))
                } else {
                    Ok(fake_series("alice"))
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_surfaces_retryable_error() {
        let calls = Cell::new(0u32);
        let result = fetch_with_retry("alice", &RetryPolicy::immediate(3), |_| {
            calls.set(calls.get() + 1);
            async { Err(FetchError::new("alice", FetchErrorKind::Server { status: 503 })) }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.retryable());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_fast() {
        let calls = Cell::new(0u32);
        let result = fetch_with_retry("ghost", &RetryPolicy::immediate(5), |_| {
            calls.set(calls.get() + 1);
            async { Err(FetchError::new("ghost", FetchErrorKind::UnknownLogin)) }
        })
        .await;

        let err = result.unwrap_err();
        assert!(!err.retryable());
        assert_eq!(calls.get(), 1, "permanent failures must not retry");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_retryable_network_error() {
        let fetcher = GithubFetcher::new(RetryPolicy::immediate(2), None)
            .with_endpoint("http://127.0.0.1:9/graphql");
        let err = fetcher
            .fetch(&UserHandle::user("alice"), date(2025, 1, 1), date(2025, 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::Network(_)));
        assert!(err.retryable());
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_login() {
        let fetcher = GithubFetcher::new(RetryPolicy::immediate(1), None);
        let err = fetcher
            .fetch(&UserHandle::user(""), date(2025, 1, 1), date(2025, 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_inverted_range() {
        let fetcher = GithubFetcher::new(RetryPolicy::immediate(1), None);
        let err = fetcher
            .fetch(&UserHandle::user("alice"), date(2025, 1, 2), date(2025, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::InvalidRequest(_)));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(429, ""),
            FetchErrorKind::RateLimited
        ));
        assert!(matches!(
            classify_status(403, "API rate limit exceeded"),
            FetchErrorKind::RateLimited
        ));
        assert!(matches!(
            classify_status(403, "forbidden"),
            FetchErrorKind::PermissionDenied
        ));
        assert!(matches!(
            classify_status(404, ""),
            FetchErrorKind::UnknownLogin
        ));
        assert!(matches!(
            classify_status(502, ""),
            FetchErrorKind::Server { status: 502 }
        ));
        assert!(matches!(
            classify_status(418, ""),
            FetchErrorKind::Http { status: 418 }
        ));
    }

    #[test]
    fn test_calendar_response_parses() {
        let payload = r#"{
            "data": {
                "user": {
                    "contributionsCollection": {
                        "contributionCalendar": {
                            "weeks": [
                                {
                                    "contributionDays": [
                                        {"date": "2025-01-05", "contributionCount": 2},
                                        {"date": "2025-01-06", "contributionCount": 5}
                                    ]
                                }
                            ]
                        }
                    }
                }
            }
        }"#;

        let parsed: GraphQlResponse = serde_json::from_str(payload).unwrap();
        let user = parsed.data.unwrap().user.unwrap();
        let weeks = user.contributions_collection.contribution_calendar.weeks;
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].contribution_days[1].contribution_count, 5);
    }

    #[test]
    fn test_graphql_not_found_maps_to_unknown_login() {
        let err = GraphQlError {
            message: "Could not resolve to a User".into(),
            error_type: Some("NOT_FOUND".into()),
        };
        assert!(matches!(
            classify_graphql_error(&err),
            FetchErrorKind::UnknownLogin
        ));
    }
}
