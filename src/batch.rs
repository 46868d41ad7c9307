// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded worker pool for batch contribution fetching.
//!
//! Fan-out/fan-in: up to `max_workers` fetches run concurrently, the call
//! returns once every dispatched login has exactly one recorded outcome.

use crate::fetch::{FetchError, FetchErrorKind, FetchOutcome, UserHandle, UserSeries};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Run the fetch for every handle, at most `max_workers` at a time.
///
/// `limit` truncates the input list prefix before dispatch. One fetch's
/// failure never cancels its siblings: the returned map has exactly one
/// outcome per dispatched login, keyed by login. Progress output is
/// advisory and does not affect the results.
pub async fn run_batch<F, Fut>(
    handles: &[UserHandle],
    max_workers: usize,
    limit: Option<usize>,
    show_progress: bool,
    fetch: F,
) -> BTreeMap<String, FetchOutcome>
where
    F: Fn(UserHandle) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<UserSeries, FetchError>> + Send + 'static,
{
    let selected: Vec<UserHandle> = match limit {
        Some(limit) => handles.iter().take(limit).cloned().collect(),
        None => handles.to_vec(),
    };

    let progress = if show_progress {
        let pb = ProgressBar::new(selected.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(Arc::new(pb))
    } else {
        None
    };

    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut join_set = JoinSet::new();

    for handle in selected.iter().cloned() {
        let semaphore = Arc::clone(&semaphore);
        let fetch = fetch.clone();
        let progress = progress.clone();

        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.unwrap();
            let login = handle.login.clone();
            let outcome = FetchOutcome::from(fetch(handle).await);
            if let Some(pb) = &progress {
                pb.inc(1);
            }
            (login, outcome)
        });
    }

    let mut outcomes = BTreeMap::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((login, outcome)) => {
                debug!(
                    login = %login,
                    success = outcome.is_success(),
                    "recorded fetch outcome"
                );
                outcomes.insert(login, outcome);
            }
            Err(err) => warn!("fetch task failed to join: {}", err),
        }
    }

    // A panicked task cannot report its login, so backfill from the input
    // set to keep the one-outcome-per-login contract.
    for handle in &selected {
        if !outcomes.contains_key(&handle.login) {
            outcomes.insert(
                handle.login.clone(),
                FetchOutcome::Failed(FetchError::new(
                    &handle.login,
                    FetchErrorKind::Internal("fetch task aborted".into()),
                )),
            );
        }
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    outcomes
}
