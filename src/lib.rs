// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contribution trend collector for GitHub user groups.

pub mod aggregate;
pub mod batch;
pub mod charts;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod github;
pub mod limiter;
pub mod query;
pub mod report;
pub mod trend;
pub mod users;
