// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading the user list consumed by the batch pipeline.

use crate::fetch::{UserHandle, UserKind};
use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;

/// One entry of the users file. Either a full search-result record (only
/// `login` and `type` are consumed) or a bare login string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserEntry {
    Record {
        login: String,
        #[serde(rename = "type", default)]
        kind: UserKind,
    },
    Login(String),
}

impl UserEntry {
    fn into_handle(self) -> UserHandle {
        match self {
            UserEntry::Record { login, kind } => UserHandle { login, kind },
            UserEntry::Login(login) => UserHandle {
                login,
                kind: UserKind::User,
            },
        }
    }
}

/// Load user handles from a JSON file, preserving order and dropping
/// duplicate logins (identity is unique per batch).
pub fn load_users(path: &Utf8Path) -> Result<Vec<UserHandle>> {
    let content = fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read users file at {}", path))?;

    let entries: Vec<UserEntry> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse users file at {}", path))?;

    let mut seen = HashSet::new();
    let handles: Vec<UserHandle> = entries
        .into_iter()
        .map(UserEntry::into_handle)
        .filter(|handle| seen.insert(handle.login.clone()))
        .collect();

    Ok(handles)
}
