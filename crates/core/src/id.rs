// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Fallback prefix when none can be derived from configuration.
pub const DEFAULT_PREFIX: &str = "bg";

const ID_PATTERN: &str = "^[a-z][a-z0-9]*-[a-z0-9.]+$";

#[allow(clippy::unwrap_used)] // the pattern is a compile-time constant
fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ID_PATTERN).unwrap())
}

/// Generate a ticket ID from prefix, title, and creation timestamp.
/// Format: `{prefix}-{hash}` where hash is the first 6 hex chars of
/// SHA256(title + timestamp).
pub fn generate_id(prefix: &str, title: &str, created: &DateTime<Utc>) -> String {
    let input = format!("{}{}", title, created.to_rfc3339());
    let hash = Sha256::digest(input.as_bytes());
    format!("{}-{}", prefix, hex::encode(&hash[..3]))
}

/// Check if a string is a valid ticket ID.
pub fn is_valid_id(id: &str) -> bool {
    id_regex().is_match(id)
}

/// Resolve a full or partial ID against all known IDs.
///
/// An exact match wins outright; otherwise a unique prefix match resolves.
/// Zero matches is [`Error::TicketNotFound`], more than one is
/// [`Error::AmbiguousId`] carrying every match.
pub fn resolve_id(partial: &str, all_ids: &[String]) -> Result<String> {
    if all_ids.iter().any(|id| id == partial) {
        return Ok(partial.to_string());
    }

    let mut matches: Vec<String> = all_ids
        .iter()
        .filter(|id| id.starts_with(partial))
        .cloned()
        .collect();
    matches.sort();

    match matches.len() {
        0 => Err(Error::TicketNotFound(partial.to_string())),
        1 => Ok(matches.remove(0)),
        _ => Err(Error::AmbiguousId {
            prefix: partial.to_string(),
            matches,
        }),
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
