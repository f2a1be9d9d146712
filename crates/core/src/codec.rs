// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bidirectional mapping between a [`Ticket`] and its on-disk text form.
//!
//! A ticket file is a YAML key/value header delimited by `---` sentinel
//! lines, followed by a markdown body with `## Description`, `## Design`,
//! `## Acceptance Criteria`, and `## Notes` sections, each present only
//! when non-empty, in that order. Optional header keys are omitted
//! entirely when empty; `created`/`updated` are always present as
//! ISO-8601 timestamps.
//!
//! Parsing is tolerant: unknown header keys and unknown body headings are
//! ignored, and a missing section yields `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ticket::{Ticket, TicketStatus, TicketType};

const DELIMITER: &str = "---";

const SECTION_DESCRIPTION: &str = "description";
const SECTION_DESIGN: &str = "design";
const SECTION_ACCEPTANCE: &str = "acceptance_criteria";
const SECTION_NOTES: &str = "notes";

/// The header block, in serialization order. Field order here is the key
/// order in the file.
#[derive(Serialize, Deserialize)]
struct Header {
    id: String,
    title: String,
    #[serde(rename = "type")]
    ticket_type: TicketType,
    status: TicketStatus,
    priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    deps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_ref: Option<String>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

/// Serializes a ticket to its file form.
pub fn serialize(ticket: &Ticket) -> Result<String> {
    ticket.validate()?;

    let header = Header {
        id: ticket.id.clone(),
        title: ticket.title.clone(),
        ticket_type: ticket.ticket_type,
        status: ticket.status,
        priority: ticket.priority,
        assignee: ticket.assignee.clone(),
        tags: ticket.tags.clone(),
        deps: ticket.deps.clone(),
        links: ticket.links.clone(),
        parent: ticket.parent.clone(),
        external_ref: ticket.external_ref.clone(),
        created: ticket.created,
        updated: ticket.updated,
    };

    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&serde_yaml::to_string(&header)?);
    out.push_str(DELIMITER);
    out.push('\n');

    let mut sections: Vec<String> = Vec::new();
    if let Some(description) = non_empty(&ticket.description) {
        sections.push(format!("## Description\n\n{}", description));
    }
    if let Some(design) = non_empty(&ticket.design) {
        sections.push(format!("## Design\n\n{}", design));
    }
    if let Some(acceptance) = non_empty(&ticket.acceptance_criteria) {
        sections.push(format!("## Acceptance Criteria\n\n{}", acceptance));
    }
    if !ticket.notes.is_empty() {
        let bullets: Vec<String> = ticket.notes.iter().map(|n| format!("- {}", n)).collect();
        sections.push(format!("## Notes\n\n{}", bullets.join("\n")));
    }

    if !sections.is_empty() {
        out.push('\n');
        out.push_str(&sections.join("\n\n"));
        out.push('\n');
    }

    Ok(out)
}

/// Parses a ticket file back into a [`Ticket`].
pub fn parse(content: &str) -> Result<Ticket> {
    let (header_text, body) = split_header(content)?;
    let header: Header = serde_yaml::from_str(header_text)?;

    let mut ticket = Ticket {
        id: header.id,
        title: header.title,
        ticket_type: header.ticket_type,
        status: header.status,
        priority: header.priority,
        assignee: header.assignee,
        tags: header.tags,
        deps: header.deps,
        links: header.links,
        parent: header.parent,
        external_ref: header.external_ref,
        created: header.created,
        updated: header.updated,
        description: None,
        design: None,
        acceptance_criteria: None,
        notes: Vec::new(),
    };
    ticket.validate()?;

    for (name, text) in body_sections(body) {
        match name.as_str() {
            SECTION_DESCRIPTION => ticket.description = Some(text),
            SECTION_DESIGN => ticket.design = Some(text),
            SECTION_ACCEPTANCE => ticket.acceptance_criteria = Some(text),
            SECTION_NOTES => {
                ticket.notes = text
                    .lines()
                    .filter_map(|line| line.trim().strip_prefix("- ").map(str::to_string))
                    .collect();
            }
            // Unknown headings are ignored.
            _ => {}
        }
    }

    Ok(ticket)
}

/// Splits the sentinel-delimited header from the body.
fn split_header(content: &str) -> Result<(&str, &str)> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
        .ok_or_else(|| Error::MalformedTicket("missing header delimiter".to_string()))?;

    // The closing delimiter is a line consisting of exactly `---`.
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((header, body));
        }
        offset += line.len();
    }
    Err(Error::MalformedTicket(
        "unterminated header block".to_string(),
    ))
}

/// Collects `(section_name, text)` pairs from the body, section names
/// lowercased with spaces replaced by underscores. Text before the first
/// heading is discarded.
fn body_sections(body: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in body.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            if let Some((name, lines)) = current.take() {
                sections.push((name, lines.join("\n").trim().to_string()));
            }
            let name = heading.trim().to_lowercase().replace(' ', "_");
            current = Some((name, Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((name, lines)) = current.take() {
        sections.push((name, lines.join("\n").trim().to_string()));
    }

    sections
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .collect()
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
