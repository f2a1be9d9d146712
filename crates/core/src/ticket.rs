// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core ticket types for the bodega issue tracker.
//!
//! This module contains the fundamental data types: Ticket, TicketType,
//! and TicketStatus. A ticket has no identity outside its file; the store
//! in [`crate::store`] is the sole source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::id::is_valid_id;

/// Classification of tickets by their nature and scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    /// Defect or problem to fix.
    Bug,
    /// New capability or enhancement.
    Feature,
    /// Standard unit of work.
    Task,
    /// Large initiative containing multiple tickets.
    Epic,
    /// Maintenance work (refactoring, cleanup, dependency updates).
    Chore,
}

impl TicketType {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Bug => "bug",
            TicketType::Feature => "feature",
            TicketType::Task => "task",
            TicketType::Epic => "epic",
            TicketType::Chore => "chore",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bug" => Ok(TicketType::Bug),
            "feature" => Ok(TicketType::Feature),
            "task" => Ok(TicketType::Task),
            "epic" => Ok(TicketType::Epic),
            "chore" => Ok(TicketType::Chore),
            _ => Err(Error::InvalidTicketType(s.to_string())),
        }
    }
}

/// Workflow status of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    /// Not yet started. Initial state for new tickets.
    Open,
    /// Currently being worked on.
    InProgress,
    /// Done, or closed without completion.
    Closed,
}

impl TicketStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in-progress",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "in-progress" => Ok(TicketStatus::InProgress),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// The primary entity representing a tracked work item, persisted as one
/// file by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    /// Unique identifier (format: `{prefix}-{hash}`). Empty only before
    /// the ticket has been created in the store.
    pub id: String,
    /// Short description of the work.
    pub title: String,
    /// Classification of the ticket.
    pub ticket_type: TicketType,
    /// Current workflow state.
    pub status: TicketStatus,
    /// Urgency, 0 (highest) through 4 (lowest).
    pub priority: u8,
    /// Person this ticket is assigned to.
    pub assignee: Option<String>,
    /// Free-form labels, insertion order preserved.
    pub tags: Vec<String>,
    /// IDs of tickets that block this one.
    pub deps: Vec<String>,
    /// IDs of related tickets (symmetric, non-blocking).
    pub links: Vec<String>,
    /// Optional parent ticket for hierarchical grouping. Not traversed by
    /// the dependency graph.
    pub parent: Option<String>,
    /// Opaque reference into an external tracker.
    pub external_ref: Option<String>,
    /// When the ticket was created (UTC).
    pub created: DateTime<Utc>,
    /// When the ticket was last modified (UTC).
    pub updated: DateTime<Utc>,
    /// Longer description providing context.
    pub description: Option<String>,
    /// Design notes.
    pub design: Option<String>,
    /// Acceptance criteria.
    pub acceptance_criteria: Option<String>,
    /// Timestamp-prefixed notes, oldest first.
    pub notes: Vec<String>,
}

impl Ticket {
    /// Creates a new open ticket with default priority, validating the
    /// title and id.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        ticket_type: TicketType,
    ) -> Result<Self> {
        let now = Utc::now();
        let ticket = Ticket {
            id: id.into(),
            title: title.into(),
            ticket_type,
            status: TicketStatus::Open,
            priority: 2,
            assignee: None,
            tags: Vec::new(),
            deps: Vec::new(),
            links: Vec::new(),
            parent: None,
            external_ref: None,
            created: now,
            updated: now,
            description: None,
            design: None,
            acceptance_criteria: None,
            notes: Vec::new(),
        };
        ticket.validate()?;
        Ok(ticket)
    }

    /// Validates the construction invariants: priority range, non-empty
    /// title, and the id pattern (an empty id is allowed for tickets that
    /// have not been created yet).
    pub fn validate(&self) -> Result<()> {
        if self.priority > 4 {
            return Err(Error::InvalidPriority(self.priority));
        }
        if self.title.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }
        if !self.id.is_empty() && !is_valid_id(&self.id) {
            return Err(Error::InvalidId(self.id.clone()));
        }
        Ok(())
    }

    /// Returns true if this ticket is closed.
    pub fn is_closed(&self) -> bool {
        self.status == TicketStatus::Closed
    }

    /// Appends a timestamped note and bumps `updated`.
    ///
    /// Notes are pre-formatted here, at mutation time; the codec writes
    /// them out verbatim.
    pub fn add_note(&mut self, text: &str) {
        let now = Utc::now();
        self.notes
            .push(format!("{}: {}", now.format("%Y-%m-%d %H:%M"), text));
        self.updated = now;
    }
}

#[cfg(test)]
#[path = "ticket_tests.rs"]
mod tests;
