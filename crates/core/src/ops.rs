// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared business logic for the CLI and programmatic front-ends,
//! separated from presentation concerns.
//!
//! "Already in this state" outcomes (starting an in-progress ticket,
//! closing a closed one, re-adding an existing dependency) are reported
//! as a boolean in the result tuple, never as errors.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{git_user_name, GitRunner};
use crate::graph::DependencyGraph;
use crate::store::TicketStore;
use crate::ticket::{Ticket, TicketStatus, TicketType};
use crate::worktree::CommitOp;

/// Fields for a new ticket; unset values fall back to the configured
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub title: String,
    pub ticket_type: Option<TicketType>,
    pub priority: Option<u8>,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub deps: Vec<String>,
    pub parent: Option<String>,
    pub external_ref: Option<String>,
    pub description: Option<String>,
}

/// Field updates for [`edit_ticket`]. `assignee: Some("")` clears the
/// assignee.
#[derive(Debug, Clone, Default)]
pub struct EditTicket {
    pub title: Option<String>,
    pub ticket_type: Option<TicketType>,
    pub priority: Option<u8>,
    pub assignee: Option<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub description: Option<String>,
}

/// Creates a new ticket, applying config defaults.
///
/// Dependency ids that do not resolve to stored tickets are returned as
/// a warning list for the caller to render; they are not an error.
pub fn create_ticket(
    store: &TicketStore,
    config: &Config,
    new: NewTicket,
) -> Result<(Ticket, Vec<String>)> {
    let mut ticket = Ticket::new(
        "",
        new.title,
        new.ticket_type.unwrap_or(config.default_type),
    )?;
    ticket.priority = new.priority.unwrap_or(config.default_priority);
    ticket.assignee = new
        .assignee
        .filter(|a| !a.is_empty())
        .or_else(|| (!config.default_assignee.is_empty()).then(|| config.default_assignee.clone()));
    for tag in new.tags {
        if !ticket.tags.contains(&tag) {
            ticket.tags.push(tag);
        }
    }
    ticket.deps = new.deps;
    ticket.parent = new.parent;
    ticket.external_ref = new.external_ref;
    ticket.description = new.description;
    ticket.validate()?;

    let all_ids = store.list_ids()?;
    let missing_deps: Vec<String> = ticket
        .deps
        .iter()
        .filter(|dep| !all_ids.contains(dep))
        .cloned()
        .collect();

    let created = store.create(ticket)?;
    Ok((created, missing_deps))
}

/// Sets a ticket to in-progress, assigning the git user when it has no
/// assignee and none was given. `assignee: Some("")` clears the field.
pub fn start_ticket(
    store: &TicketStore,
    config: &Config,
    git: &dyn GitRunner,
    id_or_prefix: &str,
    assignee: Option<&str>,
) -> Result<(Ticket, bool)> {
    let mut ticket = store.get(id_or_prefix)?;
    let already_in_progress = ticket.status == TicketStatus::InProgress;

    if !already_in_progress {
        ticket.status = TicketStatus::InProgress;
        if assignee.is_none() && ticket.assignee.is_none() {
            ticket.assignee = if config.default_assignee.is_empty() {
                git_user_name(git, &config.bodega_dir)
            } else {
                Some(config.default_assignee.clone())
            };
        }
    }
    if let Some(name) = assignee {
        ticket.assignee = (!name.is_empty()).then(|| name.to_string());
    }

    store.save(&mut ticket)?;
    Ok((ticket, already_in_progress))
}

/// Closes a ticket. Closing an already-closed ticket is a no-op reported
/// in the flag.
pub fn close_ticket(store: &TicketStore, id_or_prefix: &str) -> Result<(Ticket, bool)> {
    let mut ticket = store.get(id_or_prefix)?;
    let already_closed = ticket.is_closed();

    if !already_closed {
        ticket.status = TicketStatus::Closed;
        store.save_with_op(&mut ticket, CommitOp::Close)?;
    }
    Ok((ticket, already_closed))
}

/// Reopens a ticket (sets it to open).
pub fn reopen_ticket(store: &TicketStore, id_or_prefix: &str) -> Result<(Ticket, bool)> {
    let mut ticket = store.get(id_or_prefix)?;
    let already_open = ticket.status == TicketStatus::Open;

    if !already_open {
        ticket.status = TicketStatus::Open;
        store.save(&mut ticket)?;
    }
    Ok((ticket, already_open))
}

/// Adds a timestamped note to a ticket.
pub fn add_note(store: &TicketStore, id_or_prefix: &str, text: &str) -> Result<Ticket> {
    let mut ticket = store.get(id_or_prefix)?;
    ticket.add_note(text);
    store.save(&mut ticket)?;
    Ok(ticket)
}

/// Edits ticket properties. Tag additions suppress duplicates here, at
/// the operation layer.
pub fn edit_ticket(
    store: &TicketStore,
    id_or_prefix: &str,
    edit: EditTicket,
) -> Result<(Ticket, bool)> {
    let mut ticket = store.get(id_or_prefix)?;
    let mut modified = false;

    if let Some(title) = edit.title {
        ticket.title = title;
        modified = true;
    }
    if let Some(ticket_type) = edit.ticket_type {
        ticket.ticket_type = ticket_type;
        modified = true;
    }
    if let Some(priority) = edit.priority {
        ticket.priority = priority;
        modified = true;
    }
    if let Some(assignee) = edit.assignee {
        ticket.assignee = (!assignee.is_empty()).then_some(assignee);
        modified = true;
    }
    for tag in edit.add_tags {
        if !ticket.tags.contains(&tag) {
            ticket.tags.push(tag);
        }
        modified = true;
    }
    for tag in edit.remove_tags {
        ticket.tags.retain(|t| t != &tag);
        modified = true;
    }
    if let Some(description) = edit.description {
        ticket.description = Some(description);
        modified = true;
    }

    if modified {
        ticket.validate()?;
        store.save(&mut ticket)?;
    }
    Ok((ticket, modified))
}

/// Adds a dependency: `blocker` must be closed before `ticket` unblocks.
///
/// The cycle check runs against a fresh graph snapshot before anything
/// is written; this is the sole cycle-prevention mechanism.
pub fn add_dependency(
    store: &TicketStore,
    ticket_id: &str,
    blocker_id: &str,
) -> Result<(Ticket, Ticket, bool)> {
    let mut ticket = store.get(ticket_id)?;
    let blocker = store.get(blocker_id)?;

    if ticket.id == blocker.id {
        return Err(Error::SelfDependency);
    }
    if ticket.deps.contains(&blocker.id) {
        return Ok((ticket, blocker, true));
    }

    let graph = DependencyGraph::new(store)?;
    if graph.would_create_cycle(&ticket.id, &blocker.id) {
        return Err(Error::CycleDetected);
    }

    ticket.deps.push(blocker.id.clone());
    store.save(&mut ticket)?;
    Ok((ticket, blocker, false))
}

/// Removes a dependency. Removing one that is not present is a no-op
/// reported in the flag.
pub fn remove_dependency(
    store: &TicketStore,
    ticket_id: &str,
    blocker_id: &str,
) -> Result<(Ticket, Ticket, bool)> {
    let mut ticket = store.get(ticket_id)?;
    let blocker = store.get(blocker_id)?;

    if !ticket.deps.contains(&blocker.id) {
        return Ok((ticket, blocker, false));
    }

    ticket.deps.retain(|d| d != &blocker.id);
    store.save(&mut ticket)?;
    Ok((ticket, blocker, true))
}

/// Links two tickets symmetrically (non-blocking relation). Both sides
/// end up listing each other.
pub fn link_tickets(
    store: &TicketStore,
    first_id: &str,
    second_id: &str,
) -> Result<(Ticket, Ticket, bool)> {
    let mut first = store.get(first_id)?;
    let mut second = store.get(second_id)?;

    if first.id == second.id {
        return Err(Error::SelfDependency);
    }
    if first.links.contains(&second.id) && second.links.contains(&first.id) {
        return Ok((first, second, true));
    }

    if !first.links.contains(&second.id) {
        first.links.push(second.id.clone());
        store.save(&mut first)?;
    }
    if !second.links.contains(&first.id) {
        second.links.push(first.id.clone());
        store.save(&mut second)?;
    }
    Ok((first, second, false))
}

/// Removes a symmetric link from both sides.
pub fn unlink_tickets(
    store: &TicketStore,
    first_id: &str,
    second_id: &str,
) -> Result<(Ticket, Ticket, bool)> {
    let mut first = store.get(first_id)?;
    let mut second = store.get(second_id)?;

    let was_linked = first.links.contains(&second.id) || second.links.contains(&first.id);

    if first.links.contains(&second.id) {
        first.links.retain(|l| l != &second.id);
        store.save(&mut first)?;
    }
    if second.links.contains(&first.id) {
        second.links.retain(|l| l != &first.id);
        store.save(&mut second)?;
    }
    Ok((first, second, was_linked))
}

/// Tickets ready to work on, sorted by priority then creation time.
pub fn get_ready_tickets(store: &TicketStore) -> Result<Vec<Ticket>> {
    let graph = DependencyGraph::new(store)?;
    let mut tickets = graph.get_ready_tickets();
    tickets.sort_by(|a, b| (a.priority, a.created).cmp(&(b.priority, b.created)));
    Ok(tickets)
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
