// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

// TicketType parsing tests
#[parameterized(
    bug_lower = { "bug", TicketType::Bug },
    feature_lower = { "feature", TicketType::Feature },
    task_lower = { "task", TicketType::Task },
    epic_lower = { "epic", TicketType::Epic },
    chore_lower = { "chore", TicketType::Chore },
    bug_upper = { "BUG", TicketType::Bug },
    epic_mixed = { "Epic", TicketType::Epic },
)]
fn ticket_type_from_str_valid(input: &str, expected: TicketType) {
    assert_eq!(input.parse::<TicketType>().unwrap(), expected);
}

#[parameterized(
    invalid = { "invalid" },
    empty = { "" },
    idea = { "idea" },
)]
fn ticket_type_from_str_invalid(input: &str) {
    assert!(input.parse::<TicketType>().is_err());
}

#[parameterized(
    bug = { TicketType::Bug, "bug" },
    feature = { TicketType::Feature, "feature" },
    task = { TicketType::Task, "task" },
    epic = { TicketType::Epic, "epic" },
    chore = { TicketType::Chore, "chore" },
)]
fn ticket_type_as_str(ticket_type: TicketType, expected: &str) {
    assert_eq!(ticket_type.as_str(), expected);
}

// TicketStatus parsing tests
#[parameterized(
    open = { "open", TicketStatus::Open },
    in_progress = { "in-progress", TicketStatus::InProgress },
    closed = { "closed", TicketStatus::Closed },
    open_upper = { "OPEN", TicketStatus::Open },
)]
fn status_from_str_valid(input: &str, expected: TicketStatus) {
    assert_eq!(input.parse::<TicketStatus>().unwrap(), expected);
}

#[parameterized(
    invalid = { "invalid" },
    underscore = { "in_progress" },
    empty = { "" },
)]
fn status_from_str_invalid(input: &str) {
    assert!(input.parse::<TicketStatus>().is_err());
}

#[test]
fn test_new_ticket_defaults() {
    let ticket = Ticket::new("bg-a1b2c3", "Fix the thing", TicketType::Bug).unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.priority, 2);
    assert!(ticket.assignee.is_none());
    assert!(ticket.deps.is_empty());
    assert!(ticket.notes.is_empty());
    assert_eq!(ticket.created, ticket.updated);
}

#[test]
fn test_new_ticket_empty_id_allowed() {
    let ticket = Ticket::new("", "Not yet created", TicketType::Task).unwrap();
    assert!(ticket.id.is_empty());
}

#[test]
fn test_new_ticket_empty_title_rejected() {
    let err = Ticket::new("bg-a1b2c3", "   ", TicketType::Task).unwrap_err();
    assert!(matches!(err, Error::EmptyTitle));
}

#[test]
fn test_new_ticket_bad_id_rejected() {
    let err = Ticket::new("NotAnId", "Title", TicketType::Task).unwrap_err();
    assert!(matches!(err, Error::InvalidId(_)));
}

#[test]
fn test_validate_priority_range() {
    let mut ticket = Ticket::new("bg-a1b2c3", "Title", TicketType::Task).unwrap();
    ticket.priority = 4;
    assert!(ticket.validate().is_ok());
    ticket.priority = 5;
    assert!(matches!(ticket.validate(), Err(Error::InvalidPriority(5))));
}

#[test]
fn test_add_note_formats_timestamp_prefix() {
    let mut ticket = Ticket::new("bg-a1b2c3", "Title", TicketType::Task).unwrap();
    let before = ticket.updated;
    ticket.add_note("investigated the flake");
    assert_eq!(ticket.notes.len(), 1);
    let note = &ticket.notes[0];
    assert!(note.ends_with(": investigated the flake"));
    // "YYYY-MM-DD HH:MM: text"
    assert_eq!(note.as_bytes()[4], b'-');
    assert_eq!(note.as_bytes()[10], b' ');
    assert!(ticket.updated >= before);
}

#[test]
fn test_is_closed() {
    let mut ticket = Ticket::new("bg-a1b2c3", "Title", TicketType::Task).unwrap();
    assert!(!ticket.is_closed());
    ticket.status = TicketStatus::Closed;
    assert!(ticket.is_closed());
}
