// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;

fn fixture() -> Ticket {
    let created = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
    Ticket {
        id: "bg-a1b2c3".to_string(),
        title: "Implement auth".to_string(),
        ticket_type: TicketType::Feature,
        status: TicketStatus::Open,
        priority: 1,
        assignee: None,
        tags: Vec::new(),
        deps: Vec::new(),
        links: Vec::new(),
        parent: None,
        external_ref: None,
        created,
        updated: created,
        description: None,
        design: None,
        acceptance_criteria: None,
        notes: Vec::new(),
    }
}

#[test]
fn test_serialize_minimal_omits_optional_keys() {
    let text = serialize(&fixture()).unwrap();
    assert!(text.starts_with("---\n"));
    assert!(text.contains("id: bg-a1b2c3"));
    assert!(text.contains("type: feature"));
    assert!(text.contains("status: open"));
    assert!(text.contains("priority: 1"));
    assert!(text.contains("created:"));
    assert!(text.contains("updated:"));
    assert!(!text.contains("assignee"));
    assert!(!text.contains("tags"));
    assert!(!text.contains("deps"));
    assert!(!text.contains("links"));
    assert!(!text.contains("parent"));
    assert!(!text.contains("external_ref"));
    assert!(!text.contains("## "));
}

#[test]
fn test_serialize_sections_in_order() {
    let mut ticket = fixture();
    ticket.description = Some("What to do".to_string());
    ticket.design = Some("How to do it".to_string());
    ticket.acceptance_criteria = Some("How we know it works".to_string());
    ticket.notes = vec!["2026-01-15 10:30: kickoff".to_string()];

    let text = serialize(&ticket).unwrap();
    let desc = text.find("## Description").unwrap();
    let design = text.find("## Design").unwrap();
    let acceptance = text.find("## Acceptance Criteria").unwrap();
    let notes = text.find("## Notes").unwrap();
    assert!(desc < design && design < acceptance && acceptance < notes);
    assert!(text.contains("- 2026-01-15 10:30: kickoff"));
}

#[test]
fn test_round_trip_all_fields_populated() {
    let mut ticket = fixture();
    ticket.status = TicketStatus::InProgress;
    ticket.assignee = Some("alice".to_string());
    ticket.tags = vec!["backend".to_string(), "auth".to_string()];
    ticket.deps = vec!["bg-d4e5f6".to_string(), "bg-g7h8i9".to_string()];
    ticket.links = vec!["bg-j0k1l2".to_string()];
    ticket.parent = Some("bg-000aaa".to_string());
    ticket.external_ref = Some("JIRA-123".to_string());
    ticket.description = Some("Multi-line\ndescription text".to_string());
    ticket.design = Some("Use JWTs".to_string());
    ticket.acceptance_criteria = Some("Login survives restart".to_string());
    ticket.notes = vec![
        "2026-01-15 10:30: kickoff".to_string(),
        "2026-01-16 09:00: blocked on infra".to_string(),
    ];

    let parsed = parse(&serialize(&ticket).unwrap()).unwrap();
    assert_eq!(parsed, ticket);
}

#[test]
fn test_round_trip_minimal() {
    let ticket = fixture();
    let parsed = parse(&serialize(&ticket).unwrap()).unwrap();
    assert_eq!(parsed, ticket);
}

#[test]
fn test_parse_ignores_unknown_heading_and_header_key() {
    let text = "---\n\
                id: bg-a1b2c3\n\
                title: Implement auth\n\
                type: feature\n\
                status: open\n\
                priority: 1\n\
                reviewer: bob\n\
                created: 2026-01-15T10:30:00Z\n\
                updated: 2026-01-15T10:30:00Z\n\
                ---\n\n\
                ## Rationale\n\nignored entirely\n\n\
                ## Description\n\nkept\n";
    let ticket = parse(text).unwrap();
    assert_eq!(ticket.description.as_deref(), Some("kept"));
    assert_eq!(ticket.design, None);
}

#[test]
fn test_parse_missing_body_is_fine() {
    let text = "---\n\
                id: bg-a1b2c3\n\
                title: Implement auth\n\
                type: task\n\
                status: closed\n\
                priority: 0\n\
                created: 2026-01-15T10:30:00Z\n\
                updated: 2026-01-15T10:30:00Z\n\
                ---\n";
    let ticket = parse(text).unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
    assert!(ticket.notes.is_empty());
}

#[test]
fn test_parse_notes_skips_non_bullet_lines() {
    let text = "---\n\
                id: bg-a1b2c3\n\
                title: Implement auth\n\
                type: task\n\
                status: open\n\
                priority: 2\n\
                created: 2026-01-15T10:30:00Z\n\
                updated: 2026-01-15T10:30:00Z\n\
                ---\n\n\
                ## Notes\n\nstray line\n- 2026-01-15 10:30: first\n\n- 2026-01-16 11:00: second\n";
    let ticket = parse(text).unwrap();
    assert_eq!(
        ticket.notes,
        vec![
            "2026-01-15 10:30: first".to_string(),
            "2026-01-16 11:00: second".to_string(),
        ]
    );
}

#[test]
fn test_parse_missing_delimiter_is_error() {
    assert!(matches!(
        parse("id: bg-a1b2c3\n"),
        Err(Error::MalformedTicket(_))
    ));
    assert!(matches!(
        parse("---\nid: bg-a1b2c3\n"),
        Err(Error::MalformedTicket(_))
    ));
}

#[test]
fn test_parse_validates_header_fields() {
    let text = "---\n\
                id: bg-a1b2c3\n\
                title: Implement auth\n\
                type: task\n\
                status: open\n\
                priority: 9\n\
                created: 2026-01-15T10:30:00Z\n\
                updated: 2026-01-15T10:30:00Z\n\
                ---\n";
    assert!(matches!(parse(text), Err(Error::InvalidPriority(9))));

    let bad_type = text.replace("type: task", "type: saga");
    assert!(parse(&bad_type).is_err());
}
