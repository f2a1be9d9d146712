// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use crate::config::{SyncStrategy, BODEGA_DIR_NAME};
use crate::git::fake::FakeGit;
use tempfile::TempDir;

fn setup(temp: &TempDir) -> (TicketStore, Config) {
    let config = Config {
        bodega_dir: temp.path().join(BODEGA_DIR_NAME),
        id_prefix: "bg".to_string(),
        default_type: TicketType::Task,
        default_priority: 2,
        default_assignee: String::new(),
        branch: String::new(),
        auto_commit: false,
        strategy: SyncStrategy::Theirs,
    };
    (TicketStore::new(&config), config)
}

fn create(store: &TicketStore, config: &Config, id: &str, title: &str) -> Ticket {
    let mut ticket = Ticket::new(id, title, TicketType::Task).unwrap();
    ticket.priority = config.default_priority;
    store.create(ticket).unwrap()
}

#[test]
fn test_create_ticket_applies_defaults_and_warns_on_missing_deps() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "Existing dep");

    let (ticket, missing) = create_ticket(
        &store,
        &config,
        NewTicket {
            title: "New work".to_string(),
            deps: vec!["bg-aaa111".to_string(), "bg-gone99".to_string()],
            tags: vec!["x".to_string(), "x".to_string(), "y".to_string()],
            ..NewTicket::default()
        },
    )
    .unwrap();

    assert!(ticket.id.starts_with("bg-"));
    assert_eq!(ticket.ticket_type, TicketType::Task);
    assert_eq!(ticket.priority, 2);
    assert_eq!(ticket.status, TicketStatus::Open);
    // Duplicate tags are suppressed at this layer.
    assert_eq!(ticket.tags, vec!["x".to_string(), "y".to_string()]);
    // Missing deps are a warning, not an error; the edge is still stored.
    assert_eq!(missing, vec!["bg-gone99".to_string()]);
    assert_eq!(store.get(&ticket.id).unwrap().deps.len(), 2);
}

#[test]
fn test_create_ticket_rejects_bad_priority() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    let err = create_ticket(
        &store,
        &config,
        NewTicket {
            title: "Too urgent".to_string(),
            priority: Some(9),
            ..NewTicket::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidPriority(9)));
}

#[test]
fn test_start_ticket_assigns_git_user() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "Work");

    let git = FakeGit::new().respond("config user.name", 0, "Alice\n", "");
    let (ticket, already) = start_ticket(&store, &config, &git, "bg-a", None).unwrap();

    assert!(!already);
    assert_eq!(ticket.status, TicketStatus::InProgress);
    assert_eq!(ticket.assignee.as_deref(), Some("Alice"));

    // Second start is a no-op with the flag set.
    let (_, already) = start_ticket(&store, &config, &git, "bg-a", None).unwrap();
    assert!(already);
}

#[test]
fn test_start_ticket_explicit_assignee_wins_and_empty_clears() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "Work");

    let git = FakeGit::new();
    let (ticket, _) = start_ticket(&store, &config, &git, "bg-a", Some("bob")).unwrap();
    assert_eq!(ticket.assignee.as_deref(), Some("bob"));

    let (ticket, _) = start_ticket(&store, &config, &git, "bg-a", Some("")).unwrap();
    assert_eq!(ticket.assignee, None);
}

#[test]
fn test_close_and_reopen_report_already_in_state() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "Work");

    let (ticket, already) = close_ticket(&store, "bg-a").unwrap();
    assert!(ticket.is_closed());
    assert!(!already);

    let (_, already) = close_ticket(&store, "bg-a").unwrap();
    assert!(already);

    let (ticket, already) = reopen_ticket(&store, "bg-a").unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert!(!already);

    let (_, already) = reopen_ticket(&store, "bg-a").unwrap();
    assert!(already);
}

#[test]
fn test_add_note_persists() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "Work");

    add_note(&store, "bg-a", "first finding").unwrap();
    let loaded = store.get("bg-aaa111").unwrap();
    assert_eq!(loaded.notes.len(), 1);
    assert!(loaded.notes[0].ends_with(": first finding"));
}

#[test]
fn test_edit_ticket_fields_and_tags() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    let mut ticket = Ticket::new("bg-aaa111", "Work", TicketType::Task).unwrap();
    ticket.tags = vec!["old".to_string()];
    store.create(ticket).unwrap();

    let (edited, modified) = edit_ticket(
        &store,
        "bg-a",
        EditTicket {
            title: Some("Renamed".to_string()),
            ticket_type: Some(TicketType::Bug),
            priority: Some(0),
            add_tags: vec!["new".to_string(), "old".to_string()],
            remove_tags: vec!["old".to_string()],
            ..EditTicket::default()
        },
    )
    .unwrap();

    assert!(modified);
    assert_eq!(edited.title, "Renamed");
    assert_eq!(edited.ticket_type, TicketType::Bug);
    assert_eq!(edited.priority, 0);
    assert_eq!(edited.tags, vec!["new".to_string()]);

    let (_, modified) = edit_ticket(&store, "bg-a", EditTicket::default()).unwrap();
    assert!(!modified);
}

#[test]
fn test_edit_ticket_validates_before_saving() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "Work");

    let err = edit_ticket(
        &store,
        "bg-a",
        EditTicket {
            title: Some("  ".to_string()),
            ..EditTicket::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::EmptyTitle));
    // Nothing was written.
    assert_eq!(store.get("bg-aaa111").unwrap().title, "Work");
}

#[test]
fn test_add_dependency_and_already_flag() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "A");
    create(&store, &config, "bg-bbb222", "B");

    let (ticket, blocker, already) = add_dependency(&store, "bg-b", "bg-a").unwrap();
    assert_eq!(ticket.id, "bg-bbb222");
    assert_eq!(blocker.id, "bg-aaa111");
    assert!(!already);
    assert_eq!(store.get("bg-b").unwrap().deps, vec!["bg-aaa111".to_string()]);

    let (_, _, already) = add_dependency(&store, "bg-b", "bg-a").unwrap();
    assert!(already);
}

#[test]
fn test_add_dependency_rejects_self() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "A");

    let err = add_dependency(&store, "bg-a", "bg-aaa111").unwrap_err();
    assert!(matches!(err, Error::SelfDependency));
}

#[test]
fn test_add_dependency_rejects_cycle_before_writing() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "A");
    create(&store, &config, "bg-bbb222", "B");

    add_dependency(&store, "bg-a", "bg-b").unwrap();
    let err = add_dependency(&store, "bg-b", "bg-a").unwrap_err();
    assert!(matches!(err, Error::CycleDetected));
    // The reverse edge was never persisted.
    assert!(store.get("bg-bbb222").unwrap().deps.is_empty());
}

#[test]
fn test_add_dependency_rejects_three_hop_cycle() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "A");
    create(&store, &config, "bg-bbb222", "B");
    create(&store, &config, "bg-ccc333", "C");

    add_dependency(&store, "bg-a", "bg-b").unwrap();
    add_dependency(&store, "bg-b", "bg-c").unwrap();
    let err = add_dependency(&store, "bg-c", "bg-a").unwrap_err();
    assert!(matches!(err, Error::CycleDetected));
}

#[test]
fn test_remove_dependency() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "A");
    create(&store, &config, "bg-bbb222", "B");
    add_dependency(&store, "bg-b", "bg-a").unwrap();

    let (_, _, was) = remove_dependency(&store, "bg-b", "bg-a").unwrap();
    assert!(was);
    assert!(store.get("bg-b").unwrap().deps.is_empty());

    let (_, _, was) = remove_dependency(&store, "bg-b", "bg-a").unwrap();
    assert!(!was);
}

#[test]
fn test_link_tickets_is_symmetric() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "A");
    create(&store, &config, "bg-bbb222", "B");

    let (_, _, already) = link_tickets(&store, "bg-a", "bg-b").unwrap();
    assert!(!already);
    assert_eq!(store.get("bg-a").unwrap().links, vec!["bg-bbb222".to_string()]);
    assert_eq!(store.get("bg-b").unwrap().links, vec!["bg-aaa111".to_string()]);

    let (_, _, already) = link_tickets(&store, "bg-a", "bg-b").unwrap();
    assert!(already);

    let err = link_tickets(&store, "bg-a", "bg-aaa111").unwrap_err();
    assert!(matches!(err, Error::SelfDependency));
}

#[test]
fn test_unlink_tickets_clears_both_sides() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);
    create(&store, &config, "bg-aaa111", "A");
    create(&store, &config, "bg-bbb222", "B");
    link_tickets(&store, "bg-a", "bg-b").unwrap();

    let (_, _, was) = unlink_tickets(&store, "bg-a", "bg-b").unwrap();
    assert!(was);
    assert!(store.get("bg-a").unwrap().links.is_empty());
    assert!(store.get("bg-b").unwrap().links.is_empty());

    let (_, _, was) = unlink_tickets(&store, "bg-a", "bg-b").unwrap();
    assert!(!was);
}

#[test]
fn test_ready_tickets_sorted_by_priority() {
    let temp = TempDir::new().unwrap();
    let (store, _config) = setup(&temp);

    let mut urgent = Ticket::new("bg-aaa111", "Urgent", TicketType::Task).unwrap();
    urgent.priority = 0;
    store.create(urgent).unwrap();
    let mut later = Ticket::new("bg-bbb222", "Later", TicketType::Task).unwrap();
    later.priority = 3;
    store.create(later).unwrap();

    let ready = get_ready_tickets(&store).unwrap();
    let ids: Vec<&str> = ready.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["bg-aaa111", "bg-bbb222"]);
}

#[test]
fn test_blocked_ready_scenario_end_to_end() {
    let temp = TempDir::new().unwrap();
    let (store, config) = setup(&temp);

    let (a, _) = create_ticket(
        &store,
        &config,
        NewTicket {
            title: "A".to_string(),
            ..NewTicket::default()
        },
    )
    .unwrap();
    let (b, missing) = create_ticket(
        &store,
        &config,
        NewTicket {
            title: "B".to_string(),
            deps: vec![a.id.clone()],
            ..NewTicket::default()
        },
    )
    .unwrap();
    assert!(missing.is_empty());

    let graph = DependencyGraph::new(&store).unwrap();
    let blocked: Vec<String> = graph.get_blocked_tickets().into_iter().map(|t| t.id).collect();
    assert_eq!(blocked, vec![b.id.clone()]);

    close_ticket(&store, &a.id).unwrap();

    let graph = DependencyGraph::new(&store).unwrap();
    assert!(graph.get_blocked_tickets().is_empty());
    let ready: Vec<String> = graph.get_ready_tickets().into_iter().map(|t| t.id).collect();
    assert_eq!(ready, vec![b.id]);
}
