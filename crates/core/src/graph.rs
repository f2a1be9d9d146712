// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency analysis over a snapshot of the ticket store.
//!
//! `deps` relationship: A depends on B means B blocks A; A is blocked
//! until B is closed. The graph is a derived, disposable index rebuilt
//! from a full store read; it never writes anything. Dangling dependency
//! ids are tolerated everywhere: a missing dep neither blocks nor fails
//! a query.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::store::TicketStore;
use crate::ticket::Ticket;

/// Cap on fallback roots when a fully cyclic graph has no true roots.
const MAX_FALLBACK_ROOTS: usize = 5;

/// In-memory dependency graph built from a store snapshot.
pub struct DependencyGraph {
    tickets: BTreeMap<String, Ticket>,
    /// id -> ids blocking it (forward edges).
    adjacency: BTreeMap<String, BTreeSet<String>>,
    /// id -> ids it blocks (reverse edges).
    reverse: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Builds the graph from a full store read.
    pub fn new(store: &TicketStore) -> crate::error::Result<Self> {
        Ok(Self::from_tickets(store.list_all()?))
    }

    /// Builds the graph from an already-loaded snapshot.
    pub fn from_tickets(tickets: Vec<Ticket>) -> Self {
        let mut graph = DependencyGraph {
            tickets: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            reverse: BTreeMap::new(),
        };
        for ticket in tickets {
            for dep_id in &ticket.deps {
                graph
                    .adjacency
                    .entry(ticket.id.clone())
                    .or_default()
                    .insert(dep_id.clone());
                graph
                    .reverse
                    .entry(dep_id.clone())
                    .or_default()
                    .insert(ticket.id.clone());
            }
            graph.tickets.insert(ticket.id.clone(), ticket);
        }
        graph
    }

    /// True iff the ticket has a direct dependency that exists and is not
    /// closed.
    pub fn is_blocked(&self, ticket_id: &str) -> bool {
        let Some(ticket) = self.tickets.get(ticket_id) else {
            return false;
        };
        ticket.deps.iter().any(|dep_id| {
            self.tickets
                .get(dep_id)
                .is_some_and(|dep| !dep.is_closed())
        })
    }

    /// Direct open blockers of a ticket.
    pub fn get_blockers(&self, ticket_id: &str) -> Vec<String> {
        let Some(ticket) = self.tickets.get(ticket_id) else {
            return Vec::new();
        };
        ticket
            .deps
            .iter()
            .filter(|dep_id| {
                self.tickets
                    .get(dep_id.as_str())
                    .is_some_and(|dep| !dep.is_closed())
            })
            .cloned()
            .collect()
    }

    /// All transitive dependency ids, regardless of status.
    pub fn get_all_blockers(&self, ticket_id: &str) -> Vec<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = self
            .adjacency
            .get(ticket_id)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default();
        let mut result = Vec::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(deps) = self.adjacency.get(&current) {
                stack.extend(deps.iter().cloned());
            }
            result.push(current);
        }
        result
    }

    /// All non-closed tickets that are blocked.
    pub fn get_blocked_tickets(&self) -> Vec<Ticket> {
        self.tickets
            .values()
            .filter(|t| !t.is_closed() && self.is_blocked(&t.id))
            .cloned()
            .collect()
    }

    /// All non-closed tickets that are ready to work on.
    pub fn get_ready_tickets(&self) -> Vec<Ticket> {
        self.tickets
            .values()
            .filter(|t| !t.is_closed() && !self.is_blocked(&t.id))
            .cloned()
            .collect()
    }

    /// True iff adding `new_dep_id` to `ticket_id`'s deps would create a
    /// cycle, i.e. `ticket_id` is already reachable from `new_dep_id`
    /// along existing forward edges. Must be checked before the edge is
    /// persisted; the entity layer does not know about the graph.
    pub fn would_create_cycle(&self, ticket_id: &str, new_dep_id: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![new_dep_id];

        while let Some(current) = stack.pop() {
            if current == ticket_id {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(ticket) = self.tickets.get(current) {
                stack.extend(ticket.deps.iter().map(String::as_str));
            }
        }
        false
    }

    /// Finds dependency cycles with a three-color DFS.
    ///
    /// Reports one path per back edge hit during traversal: at least one
    /// path through each cycle, not every simple cycle, and overlapping
    /// cycles may repeat segments.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color: BTreeMap<&str, Color> = self
            .tickets
            .keys()
            .map(|id| (id.as_str(), Color::White))
            .collect();
        let mut cycles: Vec<Vec<String>> = Vec::new();
        let mut path: Vec<&str> = Vec::new();

        fn dfs<'a>(
            graph: &'a DependencyGraph,
            node: &'a str,
            color: &mut BTreeMap<&'a str, Color>,
            path: &mut Vec<&'a str>,
            cycles: &mut Vec<Vec<String>>,
        ) {
            color.insert(node, Color::Gray);
            path.push(node);

            if let Some(deps) = graph.adjacency.get(node) {
                for neighbor in deps {
                    // Dangling dep: not a node, skip.
                    let Some(&state) = color.get(neighbor.as_str()) else {
                        continue;
                    };
                    match state {
                        Color::Gray => {
                            if let Some(start) =
                                path.iter().position(|&id| id == neighbor.as_str())
                            {
                                let mut cycle: Vec<String> =
                                    path[start..].iter().map(|&id| id.to_string()).collect();
                                cycle.push(neighbor.clone());
                                cycles.push(cycle);
                            }
                        }
                        Color::White => dfs(graph, neighbor.as_str(), color, path, cycles),
                        Color::Black => {}
                    }
                }
            }

            path.pop();
            color.insert(node, Color::Black);
        }

        let ids: Vec<&str> = self.tickets.keys().map(String::as_str).collect();
        for id in ids {
            if color.get(id) == Some(&Color::White) {
                dfs(self, id, &mut color, &mut path, &mut cycles);
            }
        }
        cycles
    }

    /// True iff any dependency cycle exists.
    pub fn has_cycle(&self) -> bool {
        !self.find_cycles().is_empty()
    }

    /// Formats the dependency tree as ASCII art, children being the
    /// tickets blocked by their parent (reverse edges).
    ///
    /// Example:
    /// ```text
    /// bg-a1b2c3 [open] Implement auth
    /// ├── bg-d4e5f6 [closed] Design auth flow
    /// └── bg-g7h8i9 [open] Set up JWT library
    /// ```
    ///
    /// Without a root, one tree is rendered per ticket with no forward
    /// edges; a fully cyclic graph falls back to a bounded arbitrary
    /// subset. Revisiting an id along the current path renders
    /// `<id> (cycle)` instead of recursing.
    pub fn format_tree(&self, root_id: Option<&str>) -> String {
        if let Some(root_id) = root_id {
            return self.format_root(root_id);
        }

        let mut roots: Vec<&str> = self
            .tickets
            .keys()
            .filter(|id| {
                self.adjacency
                    .get(id.as_str())
                    .map(|deps| deps.is_empty())
                    .unwrap_or(true)
            })
            .map(String::as_str)
            .collect();

        if roots.is_empty() {
            // Every ticket has dependencies: the graph is cyclic.
            roots = self
                .tickets
                .keys()
                .take(MAX_FALLBACK_ROOTS)
                .map(String::as_str)
                .collect();
        }

        let lines: Vec<String> = roots.iter().map(|root| self.format_root(root)).collect();
        lines.join("\n")
    }

    fn format_root(&self, ticket_id: &str) -> String {
        let Some(ticket) = self.tickets.get(ticket_id) else {
            return format!("{} (not found)", ticket_id);
        };

        let mut lines = vec![format!(
            "{} [{}] {}",
            ticket.id, ticket.status, ticket.title
        )];
        let mut visited = HashSet::new();
        visited.insert(ticket_id.to_string());

        let children = self.children_of(ticket_id);
        for (i, child) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            self.format_subtree(child, "", is_last, &visited, &mut lines);
        }
        lines.join("\n")
    }

    /// Appends one subtree. The visited set is copied per branch so that
    /// sibling branches cannot see each other's visits.
    fn format_subtree(
        &self,
        ticket_id: &str,
        prefix: &str,
        is_last: bool,
        visited: &HashSet<String>,
        lines: &mut Vec<String>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };

        let Some(ticket) = self.tickets.get(ticket_id) else {
            lines.push(format!("{}{}{} (not found)", prefix, connector, ticket_id));
            return;
        };
        if visited.contains(ticket_id) {
            lines.push(format!("{}{}{} (cycle)", prefix, connector, ticket_id));
            return;
        }

        lines.push(format!(
            "{}{}{} [{}] {}",
            prefix, connector, ticket_id, ticket.status, ticket.title
        ));

        let mut visited = visited.clone();
        visited.insert(ticket_id.to_string());

        let children = self.children_of(ticket_id);
        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        for (i, child) in children.iter().enumerate() {
            let child_is_last = i == children.len() - 1;
            self.format_subtree(child, &child_prefix, child_is_last, &visited, lines);
        }
    }

    fn children_of(&self, ticket_id: &str) -> Vec<String> {
        self.reverse
            .get(ticket_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
