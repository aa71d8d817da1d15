//! Structural checks over a stored snapshot.
//!
//! The move engine never produces these shapes, but records are created and
//! edited outside it. [`check_snapshot`] reports every violation it finds
//! instead of stopping at the first one.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::legacy::LegacyGroupMerger;
use crate::model::{ItemId, NodeView, ProjectId, SiblingContext};
use crate::repo::Snapshot;
use crate::tree::Scope;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// An item sets both `parent_id` and `group_id`.
    BothPointers { id: ItemId },
    /// A group-root item carries a parent or group pointer.
    NestedGroupRoot { id: ItemId },
    /// Following parent/group pointers from `id` returns to `id`.
    Cycle { path: Vec<ItemId> },
    /// A pointer names a node that is not in the project.
    Dangling { id: ItemId, missing: ItemId },
    /// Two siblings share an order key.
    DuplicateKey {
        context: SiblingContext,
        key: f64,
        ids: Vec<ItemId>,
    },
    /// The same id appears more than once across both collections.
    DuplicateId { id: ItemId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BothPointers { id } => {
                write!(f, "'{id}' has both a parent and a group")
            }
            Self::NestedGroupRoot { id } => {
                write!(f, "group root '{id}' is nested under another node")
            }
            Self::Cycle { path } => {
                let joined: Vec<&str> = path.iter().map(ItemId::as_str).collect();
                write!(f, "pointer cycle: {}", joined.join(" -> "))
            }
            Self::Dangling { id, missing } => {
                write!(f, "'{id}' points at '{missing}', which is not in the project")
            }
            Self::DuplicateKey { context, key, ids } => {
                let joined: Vec<&str> = ids.iter().map(ItemId::as_str).collect();
                write!(f, "{context}: order key {key} shared by {}", joined.join(", "))
            }
            Self::DuplicateId { id } => write!(f, "duplicate id '{id}'"),
        }
    }
}

/// Every invariant violation in `project`, in a stable order.
pub fn check_snapshot(snapshot: &Snapshot, project: &ProjectId) -> Vec<Violation> {
    let scoped = snapshot.for_project(project);
    let mut violations = Vec::new();

    let mut seen: HashSet<&ItemId> = HashSet::new();
    let all_ids = scoped
        .items
        .iter()
        .map(|i| &i.id)
        .chain(scoped.group_roots.iter().map(|g| &g.id));
    for id in all_ids {
        if !seen.insert(id) {
            violations.push(Violation::DuplicateId { id: id.clone() });
        }
    }

    for item in &scoped.items {
        if item.parent_id.is_some() && item.group_id.is_some() {
            violations.push(Violation::BothPointers {
                id: item.id.clone(),
            });
        }
        if item.is_group_root() && (item.parent_id.is_some() || item.group_id.is_some()) {
            violations.push(Violation::NestedGroupRoot {
                id: item.id.clone(),
            });
        }
        for pointer in [&item.parent_id, &item.group_id].into_iter().flatten() {
            if !seen.contains(pointer) {
                violations.push(Violation::Dangling {
                    id: item.id.clone(),
                    missing: pointer.clone(),
                });
            }
        }
    }

    let nodes = LegacyGroupMerger::new(project).merge_snapshot(&scoped);
    violations.extend(find_cycles(&nodes_to_anchor(&nodes)));

    let scope = Scope::new(project.clone(), nodes);
    violations.extend(duplicate_keys(&scope));

    violations
}

fn nodes_to_anchor(nodes: &[NodeView]) -> BTreeMap<ItemId, ItemId> {
    nodes
        .iter()
        .filter_map(|n| n.context.anchor().map(|a| (n.id.clone(), a.clone())))
        .collect()
}

/// Each distinct cycle once, starting from its smallest id.
fn find_cycles(anchors: &BTreeMap<ItemId, ItemId>) -> Vec<Violation> {
    let mut reported: HashSet<ItemId> = HashSet::new();
    let mut cycles = Vec::new();

    for start in anchors.keys() {
        if reported.contains(start) {
            continue;
        }
        let mut path: Vec<ItemId> = vec![start.clone()];
        let mut position: HashMap<&ItemId, usize> = HashMap::from([(start, 0)]);
        let mut current = start;

        while let Some(next) = anchors.get(current) {
            if let Some(&at) = position.get(next) {
                let mut cycle: Vec<ItemId> = path[at..].to_vec();
                if cycle.iter().all(|id| !reported.contains(id)) {
                    reported.extend(cycle.iter().cloned());
                    cycle.push(next.clone());
                    cycles.push(Violation::Cycle { path: cycle });
                }
                break;
            }
            if reported.contains(next) {
                break;
            }
            position.insert(next, path.len());
            path.push(next.clone());
            current = next;
        }
    }
    cycles
}

fn duplicate_keys(scope: &Scope) -> Vec<Violation> {
    let mut found = Vec::new();
    for (context, ids) in scope.index().contexts() {
        let mut by_key: BTreeMap<u64, (f64, Vec<ItemId>)> = BTreeMap::new();
        for id in ids {
            let Some(key) = scope.get(id).and_then(|n| n.order_key) else {
                continue;
            };
            by_key
                .entry(key.to_bits())
                .or_insert_with(|| (key, Vec::new()))
                .1
                .push(id.clone());
        }
        for (key, ids) in by_key.into_values() {
            if ids.len() > 1 {
                found.push(Violation::DuplicateKey {
                    context: context.clone(),
                    key,
                    ids,
                });
            }
        }
    }
    found
}
