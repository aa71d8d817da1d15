//! Tree builder: per-context sibling lists derived from a flat node set.
//!
//! # Overview
//!
//! [`SiblingIndex::build`] groups nodes by [`SiblingContext`] (root, parent,
//! or group) and sorts each list by effective order key, then creation time,
//! then id. It is a pure O(n log n) pass that never mutates its input.
//!
//! A node whose context points at a node absent from the input (e.g. a
//! parent outside the project) is recorded as a **synthetic root**: it is
//! rendered at top level but its context is not a legal move context.
//! [`Scope`] enforces that when resolving moves.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub mod scope;

pub use scope::{Scope, TreeRow};

use std::collections::{BTreeMap, HashSet};

use crate::model::{ItemId, NodeView, SiblingContext};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiblingIndex {
    lists: BTreeMap<SiblingContext, Vec<ItemId>>,
    synthetic_roots: Vec<ItemId>,
}

impl SiblingIndex {
    pub fn build(nodes: &[NodeView]) -> Self {
        let known: HashSet<&ItemId> = nodes.iter().map(|n| &n.id).collect();
        let mut grouped: BTreeMap<SiblingContext, Vec<&NodeView>> = BTreeMap::new();
        let mut orphans: Vec<&NodeView> = Vec::new();

        for node in nodes {
            match node.context.anchor() {
                Some(anchor) if !known.contains(anchor) => orphans.push(node),
                _ => grouped.entry(node.context.clone()).or_default().push(node),
            }
        }

        let lists = grouped
            .into_iter()
            .map(|(ctx, mut members)| {
                members.sort_by(|a, b| a.render_cmp(b));
                (ctx, members.into_iter().map(|n| n.id.clone()).collect())
            })
            .collect();

        orphans.sort_by(|a, b| a.render_cmp(b));
        let synthetic_roots = orphans.into_iter().map(|n| n.id.clone()).collect();

        Self {
            lists,
            synthetic_roots,
        }
    }

    /// Sibling ids of `ctx` in render order (empty for an unknown context).
    pub fn siblings(&self, ctx: &SiblingContext) -> &[ItemId] {
        match self.lists.get(ctx) {
            Some(ids) => ids,
            None => &[],
        }
    }

    pub fn position(&self, ctx: &SiblingContext, id: &ItemId) -> Option<usize> {
        self.siblings(ctx).iter().position(|s| s == id)
    }

    /// Nodes whose declared parent or group is out of scope.
    pub fn synthetic_roots(&self) -> &[ItemId] {
        &self.synthetic_roots
    }

    pub fn is_synthetic_root(&self, id: &ItemId) -> bool {
        self.synthetic_roots.contains(id)
    }

    pub fn contexts(&self) -> impl Iterator<Item = (&SiblingContext, &[ItemId])> {
        self.lists.iter().map(|(ctx, ids)| (ctx, ids.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Collection, ItemKind};
    use chrono::{TimeZone, Utc};

    fn node(id: &str, ctx: SiblingContext, key: Option<f64>, created_ms: i64) -> NodeView {
        NodeView {
            id: ItemId::new(id),
            kind: ItemKind::Generic,
            collection: Collection::Items,
            context: ctx,
            order_key: key,
            created_at: Utc.timestamp_millis_opt(created_ms).unwrap(),
            title: id.into(),
        }
    }

    fn ids(list: &[ItemId]) -> Vec<&str> {
        list.iter().map(ItemId::as_str).collect()
    }

    #[test]
    fn groups_by_context_and_sorts() {
        let r = ItemId::new("r");
        let nodes = vec![
            node("r", SiblingContext::Root, Some(1.0), 0),
            node("c2", SiblingContext::Parent(r.clone()), Some(200.0), 0),
            node("c1", SiblingContext::Parent(r.clone()), Some(100.0), 0),
            node("m1", SiblingContext::Group(r.clone()), Some(5.0), 0),
        ];
        let index = SiblingIndex::build(&nodes);
        assert_eq!(ids(index.siblings(&SiblingContext::Root)), vec!["r"]);
        assert_eq!(
            ids(index.siblings(&SiblingContext::Parent(r.clone()))),
            vec!["c1", "c2"]
        );
        assert_eq!(ids(index.siblings(&SiblingContext::Group(r.clone()))), vec!["m1"]);
        assert_eq!(index.position(&SiblingContext::Parent(r), &ItemId::new("c2")), Some(1));
        assert_eq!(index.contexts().count(), 3);
    }

    #[test]
    fn ties_fall_back_to_created_at() {
        let nodes = vec![
            node("late", SiblingContext::Root, Some(5.0), 2_000),
            node("early", SiblingContext::Root, Some(5.0), 1_000),
            node("keyless", SiblingContext::Root, None, 3),
        ];
        let index = SiblingIndex::build(&nodes);
        assert_eq!(
            ids(index.siblings(&SiblingContext::Root)),
            vec!["keyless", "early", "late"]
        );
    }

    #[test]
    fn out_of_scope_parent_makes_synthetic_root() {
        let nodes = vec![
            node("a", SiblingContext::Root, Some(1.0), 0),
            node("orphan", SiblingContext::Parent(ItemId::new("gone")), Some(1.0), 0),
        ];
        let index = SiblingIndex::build(&nodes);
        assert_eq!(ids(index.synthetic_roots()), vec!["orphan"]);
        assert!(index.is_synthetic_root(&ItemId::new("orphan")));
        assert!(
            index
                .siblings(&SiblingContext::Parent(ItemId::new("gone")))
                .is_empty()
        );
    }

    #[test]
    fn build_does_not_touch_input() {
        let nodes = vec![
            node("b", SiblingContext::Root, Some(2.0), 0),
            node("a", SiblingContext::Root, Some(1.0), 0),
        ];
        let before = nodes.clone();
        let _ = SiblingIndex::build(&nodes);
        assert_eq!(nodes, before);
    }
}
