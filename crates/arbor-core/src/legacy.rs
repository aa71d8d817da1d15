//! Legacy group merger.
//!
//! Group roots exist in two places: current-model items flagged
//! [`ItemKind::GroupRoot`], and an older standalone collection of
//! [`GroupRoot`] records. The merger adapts both into one set of
//! [`NodeView`]s for a single project so the rest of the engine never
//! checks which source a node came from.
//!
//! The merger is read-only with respect to source identity: a node never
//! changes collection. Writes are routed back to the node's own source by
//! [`order_key_write`] and [`placement_write`]; for a legacy record only the
//! order key is ever written.
//!
//! [`ItemKind::GroupRoot`]: crate::model::ItemKind::GroupRoot

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::HashSet;

use crate::model::{Collection, GroupRoot, ItemId, NodeView, Placement, ProjectId, WorkItem};
use crate::repo::{ItemPatch, Snapshot};

/// A write addressed to the collection a node lives in.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeWrite {
    /// Patch a current-model item.
    Item { id: ItemId, patch: ItemPatch },
    /// Set a legacy group root's order key.
    LegacyGroup { id: ItemId, order_key: f64 },
}

impl NodeWrite {
    pub const fn id(&self) -> &ItemId {
        match self {
            Self::Item { id, .. } | Self::LegacyGroup { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LegacyGroupMerger<'a> {
    project: &'a ProjectId,
}

impl<'a> LegacyGroupMerger<'a> {
    pub const fn new(project: &'a ProjectId) -> Self {
        Self { project }
    }

    /// Normalize both collections of `project` into node views.
    ///
    /// An id present in both collections keeps the current-model record.
    pub fn merge(&self, items: &[WorkItem], legacy: &[GroupRoot]) -> Vec<NodeView> {
        let mut seen: HashSet<&ItemId> = HashSet::new();
        let mut nodes = Vec::with_capacity(items.len() + legacy.len());

        for item in items.iter().filter(|i| &i.project_id == self.project) {
            if !seen.insert(&item.id) {
                tracing::warn!(id = %item.id, "duplicate item id in snapshot, keeping first");
                continue;
            }
            if item.is_group_root() && (item.parent_id.is_some() || item.group_id.is_some()) {
                tracing::warn!(id = %item.id, "group root carries a parent/group pointer, treating as top-level");
            }
            nodes.push(NodeView::from_item(item));
        }

        for group in legacy.iter().filter(|g| &g.project_id == self.project) {
            if !seen.insert(&group.id) {
                tracing::warn!(id = %group.id, "legacy group root shadowed by current-model record");
                continue;
            }
            nodes.push(NodeView::from_legacy(group));
        }

        tracing::trace!(
            project = %self.project,
            items = items.len(),
            legacy = legacy.len(),
            merged = nodes.len(),
            "merged collections"
        );
        nodes
    }

    pub fn merge_snapshot(&self, snapshot: &Snapshot) -> Vec<NodeView> {
        self.merge(&snapshot.items, &snapshot.group_roots)
    }
}

/// Route an order-key-only update to the node's own collection.
pub fn order_key_write(node: &NodeView, order_key: f64) -> NodeWrite {
    match node.collection {
        Collection::Items => NodeWrite::Item {
            id: node.id.clone(),
            patch: ItemPatch::order_key_only(order_key),
        },
        Collection::LegacyGroups => NodeWrite::LegacyGroup {
            id: node.id.clone(),
            order_key,
        },
    }
}

/// Route a move result to the node's own collection. Group roots only ever
/// receive their order key.
pub fn placement_write(node: &NodeView, placement: &Placement) -> NodeWrite {
    if node.is_group_root() {
        return order_key_write(node, placement.order_key);
    }
    NodeWrite::Item {
        id: node.id.clone(),
        patch: ItemPatch::placement(placement),
    }
}
