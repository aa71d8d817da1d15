//! The normalized node shape every core function sees.
//!
//! Both persisted collections (current-model items and legacy group roots)
//! are adapted into [`NodeView`] by the legacy merger before the tree
//! builder, classifier or move planner touch them.

#![allow(clippy::cast_precision_loss)]

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use super::item::{Collection, GroupRoot, ItemId, ItemKind, SiblingContext, WorkItem};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: ItemId,
    pub kind: ItemKind,
    pub collection: Collection,
    pub context: SiblingContext,
    pub order_key: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub title: String,
}

impl NodeView {
    /// Adapt a current-model item. A group-root item is always placed at the
    /// root regardless of stray pointers.
    #[must_use]
    pub fn from_item(item: &WorkItem) -> Self {
        let context = if item.is_group_root() {
            SiblingContext::Root
        } else {
            item.context()
        };
        Self {
            id: item.id.clone(),
            kind: item.kind,
            collection: Collection::Items,
            context,
            order_key: item.order_key,
            created_at: item.created_at,
            title: item.title.clone(),
        }
    }

    /// Adapt a legacy group-root record.
    #[must_use]
    pub fn from_legacy(group: &GroupRoot) -> Self {
        Self {
            id: group.id.clone(),
            kind: ItemKind::GroupRoot,
            collection: Collection::LegacyGroups,
            context: SiblingContext::Root,
            order_key: group.order_key,
            created_at: group.created_at,
            title: group.title.clone(),
        }
    }

    #[must_use]
    pub fn is_group_root(&self) -> bool {
        self.kind == ItemKind::GroupRoot
    }

    /// The numeric position used for ordering: the order key when present
    /// and finite, otherwise the creation time in milliseconds.
    #[must_use]
    pub fn sort_key(&self) -> f64 {
        match self.order_key {
            Some(key) if key.is_finite() => key,
            _ => self.created_at.timestamp_millis() as f64,
        }
    }

    /// Sibling ordering: sort key, then creation time, then id.
    #[must_use]
    pub fn render_cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .total_cmp(&other.sort_key())
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}
