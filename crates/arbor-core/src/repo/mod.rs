//! The item repository the move engine writes through.
//!
//! The repository is the single source of truth. The engine reads a
//! [`Snapshot`], plans a move against it, and commits every resulting
//! [`NodeWrite`] in one [`ItemRepository::apply_writes`] batch: either all
//! of them land or none do. Single-record writes go through
//! [`ItemRepository::update_item`] (current-model items) and
//! [`ItemRepository::update_group_root`] (legacy group roots, order key
//! only). The engine never mutates a snapshot in place; after a write the
//! caller re-reads the snapshot and rebuilds the tree.

#![allow(clippy::module_name_repetitions, clippy::option_option)]

pub mod file;
pub mod memory;

pub use file::JsonFileRepository;
pub use memory::MemoryRepository;

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

use crate::legacy::NodeWrite;
use crate::model::{GroupRoot, ItemId, Placement, ProjectId, WorkItem};

/// Errors raised by a repository implementation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The record addressed by a write does not exist.
    #[error("record not found: {0}")]
    NotFound(ItemId),

    /// The backing store refused the write.
    #[error("write to '{id}' rejected: {reason}")]
    Rejected { id: ItemId, reason: String },

    /// The backing store could not be reached.
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the board file failed.
    #[error("board I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The board file is not valid JSON for a [`Snapshot`].
    #[error("malformed board file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Confirmed state of one project: both persisted collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<WorkItem>,
    #[serde(default)]
    pub group_roots: Vec<GroupRoot>,
}

impl Snapshot {
    /// Restrict to one project.
    #[must_use]
    pub fn for_project(&self, project: &ProjectId) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|i| &i.project_id == project)
                .cloned()
                .collect(),
            group_roots: self
                .group_roots
                .iter()
                .filter(|g| &g.project_id == project)
                .cloned()
                .collect(),
        }
    }

    /// Largest finite order key across both collections.
    #[must_use]
    pub fn max_order_key(&self) -> Option<f64> {
        self.items
            .iter()
            .filter_map(|i| i.order_key)
            .chain(self.group_roots.iter().filter_map(|g| g.order_key))
            .filter(|k| k.is_finite())
            .max_by(f64::total_cmp)
    }

    /// Apply one routed write in place.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the addressed record is not
    /// in its collection. Legacy writes never fall through to items.
    pub fn apply_write(&mut self, write: &NodeWrite) -> Result<(), RepositoryError> {
        match write {
            NodeWrite::Item { id, patch } => {
                let item = self
                    .items
                    .iter_mut()
                    .find(|i| &i.id == id)
                    .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
                patch.apply_to(item);
            }
            NodeWrite::LegacyGroup { id, order_key } => {
                let group = self
                    .group_roots
                    .iter_mut()
                    .find(|g| &g.id == id)
                    .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
                group.order_key = Some(*order_key);
            }
        }
        Ok(())
    }
}

/// Partial update of the three mutable fields.
///
/// The outer `Option` means "leave unchanged"; `Some(None)` clears a
/// pointer. Setting one pointer clears the other when applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub parent_id: Option<Option<ItemId>>,
    pub group_id: Option<Option<ItemId>>,
    pub order_key: Option<f64>,
}

impl ItemPatch {
    /// A patch that only moves the node within its current sibling group.
    #[must_use]
    pub const fn order_key_only(order_key: f64) -> Self {
        Self {
            parent_id: None,
            group_id: None,
            order_key: Some(order_key),
        }
    }

    /// A patch writing a full placement.
    #[must_use]
    pub fn placement(placement: &Placement) -> Self {
        Self {
            parent_id: Some(placement.parent_id.clone()),
            group_id: Some(placement.group_id.clone()),
            order_key: Some(placement.order_key),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.parent_id.is_none() && self.group_id.is_none() && self.order_key.is_none()
    }

    /// Apply to an item, keeping `parent_id` and `group_id` exclusive.
    pub fn apply_to(&self, item: &mut WorkItem) {
        if let Some(parent) = &self.parent_id {
            item.parent_id.clone_from(parent);
            if parent.is_some() {
                item.group_id = None;
            }
        }
        if let Some(group) = &self.group_id {
            item.group_id.clone_from(group);
            if group.is_some() {
                item.parent_id = None;
            }
        }
        if let Some(key) = self.order_key {
            item.order_key = Some(key);
        }
    }
}

/// Persistence collaborator consumed by the move engine.
///
/// Calls are blocking; a move waits for its write to resolve.
pub trait ItemRepository {
    /// Latest confirmed state of `project`.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if the store cannot be read.
    fn snapshot(&self, project: &ProjectId) -> Result<Snapshot, RepositoryError>;

    /// Update a current-model item and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown id, or another
    /// variant if the write fails.
    fn update_item(&mut self, id: &ItemId, patch: &ItemPatch) -> Result<WorkItem, RepositoryError>;

    /// Update a legacy group root's order key in place.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown id, or another
    /// variant if the write fails.
    fn update_group_root(
        &mut self,
        id: &ItemId,
        order_key: f64,
    ) -> Result<GroupRoot, RepositoryError>;

    /// Commit `writes` as one unit. On error nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if any write addresses an
    /// unknown record, or another variant if the commit fails.
    fn apply_writes(&mut self, writes: &[NodeWrite]) -> Result<(), RepositoryError>;
}
