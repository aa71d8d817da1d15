//! Single-file JSON board used by the CLI.
//!
//! The whole board (all projects, both collections) lives in one
//! `board.json`. Every write (a batch included) re-reads the file, applies
//! the change, and replaces the file atomically via a sibling temp file and
//! `rename`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{ItemPatch, ItemRepository, RepositoryError, Snapshot};
use crate::legacy::NodeWrite;
use crate::model::{GroupRoot, ItemId, ProjectId, WorkItem};

/// Current on-disk format version.
pub const BOARD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BoardFile {
    version: u32,
    #[serde(flatten)]
    snapshot: Snapshot,
}

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Open an existing board file.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Io`] if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        if !path.is_file() {
            return Err(RepositoryError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "board file missing"),
                path,
            });
        }
        Ok(Self { path })
    }

    /// Create an empty board file, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Io`] if the file cannot be written.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let repo = Self { path: path.into() };
        repo.save(&Snapshot::default())?;
        Ok(repo)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every project on the board.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Io`] or [`RepositoryError::Malformed`].
    pub fn load(&self) -> Result<Snapshot, RepositoryError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| RepositoryError::Io {
            path: self.path.clone(),
            source,
        })?;
        let board: BoardFile =
            serde_json::from_str(&raw).map_err(|source| RepositoryError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        if board.version != BOARD_VERSION {
            tracing::warn!(
                found = board.version,
                expected = BOARD_VERSION,
                "board file version mismatch, reading anyway"
            );
        }
        Ok(board.snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), RepositoryError> {
        let io_err = |source| RepositoryError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let board = BoardFile {
            version: BOARD_VERSION,
            snapshot: snapshot.clone(),
        };
        let body = serde_json::to_string_pretty(&board)
            .map_err(|source| RepositoryError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body + "\n").map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// Add a new item to the board. Item creation is outside the move
    /// engine; this exists for the CLI.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Rejected`] on a duplicate id, or an I/O
    /// error.
    pub fn insert_item(&self, item: WorkItem) -> Result<(), RepositoryError> {
        let mut snapshot = self.load()?;
        if id_taken(&snapshot, &item.id) {
            return Err(RepositoryError::Rejected {
                id: item.id,
                reason: "id already exists".into(),
            });
        }
        snapshot.items.push(item);
        self.save(&snapshot)
    }

    /// Add a record to the legacy group-root collection.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Rejected`] on a duplicate id, or an I/O
    /// error.
    pub fn insert_group_root(&self, group: GroupRoot) -> Result<(), RepositoryError> {
        let mut snapshot = self.load()?;
        if id_taken(&snapshot, &group.id) {
            return Err(RepositoryError::Rejected {
                id: group.id,
                reason: "id already exists".into(),
            });
        }
        snapshot.group_roots.push(group);
        self.save(&snapshot)
    }
}

fn id_taken(snapshot: &Snapshot, id: &ItemId) -> bool {
    snapshot.items.iter().any(|i| &i.id == id) || snapshot.group_roots.iter().any(|g| &g.id == id)
}

impl ItemRepository for JsonFileRepository {
    fn snapshot(&self, project: &ProjectId) -> Result<Snapshot, RepositoryError> {
        Ok(self.load()?.for_project(project))
    }

    fn update_item(&mut self, id: &ItemId, patch: &ItemPatch) -> Result<WorkItem, RepositoryError> {
        let mut snapshot = self.load()?;
        let item = snapshot
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        patch.apply_to(item);
        let updated = item.clone();
        self.save(&snapshot)?;
        Ok(updated)
    }

    fn update_group_root(
        &mut self,
        id: &ItemId,
        order_key: f64,
    ) -> Result<GroupRoot, RepositoryError> {
        let mut snapshot = self.load()?;
        let group = snapshot
            .group_roots
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        group.order_key = Some(order_key);
        let updated = group.clone();
        self.save(&snapshot)?;
        Ok(updated)
    }

    fn apply_writes(&mut self, writes: &[NodeWrite]) -> Result<(), RepositoryError> {
        let mut snapshot = self.load()?;
        for write in writes {
            snapshot.apply_write(write)?;
        }
        self.save(&snapshot)
    }
}
