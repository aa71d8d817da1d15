//! In-process repository with write-failure injection.

use super::{ItemPatch, ItemRepository, RepositoryError, Snapshot};
use crate::legacy::NodeWrite;
use crate::model::{GroupRoot, ItemId, ProjectId, WorkItem};

#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    state: Snapshot,
    fail_writes: Option<String>,
    fail_after: Option<usize>,
    writes: usize,
}

impl MemoryRepository {
    #[must_use]
    pub fn new(state: Snapshot) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Make every subsequent write fail with [`RepositoryError::Unavailable`].
    pub fn fail_writes(&mut self, reason: impl Into<String>) {
        self.fail_writes = Some(reason.into());
    }

    /// Let the next `n` record writes through, then fail the rest. A batch
    /// that would cross the limit fails whole.
    pub fn fail_after(&mut self, n: usize, reason: impl Into<String>) {
        self.fail_after = Some(self.writes + n);
        self.fail_writes = Some(reason.into());
    }

    /// Stop injecting failures.
    pub fn heal(&mut self) {
        self.fail_writes = None;
        self.fail_after = None;
    }

    /// Number of records written so far.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.writes
    }

    /// The full stored state across all projects.
    #[must_use]
    pub const fn state(&self) -> &Snapshot {
        &self.state
    }

    pub fn insert_item(&mut self, item: WorkItem) {
        self.state.items.push(item);
    }

    pub fn insert_group_root(&mut self, group: GroupRoot) {
        self.state.group_roots.push(group);
    }

    /// Whether the record write `pending` places after the last commit may
    /// go through.
    fn check_write(&self, pending: usize) -> Result<(), RepositoryError> {
        let Some(reason) = &self.fail_writes else {
            return Ok(());
        };
        match self.fail_after {
            Some(limit) if self.writes + pending < limit => Ok(()),
            _ => Err(RepositoryError::Unavailable(reason.clone())),
        }
    }
}

impl ItemRepository for MemoryRepository {
    fn snapshot(&self, project: &ProjectId) -> Result<Snapshot, RepositoryError> {
        Ok(self.state.for_project(project))
    }

    fn update_item(&mut self, id: &ItemId, patch: &ItemPatch) -> Result<WorkItem, RepositoryError> {
        self.check_write(0)?;
        let item = self
            .state
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        patch.apply_to(item);
        self.writes += 1;
        Ok(item.clone())
    }

    fn update_group_root(
        &mut self,
        id: &ItemId,
        order_key: f64,
    ) -> Result<GroupRoot, RepositoryError> {
        self.check_write(0)?;
        let group = self
            .state
            .group_roots
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        group.order_key = Some(order_key);
        self.writes += 1;
        Ok(group.clone())
    }

    fn apply_writes(&mut self, writes: &[NodeWrite]) -> Result<(), RepositoryError> {
        let mut staged = self.state.clone();
        for (pending, write) in writes.iter().enumerate() {
            self.check_write(pending)?;
            staged.apply_write(write)?;
        }
        self.state = staged;
        self.writes += writes.len();
        Ok(())
    }
}
