//! Applies planned moves through an [`ItemRepository`].

use tracing::{debug, info};

use super::{MovePlan, plan_move};
use crate::error::MoveError;
use crate::intent::{DropRequest, MoveIntent};
use crate::model::{ItemId, Placement, ProjectId};
use crate::order::{KeyClock, OrderKeyAllocator};
use crate::repo::ItemRepository;
use crate::tree::Scope;

/// Move engine bound to one project and one repository.
///
/// Holds no tree state between calls: every move starts from a fresh
/// snapshot.
#[derive(Debug)]
pub struct MoveExecutor<R, C> {
    repo: R,
    clock: C,
    allocator: OrderKeyAllocator,
    project: ProjectId,
}

impl<R: ItemRepository, C: KeyClock> MoveExecutor<R, C> {
    pub const fn new(repo: R, clock: C, allocator: OrderKeyAllocator, project: ProjectId) -> Self {
        Self {
            repo,
            clock,
            allocator,
            project,
        }
    }

    #[must_use]
    pub const fn project(&self) -> &ProjectId {
        &self.project
    }

    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repo
    }

    pub const fn repository_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    #[must_use]
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Rebuild the project tree from the repository's confirmed state.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::Repository`] if the snapshot cannot be read.
    pub fn scope(&self) -> Result<Scope, MoveError> {
        let snapshot = self.repo.snapshot(&self.project)?;
        Ok(Scope::from_snapshot(&self.project, &snapshot))
    }

    /// Plan a move against a fresh snapshot without writing anything.
    ///
    /// # Errors
    ///
    /// See [`plan_move`].
    pub fn plan(
        &mut self,
        dragged: &ItemId,
        target: &ItemId,
        intent: MoveIntent,
    ) -> Result<MovePlan, MoveError> {
        let scope = self.scope()?;
        plan_move(
            &scope,
            &self.allocator,
            &mut self.clock,
            dragged,
            target,
            intent,
        )
    }

    /// Move `dragged` relative to `target` and persist the result.
    ///
    /// # Errors
    ///
    /// Validation errors from [`plan_move`], or [`MoveError::Repository`]
    /// when the commit fails. The plan's writes, sibling renumbering
    /// included, are committed as one batch, so a failure stores nothing.
    pub fn move_node(
        &mut self,
        dragged: &ItemId,
        target: &ItemId,
        intent: MoveIntent,
    ) -> Result<Placement, MoveError> {
        let plan = self.plan(dragged, target, intent)?;
        if plan.is_noop() {
            debug!(dragged = %dragged, "already in place, nothing to write");
            return Ok(plan.placement);
        }

        self.repo.apply_writes(&plan.writes)?;

        info!(
            project = %self.project,
            dragged = %dragged,
            target = %target,
            %intent,
            order_key = plan.placement.order_key,
            renumbered = plan.renumbered,
            "moved item"
        );
        Ok(plan.placement)
    }

    /// Act on a completed drag.
    ///
    /// # Errors
    ///
    /// Same as [`MoveExecutor::move_node`].
    pub fn apply_drop(&mut self, request: &DropRequest) -> Result<Placement, MoveError> {
        self.move_node(&request.dragged, &request.target, request.intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemKind, WorkItem};
    use crate::order::FixedKeyClock;
    use crate::repo::{MemoryRepository, Snapshot};
    use chrono::{TimeZone, Utc};

    fn item(id: &str, parent: Option<&str>, key: f64) -> WorkItem {
        WorkItem {
            id: ItemId::new(id),
            project_id: ProjectId::new("p"),
            title: id.into(),
            kind: ItemKind::Generic,
            parent_id: parent.map(ItemId::new),
            group_id: None,
            order_key: Some(key),
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
        }
    }

    fn executor() -> MoveExecutor<MemoryRepository, FixedKeyClock> {
        let repo = MemoryRepository::new(Snapshot {
            items: vec![
                item("r", None, 1.0),
                item("c1", Some("r"), 100.0),
                item("c2", Some("r"), 200.0),
                item("c3", None, 50.0),
            ],
            group_roots: vec![],
        });
        MoveExecutor::new(
            repo,
            FixedKeyClock::new(9_000.0, 1.0),
            OrderKeyAllocator::default(),
            ProjectId::new("p"),
        )
    }

    #[test]
    fn move_writes_through_repository() {
        let mut ex = executor();
        let placed = ex
            .move_node(&ItemId::new("c3"), &ItemId::new("c2"), MoveIntent::Before)
            .unwrap();
        assert_eq!(ex.repository().write_count(), 1);

        let scope = ex.scope().unwrap();
        let c3 = scope.get(&ItemId::new("c3")).unwrap();
        assert_eq!(c3.order_key, Some(placed.order_key));
        let order: Vec<_> = scope
            .siblings(&c3.context)
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(order, vec!["c1", "c3", "c2"]);
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let mut ex = executor();
        let before = ex.repository().state().clone();
        ex.repository_mut().fail_writes("offline");

        let err = ex
            .move_node(&ItemId::new("c3"), &ItemId::new("r"), MoveIntent::Inside)
            .unwrap_err();
        assert!(matches!(err, MoveError::Repository(_)));
        assert_eq!(ex.repository().state(), &before);
    }

    #[test]
    fn renumber_failure_stores_no_sibling_keys() {
        let repo = MemoryRepository::new(Snapshot {
            items: vec![
                item("a", None, 10.0),
                item("b", None, 10.0),
                item("c", None, 10.0),
                item("x", None, 99.0),
            ],
            group_roots: vec![],
        });
        let mut ex = MoveExecutor::new(
            repo,
            FixedKeyClock::new(1.0, 1.0),
            OrderKeyAllocator::default(),
            ProjectId::new("p"),
        );
        let before = ex.repository().state().clone();
        ex.repository_mut().fail_after(1, "disk full");

        let err = ex
            .move_node(&ItemId::new("x"), &ItemId::new("b"), MoveIntent::Before)
            .unwrap_err();
        assert!(matches!(err, MoveError::Repository(_)));
        assert_eq!(ex.repository().state(), &before);
        assert_eq!(ex.repository().write_count(), 0);
    }

    #[test]
    fn noop_move_skips_writes() {
        let mut ex = executor();
        ex.move_node(&ItemId::new("c2"), &ItemId::new("c1"), MoveIntent::After)
            .unwrap();
        assert_eq!(ex.repository().write_count(), 0);
    }

    #[test]
    fn drop_request_is_applied() {
        let mut ex = executor();
        let request = DropRequest {
            dragged: ItemId::new("c3"),
            target: ItemId::new("r"),
            intent: MoveIntent::Inside,
        };
        let placed = ex.apply_drop(&request).unwrap();
        assert_eq!(placed.parent_id, Some(ItemId::new("r")));
        assert_eq!(ex.into_repository().write_count(), 1);
    }
}
