//! Move executor: turn a drop into validated writes.
//!
//! # Overview
//!
//! [`plan_move`] is pure. Given a [`Scope`] built from the repository's
//! confirmed snapshot it resolves both nodes, rejects illegal gestures, and
//! computes the dragged node's new [`Placement`] along with the exact
//! [`NodeWrite`]s needed to persist it. [`MoveExecutor`] reads the snapshot,
//! plans, and commits the plan's writes through an [`ItemRepository`] as
//! one batch.
//!
//! # Rules
//!
//! - Both nodes, and the contexts they sit in, must resolve within the
//!   project scope. A node whose parent lies outside the project is rendered
//!   as a synthetic root but cannot take part in a move.
//! - Dropping a node onto itself: `Inside` is a cycle, `Before`/`After` is
//!   an invalid move.
//! - `Inside` appends the dragged node as the last child of the target.
//!   The target must not be inside the dragged subtree, and group roots are
//!   never nested.
//! - `Before`/`After` joins the target's sibling list next to the target.
//!   A group root may only be reordered among top-level nodes and only its
//!   order key is written.
//!
//! A move that leaves the node exactly where it already is produces a plan
//! with no writes.
//!
//! # Failure
//!
//! Validation failures are returned before any write. A failed commit
//! surfaces as [`MoveError::Repository`] and stores nothing, renumbered
//! siblings included. The executor keeps no local copy of the tree, so the
//! next [`MoveExecutor::scope`] reflects whatever the repository confirmed.
//!
//! [`ItemRepository`]: crate::repo::ItemRepository

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub mod executor;

pub use executor::MoveExecutor;

use crate::error::MoveError;
use crate::intent::MoveIntent;
use crate::legacy::{self, NodeWrite};
use crate::model::{ItemId, NodeView, Placement, SiblingContext};
use crate::order::{KeyAllocation, KeyClock, OrderKeyAllocator, SiblingKey};
use crate::tree::Scope;

/// Everything needed to persist one move.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    pub dragged: ItemId,
    /// Where the dragged node ends up.
    pub placement: Placement,
    /// Writes in application order: renumbered siblings first, the dragged
    /// node last.
    pub writes: Vec<NodeWrite>,
    /// The target group had to be respaced.
    pub renumbered: bool,
}

impl MovePlan {
    /// The dragged node is already in place.
    pub fn is_noop(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Plan moving `dragged` relative to `target`.
///
/// # Errors
///
/// - [`MoveError::NotFound`] if either node, or the context either sits in,
///   is outside the scope.
/// - [`MoveError::CycleDetected`] if the drop would put a node inside its
///   own subtree.
/// - [`MoveError::InvalidMove`] for a self-drop beside itself or a group
///   root leaving the top level.
pub fn plan_move(
    scope: &Scope,
    allocator: &OrderKeyAllocator,
    clock: &mut dyn KeyClock,
    dragged: &ItemId,
    target: &ItemId,
    intent: MoveIntent,
) -> Result<MovePlan, MoveError> {
    let node = scope.resolve(dragged)?;
    let target_node = scope.resolve(target)?;
    scope.resolve_context(&node.context)?;
    scope.resolve_context(&target_node.context)?;

    if dragged == target {
        return Err(match intent {
            MoveIntent::Inside => cycle(dragged, target),
            MoveIntent::Before | MoveIntent::After => {
                MoveError::invalid(dragged, "cannot drop a node beside itself")
            }
        });
    }

    let (context, siblings, index) = match intent {
        MoveIntent::Inside => {
            if scope.is_descendant(target, dragged) {
                return Err(cycle(dragged, target));
            }
            if node.is_group_root() {
                return Err(MoveError::invalid(
                    dragged,
                    "group roots cannot be nested under another node",
                ));
            }
            let context = SiblingContext::Parent(target.clone());
            let siblings = scope.sibling_keys(&context, dragged);
            let index = siblings.len();
            (context, siblings, index)
        }
        MoveIntent::Before | MoveIntent::After => {
            let context = target_node.context.clone();
            if node.is_group_root() && !context.is_root() {
                return Err(MoveError::invalid(
                    dragged,
                    "group roots can only be reordered among top-level nodes",
                ));
            }
            let into_own_subtree = context
                .anchor()
                .is_some_and(|anchor| anchor == dragged || scope.is_descendant(anchor, dragged));
            if into_own_subtree {
                return Err(cycle(dragged, target));
            }
            let siblings = scope.sibling_keys(&context, dragged);
            let position = siblings
                .iter()
                .position(|s| &s.id == target)
                .ok_or_else(|| MoveError::not_found(target))?;
            let index = if intent == MoveIntent::After {
                position + 1
            } else {
                position
            };
            (context, siblings, index)
        }
    };

    if let Some(key) = already_in_place(node, &context, &siblings, index) {
        tracing::debug!(dragged = %dragged, target = %target, %intent, "move is a no-op");
        return Ok(MovePlan {
            dragged: dragged.clone(),
            placement: Placement::in_context(&context, key),
            writes: Vec::new(),
            renumbered: false,
        });
    }

    let allocation = allocator.insert_at(&siblings, index, dragged, clock);
    let placement = Placement::in_context(&context, allocation.moved_key());

    let mut writes = Vec::new();
    let renumbered = matches!(allocation, KeyAllocation::Renumber(_));
    if let KeyAllocation::Renumber(plan) = &allocation {
        for update in &plan.updates {
            let sibling = scope.resolve(&update.id)?;
            writes.push(legacy::order_key_write(sibling, update.key));
        }
    }
    writes.push(legacy::placement_write(node, &placement));

    tracing::debug!(
        dragged = %dragged,
        target = %target,
        %intent,
        context = %context,
        order_key = placement.order_key,
        writes = writes.len(),
        renumbered,
        "planned move"
    );

    Ok(MovePlan {
        dragged: dragged.clone(),
        placement,
        writes,
        renumbered,
    })
}

fn cycle(dragged: &ItemId, target: &ItemId) -> MoveError {
    MoveError::CycleDetected {
        dragged: dragged.clone(),
        target: target.clone(),
    }
}

/// The node's current key if it already sits in `context` strictly between
/// the neighbours of slot `index`.
fn already_in_place(
    node: &NodeView,
    context: &SiblingContext,
    siblings: &[SiblingKey],
    index: usize,
) -> Option<f64> {
    if &node.context != context {
        return None;
    }
    let key = node.order_key.filter(|k| k.is_finite())?;
    let after_prev = index
        .checked_sub(1)
        .and_then(|i| siblings.get(i))
        .is_none_or(|prev| prev.key < key);
    let before_next = siblings.get(index).is_none_or(|next| key < next.key);
    (after_prev && before_next).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupRoot, ItemKind, ProjectId, WorkItem};
    use crate::order::FixedKeyClock;
    use crate::repo::{ItemPatch, Snapshot};
    use chrono::{TimeZone, Utc};

    fn item(id: &str, parent: Option<&str>, group: Option<&str>, key: f64) -> WorkItem {
        WorkItem {
            id: ItemId::new(id),
            project_id: ProjectId::new("p"),
            title: id.into(),
            kind: ItemKind::Generic,
            parent_id: parent.map(ItemId::new),
            group_id: group.map(ItemId::new),
            order_key: Some(key),
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
        }
    }

    fn group_item(id: &str, key: f64) -> WorkItem {
        WorkItem {
            kind: ItemKind::GroupRoot,
            ..item(id, None, None, key)
        }
    }

    fn legacy(id: &str, key: f64) -> GroupRoot {
        GroupRoot {
            id: ItemId::new(id),
            project_id: ProjectId::new("p"),
            title: id.into(),
            order_key: Some(key),
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
        }
    }

    fn scope(items: Vec<WorkItem>, group_roots: Vec<GroupRoot>) -> Scope {
        Scope::from_snapshot(&ProjectId::new("p"), &Snapshot { items, group_roots })
    }

    fn plan(
        s: &Scope,
        dragged: &str,
        target: &str,
        intent: MoveIntent,
    ) -> Result<MovePlan, MoveError> {
        plan_move(
            s,
            &OrderKeyAllocator::default(),
            &mut FixedKeyClock::new(5_000.0, 1.0),
            &ItemId::new(dragged),
            &ItemId::new(target),
            intent,
        )
    }

    fn tree() -> Scope {
        scope(
            vec![
                item("r", None, None, 1.0),
                item("c1", Some("r"), None, 100.0),
                item("c2", Some("r"), None, 200.0),
                item("c3", None, None, 50.0),
                item("gc", Some("c1"), None, 10.0),
            ],
            vec![],
        )
    }

    #[test]
    fn before_lands_between_neighbours() {
        let s = tree();
        let got = plan(&s, "c3", "c2", MoveIntent::Before).unwrap();
        assert_eq!(got.placement.parent_id, Some(ItemId::new("r")));
        assert!(got.placement.order_key > 100.0 && got.placement.order_key < 200.0);
        assert_eq!(got.writes.len(), 1);
        assert!(!got.renumbered);
    }

    #[test]
    fn inside_appends_as_last_child() {
        let s = tree();
        let got = plan(&s, "c3", "r", MoveIntent::Inside).unwrap();
        assert_eq!(got.placement.parent_id, Some(ItemId::new("r")));
        assert!(got.placement.group_id.is_none());
        assert!(got.placement.order_key > 200.0);
    }

    #[test]
    fn inside_empty_target_takes_clock_key() {
        let s = tree();
        let got = plan(&s, "c3", "c2", MoveIntent::Inside).unwrap();
        assert!((got.placement.order_key - 5_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn self_drop_errors() {
        let s = tree();
        assert!(matches!(
            plan(&s, "r", "r", MoveIntent::Inside),
            Err(MoveError::CycleDetected { .. })
        ));
        assert!(matches!(
            plan(&s, "r", "r", MoveIntent::After),
            Err(MoveError::InvalidMove { .. })
        ));
    }

    #[test]
    fn inside_descendant_is_cycle() {
        let s = tree();
        assert!(matches!(
            plan(&s, "r", "gc", MoveIntent::Inside),
            Err(MoveError::CycleDetected { .. })
        ));
    }

    #[test]
    fn beside_descendant_is_cycle() {
        let s = tree();
        // gc's context is Parent(c1), and c1 is inside r.
        assert!(matches!(
            plan(&s, "r", "gc", MoveIntent::Before),
            Err(MoveError::CycleDetected { .. })
        ));
        // c2's context is Parent(r) itself.
        assert!(matches!(
            plan(&s, "r", "c2", MoveIntent::After),
            Err(MoveError::CycleDetected { .. })
        ));
    }

    #[test]
    fn group_roots_only_reorder() {
        let s = scope(
            vec![group_item("wp1", 10.0), item("t", None, Some("wp1"), 1.0)],
            vec![legacy("wp0", 20.0)],
        );
        assert!(matches!(
            plan(&s, "wp1", "wp0", MoveIntent::Inside),
            Err(MoveError::InvalidMove { .. })
        ));
        assert!(matches!(
            plan(&s, "wp0", "t", MoveIntent::Before),
            Err(MoveError::InvalidMove { .. })
        ));

        let got = plan(&s, "wp0", "wp1", MoveIntent::Before).unwrap();
        assert_eq!(
            got.writes,
            vec![NodeWrite::LegacyGroup {
                id: ItemId::new("wp0"),
                order_key: got.placement.order_key,
            }]
        );
        assert!(got.placement.order_key < 10.0);

        let got = plan(&s, "wp1", "wp0", MoveIntent::After).unwrap();
        assert_eq!(
            got.writes,
            vec![NodeWrite::Item {
                id: ItemId::new("wp1"),
                patch: ItemPatch::order_key_only(got.placement.order_key),
            }]
        );
    }

    #[test]
    fn group_into_group_root_member_list() {
        let s = scope(
            vec![
                group_item("wp", 10.0),
                item("m", None, Some("wp"), 1.0),
                item("t", None, None, 20.0),
            ],
            vec![],
        );
        let got = plan(&s, "t", "m", MoveIntent::After).unwrap();
        assert_eq!(got.placement.group_id, Some(ItemId::new("wp")));
        assert!(got.placement.parent_id.is_none());
    }

    #[test]
    fn orphans_cannot_move_or_be_targets() {
        let s = scope(
            vec![item("a", None, None, 1.0), item("o", Some("gone"), None, 1.0)],
            vec![],
        );
        assert!(matches!(
            plan(&s, "o", "a", MoveIntent::After),
            Err(MoveError::NotFound { id }) if id.as_str() == "gone"
        ));
        assert!(matches!(
            plan(&s, "a", "o", MoveIntent::Before),
            Err(MoveError::NotFound { .. })
        ));
        assert!(matches!(
            plan(&s, "a", "missing", MoveIntent::Before),
            Err(MoveError::NotFound { id }) if id.as_str() == "missing"
        ));
    }

    #[test]
    fn repeated_move_is_noop() {
        let s = tree();
        let got = plan(&s, "c2", "c1", MoveIntent::After).unwrap();
        assert!(got.is_noop());
        assert!((got.placement.order_key - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exhausted_gap_renumbers_before_moving() {
        let s = scope(
            vec![
                item("a", None, None, 10.0),
                item("b", None, None, 10.0),
                item("x", None, None, 99.0),
            ],
            vec![],
        );
        let got = plan(&s, "x", "b", MoveIntent::Before).unwrap();
        assert!(got.renumbered);
        let last = got.writes.last().unwrap();
        assert_eq!(last.id().as_str(), "x");
        assert!(got.writes.len() >= 2);
    }
}
