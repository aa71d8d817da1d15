use arbor_core::error::MoveError;
use arbor_core::intent::MoveIntent;
use arbor_core::model::{ItemId, SiblingContext};
use arbor_core::mover::MoveExecutor;
use arbor_core::order::{FixedKeyClock, OrderKeyAllocator};
use arbor_core::repo::{MemoryRepository, Snapshot};
use arbor_core::tree::Scope;
use arbor_core::validate::check_snapshot;
use proptest::prelude::*;

use generators::*;

type Executor = MoveExecutor<MemoryRepository, FixedKeyClock>;

fn executor(snapshot: Snapshot) -> Executor {
    MoveExecutor::new(
        MemoryRepository::new(snapshot),
        FixedKeyClock::new(1_000_000.0, 1.0),
        OrderKeyAllocator::default(),
        project(),
    )
}

fn position(scope: &Scope, id: &ItemId) -> (SiblingContext, usize) {
    let node = scope.get(id).unwrap();
    let index = scope.index().position(&node.context, id).unwrap();
    (node.context.clone(), index)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn any_gesture_sequence_keeps_board_valid(
        snapshot in arb_snapshot(),
        gestures in prop::collection::vec(arb_gesture(), 1..24),
    ) {
        let ids = all_ids(&snapshot);
        let mut ex = executor(snapshot);

        for (a, b, intent) in gestures {
            let dragged = &ids[a.index(ids.len())];
            let target = &ids[b.index(ids.len())];
            let before = ex.repository().state().clone();

            match ex.move_node(dragged, target, intent) {
                Ok(_) => {}
                Err(err) => {
                    prop_assert!(err.is_rejection(), "unexpected {err}");
                    prop_assert_eq!(ex.repository().state(), &before);
                }
            }

            let violations = check_snapshot(ex.repository().state(), &project());
            prop_assert!(violations.is_empty(), "{:?}", violations);
        }
    }

    #[test]
    fn repeating_a_move_keeps_position(
        snapshot in arb_snapshot(),
        gesture in arb_gesture(),
    ) {
        let ids = all_ids(&snapshot);
        let (a, b, intent) = gesture;
        let dragged = ids[a.index(ids.len())].clone();
        let target = ids[b.index(ids.len())].clone();
        let mut ex = executor(snapshot);

        if ex.move_node(&dragged, &target, intent).is_ok() {
            let first = position(&ex.scope().unwrap(), &dragged);
            let writes = ex.repository().write_count();

            ex.move_node(&dragged, &target, intent).unwrap();
            let second = position(&ex.scope().unwrap(), &dragged);

            prop_assert_eq!(first, second);
            prop_assert_eq!(ex.repository().write_count(), writes);
        }
    }

    #[test]
    fn inside_own_subtree_is_always_a_cycle(
        snapshot in arb_snapshot(),
        pick in any::<prop::sample::Index>(),
    ) {
        let ids = all_ids(&snapshot);
        let mut ex = executor(snapshot);
        let scope = ex.scope().unwrap();
        let dragged = &ids[pick.index(ids.len())];

        let mut targets: Vec<ItemId> = ids
            .iter()
            .filter(|id| scope.is_descendant(id, dragged))
            .cloned()
            .collect();
        targets.push(dragged.clone());

        for target in targets {
            let err = ex.move_node(dragged, &target, MoveIntent::Inside).unwrap_err();
            prop_assert!(matches!(err, MoveError::CycleDetected { .. }), "{err}");
        }
        prop_assert_eq!(ex.repository().write_count(), 0);
    }

    #[test]
    fn failed_writes_leave_rebuilt_tree_identical(
        snapshot in arb_snapshot(),
        gesture in arb_gesture(),
    ) {
        let ids = all_ids(&snapshot);
        let (a, b, intent) = gesture;
        let mut ex = executor(snapshot);
        let before = ex.scope().unwrap().render_order();
        ex.repository_mut().fail_writes("store offline");

        let dragged = &ids[a.index(ids.len())];
        let target = &ids[b.index(ids.len())];
        if ex.move_node(dragged, target, intent).is_ok() {
            // Only a no-op can succeed against a failing store.
            prop_assert_eq!(ex.repository().write_count(), 0);
        }
        prop_assert_eq!(ex.scope().unwrap().render_order(), before);
    }

    #[test]
    fn failed_renumber_leaves_rebuilt_tree_identical(
        siblings in 3_usize..9,
        pick in any::<prop::sample::Index>(),
        after in any::<bool>(),
        allowed in 0_usize..8,
    ) {
        // Equal keys leave no gap, so every drop among them renumbers.
        let mut items: Vec<_> = (0..siblings)
            .map(|n| item(&format!("s{n}"), None, None, 10.0))
            .collect();
        items.push(item("x", None, None, 1e9));
        let mut ex = executor(Snapshot { items, group_roots: vec![] });

        let dragged = ItemId::new("x");
        let target = ItemId::new(format!("s{}", pick.index(siblings)));
        let intent = if after { MoveIntent::After } else { MoveIntent::Before };
        let planned = ex.plan(&dragged, &target, intent).unwrap();
        prop_assume!(planned.renumbered);

        let before = ex.repository().state().clone();
        let order = ex.scope().unwrap().render_order();
        ex.repository_mut().fail_after(allowed, "disk full");

        match ex.move_node(&dragged, &target, intent) {
            Ok(_) => prop_assert!(allowed >= planned.writes.len()),
            Err(err) => {
                prop_assert!(!err.is_rejection(), "unexpected {err}");
                prop_assert!(allowed < planned.writes.len());
                prop_assert_eq!(ex.repository().state(), &before);
                prop_assert_eq!(ex.scope().unwrap().render_order(), order);
                prop_assert_eq!(ex.repository().write_count(), 0);
            }
        }
    }
}
