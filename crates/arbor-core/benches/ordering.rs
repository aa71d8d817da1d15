use arbor_core::intent::MoveIntent;
use arbor_core::model::{ItemId, ItemKind, ProjectId, WorkItem};
use arbor_core::mover::plan_move;
use arbor_core::order::{FixedKeyClock, OrderKeyAllocator, SiblingKey};
use arbor_core::repo::Snapshot;
use arbor_core::tree::Scope;
use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const SIZES: [usize; 3] = [100, 1_000, 10_000];

/// A board of `n` items: a tenth at top level, the rest spread under them.
#[allow(clippy::cast_precision_loss)]
fn board(n: usize) -> Snapshot {
    let roots = (n / 10).max(1);
    let items = (0..n)
        .map(|i| WorkItem {
            id: ItemId::new(format!("ar-{i}")),
            project_id: ProjectId::new("bench"),
            title: String::new(),
            kind: ItemKind::Generic,
            parent_id: (i >= roots).then(|| ItemId::new(format!("ar-{}", i % roots))),
            group_id: None,
            order_key: Some(i as f64 * 1000.0),
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
        })
        .collect();
    Snapshot {
        items,
        group_roots: Vec::new(),
    }
}

fn bench_scope_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree.build");
    let project = ProjectId::new("bench");

    for n in SIZES {
        let snapshot = board(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &snapshot, |b, snapshot| {
            b.iter(|| {
                let scope = Scope::from_snapshot(&project, snapshot);
                black_box(scope.render_order().len())
            });
        });
    }

    group.finish();
}

#[allow(clippy::cast_precision_loss)]
fn bench_key_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("order.insert_at");
    let alloc = OrderKeyAllocator::default();
    let moved = ItemId::new("moved");

    for n in SIZES {
        let siblings: Vec<SiblingKey> = (0..n)
            .map(|i| SiblingKey::new(ItemId::new(format!("s{i}")), i as f64 * 1000.0))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &siblings, |b, siblings| {
            let mut clock = FixedKeyClock::new(0.0, 1.0);
            b.iter(|| black_box(alloc.insert_at(siblings, siblings.len() / 2, &moved, &mut clock)));
        });
    }

    group.finish();
}

fn bench_plan_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("mover.plan");
    let project = ProjectId::new("bench");
    let alloc = OrderKeyAllocator::default();

    for n in SIZES {
        let scope = Scope::from_snapshot(&project, &board(n));
        let dragged = ItemId::new(format!("ar-{}", n - 1));
        let target = ItemId::new("ar-0");
        group.bench_with_input(BenchmarkId::from_parameter(n), &scope, |b, scope| {
            let mut clock = FixedKeyClock::new(0.0, 1.0);
            b.iter(|| {
                black_box(plan_move(
                    scope,
                    &alloc,
                    &mut clock,
                    &dragged,
                    &target,
                    MoveIntent::Inside,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scope_build, bench_key_allocation, bench_plan_move);
criterion_main!(benches);
