//! Fractional order-key allocation.
//!
//! # Overview
//!
//! A sibling group is ordered by a float `order_key`. Inserting a node at a
//! position picks the midpoint between its would-be neighbours, so a normal
//! move writes exactly one field on exactly one node and no other sibling is
//! touched.
//!
//! Let `p` be the previous sibling's key (or `anchor − Δ` when there is none)
//! and `n` the next sibling's key (or `anchor + Δ`). The new key is
//! `(p + n) / 2`. An empty group gets a fresh key from a [`KeyClock`].
//!
//! # Precision exhaustion
//!
//! Repeated bisection at one boundary halves the gap each time. Once the gap
//! drops to a few ulps at that magnitude (about 50 insertions for small keys,
//! fewer for timestamp-sized keys) the midpoint is no longer reliably
//! distinct from its neighbours. The allocator then returns
//! [`KeyAllocation::Renumber`]: an even respacing of the whole group with the
//! moved node spliced in, costing O(k) writes.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cast_precision_loss
)]

pub mod clock;

pub use clock::{FixedKeyClock, KeyClock, SystemKeyClock};

use crate::model::ItemId;

/// Default spacing (Δ) between neighbouring keys.
pub const DEFAULT_SPACING: f64 = 1000.0;

/// Minimum gap, in ulps at the key's magnitude, kept between a new key and
/// either neighbour.
const MIN_GAP_ULPS: f64 = 4.0;

/// One entry of a sibling list as the allocator sees it: id plus the
/// effective sort key, in render order.
#[derive(Debug, Clone, PartialEq)]
pub struct SiblingKey {
    pub id: ItemId,
    pub key: f64,
}

impl SiblingKey {
    pub fn new(id: impl Into<ItemId>, key: f64) -> Self {
        Self {
            id: id.into(),
            key,
        }
    }
}

/// Result of allocating a key for one insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAllocation {
    /// A key strictly between the neighbours; only the moved node changes.
    Key(f64),
    /// The gap was exhausted; the group must be respaced.
    Renumber(RenumberPlan),
}

impl KeyAllocation {
    /// The key the moved node ends up with.
    pub const fn moved_key(&self) -> f64 {
        match self {
            Self::Key(key) => *key,
            Self::Renumber(plan) => plan.moved_key,
        }
    }
}

/// Even respacing of a sibling group.
#[derive(Debug, Clone, PartialEq)]
pub struct RenumberPlan {
    /// Key for the moved node.
    pub moved_key: f64,
    /// New keys for existing siblings whose key changes.
    pub updates: Vec<SiblingKey>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderKeyAllocator {
    spacing: f64,
}

impl Default for OrderKeyAllocator {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
        }
    }
}

impl OrderKeyAllocator {
    /// Allocator with spacing Δ. Non-finite or non-positive spacing falls
    /// back to [`DEFAULT_SPACING`].
    pub fn new(spacing: f64) -> Self {
        if spacing.is_finite() && spacing > 0.0 {
            Self { spacing }
        } else {
            tracing::warn!(spacing, "invalid order-key spacing, using default");
            Self::default()
        }
    }

    pub const fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Midpoint between two neighbours, substituting `anchor ∓ Δ` for a
    /// missing side. Returns `None` when no representable key with enough
    /// room on both sides exists.
    pub fn between(&self, prev: Option<f64>, next: Option<f64>, anchor: f64) -> Option<f64> {
        let p = prev.unwrap_or(anchor - self.spacing);
        let n = next.unwrap_or(anchor + self.spacing);
        let mid = (p + n) / 2.0;
        has_room(p, mid, n).then_some(mid)
    }

    /// Allocate a key for inserting `moved` at `index` of `siblings`.
    ///
    /// `siblings` is the target group in render order with `moved` already
    /// excluded; `index` ranges over `0..=siblings.len()`.
    pub fn insert_at(
        &self,
        siblings: &[SiblingKey],
        index: usize,
        moved: &ItemId,
        clock: &mut dyn KeyClock,
    ) -> KeyAllocation {
        let index = index.min(siblings.len());
        let prev = index
            .checked_sub(1)
            .and_then(|i| siblings.get(i))
            .map(|s| s.key);
        let next = siblings.get(index).map(|s| s.key);

        let key = match (prev, next) {
            (None, None) => return KeyAllocation::Key(clock.next_key()),
            (Some(p), None) => self.between(Some(p), None, p),
            (None, Some(n)) => self.between(None, Some(n), n),
            (Some(p), Some(n)) => self.between(Some(p), Some(n), p),
        };

        match key {
            Some(key) => KeyAllocation::Key(key),
            None => {
                tracing::warn!(
                    moved = %moved,
                    index,
                    siblings = siblings.len(),
                    "order-key precision exhausted, renumbering sibling group"
                );
                KeyAllocation::Renumber(self.renumber(siblings, index))
            }
        }
    }

    /// Allocate a key for appending after the last sibling.
    pub fn append(
        &self,
        siblings: &[SiblingKey],
        moved: &ItemId,
        clock: &mut dyn KeyClock,
    ) -> KeyAllocation {
        self.insert_at(siblings, siblings.len(), moved, clock)
    }

    /// Respace `siblings` evenly from the first existing key, leaving slot
    /// `index` for the moved node.
    pub fn renumber(&self, siblings: &[SiblingKey], index: usize) -> RenumberPlan {
        let base = siblings
            .first()
            .map(|s| s.key)
            .filter(|k| k.is_finite())
            .unwrap_or(0.0);
        let index = index.min(siblings.len());
        let slot = |position: usize| base + position as f64 * self.spacing;

        let updates = siblings
            .iter()
            .enumerate()
            .filter_map(|(i, sibling)| {
                let position = if i < index { i } else { i + 1 };
                let key = slot(position);
                (key.total_cmp(&sibling.key).is_ne()).then(|| SiblingKey {
                    id: sibling.id.clone(),
                    key,
                })
            })
            .collect();

        RenumberPlan {
            moved_key: slot(index),
            updates,
        }
    }
}

/// `mid` lies strictly inside `(p, n)` with at least [`MIN_GAP_ULPS`] ulps
/// to spare on each side.
fn has_room(p: f64, mid: f64, n: f64) -> bool {
    if !(p.is_finite() && mid.is_finite() && n.is_finite()) {
        return false;
    }
    let floor = mid.abs().max(p.abs()).max(n.abs()).max(1.0) * f64::EPSILON * MIN_GAP_ULPS;
    p < mid && mid < n && mid - p > floor && n - mid > floor
}
