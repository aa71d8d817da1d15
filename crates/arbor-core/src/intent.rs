//! Drag intent classification.
//!
//! # Overview
//!
//! While a node is dragged, every hover tick maps the pointer's vertical
//! offset within the hovered row to a [`DropZone`]. The split depends on
//! what is being dragged over what:
//!
//! | dragged    | target     | same context | target top-level | mode  |
//! |------------|------------|--------------|------------------|-------|
//! | group root | group root | any          | any              | two   |
//! | any        | any        | yes          | no               | two   |
//! | otherwise  |            |              |                  | three |
//!
//! Two-zone splits at 50% into before/after. Three-zone gives the top 25%
//! to before, the bottom 25% to after, and the middle 50% to inside. Plain
//! reordering inside one nested list gets the larger two-zone target;
//! "inside" is only offered where it cannot be hit by accident during a
//! reorder.
//!
//! Dragging a node over itself, or releasing outside the hovered row,
//! yields [`DropZone::None`], which has no [`MoveIntent`] and so can never
//! reach the move executor.
//!
//! Ambient drag state lives in a [`DragSession`] value owned by the caller.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::MoveError;
use crate::model::item::ParseEnumError;
use crate::model::{ItemId, ItemKind, SiblingContext};
use crate::tree::Scope;

/// Where a drop would land relative to the hovered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropZone {
    Before,
    After,
    Inside,
    None,
}

impl DropZone {
    /// The move this zone requests, if any.
    pub const fn as_intent(self) -> Option<MoveIntent> {
        match self {
            Self::Before => Some(MoveIntent::Before),
            Self::After => Some(MoveIntent::After),
            Self::Inside => Some(MoveIntent::Inside),
            Self::None => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Inside => "inside",
            Self::None => "none",
        }
    }
}

impl fmt::Display for DropZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A drop the move executor can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveIntent {
    Before,
    After,
    Inside,
}

impl MoveIntent {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Inside => "inside",
        }
    }
}

impl fmt::Display for MoveIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveIntent {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "inside" => Ok(Self::Inside),
            _ => Err(ParseEnumError {
                expected: "intent",
                got: s.to_string(),
            }),
        }
    }
}

/// Row geometry of the hovered node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Pointer offset as a fraction of the row height, or `None` when the
    /// row is degenerate or the pointer is outside it.
    pub fn fraction(&self, pointer_y: f64) -> Option<f64> {
        if !(self.height.is_finite() && self.height > 0.0 && self.top.is_finite()) {
            return None;
        }
        let offset = pointer_y - self.top;
        (offset.is_finite() && (0.0..=self.height).contains(&offset))
            .then(|| offset / self.height)
    }
}

/// What the classifier needs to know about the dragged or hovered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragDescriptor {
    pub id: ItemId,
    pub context: SiblingContext,
    pub level: usize,
    pub kind: ItemKind,
}

impl DragDescriptor {
    /// Describe a node as it currently sits in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::NotFound`] if `id` is not in the scope.
    pub fn from_scope(scope: &Scope, id: &ItemId) -> Result<Self, MoveError> {
        let node = scope.resolve(id)?;
        Ok(Self {
            id: node.id.clone(),
            context: node.context.clone(),
            level: scope.level(id),
            kind: node.kind,
        })
    }

    pub const fn is_top_level(&self) -> bool {
        self.level == 0
    }
}

/// How a hovered row is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneMode {
    /// 50/50 before/after; never inside.
    TwoZone,
    /// 25/50/25 before/inside/after.
    ThreeZone,
}

/// The decision table from the module docs.
pub const fn zone_mode(
    dragged: ItemKind,
    target: ItemKind,
    same_context: bool,
    target_top_level: bool,
) -> ZoneMode {
    match (dragged, target, same_context, target_top_level) {
        (ItemKind::GroupRoot, ItemKind::GroupRoot, _, _) | (_, _, true, false) => {
            ZoneMode::TwoZone
        }
        _ => ZoneMode::ThreeZone,
    }
}

/// Classify one hover tick. Pure.
pub fn classify_intent(
    bounds: Bounds,
    pointer_y: f64,
    dragged: &DragDescriptor,
    target: &DragDescriptor,
) -> DropZone {
    if dragged.id == target.id {
        return DropZone::None;
    }
    let Some(fraction) = bounds.fraction(pointer_y) else {
        return DropZone::None;
    };

    let mode = zone_mode(
        dragged.kind,
        target.kind,
        dragged.context == target.context,
        target.is_top_level(),
    );

    match mode {
        ZoneMode::TwoZone => {
            if fraction < 0.5 {
                DropZone::Before
            } else {
                DropZone::After
            }
        }
        ZoneMode::ThreeZone => {
            if fraction < 0.25 {
                DropZone::Before
            } else if fraction > 0.75 {
                DropZone::After
            } else {
                DropZone::Inside
            }
        }
    }
}

/// A drop that passed classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest {
    pub dragged: ItemId,
    pub target: ItemId,
    pub intent: MoveIntent,
}

/// One pointer drag, owned by the presentation layer.
///
/// Hover ticks overwrite the armed intent (last write wins). Only
/// [`DragSession::release`] yields something the move executor may act on;
/// releasing with nothing armed is the cancellation path.
#[derive(Debug, Clone)]
pub struct DragSession {
    dragged: DragDescriptor,
    armed: Option<(ItemId, DropZone)>,
}

impl DragSession {
    pub const fn start(dragged: DragDescriptor) -> Self {
        Self {
            dragged,
            armed: None,
        }
    }

    pub const fn dragged(&self) -> &DragDescriptor {
        &self.dragged
    }

    /// Classify a hover over `target` and arm the result.
    pub fn hover(&mut self, bounds: Bounds, pointer_y: f64, target: &DragDescriptor) -> DropZone {
        let zone = classify_intent(bounds, pointer_y, &self.dragged, target);
        self.armed = match zone {
            DropZone::None => None,
            armed => Some((target.id.clone(), armed)),
        };
        tracing::trace!(dragged = %self.dragged.id, target = %target.id, %zone, "hover");
        zone
    }

    /// The pointer left every row.
    pub fn leave(&mut self) {
        self.armed = None;
    }

    pub fn armed(&self) -> Option<(&ItemId, DropZone)> {
        self.armed.as_ref().map(|(id, zone)| (id, *zone))
    }

    /// Abandon the drag without a drop.
    pub fn cancel(self) {
        tracing::trace!(dragged = %self.dragged.id, "drag cancelled");
    }

    /// End the drag. `None` means nothing valid was armed.
    pub fn release(self) -> Option<DropRequest> {
        let (target, zone) = self.armed?;
        let intent = zone.as_intent()?;
        Some(DropRequest {
            dragged: self.dragged.id,
            target,
            intent,
        })
    }
}
