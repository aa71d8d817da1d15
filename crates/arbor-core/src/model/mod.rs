//! Work-item records and the normalized node view the engine operates on.

pub mod item;
pub mod view;

pub use item::{
    Collection, GroupRoot, ItemId, ItemKind, Placement, ProjectId, SiblingContext, WorkItem,
};
pub use view::NodeView;
