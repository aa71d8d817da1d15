use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Opaque identity of a work item or legacy group root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of the project a tree is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The two node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// An ordinary task that may nest and be nested.
    Generic,
    /// A coarse top-level grouping ("work package"). Never nested.
    GroupRoot,
}

impl ItemKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::GroupRoot => "group_root",
        }
    }
}

/// Which persisted collection a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Current-model work items (generic items and flagged group roots).
    Items,
    /// The older standalone group-root collection.
    LegacyGroups,
}

impl Collection {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::LegacyGroups => "legacy_groups",
        }
    }
}

/// The key of one sibling list.
///
/// Order keys are only comparable between nodes sharing a context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SiblingContext {
    /// Top-level nodes of the project.
    Root,
    /// Children nested under a parent item.
    Parent(ItemId),
    /// Members of a flat group (work package).
    Group(ItemId),
}

impl SiblingContext {
    /// Derive a context from a node's pointers. `parent_id` wins if both are
    /// set, which only happens in malformed data.
    #[must_use]
    pub fn from_pointers(parent_id: Option<&ItemId>, group_id: Option<&ItemId>) -> Self {
        match (parent_id, group_id) {
            (Some(parent), _) => Self::Parent(parent.clone()),
            (None, Some(group)) => Self::Group(group.clone()),
            (None, None) => Self::Root,
        }
    }

    /// The node this context hangs off, if any.
    #[must_use]
    pub const fn anchor(&self) -> Option<&ItemId> {
        match self {
            Self::Root => None,
            Self::Parent(id) | Self::Group(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// The `(parent_id, group_id)` pair a node placed in this context carries.
    #[must_use]
    pub fn pointers(&self) -> (Option<ItemId>, Option<ItemId>) {
        match self {
            Self::Root => (None, None),
            Self::Parent(id) => (Some(id.clone()), None),
            Self::Group(id) => (None, Some(id.clone())),
        }
    }
}

impl fmt::Display for SiblingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Parent(id) => write!(f, "parent:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// A node in the current-model collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: ItemId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub title: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub parent_id: Option<ItemId>,
    #[serde(default)]
    pub group_id: Option<ItemId>,
    #[serde(default)]
    pub order_key: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl WorkItem {
    /// The sibling list this item currently belongs to.
    #[must_use]
    pub fn context(&self) -> SiblingContext {
        SiblingContext::from_pointers(self.parent_id.as_ref(), self.group_id.as_ref())
    }

    #[must_use]
    pub fn is_group_root(&self) -> bool {
        self.kind == ItemKind::GroupRoot
    }
}

/// A record from the legacy standalone group-root collection.
///
/// Legacy group roots are always top-level and carry no parent or group
/// pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRoot {
    pub id: ItemId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order_key: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// The three mutable fields a move produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub parent_id: Option<ItemId>,
    pub group_id: Option<ItemId>,
    pub order_key: f64,
}

impl Placement {
    /// Placement of a node at `order_key` inside `context`.
    #[must_use]
    pub fn in_context(context: &SiblingContext, order_key: f64) -> Self {
        let (parent_id, group_id) = context.pointers();
        Self {
            parent_id,
            group_id,
            order_key,
        }
    }

    #[must_use]
    pub fn context(&self) -> SiblingContext {
        SiblingContext::from_pointers(self.parent_id.as_ref(), self.group_id.as_ref())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "generic" | "item" | "task" => Ok(Self::Generic),
            "group_root" | "group" | "work_package" => Ok(Self::GroupRoot),
            _ => Err(ParseEnumError {
                expected: "kind",
                got: s.to_string(),
            }),
        }
    }
}
