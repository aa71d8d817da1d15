//! The resolved, project-scoped tree a move is planned against.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::SiblingIndex;
use crate::error::MoveError;
use crate::legacy::LegacyGroupMerger;
use crate::model::{ItemId, NodeView, ProjectId, SiblingContext};
use crate::order::SiblingKey;
use crate::repo::Snapshot;

/// One row of the flattened, depth-first render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub id: ItemId,
    pub level: usize,
    /// Rendered at top level only because its declared parent/group is
    /// missing from the scope (or unreachable from the root).
    pub synthetic: bool,
}

#[derive(Debug, Clone)]
pub struct Scope {
    project: ProjectId,
    nodes: HashMap<ItemId, NodeView>,
    index: SiblingIndex,
}

impl Scope {
    pub fn new(project: ProjectId, nodes: Vec<NodeView>) -> Self {
        let index = SiblingIndex::build(&nodes);
        let nodes = nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        Self {
            project,
            nodes,
            index,
        }
    }

    /// Merge both collections of a snapshot and index them.
    pub fn from_snapshot(project: &ProjectId, snapshot: &Snapshot) -> Self {
        let nodes = LegacyGroupMerger::new(project).merge_snapshot(snapshot);
        Self::new(project.clone(), nodes)
    }

    pub const fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub const fn index(&self) -> &SiblingIndex {
        &self.index
    }

    pub fn get(&self, id: &ItemId) -> Option<&NodeView> {
        self.nodes.get(id)
    }

    /// Look up a node that a move refers to.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::NotFound`] if `id` is not in this scope.
    pub fn resolve(&self, id: &ItemId) -> Result<&NodeView, MoveError> {
        self.get(id).ok_or_else(|| MoveError::not_found(id))
    }

    /// Check that `ctx` is a legal move context: root, or anchored on a node
    /// inside the scope.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::NotFound`] naming the missing anchor.
    pub fn resolve_context(&self, ctx: &SiblingContext) -> Result<(), MoveError> {
        match ctx.anchor() {
            None => Ok(()),
            Some(anchor) if self.nodes.contains_key(anchor) => Ok(()),
            Some(anchor) => Err(MoveError::not_found(anchor)),
        }
    }

    /// Nodes of `ctx` in render order.
    pub fn siblings(&self, ctx: &SiblingContext) -> Vec<&NodeView> {
        self.index
            .siblings(ctx)
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Effective keys of `ctx` in render order, without `exclude`.
    pub fn sibling_keys(&self, ctx: &SiblingContext, exclude: &ItemId) -> Vec<SiblingKey> {
        self.siblings(ctx)
            .into_iter()
            .filter(|n| &n.id != exclude)
            .map(|n| SiblingKey {
                id: n.id.clone(),
                key: n.sort_key(),
            })
            .collect()
    }

    /// Top-level nodes from both collections, uniformly ordered.
    pub fn top_level(&self) -> Vec<&NodeView> {
        self.siblings(&SiblingContext::Root)
    }

    /// Group members first, then nested children.
    pub fn children_of(&self, id: &ItemId) -> Vec<&NodeView> {
        let mut children = self.siblings(&SiblingContext::Group(id.clone()));
        children.extend(self.siblings(&SiblingContext::Parent(id.clone())));
        children
    }

    /// Ancestor chain from the immediate parent (or group) up to the root.
    ///
    /// Stops at a missing node or at a repeat, so malformed data cannot loop.
    pub fn ancestors(&self, id: &ItemId) -> Vec<&NodeView> {
        let mut chain = Vec::new();
        let mut visited: HashSet<&ItemId> = HashSet::new();
        let Some(start) = self.nodes.get(id) else {
            return chain;
        };
        visited.insert(&start.id);

        let mut next = start.context.anchor();
        while let Some(anchor) = next {
            let Some(node) = self.nodes.get(anchor) else {
                break;
            };
            if !visited.insert(&node.id) {
                break;
            }
            chain.push(node);
            next = node.context.anchor();
        }
        chain
    }

    /// `true` if `ancestor` appears on `node`'s ancestor chain.
    pub fn is_descendant(&self, node: &ItemId, ancestor: &ItemId) -> bool {
        self.ancestors(node).iter().any(|n| &n.id == ancestor)
    }

    /// Tree depth; top-level nodes (and synthetic roots) are level 0.
    pub fn level(&self, id: &ItemId) -> usize {
        self.ancestors(id).len()
    }

    /// Depth-first flattening for display. Synthetic roots, and anything
    /// unreachable from the root (a pointer cycle), are appended at level 0.
    pub fn render_order(&self) -> Vec<TreeRow> {
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut visited: HashSet<ItemId> = HashSet::new();

        for node in self.top_level() {
            self.walk(&node.id, 0, false, &mut rows, &mut visited);
        }
        for id in self.index.synthetic_roots() {
            self.walk(id, 0, true, &mut rows, &mut visited);
        }

        let mut unreachable: Vec<&NodeView> = self
            .nodes
            .values()
            .filter(|n| !visited.contains(&n.id))
            .collect();
        unreachable.sort_by(|a, b| a.render_cmp(b));
        for node in unreachable {
            self.walk(&node.id, 0, true, &mut rows, &mut visited);
        }
        rows
    }

    fn walk(
        &self,
        id: &ItemId,
        level: usize,
        synthetic: bool,
        rows: &mut Vec<TreeRow>,
        visited: &mut HashSet<ItemId>,
    ) {
        if !visited.insert(id.clone()) {
            return;
        }
        rows.push(TreeRow {
            id: id.clone(),
            level,
            synthetic,
        });
        for child in self.children_of(id) {
            self.walk(&child.id, level + 1, false, rows, visited);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupRoot, ItemKind, WorkItem};
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

    fn scope() -> Scope {
        let snapshot = Snapshot {
            items: vec![
                item("r", None, None, 10.0),
                item("c1", Some("r"), None, 100.0),
                item("c2", Some("r"), None, 200.0),
                item("gc", Some("c1"), None, 1.0),
                item("m", None, Some("wp"), 1.0),
                item("orphan", Some("elsewhere"), None, 1.0),
            ],
            group_roots: vec![GroupRoot {
                id: ItemId::new("wp"),
                project_id: ProjectId::new("p"),
                title: "WP".into(),
                order_key: Some(5.0),
                created_at: Utc.timestamp_millis_opt(0).unwrap(),
            }],
        };
        Scope::from_snapshot(&ProjectId::new("p"), &snapshot)
    }

    #[test]
    fn ancestors_walk_parents_and_groups() {
        let s = scope();
        let chain: Vec<_> = s
            .ancestors(&ItemId::new("gc"))
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(chain, vec!["c1", "r"]);
        assert_eq!(s.level(&ItemId::new("gc")), 2);
        assert_eq!(s.level(&ItemId::new("m")), 1);
        assert!(s.is_descendant(&ItemId::new("m"), &ItemId::new("wp")));
        assert!(!s.is_descendant(&ItemId::new("r"), &ItemId::new("gc")));
    }

    #[test]
    fn orphan_context_does_not_resolve() {
        let s = scope();
        let orphan = s.resolve(&ItemId::new("orphan")).unwrap();
        assert_eq!(s.level(&orphan.id), 0);
        let err = s.resolve_context(&orphan.context).unwrap_err();
        assert!(matches!(err, MoveError::NotFound { id } if id.as_str() == "elsewhere"));
        assert!(s.resolve_context(&SiblingContext::Root).is_ok());
    }

    #[test]
    fn render_order_is_depth_first() {
        let s = scope();
        let rows: Vec<_> = s
            .render_order()
            .into_iter()
            .map(|r| (r.id.as_str().to_string(), r.level, r.synthetic))
            .collect();
        let expect = vec![
            ("wp".to_string(), 0, false),
            ("m".to_string(), 1, false),
            ("r".to_string(), 0, false),
            ("c1".to_string(), 1, false),
            ("gc".to_string(), 2, false),
            ("c2".to_string(), 1, false),
            ("orphan".to_string(), 0, true),
        ];
        assert_eq!(rows, expect);
    }

    #[test]
    fn pointer_cycles_still_render_once() {
        let snapshot = Snapshot {
            items: vec![item("a", Some("b"), None, 1.0), item("b", Some("a"), None, 2.0)],
            group_roots: vec![],
        };
        let s = Scope::from_snapshot(&ProjectId::new("p"), &snapshot);
        let rows = s.render_order();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].synthetic);
        assert_eq!(s.ancestors(&ItemId::new("a")).len(), 1);
    }

    #[test]
    fn sibling_keys_exclude_dragged() {
        let s = scope();
        let keys = s.sibling_keys(&SiblingContext::Parent(ItemId::new("r")), &ItemId::new("c1"));
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].id.as_str(), "c2");
    }
}
