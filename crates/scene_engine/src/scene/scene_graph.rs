//! Scene graph arena
//!
//! Model nodes live in a slotmap arena and are addressed by [`NodeHandle`].
//! A node's `parent` is a plain handle and its `children` an ordered list of
//! handles, so the hierarchy needs no reference counting. Names map to
//! handles in insertion order, which is also the order roots are rendered in.

use indexmap::IndexMap;
use thiserror::Error;

use super::model_node::ModelNode;
use crate::foundation::collections::{NodeArena, NodeHandle};
use crate::foundation::math::Vec3;

/// Errors raised when linking nodes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// No node is registered under the name
    #[error("no model named '{0}'")]
    MissingNode(String),
    /// A node cannot be its own parent
    #[error("model '{0}' cannot be its own child")]
    SelfParent(String),
    /// The child is already an ancestor of the parent
    #[error("attaching '{child}' under '{parent}' would create a cycle")]
    Cycle {
        /// Requested parent
        parent: String,
        /// Requested child
        child: String,
    },
}

/// Named model nodes of one scene and the links between them
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: NodeArena<ModelNode>,
    names: IndexMap<String, NodeHandle>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under its name.
    ///
    /// A node already registered under that name is removed first (its links
    /// are broken); the name keeps its original position in the render order.
    pub fn insert(&mut self, node: ModelNode) -> NodeHandle {
        let name = node.name().to_string();
        if self.names.contains_key(&name) {
            log::debug!("Replacing model '{}'", name);
            self.remove_node(&name);
        }
        let handle = self.nodes.insert(node);
        self.names.insert(name, handle);
        handle
    }

    /// Remove a node, detaching it from its parent and turning its children into roots
    pub fn remove(&mut self, name: &str) -> Option<ModelNode> {
        let node = self.remove_node(name)?;
        self.names.shift_remove(name);
        Some(node)
    }

    /// Unlink and drop the node but keep its name slot
    fn remove_node(&mut self, name: &str) -> Option<ModelNode> {
        let handle = *self.names.get(name)?;
        self.unlink_parent(handle);
        let children = self.nodes.get(handle).map(|n| n.children.clone())?;
        for child in children {
            self.unlink_parent(child);
        }
        self.nodes.remove(handle)
    }

    /// Handle of a named node
    pub fn handle(&self, name: &str) -> Option<NodeHandle> {
        self.names.get(name).copied()
    }

    /// Whether a node is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Named node
    pub fn get(&self, name: &str) -> Option<&ModelNode> {
        self.handle(name).and_then(|h| self.nodes.get(h))
    }

    /// Named node, mutable
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModelNode> {
        let handle = self.handle(name)?;
        self.nodes.get_mut(handle)
    }

    /// Node behind a handle
    pub fn node(&self, handle: NodeHandle) -> Option<&ModelNode> {
        self.nodes.get(handle)
    }

    /// Node behind a handle, mutable
    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut ModelNode> {
        self.nodes.get_mut(handle)
    }

    /// Node names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Nodes without a parent, in insertion order
    pub fn roots(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.names
            .values()
            .copied()
            .filter(|&h| self.nodes.get(h).is_some_and(|n| n.parent.is_none()))
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// No nodes yet
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Attach `child` below `parent`, placing it at `offset` from the parent.
    ///
    /// Both nodes switch to attached transforms. A child that already had a
    /// parent is moved; it is appended to the end of the new parent's children.
    pub fn attach(&mut self, parent: &str, child: &str, offset: Vec3) -> Result<(), HierarchyError> {
        let parent_handle = self
            .handle(parent)
            .ok_or_else(|| HierarchyError::MissingNode(parent.to_string()))?;
        let child_handle = self
            .handle(child)
            .ok_or_else(|| HierarchyError::MissingNode(child.to_string()))?;

        if parent_handle == child_handle {
            return Err(HierarchyError::SelfParent(child.to_string()));
        }
        if self.is_ancestor(child_handle, parent_handle) {
            return Err(HierarchyError::Cycle {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        self.unlink_parent(child_handle);

        if let Some(parent_node) = self.nodes.get_mut(parent_handle) {
            parent_node.transform_mut().attach();
            parent_node.children.push(child_handle);
        }
        if let Some(child_node) = self.nodes.get_mut(child_handle) {
            child_node.transform_mut().attach();
            child_node.parent = Some(parent_handle);
            child_node.set_from_parent_translate(offset);
        }
        log::debug!("Attached '{}' under '{}' at {:?}", child, parent, offset);
        Ok(())
    }

    /// Detach `child` from its parent. Returns whether it had one.
    pub fn detach(&mut self, child: &str) -> Result<bool, HierarchyError> {
        let handle = self
            .handle(child)
            .ok_or_else(|| HierarchyError::MissingNode(child.to_string()))?;
        Ok(self.unlink_parent(handle))
    }

    /// Whether `ancestor` is `node` or lies on the parent chain above it
    fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    /// Break the link between `handle` and its parent, restoring standalone
    /// transforms on whichever side is left without links
    fn unlink_parent(&mut self, handle: NodeHandle) -> bool {
        let Some(parent) = self.nodes.get_mut(handle).and_then(|n| n.parent.take()) else {
            return false;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&c| c != handle);
        }
        self.settle(parent);
        self.settle(handle);
        true
    }

    fn settle(&mut self, handle: NodeHandle) {
        if let Some(node) = self.nodes.get_mut(handle) {
            if node.parent.is_none() && node.children.is_empty() {
                node.transform_mut().detach();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::LoadedModel;
    use crate::foundation::math::Axis;
    use crate::render::{GeometryBuffer, VertexFormat};

    fn graph_with(names: &[&str]) -> SceneGraph {
        let mut graph = SceneGraph::new();
        for name in names {
            let geometry = GeometryBuffer::new(Vec::new(), Vec::new(), VertexFormat::BARE, None);
            graph.insert(ModelNode::new(*name, LoadedModel::from_geometry(geometry)));
        }
        graph
    }

    fn root_names(graph: &SceneGraph) -> Vec<&str> {
        graph
            .roots()
            .filter_map(|h| graph.node(h).map(ModelNode::name))
            .collect()
    }

    #[test]
    fn test_attach_switches_both_nodes_to_hierarchy() {
        let mut graph = graph_with(&["sun", "earth", "moon"]);
        graph.attach("sun", "earth", Vec3::new(5.0, 0.0, 0.0)).unwrap();

        assert!(graph.get("sun").unwrap().is_hierarchical());
        assert!(graph.get("earth").unwrap().is_hierarchical());
        assert!(!graph.get("moon").unwrap().is_hierarchical());
        assert_eq!(root_names(&graph), vec!["sun", "moon"]);

        // Child's translate accessor now reaches the from-parent offset
        let earth = graph.get_mut("earth").unwrap();
        assert_eq!(earth.translate(Axis::X), 5.0);
        earth.set_translate(Axis::X, 8.0);
        assert_eq!(earth.transform().translate().x, 8.0);
    }

    #[test]
    fn test_attach_leaves_parent_in_place() {
        let mut graph = graph_with(&["sun", "earth"]);
        {
            let sun = graph.get_mut("sun").unwrap();
            sun.set_translate(Axis::X, 5.0);
            sun.set_rotate(Axis::Z, 90.0);
        }
        let before = graph.get("sun").unwrap().model_matrix();
        graph.attach("sun", "earth", Vec3::new(1.0, 0.0, 0.0)).unwrap();

        let sun = graph.get("sun").unwrap();
        assert_eq!(sun.model_matrix(), before);
        assert_eq!(sun.translate(Axis::X), 0.0);
        assert_eq!(sun.from_parent_matrix(), crate::foundation::math::Mat4::identity());
    }

    #[test]
    fn test_children_keep_attachment_order() {
        let mut graph = graph_with(&["root", "b", "a"]);
        graph.attach("root", "b", Vec3::zeros()).unwrap();
        graph.attach("root", "a", Vec3::zeros()).unwrap();

        let root = graph.get("root").unwrap();
        let names: Vec<&str> = root
            .children()
            .iter()
            .filter_map(|&h| graph.node(h).map(ModelNode::name))
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_rejects_self_and_cycles() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.attach("a", "b", Vec3::zeros()).unwrap();
        graph.attach("b", "c", Vec3::zeros()).unwrap();

        assert_eq!(
            graph.attach("a", "a", Vec3::zeros()),
            Err(HierarchyError::SelfParent("a".to_string()))
        );
        assert!(matches!(
            graph.attach("c", "a", Vec3::zeros()),
            Err(HierarchyError::Cycle { .. })
        ));
        assert_eq!(
            graph.attach("a", "ghost", Vec3::zeros()),
            Err(HierarchyError::MissingNode("ghost".to_string()))
        );
    }

    #[test]
    fn test_detach_restores_standalone_mode() {
        let mut graph = graph_with(&["a", "b"]);
        graph.attach("a", "b", Vec3::new(1.0, 2.0, 3.0)).unwrap();

        assert_eq!(graph.detach("b"), Ok(true));
        assert_eq!(graph.detach("b"), Ok(false));

        // The from-parent offset is dropped with the link
        let b = graph.get("b").unwrap();
        assert!(!b.is_hierarchical());
        assert_eq!(b.transform().translate(), Vec3::zeros());
        assert!(!graph.get("a").unwrap().is_hierarchical());
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.attach("a", "c", Vec3::zeros()).unwrap();
        graph.attach("b", "c", Vec3::zeros()).unwrap();

        assert!(graph.get("a").unwrap().children().is_empty());
        assert!(!graph.get("a").unwrap().is_hierarchical());
        assert_eq!(graph.get("b").unwrap().children().len(), 1);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.attach("b", "c", Vec3::zeros()).unwrap();

        // Replacing "b" keeps its slot in the order and frees its child
        let geometry = GeometryBuffer::new(Vec::new(), Vec::new(), VertexFormat::BARE, None);
        graph.insert(ModelNode::new("b", LoadedModel::from_geometry(geometry)));
        assert_eq!(graph.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(graph.get("c").unwrap().parent().is_none());
        assert!(!graph.get("c").unwrap().is_hierarchical());

        assert!(graph.remove("a").is_some());
        assert!(graph.remove("a").is_none());
        assert_eq!(graph.len(), 2);
        assert_eq!(root_names(&graph), vec!["b", "c"]);
    }
}
