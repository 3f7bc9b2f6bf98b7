//! Scene arena: resolved primitives addressed by index.

use chart3d_core::types::SurfaceColor;
use indexmap::IndexMap;

use crate::primitive::{BoundingBox, Primitive};

/// Index of a node in a [`SceneGraph`]; also the tag used for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the scene.
///
/// Group nodes carry no primitive and only exist to tie children together.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub primitive: Option<Primitive>,
    pub color: SurfaceColor,
    pub parent: Option<NodeId>,
    pub name: Option<String>,
}

impl SceneNode {
    /// Create a node drawing `primitive`.
    pub fn new(primitive: Primitive, color: SurfaceColor) -> Self {
        Self {
            primitive: Some(primitive),
            color,
            parent: None,
            name: None,
        }
    }

    /// Create an empty group node.
    pub fn group() -> Self {
        Self {
            primitive: None,
            color: SurfaceColor::default(),
            parent: None,
            name: None,
        }
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the parent.
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Ordered collection of scene nodes; insertion order is drawing order.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    names: IndexMap<String, NodeId>,
}

impl SceneGraph {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    ///
    /// A parent must already be in the graph, so links always point to an
    /// earlier node and cannot form cycles; a dangling parent is dropped. A
    /// later node with the same name takes over the name.
    pub fn add(&mut self, mut node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        if let Some(parent) = node.parent {
            if parent.index() >= self.nodes.len() {
                log::warn!("node {} refers to unknown parent {}, detaching", id.0, parent.0);
                node.parent = None;
            }
        }
        if let Some(name) = &node.name {
            self.names.insert(name.clone(), id);
        }
        self.nodes.push(node);
        id
    }

    /// Add a primitive under `parent`.
    pub fn add_child(&mut self, parent: NodeId, primitive: Primitive, color: SurfaceColor) -> NodeId {
        self.add(SceneNode::new(primitive, color).with_parent(parent))
    }

    /// Add a named group node.
    pub fn add_group(&mut self, name: impl Into<String>) -> NodeId {
        self.add(SceneNode::group().with_name(name))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    /// Nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Look up a node by name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).and_then(|n| n.parent), |p| {
            self.get(*p).and_then(|n| n.parent)
        })
    }

    /// Topmost ancestor of `id`, or `id` itself.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Direct children of `id`.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(move |(_, n)| n.parent == Some(id))
            .map(|(child, _)| child)
    }

    /// World bounds of every primitive in the scene.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.nodes
            .iter()
            .filter_map(|n| n.primitive.as_ref()?.bounds())
            .reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart3d_core::types::{Color, Vector3};

    fn bar(x: f64) -> Primitive {
        Primitive::cuboid(Vector3::new(x, 0.0, 0.0), Vector3::new(x + 1.0, 2.0, 1.0))
    }

    #[test]
    fn test_add_and_find() {
        let mut scene = SceneGraph::new();
        let series = scene.add_group("series-1");
        let a = scene.add_child(series, bar(0.0), SurfaceColor::new(Color::WHITE));
        let b = scene.add(SceneNode::new(bar(2.0), SurfaceColor::default()).with_name("last"));

        assert_eq!(scene.len(), 3);
        assert_eq!(scene.find("series-1"), Some(series));
        assert_eq!(scene.find("last"), Some(b));
        assert_eq!(scene.get(a).and_then(|n| n.parent), Some(series));
        assert!(scene.find("missing").is_none());
    }

    #[test]
    fn test_ancestors_and_root() {
        let mut scene = SceneGraph::new();
        let chart = scene.add_group("chart");
        let series = scene.add(SceneNode::group().with_parent(chart));
        let point = scene.add_child(series, bar(0.0), SurfaceColor::default());

        let chain: Vec<NodeId> = scene.ancestors(point).collect();
        assert_eq!(chain, vec![series, chart]);
        assert_eq!(scene.root_of(point), chart);
        assert_eq!(scene.root_of(chart), chart);
        assert_eq!(scene.children(series).collect::<Vec<_>>(), vec![point]);
    }

    #[test]
    fn test_forward_parent_is_dropped() {
        let mut scene = SceneGraph::new();
        let id = scene.add(SceneNode::new(bar(0.0), SurfaceColor::default()).with_parent(NodeId(5)));
        assert_eq!(scene.get(id).and_then(|n| n.parent), None);
    }

    #[test]
    fn test_bounds() {
        let mut scene = SceneGraph::new();
        assert!(scene.bounds().is_none());
        scene.add(SceneNode::new(bar(0.0), SurfaceColor::default()));
        scene.add(SceneNode::new(bar(4.0), SurfaceColor::default()));
        scene.add_group("empty");
        let bounds = scene.bounds().unwrap();
        assert_eq!(bounds.min, Vector3::ZERO);
        assert_eq!(bounds.max, Vector3::new(5.0, 2.0, 1.0));
    }
}
