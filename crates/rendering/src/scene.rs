//! Host-independent scene graph boundary.
//!
//! The core decides *what* should be on screen and hands node descriptions to
//! a [`SceneBackend`]; the backend owns the actual drawable objects. Every node
//! the core creates is destroyed through exactly one `destroy_node` call.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Tile,
    Tree,
    Building,
    Shadow,
    Ghost,
    Overlay,
}

/// Everything a backend needs to draw one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSpec {
    pub kind: NodeKind,
    /// Centre in the world plane (y down).
    pub position: Vec2,
    /// Painter's order; larger draws later.
    pub z: f32,
    pub size: Vec2,
    pub color: Color,
}

pub trait SceneBackend {
    type Node: Copy + Eq + Hash + Debug;

    fn create_node(&mut self, spec: &NodeSpec) -> Self::Node;
    fn update_node(&mut self, node: Self::Node, spec: &NodeSpec);
    fn destroy_node(&mut self, node: Self::Node);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// In-memory backend. Used headless (agent mode) and to observe the core in tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    nodes: HashMap<NodeId, NodeSpec>,
    next_id: u64,
    pub created: usize,
    pub updated: usize,
    pub destroyed: usize,
    /// Destroy calls for nodes that did not exist.
    pub stale_destroys: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeSpec> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = (NodeId, &NodeSpec)> + '_ {
        self.nodes
            .iter()
            .filter(move |(_, n)| n.kind == kind)
            .map(|(id, n)| (*id, n))
    }

    pub fn reset_counters(&mut self) {
        self.created = 0;
        self.updated = 0;
        self.destroyed = 0;
        self.stale_destroys = 0;
    }
}

impl SceneBackend for RecordingBackend {
    type Node = NodeId;

    fn create_node(&mut self, spec: &NodeSpec) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, *spec);
        self.created += 1;
        id
    }

    fn update_node(&mut self, node: NodeId, spec: &NodeSpec) {
        if let Some(existing) = self.nodes.get_mut(&node) {
            *existing = *spec;
            self.updated += 1;
        }
    }

    fn destroy_node(&mut self, node: NodeId) {
        if self.nodes.remove(&node).is_some() {
            self.destroyed += 1;
        } else {
            self.stale_destroys += 1;
        }
    }
}
