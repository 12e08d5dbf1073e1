//! Vertices of the simulated network.
//!
//! A node is passive: the engine drives it, the bound algorithm mutates it.
//! Every write to an observable attribute whose value actually differs from
//! the previous one raises the node's changed flag, which the engine inspects
//! after each hook invocation to decide whether the observer needs a fresh
//! snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::algorithm::Algorithm;

/// Identifier of a node, unique within a run.
pub type NodeId = u64;

/// State tag that suppresses all outgoing sends from a node.
pub const TERMINATED: &str = "terminated";

const DEFAULT_COLOR: &str = "olivedrab";

/// A full copy of a node's observable attributes, as handed to observers.
pub type Snapshot = Map<String, Value>;

/// A vertex of the simulated network.
pub struct Node {
    id: NodeId,
    neighbors: BTreeSet<NodeId>,
    state: String,
    is_root: bool,
    color: String,
    extras: BTreeMap<String, Value>,
    algorithm: Option<Arc<dyn Algorithm>>,
    changed: bool,
}

impl Node {
    /// Creates an isolated node with the given id.
    pub fn new(id: NodeId) -> Node {
        Node {
            id,
            neighbors: BTreeSet::new(),
            state: String::new(),
            is_root: false,
            color: DEFAULT_COLOR.to_string(),
            extras: BTreeMap::new(),
            algorithm: None,
            changed: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The ids this node can reach in one hop, in ascending order.
    pub fn neighbors(&self) -> &BTreeSet<NodeId> {
        &self.neighbors
    }

    /// Registers `neighbor` as reachable. The peer's set is not touched;
    /// symmetry is the topology builder's responsibility.
    pub fn add_neighbor(&mut self, neighbor: NodeId) {
        if self.neighbors.insert(neighbor) {
            self.changed = true;
        }
    }

    pub(crate) fn clear_neighbors(&mut self) {
        if !self.neighbors.is_empty() {
            self.neighbors.clear();
            self.changed = true;
        }
    }

    /// The opaque state tag. [`TERMINATED`] gates outgoing sends.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn set_state<S: Into<String>>(&mut self, state: S) {
        let state = state.into();
        if self.state != state {
            self.state = state;
            self.changed = true;
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state == TERMINATED
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn set_root(&mut self, is_root: bool) {
        if self.is_root != is_root {
            self.is_root = is_root;
            self.changed = true;
        }
    }

    /// The presentation tag exposed to observers.
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color<S: Into<String>>(&mut self, color: S) {
        let color = color.into();
        if self.color != color {
            self.color = color;
            self.changed = true;
        }
    }

    /// Reads a free-form attribute set by an algorithm.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// Writes a free-form attribute. Part of the change-tracking surface.
    pub fn set_attr<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let key = key.into();
        let value = value.into();
        if self.extras.get(&key) != Some(&value) {
            self.extras.insert(key, value);
            self.changed = true;
        }
    }

    pub(crate) fn algorithm(&self) -> Option<&Arc<dyn Algorithm>> {
        self.algorithm.as_ref()
    }

    pub(crate) fn bind_algorithm(&mut self, algorithm: Arc<dyn Algorithm>) {
        self.algorithm = Some(algorithm);
    }

    /// Whether any observable attribute changed since the last reset.
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    pub fn reset_changed(&mut self) {
        self.changed = false;
    }

    /// Copies every observable attribute into a map for the change log.
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.insert("id".into(), Value::from(self.id));
        snapshot.insert(
            "neighbors".into(),
            Value::from(self.neighbors.iter().copied().collect::<Vec<_>>()),
        );
        snapshot.insert("state".into(), Value::from(self.state.as_str()));
        snapshot.insert("is_root".into(), Value::from(self.is_root));
        snapshot.insert("color".into(), Value::from(self.color.as_str()));
        for (key, value) in &self.extras {
            snapshot.insert(key.clone(), value.clone());
        }
        snapshot
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("neighbors", &self.neighbors)
            .field("state", &self.state)
            .field("is_root", &self.is_root)
            .field("color", &self.color)
            .field("extras", &self.extras)
            .field("changed", &self.changed)
            .finish()
    }
}
