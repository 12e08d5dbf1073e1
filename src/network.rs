//! Network assembly and ownership.
//!
//! [`NetworkBuilder`] turns a validated [`Config`] into a [`Network`]:
//! identities are assigned, a root is selected, the topology is built and
//! verified connected, and the algorithm is bound to every node. The
//! resulting network owns the node map, the event queue, the change log and
//! the trace sink; everything else borrows from it.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::ops;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::algorithm::{self, Algorithm, Phase};
use crate::changelog::ChangeLog;
use crate::comm::EdgeDelays;
use crate::config::{Config, DelayMode, DisplayMode, IdType, LogDetail, RootMode, Topology};
use crate::error::{ErrorKind, Result};
use crate::node::{Node, NodeId};
use crate::queue::EventQueue;
use crate::topology;

/// A fully assembled simulation: nodes, queue, change log and trace sink.
///
/// Dispatch behavior (init phase, queue drain, single-stepping) lives in the
/// engine module.
pub struct Network {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) queue: EventQueue,
    pub(crate) change_log: ChangeLog,
    pub(crate) topology: Topology,
    pub(crate) delay: DelayMode,
    pub(crate) display: DisplayMode,
    pub(crate) logging: LogDetail,
    pub(crate) edge_delays: EdgeDelays,
    pub(crate) rng: StdRng,
    pub(crate) trace: Option<Box<dyn Write>>,
    pub(crate) reported_missing: BTreeSet<(NodeId, Phase)>,
    pub(crate) delivered: u64,
    pub(crate) dropped: u64,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("nodes", &self.nodes)
            .field("queue", &self.queue)
            .field("change_log", &self.change_log)
            .field("topology", &self.topology)
            .field("delay", &self.delay)
            .field("display", &self.display)
            .field("logging", &self.logging)
            .field("edge_delays", &self.edge_delays)
            .field("rng", &self.rng)
            .field("trace", &self.trace.as_ref().map(|_| "<trace sink>"))
            .field("reported_missing", &self.reported_missing)
            .field("delivered", &self.delivered)
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl Network {
    /// Iterates the nodes in ascending-id (= node) order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The distinguished root, if the root mode designated one.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.values().find(|node| node.is_root())
    }

    /// Number of undelivered messages.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Read access for observers. The engine never reads the log back.
    pub fn change_log(&self) -> &ChangeLog {
        &self.change_log
    }

    /// Pop access for observers consuming snapshots from the front.
    pub fn change_log_mut(&mut self) -> &mut ChangeLog {
        &mut self.change_log
    }
}

impl ops::Index<NodeId> for Network {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        self.node(index).expect("indexed node not found")
    }
}

impl ops::IndexMut<NodeId> for Network {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        self.node_mut(index).expect("indexed node not found")
    }
}

/// Configures and assembles [`Network`] instances.
pub struct NetworkBuilder {
    config: Config,
    seed: Option<u64>,
    root_override: Option<NodeId>,
    algorithm: Option<Arc<dyn Algorithm>>,
    trace: Option<Box<dyn Write>>,
    edge_delays: EdgeDelays,
}

impl NetworkBuilder {
    pub fn new(config: Config) -> NetworkBuilder {
        NetworkBuilder {
            config,
            seed: None,
            root_override: None,
            algorithm: None,
            trace: None,
            edge_delays: EdgeDelays::new(),
        }
    }

    /// Seeds the simulation RNG so that identity assignment, topology and
    /// random delays reproduce exactly.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Designates the node with `id` as the root, overriding the configured
    /// root mode. Fails the build if no node gets that id.
    pub fn root(&mut self, id: NodeId) -> &mut Self {
        self.root_override = Some(id);
        self
    }

    /// Binds `algorithm` to every node, bypassing the registry loader.
    pub fn algorithm(&mut self, algorithm: Arc<dyn Algorithm>) -> &mut Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Attaches a sink for the engine trace stream.
    pub fn trace(&mut self, sink: Box<dyn Write>) -> &mut Self {
        self.trace = Some(sink);
        self
    }

    /// Fixes the delay of the undirected edge `a`–`b`, overriding the delay
    /// mode for that link.
    pub fn edge_delay(&mut self, a: NodeId, b: NodeId, delay: f64) -> &mut Self {
        self.edge_delays.insert((a.min(b), a.max(b)), delay);
        self
    }

    /// Assembles the network. Consumes the trace sink; the algorithm
    /// override and configuration are reusable across builds.
    pub fn build(&mut self) -> Result<Network> {
        self.config.validate()?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let count = self.config.node_count as usize;
        let mut nodes: Vec<Node> = assign_ids(count, self.config.id_type, &mut rng)
            .into_iter()
            .map(Node::new)
            .collect();
        self.select_root(&mut nodes, &mut rng)?;
        topology::build(
            self.config.topology,
            &mut nodes,
            self.config.max_depth(),
            &mut rng,
        )?;

        let algorithm = match &self.algorithm {
            Some(algorithm) => algorithm.clone(),
            None => algorithm::load(self.config.algorithm.as_deref())?,
        };
        for node in &mut nodes {
            node.bind_algorithm(algorithm.clone());
            node.reset_changed();
        }

        Ok(Network {
            nodes: nodes.into_iter().map(|node| (node.id(), node)).collect(),
            queue: EventQueue::new(),
            change_log: ChangeLog::new(),
            topology: self.config.topology,
            delay: self.config.delay,
            display: self.config.display,
            logging: self.config.logging,
            edge_delays: self.edge_delays.clone(),
            rng,
            trace: self.trace.take(),
            reported_missing: BTreeSet::new(),
            delivered: 0,
            dropped: 0,
        })
    }

    fn select_root(&self, nodes: &mut [Node], rng: &mut StdRng) -> Result<()> {
        if let Some(id) = self.root_override {
            let index = nodes
                .binary_search_by_key(&id, Node::id)
                .map_err(|_| ErrorKind::InvalidConfiguration(format!("no node has id {}", id)))?;
            nodes[index].set_root(true);
            return Ok(());
        }
        match self.config.root {
            RootMode::NoRoot => {}
            RootMode::Random => {
                let index = rng.gen_range(0..nodes.len());
                nodes[index].set_root(true);
            }
            // Nodes are already in ascending id order.
            RootMode::MinId => nodes[0].set_root(true),
        }
        Ok(())
    }
}

/// Produces `count` distinct ids in ascending order.
fn assign_ids(count: usize, mode: IdType, rng: &mut StdRng) -> Vec<NodeId> {
    match mode {
        IdType::Sequential => (0..count as NodeId).collect(),
        IdType::Random => {
            let lo: NodeId = 100;
            // The documented range is [100, 100N - 1]; it degenerates for
            // N = 1, where the sole node gets 100.
            let hi = (100 * count as NodeId).max(lo + count as NodeId);
            let mut ids = BTreeSet::new();
            while ids.len() < count {
                ids.insert(rng.gen_range(lo..hi));
            }
            ids.into_iter().collect()
        }
    }
}
