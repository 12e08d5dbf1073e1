//! The dispatch loop.
//!
//! The engine first runs `init` on every node in node order, then drains the
//! event queue, delivering the earliest pending message to its destination
//! until none remain. Exactly one hook executes at any moment and each runs
//! to completion before the next pop; asynchrony is modelled entirely by
//! arrival times. Per-delivery faults are isolated: a missing hook or an
//! unknown destination is logged and the drain continues.

use std::io::Write;

use log::warn;

use crate::algorithm::Phase;
use crate::comm::Comm;
use crate::config::{DisplayMode, LogDetail};
use crate::error::{ErrorKind, Result};
use crate::network::Network;
use crate::node::NodeId;

/// Writes to the trace sink when the configured verbosity allows.
macro_rules! sim_trace {
    ($net:expr, $level:expr, $fmt:expr $(, $arg:expr)*) => {
        if $net.logging >= $level {
            if let Some(ref mut sink) = $net.trace {
                writeln!(sink, $fmt $(, $arg)*)?;
            }
        }
    };
}

/// Record of one drained queue entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delivery {
    pub source: NodeId,
    pub dest: NodeId,
    pub arrival_time: f64,
    /// False when the destination was unknown and the message was dropped.
    pub delivered: bool,
}

/// Counters reported once the queue has drained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub delivered: u64,
    pub dropped: u64,
}

impl Network {
    /// Runs the simulation to quiescence: the init phase followed by a full
    /// queue drain. Terminates iff the bound algorithm stops emitting.
    pub fn run(&mut self) -> Result<Summary> {
        sim_trace!(
            self,
            LogDetail::Short,
            "starting simulation: {} nodes, {:?} topology",
            self.nodes.len(),
            self.topology
        );
        self.init_phase()?;
        while self.step()?.is_some() {}
        sim_trace!(
            self,
            LogDetail::Short,
            "simulation finished: {} delivered, {} dropped",
            self.delivered,
            self.dropped
        );
        Ok(Summary {
            delivered: self.delivered,
            dropped: self.dropped,
        })
    }

    /// Invokes `init` on every node in node order. Each init call may emit
    /// messages; change-log entries are recorded for nodes whose flag is set.
    pub fn init_phase(&mut self) -> Result<()> {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.run_algorithm(id, Phase::Init, None, None);
            self.record_and_reset(id);
            if let Some(node) = self.nodes.get(&id) {
                sim_trace!(
                    self,
                    LogDetail::Medium,
                    "init: node {} state={:?} root={}",
                    id,
                    node.state(),
                    node.is_root()
                );
            }
        }
        Ok(())
    }

    /// Pops and delivers the earliest pending message. Returns `None` once
    /// the queue is empty.
    pub fn step(&mut self) -> Result<Option<Delivery>> {
        let msg = match self.queue.pop() {
            Some(msg) => msg,
            None => return Ok(None),
        };
        if !self.nodes.contains_key(&msg.dest) {
            warn!("{}", ErrorKind::UnknownDestination(msg.dest));
            self.dropped += 1;
            return Ok(Some(Delivery {
                source: msg.source,
                dest: msg.dest,
                arrival_time: msg.arrival_time,
                delivered: false,
            }));
        }
        sim_trace!(
            self,
            LogDetail::Long,
            "[{}] -> [{}] @ {}: {}",
            msg.source,
            msg.dest,
            msg.arrival_time,
            msg.content
        );
        self.run_algorithm(
            msg.dest,
            Phase::Main,
            Some(msg.arrival_time),
            Some(msg.content.as_str()),
        );
        self.record_and_reset(msg.dest);
        self.delivered += 1;
        Ok(Some(Delivery {
            source: msg.source,
            dest: msg.dest,
            arrival_time: msg.arrival_time,
            delivered: true,
        }))
    }

    /// Dispatches one hook invocation on `id`. Delivery always invokes the
    /// hook, terminated or not; state guards are the algorithm's business.
    fn run_algorithm(
        &mut self,
        id: NodeId,
        phase: Phase,
        arrival_time: Option<f64>,
        content: Option<&str>,
    ) {
        let algorithm = match self.nodes.get(&id).and_then(|node| node.algorithm().cloned()) {
            Some(algorithm) => algorithm,
            None => {
                // Reported once per node and phase; the node is skipped.
                if self.reported_missing.insert((id, phase)) {
                    warn!("{}", ErrorKind::MissingHook(phase, id));
                }
                return;
            }
        };
        let node = match self.nodes.get_mut(&id) {
            Some(node) => node,
            None => return,
        };
        let mut comm = Comm::new(&mut self.queue, self.delay, &self.edge_delays, &mut self.rng);
        let outcome = match phase {
            Phase::Init => algorithm.init(node, &mut comm),
            Phase::Main => algorithm.on_message(
                node,
                &mut comm,
                arrival_time.unwrap_or(0.0),
                content.unwrap_or(""),
            ),
        };
        if let Err(err) = outcome {
            warn!("node {} failed during {}: {}", id, phase, err);
        }
    }

    fn record_and_reset(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if self.display == DisplayMode::Graph && node.has_changed() {
                self.change_log.push(node.snapshot());
            }
            node.reset_changed();
        }
    }
}

/// Drains the queue one delivery at a time; the item is `Err` only when the
/// trace sink fails.
impl Iterator for Network {
    type Item = Result<Delivery>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::rc::Rc;
    use std::cell::RefCell;
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::algorithm::Algorithm;
    use crate::changelog::ChangeLog;
    use crate::comm::EdgeDelays;
    use crate::config::{DelayMode, Topology};
    use crate::error::Result;
    use crate::node::Node;
    use crate::queue::{EventQueue, Message};

    #[derive(Debug)]
    struct Echo;

    impl Algorithm for Echo {
        fn init(&self, node: &mut Node, comm: &mut Comm) -> Result<()> {
            if node.is_root() {
                comm.send_to_all(node, "echo", None);
            }
            Ok(())
        }

        fn on_message(
            &self,
            node: &mut Node,
            _comm: &mut Comm,
            _arrival_time: f64,
            content: &str,
        ) -> Result<()> {
            node.set_attr("last", content);
            Ok(())
        }
    }

    fn bare_network(nodes: Vec<Node>, display: DisplayMode) -> Network {
        Network {
            nodes: nodes.into_iter().map(|node| (node.id(), node)).collect(),
            queue: EventQueue::new(),
            change_log: ChangeLog::new(),
            topology: Topology::Line,
            delay: DelayMode::Constant,
            display,
            logging: LogDetail::Short,
            edge_delays: EdgeDelays::new(),
            rng: StdRng::seed_from_u64(0),
            trace: None,
            reported_missing: BTreeSet::new(),
            delivered: 0,
            dropped: 0,
        }
    }

    fn linked_pair(algorithm: Option<Arc<dyn Algorithm>>) -> Vec<Node> {
        let mut nodes: Vec<Node> = (0..2u64).map(Node::new).collect();
        nodes[0].add_neighbor(1);
        nodes[1].add_neighbor(0);
        nodes[0].set_root(true);
        for node in &mut nodes {
            if let Some(algorithm) = &algorithm {
                node.bind_algorithm(algorithm.clone());
            }
            node.reset_changed();
        }
        nodes
    }

    #[test]
    fn unknown_destination_is_dropped_and_counted() {
        let mut net = bare_network(linked_pair(Some(Arc::new(Echo))), DisplayMode::Text);
        net.queue.push(Message {
            source: 0,
            dest: 99,
            arrival_time: 1.0,
            content: "lost".into(),
        });
        let summary = net.run().unwrap();
        assert_eq!(summary, Summary { delivered: 1, dropped: 1 });
    }

    #[test]
    fn missing_algorithm_skips_the_node() {
        let mut net = bare_network(linked_pair(None), DisplayMode::Text);
        net.queue.push(Message {
            source: 0,
            dest: 1,
            arrival_time: 1.0,
            content: "orphan".into(),
        });
        // Both phases are skipped without a bound algorithm; the queue still
        // drains and nothing panics.
        let summary = net.run().unwrap();
        assert_eq!(summary, Summary { delivered: 1, dropped: 0 });
        assert_eq!(net.reported_missing.len(), 3);
    }

    #[test]
    fn graph_display_records_changes_and_resets_flags() {
        let mut net = bare_network(linked_pair(Some(Arc::new(Echo))), DisplayMode::Graph);
        net.run().unwrap();
        // Only node 1 mutates: the root's init emits without touching state.
        assert_eq!(net.change_log().len(), 1);
        let snapshot = net.change_log_mut().pop().unwrap();
        assert_eq!(snapshot["id"].as_u64(), Some(1));
        assert_eq!(snapshot["last"].as_str(), Some("echo"));
        assert!(net.nodes().all(|node| !node.has_changed()));
    }

    #[test]
    fn text_display_keeps_the_change_log_empty() {
        let mut net = bare_network(linked_pair(Some(Arc::new(Echo))), DisplayMode::Text);
        net.run().unwrap();
        assert!(net.change_log().is_empty());
        assert!(net.nodes().all(|node| !node.has_changed()));
    }

    #[test]
    fn network_iterates_deliveries() {
        let mut net = bare_network(linked_pair(Some(Arc::new(Echo))), DisplayMode::Text);
        net.init_phase().unwrap();
        let deliveries: Vec<Delivery> = net.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].source, 0);
        assert_eq!(deliveries[0].dest, 1);
        assert!(deliveries[0].delivered);
    }

    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedSink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    #[test]
    fn long_trace_reports_banners_inits_and_deliveries() {
        let sink = SharedSink::default();
        let mut net = bare_network(linked_pair(Some(Arc::new(Echo))), DisplayMode::Text);
        net.logging = LogDetail::Long;
        net.trace = Some(Box::new(sink.clone()));
        net.run().unwrap();
        let trace = sink.contents();
        assert!(trace.contains("starting simulation: 2 nodes, Line topology"));
        assert!(trace.contains("init: node 0"));
        assert!(trace.contains("[0] -> [1] @ 1: echo"));
        assert!(trace.contains("simulation finished: 1 delivered, 0 dropped"));
    }

    #[test]
    fn short_trace_emits_banners_only() {
        let sink = SharedSink::default();
        let mut net = bare_network(linked_pair(Some(Arc::new(Echo))), DisplayMode::Text);
        net.trace = Some(Box::new(sink.clone()));
        net.run().unwrap();
        let trace = sink.contents();
        assert!(trace.contains("starting simulation"));
        assert!(trace.contains("simulation finished"));
        assert!(!trace.contains("init:"));
        assert!(!trace.contains("->"));
    }
}
