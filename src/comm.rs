//! The communication facade handed to algorithm hooks.
//!
//! The facade is the sole path by which algorithms reach the event queue. It
//! borrows the queue, the delay configuration and the engine RNG for the
//! duration of a single hook invocation, so algorithm code can never hold on
//! to the queue across invocations.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::DelayMode;
use crate::node::{Node, NodeId};
use crate::queue::{EventQueue, Message};

const CONSTANT_DELAY: f64 = 1.0;

/// Reserved per-edge delay table, keyed by unordered edge.
pub(crate) type EdgeDelays = BTreeMap<(NodeId, NodeId), f64>;

/// Message-emission capability passed to every algorithm invocation.
pub struct Comm<'a> {
    queue: &'a mut EventQueue,
    delay: DelayMode,
    edge_delays: &'a EdgeDelays,
    rng: &'a mut StdRng,
}

impl<'a> Comm<'a> {
    pub(crate) fn new(
        queue: &'a mut EventQueue,
        delay: DelayMode,
        edge_delays: &'a EdgeDelays,
        rng: &'a mut StdRng,
    ) -> Comm<'a> {
        Comm {
            queue,
            delay,
            edge_delays,
            rng,
        }
    }

    /// Enqueues a unicast message from `source` to `dest`.
    ///
    /// A terminated source makes this a silent no-op. The arrival time is
    /// `sent_time` (zero when absent) plus the per-hop delay.
    pub fn send(&mut self, source: &Node, dest: NodeId, content: &str, sent_time: Option<f64>) {
        if source.is_terminated() {
            return;
        }
        let delay = self.link_delay(source.id(), dest);
        let arrival_time = sent_time.unwrap_or(0.0) + delay;
        self.queue.push(Message {
            source: source.id(),
            dest,
            arrival_time,
            content: content.to_owned(),
        });
    }

    /// Sends `content` to every neighbor of `source`, in ascending-id order.
    pub fn send_to_all(&mut self, source: &Node, content: &str, sent_time: Option<f64>) {
        for &dest in source.neighbors() {
            self.send(source, dest, content, sent_time);
        }
    }

    fn link_delay(&mut self, a: NodeId, b: NodeId) -> f64 {
        let edge = (a.min(b), a.max(b));
        if let Some(&delay) = self.edge_delays.get(&edge) {
            return delay;
        }
        match self.delay {
            DelayMode::Constant => CONSTANT_DELAY,
            DelayMode::Random => self.rng.gen(),
        }
    }
}
