//! Flooding broadcast.
//!
//! The root floods its neighbors during `init` and terminates. Every other
//! node forwards the first message it sees to all of its neighbors, then
//! terminates as well; later deliveries find the node terminated and emit
//! nothing. Messages carry the delivery time forward as their send time, so
//! the flood front advances one hop per time unit under constant delay.

use log::debug;

use crate::algorithm::Algorithm;
use crate::comm::Comm;
use crate::error::Result;
use crate::node::{Node, TERMINATED};

const PAYLOAD: &str = "running a broadcast";

/// Single-source flooding broadcast.
#[derive(Clone, Copy, Debug, Default)]
pub struct Broadcast;

impl Algorithm for Broadcast {
    fn init(&self, node: &mut Node, comm: &mut Comm) -> Result<()> {
        if node.is_root() {
            debug!("node {} is the broadcast root", node.id());
            comm.send_to_all(node, PAYLOAD, None);
            node.set_color("#000000");
            node.set_state(TERMINATED);
        }
        Ok(())
    }

    fn on_message(
        &self,
        node: &mut Node,
        comm: &mut Comm,
        arrival_time: f64,
        _content: &str,
    ) -> Result<()> {
        if !node.is_terminated() {
            comm.send_to_all(node, PAYLOAD, Some(arrival_time));
            node.set_color("#7427e9");
            node.set_state(TERMINATED);
        }
        Ok(())
    }
}
