//! Breadth-first spanning tree.
//!
//! The root announces distance 0 and terminates. Every other node starts
//! with no distance (treated as infinite) and adopts the first improving
//! announcement it receives, recording the sender as its parent and
//! re-announcing the incremented distance. The `dist + 1 < current` guard
//! suppresses redundant accepts once a node has its final distance.

use log::debug;
use serde_json::Value;

use crate::algorithm::Algorithm;
use crate::comm::Comm;
use crate::error::Result;
use crate::node::{Node, NodeId, TERMINATED};

const COLORS: [&str; 20] = [
    "blue", "red", "green", "yellow", "purple", "pink", "orange", "cyan", "magenta", "lime",
    "teal", "lavender", "brown", "maroon", "navy", "olive", "coral", "salmon", "gold", "silver",
];

/// Distance-vector style breadth-first search from the root.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bfs;

fn announce(distance: f64, from: NodeId) -> String {
    format!("running a BFS with distance {} from {}", distance, from)
}

impl Algorithm for Bfs {
    fn init(&self, node: &mut Node, comm: &mut Comm) -> Result<()> {
        if node.is_root() {
            debug!("node {} is the BFS root", node.id());
            node.set_attr("parent", node.id());
            node.set_attr("distance", 0.0);
            comm.send_to_all(node, &announce(0.0, node.id()), None);
            node.set_color("#000000");
            node.set_state(TERMINATED);
        } else {
            node.set_attr("parent", Value::Null);
            node.set_attr("distance", Value::Null);
        }
        Ok(())
    }

    fn on_message(
        &self,
        node: &mut Node,
        comm: &mut Comm,
        _arrival_time: f64,
        content: &str,
    ) -> Result<()> {
        if node.state() == "activated" {
            return Ok(());
        }
        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(format!("malformed BFS announcement {:?}", content).into());
        }
        let distance: f64 = tokens[tokens.len() - 3]
            .parse()
            .map_err(|_| format!("malformed BFS distance in {:?}", content))?;
        let parent: NodeId = tokens[tokens.len() - 1]
            .parse()
            .map_err(|_| format!("malformed BFS sender in {:?}", content))?;

        let current = node
            .attr("distance")
            .and_then(Value::as_f64)
            .unwrap_or(f64::INFINITY);
        if distance + 1.0 < current {
            node.set_state("activated");
            node.set_attr("parent", parent);
            node.set_attr("distance", distance + 1.0);
            node.set_color(COLORS[distance as usize % COLORS.len()]);
            comm.send_to_all(node, &announce(distance + 1.0, node.id()), None);
            node.set_state("deactivated");
        }
        Ok(())
    }
}
