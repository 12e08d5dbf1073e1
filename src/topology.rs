//! Construction of the neighbor graph.
//!
//! Builders operate on a slice of nodes already arranged in ascending-id
//! order and populate the neighbor sets symmetrically. Every build is
//! verified connected via union-find; randomized builds that come out
//! disconnected are retried a bounded number of times before the whole run
//! is rejected as `NotConnected`.

use std::collections::VecDeque;

use itertools::Itertools;
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::Topology;
use crate::error::{ErrorKind, Result};
use crate::node::Node;

/// Attempts before a randomized build is declared `NotConnected`.
const MAX_BUILD_ATTEMPTS: usize = 64;

/// Populates the neighbor sets of `nodes` according to `kind`.
///
/// `max_depth` bounds the height of a `Tree` build and is ignored otherwise.
/// Tree and Star require one node with the root flag set.
pub(crate) fn build(
    kind: Topology,
    nodes: &mut [Node],
    max_depth: usize,
    rng: &mut StdRng,
) -> Result<()> {
    for attempt in 1..=MAX_BUILD_ATTEMPTS {
        for node in nodes.iter_mut() {
            node.clear_neighbors();
        }
        match kind {
            Topology::Line => build_line(nodes),
            Topology::Clique => build_clique(nodes),
            Topology::Star => build_star(nodes)?,
            Topology::Tree => build_tree(nodes, max_depth)?,
            Topology::Random => build_random(nodes, rng),
        }
        if connected(nodes) {
            return Ok(());
        }
        debug!("{:?} topology attempt {} came out disconnected", kind, attempt);
    }
    Err(ErrorKind::NotConnected.into())
}

/// Checks that the undirected graph induced by the neighbor sets is
/// connected, reporting `NotConnected` otherwise.
pub fn verify_connected(nodes: &[Node]) -> Result<()> {
    if connected(nodes) {
        Ok(())
    } else {
        Err(ErrorKind::NotConnected.into())
    }
}

fn connect(nodes: &mut [Node], i: usize, j: usize) {
    let id_i = nodes[i].id();
    let id_j = nodes[j].id();
    nodes[i].add_neighbor(id_j);
    nodes[j].add_neighbor(id_i);
}

fn root_index(nodes: &[Node]) -> Result<usize> {
    nodes.iter().position(Node::is_root).ok_or_else(|| {
        ErrorKind::InvalidConfiguration("no root designated for a rooted topology".into()).into()
    })
}

fn build_line(nodes: &mut [Node]) {
    for i in 1..nodes.len() {
        connect(nodes, i - 1, i);
    }
}

fn build_clique(nodes: &mut [Node]) {
    for (i, j) in (0..nodes.len()).tuple_combinations() {
        connect(nodes, i, j);
    }
}

fn build_star(nodes: &mut [Node]) -> Result<()> {
    let hub = root_index(nodes)?;
    for i in 0..nodes.len() {
        if i != hub {
            connect(nodes, hub, i);
        }
    }
    Ok(())
}

/// Breadth-first binary fan-out from the root. Children are taken in array
/// (= id) order. Placing fewer than all nodes means the depth bound is too
/// tight for the node count.
fn build_tree(nodes: &mut [Node], max_depth: usize) -> Result<()> {
    let root = root_index(nodes)?;
    let mut placed = vec![false; nodes.len()];
    placed[root] = true;
    let mut placed_count = 1;
    let mut frontier = VecDeque::new();
    frontier.push_back((root, 0));
    let mut next_child = 0;

    while placed_count < nodes.len() {
        let (parent, depth) = match frontier.pop_front() {
            Some(entry) => entry,
            None => break,
        };
        if depth >= max_depth {
            continue;
        }
        for _ in 0..2 {
            while next_child < nodes.len() && placed[next_child] {
                next_child += 1;
            }
            if next_child >= nodes.len() {
                break;
            }
            connect(nodes, parent, next_child);
            placed[next_child] = true;
            placed_count += 1;
            frontier.push_back((next_child, depth + 1));
        }
    }

    if placed_count < nodes.len() {
        return Err(ErrorKind::InvalidConfiguration(format!(
            "a tree of depth {} cannot hold {} nodes",
            max_depth,
            nodes.len()
        ))
        .into());
    }
    Ok(())
}

fn build_random(nodes: &mut [Node], rng: &mut StdRng) {
    // All connected shapes on three labeled vertices: line, vee, triangle.
    const THREE_NODE_SHAPES: [&[(usize, usize)]; 3] = [
        &[(0, 1), (1, 2)],
        &[(0, 1), (0, 2)],
        &[(0, 1), (1, 2), (0, 2)],
    ];

    let n = nodes.len();
    match n {
        0 | 1 => {}
        2 => connect(nodes, 0, 1),
        3 => {
            let shape = THREE_NODE_SHAPES[rng.gen_range(0..THREE_NODE_SHAPES.len())];
            for &(i, j) in shape {
                connect(nodes, i, j);
            }
        }
        _ => {
            let cap = (((n - 1) as f64).ln().floor() as usize * 2).clamp(1, n - 1);
            for i in 0..n {
                let degree = rng.gen_range(1..=cap);
                for pick in rand::seq::index::sample(rng, n - 1, degree) {
                    // The sample space excludes `i` itself.
                    let j = if pick >= i { pick + 1 } else { pick };
                    connect(nodes, i, j);
                }
            }
        }
    }
}

fn connected(nodes: &[Node]) -> bool {
    if nodes.len() <= 1 {
        return true;
    }
    let mut uf = UnionFind::new(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        for &neighbor in node.neighbors() {
            if let Ok(j) = nodes.binary_search_by_key(&neighbor, Node::id) {
                uf.union(i, j);
            }
        }
    }
    let root = uf.find(0);
    (1..nodes.len()).all(|i| uf.find(i) == root)
}

/// Disjoint-set forest with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    fn new(size: usize) -> UnionFind {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![1; size],
        }
    }

    fn find(&mut self, node: usize) -> usize {
        if self.parent[node] != node {
            let root = self.find(self.parent[node]);
            self.parent[node] = root;
        }
        self.parent[node]
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        if self.rank[root_a] > self.rank[root_b] {
            self.parent[root_b] = root_a;
        } else if self.rank[root_a] < self.rank[root_b] {
            self.parent[root_a] = root_b;
        } else {
            self.parent[root_b] = root_a;
            self.rank[root_a] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn make_nodes(n: usize) -> Vec<Node> {
        (0..n as u64).map(Node::new).collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn hand_crafted_disconnected_graph_is_rejected() {
        let mut nodes = make_nodes(4);
        // Two separate pairs: 0-1 and 2-3.
        connect(&mut nodes, 0, 1);
        connect(&mut nodes, 2, 3);
        let err = verify_connected(&nodes).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NotConnected));
        connect(&mut nodes, 1, 2);
        assert!(verify_connected(&nodes).is_ok());
    }

    #[test]
    fn single_node_is_trivially_connected() {
        let nodes = make_nodes(1);
        assert!(verify_connected(&nodes).is_ok());
    }

    #[test]
    fn tree_depth_too_small_is_a_configuration_error() {
        let mut nodes = make_nodes(4);
        nodes[0].set_root(true);
        // Depth 1 holds the root plus two children at most.
        let err = build(Topology::Tree, &mut nodes, 1, &mut rng()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidConfiguration(_)));
    }

    #[test]
    fn rooted_topology_without_root_is_rejected() {
        let mut nodes = make_nodes(3);
        let err = build(Topology::Star, &mut nodes, 2, &mut rng()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidConfiguration(_)));
    }

    #[test]
    fn union_find_merges_components() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        assert_eq!(uf.find(0), uf.find(1));
        assert_ne!(uf.find(1), uf.find(3));
        uf.union(1, 3);
        assert_eq!(uf.find(0), uf.find(4));
    }
}
