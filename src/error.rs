//! Crate-wide error taxonomy.
//!
//! Configuration, identity, topology and loader failures are fatal and abort
//! before the drain loop starts. Per-delivery faults (`MissingHook`,
//! `UnknownDestination`) are formatted through their kind and logged by the
//! engine; they never halt a running simulation.

use error_chain::error_chain;

use crate::algorithm::Phase;
use crate::node::NodeId;

error_chain! {
    foreign_links {
        Io(::std::io::Error);
    }

    errors {
        /// Unrecognized option value, non-positive node count, or a tree
        /// depth bound too small to place every node.
        InvalidConfiguration(reason: String) {
            description("invalid configuration")
            display("invalid configuration: {}", reason)
        }

        /// The loader cannot resolve the configured algorithm.
        AlgorithmLoadFailed(reason: String) {
            description("algorithm load failed")
            display("algorithm load failed: {}", reason)
        }

        /// The topology builder exhausted its retries without producing a
        /// connected graph.
        NotConnected {
            description("topology is not connected")
            display("topology builder exhausted its retries without a connected graph")
        }

        /// A node has no algorithm bound for the phase being dispatched.
        /// Reported once per node and phase; the node is skipped.
        MissingHook(phase: Phase, id: NodeId) {
            description("missing algorithm hook")
            display("node {} has no {} hook", id, phase)
        }

        /// A popped message targets an id that is not in the node map. The
        /// message is dropped.
        UnknownDestination(id: NodeId) {
            description("unknown destination")
            display("message addressed to unknown node {}", id)
        }
    }
}
