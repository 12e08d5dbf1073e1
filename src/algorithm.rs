//! The per-node algorithm contract and its loader.
//!
//! A distributed algorithm is a pair of hooks: `init`, invoked once per node
//! at start-up, and `on_message`, invoked for every delivery. Implementations
//! are stateless; all per-node state lives on the [`Node`] handed to each
//! invocation, and messages leave only through the [`Comm`] facade.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::algorithms::{Bfs, Broadcast};
use crate::comm::Comm;
use crate::error::{ErrorKind, Result};
use crate::node::Node;

/// Behavior bound to every node of a simulation.
///
/// Hooks run to completion before the engine pops the next message; they may
/// emit any number of messages through `comm`. A returned error is isolated
/// to the offending invocation and logged by the engine.
pub trait Algorithm: std::fmt::Debug {
    /// Called once per node, in node order, before the drain loop starts.
    fn init(&self, node: &mut Node, comm: &mut Comm) -> Result<()>;

    /// Called for every message delivered to `node`.
    fn on_message(
        &self,
        node: &mut Node,
        comm: &mut Comm,
        arrival_time: f64,
        content: &str,
    ) -> Result<()>;
}

/// The dispatch phase an invocation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Start-up round, one `init` per node.
    Init,
    /// Message delivery via `on_message`.
    Main,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::Init => write!(f, "init"),
            Phase::Main => write!(f, "on_message"),
        }
    }
}

/// Names served by [`load`].
pub const BUILTIN_ALGORITHMS: [&str; 2] = ["bfs", "broadcast"];

/// Resolves the configured algorithm path against the built-in registry.
///
/// The file stem of the path selects the algorithm, so both `"broadcast"`
/// and `"algorithms/broadcastAlgorithm.py"` resolve to the broadcast
/// exemplar. Unknown names fail the whole run.
pub fn load(path: Option<&str>) -> Result<Arc<dyn Algorithm>> {
    let path = match path {
        Some(path) => path,
        None => return Err(ErrorKind::AlgorithmLoadFailed("no algorithm provided".into()).into()),
    };
    let stem = Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            ErrorKind::AlgorithmLoadFailed(format!("unusable algorithm path {:?}", path))
        })?;
    match stem {
        "bfs" | "BFSalgorithm" => Ok(Arc::new(Bfs)),
        "broadcast" | "broadcastAlgorithm" => Ok(Arc::new(Broadcast)),
        other => Err(ErrorKind::AlgorithmLoadFailed(format!(
            "unknown algorithm {:?} (built-ins: {})",
            other,
            BUILTIN_ALGORITHMS.join(", ")
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_by_file_stem() {
        assert!(load(Some("broadcast")).is_ok());
        assert!(load(Some("bfs")).is_ok());
        assert!(load(Some("algorithms/broadcastAlgorithm.py")).is_ok());
        assert!(load(Some("./somewhere/BFSalgorithm.py")).is_ok());
    }

    #[test]
    fn unknown_name_fails_the_load() {
        let err = load(Some("paxos")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::AlgorithmLoadFailed(_)));
    }

    #[test]
    fn missing_path_fails_the_load() {
        let err = load(None).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::AlgorithmLoadFailed(_)));
    }
}
