//! # distsim
//!
//! A discrete-event simulator for message-passing distributed algorithms on
//! synthetic network topologies.
//!
//! A simulation binds one [`Algorithm`] — an `init` hook and an `on_message`
//! hook — to every node of a generated network. The engine runs `init` on
//! each node in node order, then advances a global event clock by repeatedly
//! delivering the earliest pending message to its destination, which may emit
//! further messages through the [`Comm`] facade. The run terminates when no
//! undelivered messages remain.
//!
//! Messages pop in ascending `(arrival_time, insertion_seq)` order, so
//! colliding arrival times are resolved in emission order. The generated
//! graph is guaranteed connected and neighbor-symmetric; ids are unique per
//! run. A node whose state is [`TERMINATED`] cannot send.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use distsim::{Broadcast, Config, NetworkBuilder};
//!
//! let mut builder = NetworkBuilder::new(Config::default());
//! builder.seed(7).algorithm(Arc::new(Broadcast));
//! let mut network = builder.build().unwrap();
//! let summary = network.run().unwrap();
//! println!("{} messages delivered", summary.delivered);
//! ```
//!
//! External observers (a graph display, a test harness) read the node map
//! through [`Network::nodes`] and consume state snapshots from the
//! [`ChangeLog`]; the engine appends, the observer pops, and neither reads
//! the other's side.

#![recursion_limit = "1024"]

pub mod algorithm;
pub mod algorithms;
pub mod changelog;
pub mod comm;
pub mod config;
pub mod engine;
pub mod error;
pub mod network;
pub mod node;
pub mod queue;
pub mod topology;

pub use crate::algorithm::{load, Algorithm, Phase, BUILTIN_ALGORITHMS};
pub use crate::algorithms::{Bfs, Broadcast};
pub use crate::changelog::ChangeLog;
pub use crate::comm::Comm;
pub use crate::config::{
    Config, DelayMode, DisplayMode, IdType, LogDetail, RootMode, Topology,
};
pub use crate::engine::{Delivery, Summary};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::network::{Network, NetworkBuilder};
pub use crate::node::{Node, NodeId, Snapshot, TERMINATED};
pub use crate::queue::{EventQueue, Message};
