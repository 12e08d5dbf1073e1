//! Built-in exemplar algorithms served by the loader registry.

mod bfs;
mod broadcast;

pub use self::bfs::Bfs;
pub use self::broadcast::Broadcast;
