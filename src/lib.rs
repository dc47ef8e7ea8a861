//! Copy-on-write augmented B-tree for positional indexing
//!
//! A [`Rope`] is a balanced sequence of user-defined elements. Every node
//! caches the [`Summary`] of its subtree, so any coordinate system that can be
//! read off a summary (bytes, chars, lines...) is addressable in O(log n)
//! through a [`Metric`]. Clones share structure; writes copy only the nodes on
//! the path to the change.
//!
//! Bulk construction, concatenation and splitting go through [`Builder`],
//! which grafts whole subtrees instead of re-inserting their elements.

mod builder;
mod check;
mod error;
mod iter;
mod node;
mod path;
mod rope;
mod storage;
mod summary;

pub use builder::Builder;
pub use error::InvariantError;
pub use iter::Iter;
pub use path::{Index, MAX_HEIGHT};
pub use rope::Rope;
pub use summary::{Element, Metric, Summary};

/// Maximum children per node (tuned for cache lines)
pub const MAX_NODE_SIZE: usize = 16;

/// Minimum children of any node except the root
pub const MIN_NODE_SIZE: usize = (MAX_NODE_SIZE + 1) / 2;
