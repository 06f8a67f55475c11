//! Join-tree compilation.
//!
//! Walks the graph model's tree structure and the host's current selection
//! and produces a [`QueryDescriptor`]: the declarative representation of
//! columns, nested join tree, predicate, and row cap that an external
//! executor turns into results.

mod compiler;
mod descriptor;

pub use compiler::{compile, ROW_LIMIT};
pub use descriptor::{JoinBranch, JoinNode, QueryDescriptor, SelectColumn};
