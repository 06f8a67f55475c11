//! Headless core of a visual join assembler.
//!
//! A host drops table nodes onto a canvas and links them with
//! foreign-key-derived edges; the edges form a rooted tree. This crate owns
//! that graph ([`GraphModel`]), lays it out with a force-directed simulation
//! ([`LayoutEngine`]), and compiles the tree plus the host's selection into
//! a declarative [`QueryDescriptor`] an external executor can run. Window
//! chrome, drag decoding, SQL execution, and result rendering are host
//! concerns and live outside this crate; [`Session`] is the boundary they
//! talk to.

#![warn(missing_docs)]

pub mod error;
pub mod geom;
pub mod graph;
pub mod layout;
pub mod query;
pub mod session;

pub use error::{GraphError, Result};
pub use geom::Vec2;
pub use graph::{AliasRegistry, EdgeId, GraphModel, JoinEdge, JoinType, NodeId, TableNode};
pub use layout::{LayoutEngine, LayoutParams};
pub use query::{compile, JoinBranch, JoinNode, QueryDescriptor, SelectColumn, ROW_LIMIT};
pub use session::{SchemaProvider, Session, SessionObserver};
