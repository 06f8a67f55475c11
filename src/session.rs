//! Host adapter: translates host commands into model mutations, re-triggers
//! layout and compilation, and fans events out to registered observers.
//!
//! The session is single-threaded by design. The host drives
//! [`Session::step`] from its own periodic tick while
//! [`Session::is_settled`] is false, and must not interleave mutations with
//! an in-progress step; every mutation clears the settled flag so the tick
//! driver knows to resume.

use tracing::trace;

use crate::error::Result;
use crate::geom::Vec2;
use crate::graph::{EdgeId, GraphModel, JoinType, NodeId};
use crate::layout::{LayoutEngine, LayoutParams};
use crate::query::{compile, QueryDescriptor};

/// Callbacks the host registers to hear about layout and query changes.
/// All notifications are synchronous; default implementations ignore the
/// event.
pub trait SessionObserver {
    /// Positions after a simulation step, in placement order.
    fn positions_updated(&mut self, positions: &[(NodeId, Vec2)]) {
        let _ = positions;
    }

    /// A recompile produced a fresh descriptor.
    fn query_changed(&mut self, descriptor: &QueryDescriptor) {
        let _ = descriptor;
    }

    /// The first selected node's root table changed; the host should switch
    /// its foreign-key filter context accordingly.
    fn root_changed(&mut self, root: NodeId) {
        let _ = root;
    }
}

/// Schema metadata consumed from the host's catalog collaborator.
pub trait SchemaProvider {
    /// Ordered column names of a table.
    fn columns_of(&self, table: &str) -> Vec<String>;

    /// Directed `(from_table, to_table)` foreign-key relations touching a
    /// table.
    fn foreign_keys_of(&self, table: &str) -> Vec<(String, String)>;
}

/// Owns the graph model, the layout engine, the selection, and the
/// predicate, and wires them together per host command.
pub struct Session {
    graph: GraphModel,
    engine: LayoutEngine,
    selection: Vec<NodeId>,
    predicate: String,
    settled: bool,
    notified_root: Option<NodeId>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session with default layout parameters.
    pub fn new() -> Self {
        Self::with_params(LayoutParams::default())
    }

    /// Creates a session with host-supplied layout parameters.
    pub fn with_params(params: LayoutParams) -> Self {
        Self {
            graph: GraphModel::new(),
            engine: LayoutEngine::new(params),
            selection: Vec::new(),
            predicate: String::new(),
            // an empty graph is already at rest
            settled: true,
            notified_root: None,
            observers: Vec::new(),
        }
    }

    /// Registers an observer for layout and query events.
    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Read access to the underlying graph.
    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    /// The active layout parameters.
    pub fn params(&self) -> &LayoutParams {
        self.engine.params()
    }

    /// Currently selected node ids, in host-declared order.
    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// Current free-text predicate.
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// True once stepping has brought the layout below the settle
    /// threshold; the tick driver should pause until the next mutation.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Places a table node and resumes the layout.
    pub fn add_node(
        &mut self,
        table_name: impl Into<String>,
        columns: Vec<String>,
        position: Vec2,
    ) -> NodeId {
        let id = self.graph.add_node(table_name, columns, position);
        self.settled = false;
        self.emit_query();
        id
    }

    /// Places a table node, pulling its column list from the schema
    /// provider.
    pub fn place_table(
        &mut self,
        provider: &dyn SchemaProvider,
        table: &str,
        position: Vec2,
    ) -> NodeId {
        let columns = provider.columns_of(table);
        self.add_node(table, columns, position)
    }

    /// Joins two placed tables with an inner join (toggle it afterwards with
    /// [`Session::set_join_type`]) and resumes the layout.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId> {
        let id = self.graph.add_edge(from, to, JoinType::Inner)?;
        self.settled = false;
        self.refresh_root();
        self.emit_query();
        Ok(id)
    }

    /// Switches an edge between inner and outer join and recompiles.
    pub fn set_join_type(&mut self, edge: EdgeId, join_type: JoinType) -> Result<()> {
        self.graph.set_join_type(edge, join_type)?;
        self.emit_query();
        Ok(())
    }

    /// Replaces the selection and recompiles. Unknown ids are rejected
    /// without touching the current selection.
    pub fn set_selection(&mut self, selection: Vec<NodeId>) -> Result<()> {
        for &id in &selection {
            self.graph.node(id)?;
        }
        self.selection = selection;
        self.refresh_root();
        self.emit_query();
        Ok(())
    }

    /// Replaces the predicate text and recompiles.
    pub fn set_predicate(&mut self, predicate: impl Into<String>) {
        self.predicate = predicate.into();
        self.emit_query();
    }

    /// Moves a node to a host-chosen position (drag) and resumes the
    /// layout.
    pub fn set_position(&mut self, id: NodeId, position: Vec2) -> Result<()> {
        self.graph.set_position(id, position)?;
        self.settled = false;
        Ok(())
    }

    /// Discards nodes, edges, aliases, selection, and predicate atomically.
    /// The empty graph counts as settled; the host should stop its tick
    /// driver and restart it lazily on the next mutation.
    pub fn reset(&mut self) {
        self.graph.reset();
        self.selection.clear();
        self.predicate.clear();
        self.settled = true;
        self.notified_root = None;
    }

    /// Advances the simulation by `dt`, pushes positions to observers, and
    /// returns the kinetic-energy proxy.
    pub fn step(&mut self, dt: f64) -> f64 {
        let kinetic = self.engine.step(&mut self.graph, dt);
        if self.engine.is_settled(kinetic) {
            if !self.settled {
                trace!(kinetic, "layout settled");
            }
            self.settled = true;
        }
        let positions = self.graph.positions();
        for observer in &mut self.observers {
            observer.positions_updated(&positions);
        }
        kinetic
    }

    /// Tables foreign-key-related to the current root context, in catalog
    /// order, deduplicated. Empty when nothing is selected.
    pub fn join_candidates(&self, provider: &dyn SchemaProvider) -> Vec<String> {
        let Some(&first) = self.selection.first() else {
            return Vec::new();
        };
        let Ok(root) = self.graph.root_of(first) else {
            return Vec::new();
        };
        let Ok(node) = self.graph.node(root) else {
            return Vec::new();
        };
        let table = node.table_name.clone();
        let mut candidates = Vec::new();
        for (from, to) in provider.foreign_keys_of(&table) {
            let other = if from == table {
                to
            } else if to == table {
                from
            } else {
                continue;
            };
            if !candidates.contains(&other) {
                candidates.push(other);
            }
        }
        candidates
    }

    /// Recompiles and notifies observers when a descriptor was produced.
    /// An empty graph or empty selection produces nothing and is not an
    /// error at this level.
    fn emit_query(&mut self) {
        let compiled = compile(&self.graph, &self.selection, &self.predicate);
        if let Ok(Some(descriptor)) = compiled {
            for observer in &mut self.observers {
                observer.query_changed(&descriptor);
            }
        }
    }

    /// Emits `root_changed` when the first selected node's root differs
    /// from the last notified one.
    fn refresh_root(&mut self) {
        let Some(&first) = self.selection.first() else {
            return;
        };
        let Ok(root) = self.graph.root_of(first) else {
            return;
        };
        if self.notified_root != Some(root) {
            self.notified_root = Some(root);
            for observer in &mut self.observers {
                observer.root_changed(root);
            }
        }
    }
}
