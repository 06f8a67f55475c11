//! Canvas graph model: placed tables, join edges, and the tree invariant.
//!
//! Nodes and edges live in id-keyed arenas with stable insertion order; the
//! edge set always forms a rooted forest (in practice a single tree, since
//! every node after the first is attached with exactly one incoming edge).
//! Root finding and join-tree traversal are pure functions over that
//! structure; there are no parent/child back-pointers to keep in sync.

mod alias;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

pub use alias::AliasRegistry;

use crate::error::{GraphError, Result};
use crate::geom::Vec2;

/// Stable identity of a placed table node.
pub type NodeId = u64;
/// Stable identity of a join edge.
pub type EdgeId = u64;

/// Inner/outer marker carried by a join edge. Exactly one of the two is
/// active at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    /// Rows must match on both sides.
    #[default]
    Inner,
    /// Rows of the parent side are kept even without a match.
    Outer,
}

/// A table instance placed on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct TableNode {
    /// Stable identity, assigned by the model.
    pub id: NodeId,
    /// Source table reference; opaque to this crate.
    pub table_name: String,
    /// Host-declared column order. Empty means "all columns".
    pub columns: Vec<String>,
    /// Short unique label, derived from the table name.
    pub alias: String,
    /// Current canvas position.
    pub position: Vec2,
    /// Current simulation velocity.
    pub velocity: Vec2,
    /// Positive inertial mass; heavier nodes accelerate less.
    pub mass: f64,
    /// Transient force accumulator, reset on every simulation step.
    pub(crate) force: Vec2,
    pub(crate) incoming: Option<EdgeId>,
    pub(crate) outgoing: SmallVec<[EdgeId; 4]>,
}

impl TableNode {
    /// The edge pointing at this node from its parent, if any.
    pub fn parent_edge(&self) -> Option<EdgeId> {
        self.incoming
    }
}

/// A foreign-key-derived link between two placed tables.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinEdge {
    /// Stable identity, assigned by the model.
    pub id: EdgeId,
    /// Parent-side node.
    pub from_node: NodeId,
    /// Child-side node; holds at most one incoming edge.
    pub to_node: NodeId,
    /// Inner/outer marker, mutable by host action.
    pub join_type: JoinType,
    /// Per-edge spring rest length; `None` falls back to the shared layout
    /// default.
    pub rest_length: Option<f64>,
    /// Per-edge spring constant; `None` falls back to the shared layout
    /// default.
    pub spring_constant: Option<f64>,
}

/// Owns the node and edge arenas, the alias registry, and the invariants
/// tying them together.
#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: Vec<TableNode>,
    node_index: FxHashMap<NodeId, usize>,
    edges: Vec<JoinEdge>,
    edge_index: FxHashMap<EdgeId, usize>,
    aliases: AliasRegistry,
    next_node_id: NodeId,
    next_edge_id: EdgeId,
}

impl GraphModel {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of placed nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no nodes are placed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of join edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Places a new table node and returns its id. Assigns the alias and
    /// never fails; ids are handed out monotonically and cannot collide.
    pub fn add_node(
        &mut self,
        table_name: impl Into<String>,
        columns: Vec<String>,
        position: Vec2,
    ) -> NodeId {
        let id = self.next_node_id + 1;
        self.push_node(id, table_name.into(), columns, position);
        id
    }

    /// Places a table node under an explicit id. Fails with
    /// [`GraphError::DuplicateIdentity`] when the id is already taken.
    pub fn insert_node(
        &mut self,
        id: NodeId,
        table_name: impl Into<String>,
        columns: Vec<String>,
        position: Vec2,
    ) -> Result<NodeId> {
        if self.node_index.contains_key(&id) {
            return Err(GraphError::DuplicateIdentity { id });
        }
        self.push_node(id, table_name.into(), columns, position);
        Ok(id)
    }

    fn push_node(&mut self, id: NodeId, table_name: String, columns: Vec<String>, position: Vec2) {
        let alias = self.aliases.assign(&table_name);
        debug!(node = id, table = %table_name, %alias, "table placed");
        self.node_index.insert(id, self.nodes.len());
        self.nodes.push(TableNode {
            id,
            table_name,
            columns,
            alias,
            position,
            velocity: Vec2::ZERO,
            mass: 1.0,
            force: Vec2::ZERO,
            incoming: None,
            outgoing: SmallVec::new(),
        });
        self.next_node_id = self.next_node_id.max(id);
    }

    /// Connects `from` to `to` with a join edge.
    ///
    /// Rejected without mutating the graph when either endpoint is unknown,
    /// when `to` already has a parent, or when the edge would close a cycle
    /// (possible only when `to` is an ancestor of `from`).
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, join_type: JoinType) -> Result<EdgeId> {
        self.node(from)?;
        let target = self.node(to)?;
        if target.incoming.is_some() {
            return Err(GraphError::SecondParent { node: to });
        }
        if self.root_of(from)? == to {
            return Err(GraphError::Cycle { from, to });
        }

        self.next_edge_id += 1;
        let id = self.next_edge_id;
        self.edge_index.insert(id, self.edges.len());
        self.edges.push(JoinEdge {
            id,
            from_node: from,
            to_node: to,
            join_type,
            rest_length: None,
            spring_constant: None,
        });
        self.node_mut(to).incoming = Some(id);
        self.node_mut(from).outgoing.push(id);
        debug!(edge = id, from, to, ?join_type, "tables joined");
        Ok(id)
    }

    /// Switches an edge between inner and outer join.
    pub fn set_join_type(&mut self, edge: EdgeId, join_type: JoinType) -> Result<()> {
        let idx = self.edge_idx(edge)?;
        self.edges[idx].join_type = join_type;
        Ok(())
    }

    /// Overrides an edge's spring geometry; `None` keeps the shared default.
    pub fn set_edge_spring(
        &mut self,
        edge: EdgeId,
        rest_length: Option<f64>,
        spring_constant: Option<f64>,
    ) -> Result<()> {
        let idx = self.edge_idx(edge)?;
        self.edges[idx].rest_length = rest_length;
        self.edges[idx].spring_constant = spring_constant;
        Ok(())
    }

    /// Moves a node to an externally chosen position (host drag).
    pub fn set_position(&mut self, id: NodeId, position: Vec2) -> Result<()> {
        let idx = self.node_idx(id)?;
        self.nodes[idx].position = position;
        Ok(())
    }

    /// Changes a node's inertial mass. `mass` must be positive.
    pub fn set_mass(&mut self, id: NodeId, mass: f64) -> Result<()> {
        debug_assert!(mass > 0.0, "mass must be positive");
        let idx = self.node_idx(id)?;
        self.nodes[idx].mass = mass;
        Ok(())
    }

    /// The unique node without an incoming edge, found from the first placed
    /// node. Fails with [`GraphError::EmptyGraph`] when nothing is placed.
    pub fn root(&self) -> Result<NodeId> {
        let first = self.nodes.first().ok_or(GraphError::EmptyGraph)?;
        self.root_of(first.id)
    }

    /// Walks incoming edges upward from `id` until a parentless node is
    /// found. Terminates in at most N hops for N nodes, guaranteed by
    /// acyclicity.
    pub fn root_of(&self, id: NodeId) -> Result<NodeId> {
        let mut current = self.node(id)?;
        while let Some(edge) = current.incoming {
            let idx = self.edge_idx(edge)?;
            current = self.node(self.edges[idx].from_node)?;
        }
        Ok(current.id)
    }

    /// Clears nodes, edges, and the alias registry atomically; id counters
    /// restart as well, leaving no partial state observable.
    pub fn reset(&mut self) {
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "graph reset"
        );
        self.nodes.clear();
        self.node_index.clear();
        self.edges.clear();
        self.edge_index.clear();
        self.aliases.clear();
        self.next_node_id = 0;
        self.next_edge_id = 0;
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Result<&TableNode> {
        self.node_idx(id).map(|idx| &self.nodes[idx])
    }

    /// Looks up an edge by id.
    pub fn edge(&self, id: EdgeId) -> Result<&JoinEdge> {
        self.edge_idx(id).map(|idx| &self.edges[idx])
    }

    /// Nodes in placement order.
    pub fn nodes(&self) -> impl Iterator<Item = &TableNode> {
        self.nodes.iter()
    }

    /// Edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = &JoinEdge> {
        self.edges.iter()
    }

    /// Outgoing edges of a node, in creation order.
    pub fn outgoing(&self, id: NodeId) -> Result<impl Iterator<Item = &JoinEdge>> {
        let idx = self.node_idx(id)?;
        Ok(self.nodes[idx]
            .outgoing
            .iter()
            .map(|edge| &self.edges[self.edge_index[edge]]))
    }

    /// Current `(id, position)` pairs in placement order, for host position
    /// updates.
    pub fn positions(&self) -> Vec<(NodeId, Vec2)> {
        self.nodes.iter().map(|n| (n.id, n.position)).collect()
    }

    /// Split view for the simulation: mutable node arena (placement order),
    /// shared edge arena (creation order), and the id-to-arena-slot map.
    pub(crate) fn simulation_parts(
        &mut self,
    ) -> (&mut [TableNode], &[JoinEdge], &FxHashMap<NodeId, usize>) {
        (&mut self.nodes, &self.edges, &self.node_index)
    }

    fn node_idx(&self, id: NodeId) -> Result<usize> {
        self.node_index
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownNode { id })
    }

    fn edge_idx(&self, id: EdgeId) -> Result<usize> {
        self.edge_index
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownEdge { id })
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TableNode {
        let idx = self.node_index[&id];
        &mut self.nodes[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(model: &mut GraphModel, names: &[&str]) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let id = model.add_node(*name, Vec::new(), Vec2::new(i as f64, 0.0));
            if let Some(&prev) = ids.last() {
                model.add_edge(prev, id, JoinType::Inner).unwrap();
            }
            ids.push(id);
        }
        ids
    }

    #[test]
    fn aliases_follow_the_collision_sequence() {
        let mut model = GraphModel::new();
        let a = model.add_node("order_item", Vec::new(), Vec2::ZERO);
        let b = model.add_node("order_item", Vec::new(), Vec2::ZERO);
        let c = model.add_node("order_item", Vec::new(), Vec2::ZERO);
        assert_eq!(model.node(a).unwrap().alias, "oi");
        assert_eq!(model.node(b).unwrap().alias, "oi1");
        assert_eq!(model.node(c).unwrap().alias, "oi2");
    }

    #[test]
    fn second_parent_is_rejected_and_state_unchanged() {
        let mut model = GraphModel::new();
        let a = model.add_node("a", Vec::new(), Vec2::ZERO);
        let b = model.add_node("b", Vec::new(), Vec2::ZERO);
        let c = model.add_node("c", Vec::new(), Vec2::ZERO);
        model.add_edge(a, b, JoinType::Inner).unwrap();

        let before: Vec<JoinEdge> = model.edges().cloned().collect();
        let err = model.add_edge(c, b, JoinType::Inner).unwrap_err();
        assert_eq!(err, GraphError::SecondParent { node: b });
        assert_eq!(err.code(), "InvariantViolation");

        let after: Vec<JoinEdge> = model.edges().cloned().collect();
        assert_eq!(before, after);
        assert!(model.node(c).unwrap().outgoing.is_empty());
    }

    #[test]
    fn cycle_is_rejected() {
        let mut model = GraphModel::new();
        let ids = chain(&mut model, &["a", "b", "c"]);
        let err = model.add_edge(ids[2], ids[0], JoinType::Inner).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                from: ids[2],
                to: ids[0]
            }
        );
        assert_eq!(model.edge_count(), 2);
    }

    #[test]
    fn root_is_the_same_from_every_node() {
        let mut model = GraphModel::new();
        let ids = chain(&mut model, &["a", "b", "c", "d"]);
        for &id in &ids {
            assert_eq!(model.root_of(id).unwrap(), ids[0]);
        }
        assert_eq!(model.root().unwrap(), ids[0]);
    }

    #[test]
    fn root_of_empty_graph_is_an_error() {
        let model = GraphModel::new();
        assert_eq!(model.root().unwrap_err(), GraphError::EmptyGraph);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut model = GraphModel::new();
        let a = model.add_node("a", Vec::new(), Vec2::ZERO);
        assert_eq!(
            model.add_edge(a, 99, JoinType::Inner).unwrap_err(),
            GraphError::UnknownNode { id: 99 }
        );
        assert_eq!(
            model.set_join_type(7, JoinType::Outer).unwrap_err(),
            GraphError::UnknownEdge { id: 7 }
        );
    }

    #[test]
    fn explicit_id_collision_is_rejected() {
        let mut model = GraphModel::new();
        let id = model.add_node("a", Vec::new(), Vec2::ZERO);
        let err = model
            .insert_node(id, "b", Vec::new(), Vec2::ZERO)
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateIdentity { id });
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn join_type_toggle_is_exclusive() {
        let mut model = GraphModel::new();
        let ids = chain(&mut model, &["a", "b"]);
        let edge = model.node(ids[1]).unwrap().parent_edge().unwrap();
        assert_eq!(model.edge(edge).unwrap().join_type, JoinType::Inner);
        model.set_join_type(edge, JoinType::Outer).unwrap();
        assert_eq!(model.edge(edge).unwrap().join_type, JoinType::Outer);
        model.set_join_type(edge, JoinType::Inner).unwrap();
        assert_eq!(model.edge(edge).unwrap().join_type, JoinType::Inner);
    }

    #[test]
    fn reset_clears_everything_atomically() {
        let mut model = GraphModel::new();
        chain(&mut model, &["orders", "order_items"]);
        model.reset();
        assert!(model.is_empty());
        assert_eq!(model.edge_count(), 0);
        // counters and aliases restart from scratch
        let id = model.add_node("orders", Vec::new(), Vec2::ZERO);
        assert_eq!(id, 1);
        assert_eq!(model.node(id).unwrap().alias, "o");
    }

    #[test]
    fn outgoing_preserves_creation_order() {
        let mut model = GraphModel::new();
        let hub = model.add_node("hub", Vec::new(), Vec2::ZERO);
        let spokes: Vec<NodeId> = (0..3)
            .map(|i| model.add_node(format!("s{i}"), Vec::new(), Vec2::ZERO))
            .collect();
        for &s in &spokes {
            model.add_edge(hub, s, JoinType::Inner).unwrap();
        }
        let targets: Vec<NodeId> = model.outgoing(hub).unwrap().map(|e| e.to_node).collect();
        assert_eq!(targets, spokes);
    }
}
