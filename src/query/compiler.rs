//! Lowering from graph model + selection to a query descriptor.

use tracing::debug;

use crate::error::Result;
use crate::graph::{GraphModel, NodeId};
use crate::query::descriptor::{JoinBranch, JoinNode, QueryDescriptor, SelectColumn};

/// Unconditional row cap applied to every compiled query.
pub const ROW_LIMIT: u64 = 100;

/// Compiles the current tree and selection into a descriptor.
///
/// Fails with [`crate::GraphError::EmptyGraph`] when no nodes exist. An
/// empty selection yields `Ok(None)`: a "select nothing" query is never
/// emitted. The compiler keeps no state between calls; unchanged inputs
/// produce an identical descriptor.
pub fn compile(
    graph: &GraphModel,
    selection: &[NodeId],
    predicate: &str,
) -> Result<Option<QueryDescriptor>> {
    let root = graph.root()?;
    if selection.is_empty() {
        return Ok(None);
    }

    let mut columns = Vec::new();
    for &id in selection {
        let node = graph.node(id)?;
        if node.columns.is_empty() {
            columns.push(SelectColumn::star(&node.alias));
        } else {
            for name in &node.columns {
                columns.push(SelectColumn::column(&node.alias, name));
            }
        }
    }

    let from = join_tree(graph, root)?;
    debug!(root, columns = columns.len(), "query compiled");
    Ok(Some(QueryDescriptor {
        columns,
        from,
        predicate: predicate.to_owned(),
        limit: ROW_LIMIT,
    }))
}

/// Builds the FROM-tree below `id`, children in edge-creation order.
fn join_tree(graph: &GraphModel, id: NodeId) -> Result<JoinNode> {
    let node = graph.node(id)?;
    let mut children = Vec::new();
    for edge in graph.outgoing(id)? {
        children.push(JoinBranch {
            join_type: edge.join_type,
            child: join_tree(graph, edge.to_node)?,
        });
    }
    Ok(JoinNode {
        table: node.table_name.clone(),
        alias: node.alias.clone(),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec2;
    use crate::graph::JoinType;
    use crate::GraphError;

    fn orders_with_items() -> (GraphModel, NodeId, NodeId) {
        let mut model = GraphModel::new();
        let orders = model.add_node("orders", Vec::new(), Vec2::ZERO);
        let items = model.add_node("order_items", Vec::new(), Vec2::new(1.0, 0.0));
        model.add_edge(orders, items, JoinType::Inner).unwrap();
        (model, orders, items)
    }

    #[test]
    fn empty_graph_is_an_error() {
        let model = GraphModel::new();
        assert_eq!(compile(&model, &[1], "").unwrap_err(), GraphError::EmptyGraph);
    }

    #[test]
    fn empty_selection_skips_compilation() {
        let (model, _, _) = orders_with_items();
        assert_eq!(compile(&model, &[], "").unwrap(), None);
    }

    #[test]
    fn columns_follow_selection_order() {
        let (model, orders, items) = orders_with_items();
        let descriptor = compile(&model, &[items, orders], "").unwrap().unwrap();
        assert_eq!(
            descriptor.columns,
            vec![SelectColumn::star("oi"), SelectColumn::star("o")]
        );
    }

    #[test]
    fn declared_columns_keep_their_order() {
        let mut model = GraphModel::new();
        let users = model.add_node(
            "users",
            vec!["id".into(), "name".into(), "email".into()],
            Vec2::ZERO,
        );
        let descriptor = compile(&model, &[users], "").unwrap().unwrap();
        assert_eq!(
            descriptor.columns,
            vec![
                SelectColumn::column("u", "id"),
                SelectColumn::column("u", "name"),
                SelectColumn::column("u", "email"),
            ]
        );
    }

    #[test]
    fn repeated_compiles_are_identical() {
        let (model, orders, items) = orders_with_items();
        let selection = [orders, items];
        let first = compile(&model, &selection, "o.total > 5").unwrap().unwrap();
        let second = compile(&model, &selection, "o.total > 5").unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn from_tree_mirrors_the_model() {
        let (mut model, orders, items) = orders_with_items();
        let products = model.add_node("products", Vec::new(), Vec2::new(2.0, 0.0));
        model.add_edge(items, products, JoinType::Outer).unwrap();

        let descriptor = compile(&model, &[orders], "").unwrap().unwrap();
        assert_eq!(descriptor.from.alias, "o");
        assert_eq!(descriptor.from.children.len(), 1);
        let items_branch = &descriptor.from.children[0];
        assert_eq!(items_branch.join_type, JoinType::Inner);
        assert_eq!(items_branch.child.alias, "oi");
        assert_eq!(items_branch.child.children[0].join_type, JoinType::Outer);
        assert_eq!(items_branch.child.children[0].child.table, "products");
        assert_eq!(descriptor.limit, ROW_LIMIT);
    }
}
