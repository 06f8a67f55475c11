//! Value types making up a compiled query descriptor.

use std::fmt;

use serde::Serialize;

use crate::graph::JoinType;

/// One entry of the select list, qualified by a table alias.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SelectColumn {
    /// Every column of the aliased table (`o.*`), used when the node
    /// declared no explicit columns.
    Star {
        /// Qualifying table alias.
        alias: String,
    },
    /// A single named column (`o.id`).
    Column {
        /// Qualifying table alias.
        alias: String,
        /// Column name as declared by the host.
        name: String,
    },
}

impl SelectColumn {
    /// All columns of `alias`.
    pub fn star(alias: impl Into<String>) -> Self {
        SelectColumn::Star {
            alias: alias.into(),
        }
    }

    /// A single qualified column.
    pub fn column(alias: impl Into<String>, name: impl Into<String>) -> Self {
        SelectColumn::Column {
            alias: alias.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SelectColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectColumn::Star { alias } => write!(f, "{alias}.*"),
            SelectColumn::Column { alias, name } => write!(f, "{alias}.{name}"),
        }
    }
}

/// A table within the FROM-tree, with its joined children in edge-creation
/// order. Mirrors the graph model's tree exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinNode {
    /// Source table name.
    pub table: String,
    /// Alias the columns are qualified by.
    pub alias: String,
    /// Joined children, in the order their edges were created.
    pub children: Vec<JoinBranch>,
}

/// A join hanging off a parent table: the edge's current inner/outer marker
/// plus the child subtree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinBranch {
    /// Inner/outer marker of the connecting edge at compile time.
    pub join_type: JoinType,
    /// The joined subtree.
    pub child: JoinNode,
}

/// The compiled, declarative query: recomputed on every trigger, superseded
/// by the next compile, never persisted by this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryDescriptor {
    /// Qualified select list, in selection order then column declaration
    /// order. Never empty: an empty selection skips compilation entirely.
    pub columns: Vec<SelectColumn>,
    /// Nested FROM-tree rooted at the graph's root table.
    pub from: JoinNode,
    /// Free-text predicate, opaque to this crate. Empty means no filter.
    pub predicate: String,
    /// Unconditional row cap.
    pub limit: u64,
}

impl fmt::Display for QueryDescriptor {
    /// Renders a deterministic SQL preview.
    ///
    /// Join conditions are resolved from foreign-key metadata by the
    /// external executor and are not part of the descriptor, so none are
    /// rendered here.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}")?;
        }
        write!(f, " FROM {} AS {}", self.from.table, self.from.alias)?;
        fmt_joins(&self.from, f)?;
        if !self.predicate.trim().is_empty() {
            write!(f, " WHERE {}", self.predicate)?;
        }
        write!(f, " LIMIT {}", self.limit)
    }
}

fn fmt_joins(node: &JoinNode, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for branch in &node.children {
        let keyword = match branch.join_type {
            JoinType::Inner => "INNER JOIN",
            JoinType::Outer => "LEFT OUTER JOIN",
        };
        write!(f, " {keyword} {} AS {}", branch.child.table, branch.child.alias)?;
        fmt_joins(&branch.child, f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_renders_nested_joins_depth_first() {
        let descriptor = QueryDescriptor {
            columns: vec![SelectColumn::star("o"), SelectColumn::column("oi", "sku")],
            from: JoinNode {
                table: "orders".into(),
                alias: "o".into(),
                children: vec![JoinBranch {
                    join_type: JoinType::Inner,
                    child: JoinNode {
                        table: "order_items".into(),
                        alias: "oi".into(),
                        children: vec![JoinBranch {
                            join_type: JoinType::Outer,
                            child: JoinNode {
                                table: "products".into(),
                                alias: "p".into(),
                                children: Vec::new(),
                            },
                        }],
                    },
                }],
            },
            predicate: "o.total > 10".into(),
            limit: 100,
        };
        assert_eq!(
            descriptor.to_string(),
            "SELECT o.*, oi.sku FROM orders AS o \
             INNER JOIN order_items AS oi \
             LEFT OUTER JOIN products AS p \
             WHERE o.total > 10 LIMIT 100"
        );
    }

    #[test]
    fn blank_predicate_omits_where() {
        let descriptor = QueryDescriptor {
            columns: vec![SelectColumn::star("u")],
            from: JoinNode {
                table: "users".into(),
                alias: "u".into(),
                children: Vec::new(),
            },
            predicate: "   ".into(),
            limit: 100,
        };
        assert_eq!(descriptor.to_string(), "SELECT u.* FROM users AS u LIMIT 100");
    }
}
