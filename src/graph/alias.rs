//! Alias assignment for placed tables.

use rustc_hash::FxHashMap;

/// Allocates short unique aliases derived from table names.
///
/// The prefix is the first letter of each `_`-separated segment of the name,
/// lowercased (`order_item` → `oi`). The first table with a given prefix
/// keeps the bare prefix; each later collision appends the running occurrence
/// count, so three `order_item` drops alias to `oi`, `oi1`, `oi2`.
///
/// Owned by a single graph instance and cleared with it; never process-wide.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    seen: FxHashMap<String, u32>,
}

impl AliasRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes, records, and returns the alias for one more occurrence of
    /// `table_name`.
    pub fn assign(&mut self, table_name: &str) -> String {
        let prefix = derive_prefix(table_name);
        let count = self.seen.entry(prefix.clone()).or_insert(0);
        let alias = if *count == 0 {
            prefix
        } else {
            format!("{prefix}{count}")
        };
        *count += 1;
        alias
    }

    /// Forgets every prefix counter.
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// First letter of each underscore-separated segment, lowercased. Empty
/// segments (doubled or leading underscores) contribute nothing.
fn derive_prefix(table_name: &str) -> String {
    table_name
        .split('_')
        .filter_map(|segment| segment.chars().next())
        .flat_map(char::to_lowercase)
        .collect()
}
