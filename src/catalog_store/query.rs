//! Dynamic predicate composition for the catalog queries.
//!
//! The builder accumulates `(fragment, bound parameter)` pairs and joins
//! them conjunctively. Fragments are code-owned string literals; every
//! user-supplied value travels as a bound parameter, never interpolated
//! into the SQL text. ORDER BY columns come from per-entity allow-lists in
//! the store, so no sort input reaches the query text either.

use rusqlite::types::Value;

#[derive(Debug, Default)]
pub struct QueryBuilder {
    predicates: Vec<String>,
    params: Vec<Value>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder::default()
    }

    /// Append a predicate fragment with its bound parameters. The fragment
    /// must contain one `?` placeholder per value.
    pub fn and(&mut self, fragment: &str, values: impl IntoIterator<Item = Value>) {
        self.predicates.push(fragment.to_string());
        self.params.extend(values);
    }

    /// Append a case-insensitive substring match. The wildcard wrapping
    /// happens in the parameter value, not in the SQL text.
    pub fn and_like(&mut self, fragment: &str, term: &str) {
        self.and(fragment, [Value::Text(format!("%{}%", term))]);
    }

    /// Append an `IN` membership predicate over an id set.
    ///
    /// An empty set must match zero rows, not silently drop the filter, so
    /// it composes the always-false predicate instead.
    pub fn and_id_set(&mut self, column: &str, ids: &[String]) {
        if ids.is_empty() {
            self.predicates.push("0 = 1".to_string());
            return;
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        self.predicates
            .push(format!("{} IN ({})", column, placeholders));
        self.params
            .extend(ids.iter().map(|id| Value::Text(id.clone())));
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// All predicates joined with AND, without the `WHERE` keyword. Empty
    /// when no filter applies.
    pub fn conjunction(&self) -> String {
        self.predicates.join(" AND ")
    }

    /// A leading ` WHERE ...` clause, or the empty string when no filter
    /// applies.
    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conjunction())
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_has_no_where_clause() {
        let qb = QueryBuilder::new();
        assert!(qb.is_empty());
        assert_eq!(qb.where_clause(), "");
        assert!(qb.params().is_empty());
    }

    #[test]
    fn test_predicates_combine_conjunctively() {
        let mut qb = QueryBuilder::new();
        qb.and_like("a.name LIKE ?", "daft");
        qb.and("a.popularity >= ?", [Value::Integer(50)]);

        assert_eq!(
            qb.where_clause(),
            " WHERE a.name LIKE ? AND a.popularity >= ?"
        );
        assert_eq!(
            qb.params(),
            &[Value::Text("%daft%".to_string()), Value::Integer(50)]
        );
    }

    #[test]
    fn test_like_wildcards_stay_in_parameter() {
        let mut qb = QueryBuilder::new();
        // A hostile term never reaches the SQL text.
        qb.and_like("a.name LIKE ?", "'; DROP TABLE artists; --");

        assert_eq!(qb.where_clause(), " WHERE a.name LIKE ?");
        assert_eq!(
            qb.params(),
            &[Value::Text("%'; DROP TABLE artists; --%".to_string())]
        );
    }

    #[test]
    fn test_id_set_expands_placeholders() {
        let mut qb = QueryBuilder::new();
        qb.and_id_set("a.id", &["x".to_string(), "y".to_string()]);

        assert_eq!(qb.where_clause(), " WHERE a.id IN (?, ?)");
        assert_eq!(
            qb.params(),
            &[Value::Text("x".to_string()), Value::Text("y".to_string())]
        );
    }

    #[test]
    fn test_empty_id_set_matches_nothing() {
        let mut qb = QueryBuilder::new();
        qb.and_id_set("a.id", &[]);

        assert_eq!(qb.where_clause(), " WHERE 0 = 1");
        assert!(qb.params().is_empty());
    }

    #[test]
    fn test_id_set_coexists_with_text_search() {
        // "search within an artist's tracks": both filters apply at once.
        let mut qb = QueryBuilder::new();
        qb.and_like("t.name LIKE ?", "love");
        qb.and_id_set("t.id", &["t1".to_string()]);

        assert_eq!(qb.where_clause(), " WHERE t.name LIKE ? AND t.id IN (?)");
        assert_eq!(qb.params().len(), 2);
    }
}
