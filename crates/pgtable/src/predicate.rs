//! Predicate compilation from partial-row mappings.
//!
//! [`Values`] is an ordered mapping from column name to bound value. The same
//! mapping compiles into an equality predicate, an insert column/value list
//! pair, or an UPDATE SET clause, depending on the operation consuming it.

use crate::error::{TableError, TableResult};
use crate::fragment::{Fragment, frag};
use std::str::FromStr;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// An ordered partial-row mapping from column name to bound value.
///
/// Insertion order is preserved and drives column order in every compiled
/// fragment. Setting a column that is already present replaces its value in
/// place, keeping iteration deterministic.
///
/// # Example
///
/// ```ignore
/// use pgtable::Values;
///
/// let row = Values::new().set("id", 1_i64).set("username", "alice");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Values {
    fields: Vec<(String, Arc<dyn ToSql + Sync + Send>)>,
}

impl Values {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value.
    pub fn set<T>(mut self, column: &str, value: T) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        let value: Arc<dyn ToSql + Sync + Send> = Arc::new(value);
        match self.fields.iter_mut().find(|(c, _)| c == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column.to_string(), value)),
        }
        self
    }

    /// Set a JSON column.
    pub fn set_json<T: serde::Serialize>(self, column: &str, value: &T) -> serde_json::Result<Self> {
        let json_val = serde_json::to_value(value)?;
        Ok(self.set(column, json_val))
    }

    /// Number of columns in the mapping.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the mapping has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    /// Compile to a conjunctive equality predicate.
    ///
    /// The empty mapping compiles to the always-true condition, so it
    /// matches every row.
    pub fn predicate(&self) -> TableResult<Fragment> {
        if self.fields.is_empty() {
            return Ok(match_all());
        }
        Ok(Fragment::join(self.assignments()?, " AND "))
    }

    /// Column-list and value-list fragments for an INSERT, positionally
    /// aligned in insertion order.
    pub fn insert_lists(&self) -> TableResult<(Fragment, Fragment)> {
        if self.fields.is_empty() {
            return Err(TableError::invalid_argument("insert row has no columns"));
        }

        let mut cols = Fragment::empty();
        let mut vals = Fragment::empty();
        for (i, (column, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                cols.push(", ");
                vals.push(", ");
            }
            cols.push_ident(column)?;
            vals.push_bind_value(value.clone());
        }
        Ok((cols, vals))
    }

    /// Compile to an UPDATE SET clause body.
    ///
    /// The empty mapping is rejected: an UPDATE with no assignments is
    /// meaningless and must not reach the engine.
    pub fn set_clause(&self) -> TableResult<Fragment> {
        if self.fields.is_empty() {
            return Err(TableError::invalid_argument(
                "update requires at least one assignment",
            ));
        }
        Ok(Fragment::join(self.assignments()?, ", "))
    }

    /// One `column = $n` fragment per field, in insertion order.
    fn assignments(&self) -> TableResult<Vec<Fragment>> {
        self.fields
            .iter()
            .map(|(column, value)| {
                let mut f = Fragment::empty();
                f.push_ident(column)?;
                f.push(" = ");
                f.push_bind_value(value.clone());
                Ok(f)
            })
            .collect()
    }
}

/// The always-true predicate, for the raw-SQL accessor variants.
pub fn match_all() -> Fragment {
    frag("1=1")
}

/// Sort direction for [`order_by`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Render as a SQL keyword.
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = TableError;

    fn from_str(s: &str) -> TableResult<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Direction::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Direction::Desc)
        } else {
            Err(TableError::invalid_argument(format!(
                "sort direction must be 'asc' or 'desc', got '{s}'"
            )))
        }
    }
}

/// Compile an `ORDER BY` clause; the direction applies to every listed column.
///
/// An empty column list is rejected.
pub fn order_by(columns: &[&str], direction: Direction) -> TableResult<Fragment> {
    if columns.is_empty() {
        return Err(TableError::invalid_argument(
            "order by requires at least one column",
        ));
    }

    let mut out = frag("ORDER BY ");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.push(", ");
        }
        out.push_ident(column)?;
        out.push(" ");
        out.push(direction.as_sql());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_clause_count_matches_key_count() {
        let w = Values::new()
            .set("a", 1_i32)
            .set("b", "x")
            .set("c", Option::<i64>::None);
        let p = w.predicate().unwrap();

        assert_eq!(p.to_sql(), "a = $1 AND b = $2 AND c = $3");
        assert_eq!(p.params_ref().len(), w.len());
    }

    #[test]
    fn empty_predicate_matches_all() {
        let p = Values::new().predicate().unwrap();
        assert_eq!(p.to_sql(), "1=1");
        assert_eq!(p.params_ref().len(), 0);
    }

    #[test]
    fn setting_a_column_twice_replaces_in_place() {
        let w = Values::new().set("a", 1_i32).set("b", 2_i32).set("a", 3_i32);
        assert_eq!(w.len(), 2);
        assert_eq!(w.columns().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn insert_lists_are_positionally_aligned() {
        let row = Values::new().set("id", 7_i64).set("username", "alice");
        let (cols, vals) = row.insert_lists().unwrap();

        assert_eq!(cols.to_sql(), "id, username");
        assert_eq!(vals.to_sql(), "$1, $2");
        assert_eq!(vals.params_ref().len(), 2);
        assert_eq!(cols.params_ref().len(), 0);
    }

    #[test]
    fn empty_insert_row_is_rejected() {
        let err = Values::new().insert_lists().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn set_clause_renders_assignments() {
        let changes = Values::new().set("bio", "x").set("age", 30_i32);
        let set = changes.set_clause().unwrap();

        assert_eq!(set.to_sql(), "bio = $1, age = $2");
        assert_eq!(set.params_ref().len(), 2);
    }

    #[test]
    fn empty_set_clause_is_rejected() {
        let err = Values::new().set_clause().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn set_json_binds_a_json_value() {
        let row = Values::new()
            .set_json("meta", &serde_json::json!({"k": 1}))
            .unwrap();
        let (cols, vals) = row.insert_lists().unwrap();
        assert_eq!(cols.to_sql(), "meta");
        assert_eq!(vals.to_sql(), "$1");
    }

    #[test]
    fn predicate_rejects_unsafe_column_names() {
        let w = Values::new().set("a; drop table users", 1_i32);
        assert!(w.predicate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn order_by_applies_direction_to_every_column() {
        let f = order_by(&["last_name", "first_name"], Direction::Desc).unwrap();
        assert_eq!(f.to_sql(), "ORDER BY last_name DESC, first_name DESC");
    }

    #[test]
    fn order_by_defaults_to_ascending() {
        let f = order_by(&["age"], Direction::default()).unwrap();
        assert_eq!(f.to_sql(), "ORDER BY age ASC");
    }

    #[test]
    fn empty_order_by_is_rejected() {
        let err = order_by(&[], Direction::Asc).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("asc".parse::<Direction>().unwrap(), Direction::Asc);
        assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
        assert!("sideways".parse::<Direction>().unwrap_err().is_invalid_argument());
    }
}
