//! Composable, parameter-safe SQL fragments.
//!
//! A [`Fragment`] stores SQL pieces and bound values separately and generates
//! `$1, $2, ...` placeholders in the final SQL string, so fragments compose
//! without manually tracking placeholder indices.
//!
//! # Example
//!
//! ```ignore
//! use pgtable::frag;
//!
//! let mut w = frag("age >= ");
//! w.push_bind(21_i32);
//!
//! let mut q = frag("SELECT * FROM users WHERE ");
//! q.push_fragment(w);
//! assert_eq!(q.to_sql(), "SELECT * FROM users WHERE age >= $1");
//! ```

use crate::error::{TableError, TableResult};
use std::sync::Arc;
use tokio_postgres::types::ToSql;

#[derive(Debug)]
enum Part {
    Raw(String),
    Param,
}

/// A piece of query text plus its bound values.
#[derive(Debug, Default)]
pub struct Fragment {
    parts: Vec<Part>,
    params: Vec<Arc<dyn ToSql + Sync + Send>>,
}

/// Start a fragment from an initial piece of SQL.
pub fn frag(initial_sql: impl Into<String>) -> Fragment {
    Fragment::new(initial_sql)
}

impl Fragment {
    /// Create a new fragment with an initial piece of SQL.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Raw(initial_sql.into())],
            params: Vec::new(),
        }
    }

    /// Create an empty fragment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(Part::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(Part::Raw(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind<T>(&mut self, value: T) -> &mut Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.parts.push(Part::Param);
        self.params.push(Arc::new(value));
        self
    }

    pub(crate) fn push_bind_value(&mut self, value: Arc<dyn ToSql + Sync + Send>) -> &mut Self {
        self.parts.push(Part::Param);
        self.params.push(value);
        self
    }

    /// Append another [`Fragment`], consuming it.
    ///
    /// Placeholder indices stay correct: they are assigned when the combined
    /// fragment is rendered, not when parts are appended.
    pub fn push_fragment(&mut self, mut other: Fragment) -> &mut Self {
        self.parts.append(&mut other.parts);
        self.params.append(&mut other.params);
        self
    }

    /// Append a SQL identifier (schema/table/column) safely.
    ///
    /// Identifiers cannot be parameterized, so this validates that each
    /// `.`-separated segment matches `[A-Za-z_][A-Za-z0-9_]*` before
    /// splicing it into the SQL text.
    pub fn push_ident(&mut self, ident: &str) -> TableResult<&mut Self> {
        if ident.is_empty() {
            return Err(TableError::invalid_argument("empty identifier"));
        }

        for seg in ident.split('.') {
            let mut chars = seg.chars();
            let first_ok = chars
                .next()
                .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
            if !first_ok || !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
                return Err(TableError::invalid_argument(format!(
                    "invalid identifier '{ident}'"
                )));
            }
        }

        Ok(self.push(ident))
    }

    /// Join fragments with a raw separator.
    pub fn join(parts: impl IntoIterator<Item = Fragment>, sep: &str) -> Fragment {
        let mut out = Fragment::empty();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push(sep);
            }
            out.push_fragment(part);
        }
        out
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                Part::Raw(s) => out.push_str(s),
                Part::Param => {
                    idx += 1;
                    use std::fmt::Write;
                    let _ = write!(&mut out, "${idx}");
                }
            }
        }
        out
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}
