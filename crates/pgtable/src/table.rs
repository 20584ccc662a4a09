//! Single-table accessors.
//!
//! A [`TableDef`] is const-constructible static metadata: the table name and
//! its key (conflict-target) columns. Declare one per known table and bind it
//! to a connection to get a [`Table`]:
//!
//! ```ignore
//! use pgtable::{TableDef, Values};
//!
//! const USERS: TableDef = TableDef::new("users").with_key(&["id"]);
//!
//! let users = USERS.bind(&client);
//! users.insert(&[Values::new().set("id", 1_i64).set("username", "alice")]).await?;
//! let row = users.fetch_one(&Values::new().set("id", 1_i64)).await?;
//! ```

use crate::client::Client;
use crate::error::{TableError, TableResult};
use crate::fragment::{Fragment, frag};
use crate::predicate::{Direction, Values, order_by};
use futures_util::future::try_join_all;
use tokio_postgres::Row;

/// Static table metadata: name plus key columns.
///
/// The key columns name the conflict target used by
/// [`Table::insert_or_replace`]; leave them empty for tables that never
/// resolve conflicts by replacement.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub key_cols: &'static [&'static str],
}

impl TableDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            key_cols: &[],
        }
    }

    pub const fn with_key(mut self, cols: &'static [&'static str]) -> Self {
        self.key_cols = cols;
        self
    }

    /// Bind this definition to a connection handle.
    pub fn bind<'a, C: Client>(&self, conn: &'a C) -> Table<'a, C> {
        Table { def: *self, conn }
    }
}

/// Ordering and limit options for [`Table::fetch_all`].
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    order_by: Option<Vec<String>>,
    direction: Direction,
    limit: Option<i64>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Order the result by one or more columns.
    pub fn order_by(mut self, columns: &[&str]) -> Self {
        self.order_by = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Sort direction, applied to every ordered column. Defaults to ascending.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Cap the number of returned rows. Must be non-negative.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Conflict handling for the insert variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OnConflict {
    Error,
    Ignore,
    Replace,
}

/// A table accessor bound to one table name and one connection handle.
///
/// The connection is held by reference for the accessor's whole lifetime and
/// is never closed here. All operations issue exactly one round trip, except
/// the multi-row insert variants, which issue one per row.
pub struct Table<'a, C> {
    def: TableDef,
    conn: &'a C,
}

impl<'a, C: Client> Table<'a, C> {
    /// The bound table name.
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    // ==================== Insert ====================

    /// Insert one or more rows, one INSERT statement per row, all dispatched
    /// concurrently. Constraint violations propagate as
    /// [`TableError::DataAccess`].
    ///
    /// The call completes once every row statement has completed, or as soon
    /// as the first failure is observed. Rows already inserted when a later
    /// statement fails are not rolled back; bind the accessor to a
    /// transaction for all-or-nothing batches.
    pub async fn insert(&self, rows: &[Values]) -> TableResult<()> {
        self.insert_with(rows, OnConflict::Error).await
    }

    /// As [`Table::insert`], but a conflicting row is skipped
    /// (`ON CONFLICT DO NOTHING`) instead of raising.
    pub async fn insert_or_ignore(&self, rows: &[Values]) -> TableResult<()> {
        self.insert_with(rows, OnConflict::Ignore).await
    }

    /// As [`Table::insert`], but a conflicting row is overwritten
    /// (`ON CONFLICT ... DO UPDATE`) instead of raising.
    ///
    /// Requires key columns on the [`TableDef`].
    pub async fn insert_or_replace(&self, rows: &[Values]) -> TableResult<()> {
        self.insert_with(rows, OnConflict::Replace).await
    }

    async fn insert_with(&self, rows: &[Values], conflict: OnConflict) -> TableResult<()> {
        if rows.is_empty() {
            return Err(TableError::invalid_argument(
                "insert requires at least one row",
            ));
        }

        let mut stmts = Vec::with_capacity(rows.len());
        for row in rows {
            stmts.push(build_insert(&self.def, row, conflict)?);
        }

        try_join_all(stmts.iter().map(|stmt| self.run_execute(stmt))).await?;
        Ok(())
    }

    // ==================== Update ====================

    /// UPDATE rows matching a raw predicate fragment; returns the
    /// affected-row count the engine reports.
    pub async fn update_sql(&self, pred: Fragment, changes: &Values) -> TableResult<u64> {
        let stmt = build_update(&self.def, pred, changes)?;
        self.run_execute(&stmt).await
    }

    /// UPDATE rows matching an equality mapping.
    pub async fn update(&self, where_values: &Values, changes: &Values) -> TableResult<u64> {
        self.update_sql(where_values.predicate()?, changes).await
    }

    // ==================== Delete ====================

    /// DELETE rows matching a raw predicate fragment.
    pub async fn delete_sql(&self, pred: Fragment) -> TableResult<()> {
        let stmt = build_delete(&self.def, pred)?;
        self.run_execute(&stmt).await?;
        Ok(())
    }

    /// DELETE rows matching an equality mapping.
    pub async fn delete(&self, where_values: &Values) -> TableResult<()> {
        self.delete_sql(where_values.predicate()?).await
    }

    // ==================== Select ====================

    /// SELECT * rows matching a raw predicate fragment, in engine order.
    pub async fn fetch_all_sql(&self, pred: Fragment) -> TableResult<Vec<Row>> {
        let stmt = build_select(&self.def, pred)?;
        self.run_query(&stmt).await
    }

    /// SELECT at most one row matching a raw predicate fragment.
    ///
    /// Returns `None` for zero matches and a [`TableError::RowCount`] error
    /// for two or more.
    pub async fn fetch_opt_sql(&self, pred: Fragment) -> TableResult<Option<Row>> {
        let stmt = build_select_one(&self.def, pred)?;
        at_most_one(self.run_query(&stmt).await?)
    }

    /// SELECT exactly one row matching a raw predicate fragment.
    ///
    /// Zero matches is a [`TableError::RowCount`] error too.
    pub async fn fetch_one_sql(&self, pred: Fragment) -> TableResult<Row> {
        self.fetch_opt_sql(pred)
            .await?
            .ok_or_else(|| TableError::row_count(1, 0))
    }

    /// SELECT * rows matching an equality mapping, with optional ordering
    /// and limit.
    pub async fn fetch_all(
        &self,
        where_values: &Values,
        opts: &FetchOptions,
    ) -> TableResult<Vec<Row>> {
        let stmt = build_fetch(&self.def, where_values, opts)?;
        self.run_query(&stmt).await
    }

    /// SELECT at most one row matching an equality mapping.
    pub async fn fetch_opt(&self, where_values: &Values) -> TableResult<Option<Row>> {
        at_most_one(self.fetch_all(where_values, &FetchOptions::new()).await?)
    }

    /// SELECT exactly one row matching an equality mapping.
    pub async fn fetch_one(&self, where_values: &Values) -> TableResult<Row> {
        self.fetch_opt(where_values)
            .await?
            .ok_or_else(|| TableError::row_count(1, 0))
    }

    // ==================== Dispatch ====================

    async fn run_query(&self, stmt: &Fragment) -> TableResult<Vec<Row>> {
        let sql = stmt.to_sql();
        tracing::debug!(table = self.def.name, sql = %sql, "query");
        self.conn.query(&sql, &stmt.params_ref()).await
    }

    async fn run_execute(&self, stmt: &Fragment) -> TableResult<u64> {
        let sql = stmt.to_sql();
        tracing::debug!(table = self.def.name, sql = %sql, "execute");
        self.conn.execute(&sql, &stmt.params_ref()).await
    }
}

/// Zero rows is `None`, one row is the row, more is a row-count violation.
fn at_most_one<T>(mut rows: Vec<T>) -> TableResult<Option<T>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        got => Err(TableError::row_count(1, got as u64)),
    }
}

fn build_insert(def: &TableDef, row: &Values, conflict: OnConflict) -> TableResult<Fragment> {
    let (cols, vals) = row.insert_lists()?;

    let mut stmt = frag("INSERT INTO ");
    stmt.push_ident(def.name)?;
    stmt.push(" (");
    stmt.push_fragment(cols);
    stmt.push(") VALUES (");
    stmt.push_fragment(vals);
    stmt.push(")");

    match conflict {
        OnConflict::Error => {}
        OnConflict::Ignore => {
            stmt.push(" ON CONFLICT DO NOTHING");
        }
        OnConflict::Replace => {
            if def.key_cols.is_empty() {
                return Err(TableError::invalid_argument(format!(
                    "table '{}' declares no key columns to resolve conflicts against",
                    def.name
                )));
            }

            let overwrite: Vec<&str> = row
                .columns()
                .filter(|c| !def.key_cols.iter().any(|k| k == c))
                .collect();

            // A row carrying nothing but its key has nothing to overwrite.
            if overwrite.is_empty() {
                stmt.push(" ON CONFLICT DO NOTHING");
            } else {
                stmt.push(" ON CONFLICT (");
                for (i, key) in def.key_cols.iter().enumerate() {
                    if i > 0 {
                        stmt.push(", ");
                    }
                    stmt.push_ident(key)?;
                }
                stmt.push(") DO UPDATE SET ");
                for (i, column) in overwrite.iter().enumerate() {
                    if i > 0 {
                        stmt.push(", ");
                    }
                    stmt.push_ident(column)?;
                    stmt.push(" = EXCLUDED.");
                    stmt.push_ident(column)?;
                }
            }
        }
    }

    Ok(stmt)
}

fn build_update(def: &TableDef, pred: Fragment, changes: &Values) -> TableResult<Fragment> {
    let set = changes.set_clause()?;

    let mut stmt = frag("UPDATE ");
    stmt.push_ident(def.name)?;
    stmt.push(" SET ");
    stmt.push_fragment(set);
    stmt.push(" WHERE ");
    stmt.push_fragment(pred);
    Ok(stmt)
}

fn build_delete(def: &TableDef, pred: Fragment) -> TableResult<Fragment> {
    let mut stmt = frag("DELETE FROM ");
    stmt.push_ident(def.name)?;
    stmt.push(" WHERE ");
    stmt.push_fragment(pred);
    Ok(stmt)
}

fn build_select(def: &TableDef, pred: Fragment) -> TableResult<Fragment> {
    let mut stmt = frag("SELECT * FROM ");
    stmt.push_ident(def.name)?;
    stmt.push(" WHERE ");
    stmt.push_fragment(pred);
    Ok(stmt)
}

fn build_select_one(def: &TableDef, pred: Fragment) -> TableResult<Fragment> {
    let mut stmt = build_select(def, pred)?;
    // Two rows are enough to prove the violation; no point scanning further.
    stmt.push(" LIMIT 2");
    Ok(stmt)
}

fn build_fetch(def: &TableDef, where_values: &Values, opts: &FetchOptions) -> TableResult<Fragment> {
    let mut stmt = build_select(def, where_values.predicate()?)?;

    if let Some(columns) = &opts.order_by {
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        stmt.push(" ");
        stmt.push_fragment(order_by(&columns, opts.direction)?);
    }

    if let Some(limit) = opts.limit {
        if limit < 0 {
            return Err(TableError::invalid_argument(format!(
                "limit must be non-negative, got {limit}"
            )));
        }
        stmt.push(&format!(" LIMIT {limit}"));
    }

    Ok(stmt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS: TableDef = TableDef::new("users").with_key(&["id"]);
    const LOGS: TableDef = TableDef::new("logs");

    fn row() -> Values {
        Values::new().set("id", 1_i64).set("username", "alice")
    }

    #[test]
    fn insert_builds_one_statement_per_row_shape() {
        let stmt = build_insert(&USERS, &row(), OnConflict::Error).unwrap();
        assert_eq!(
            stmt.to_sql(),
            "INSERT INTO users (id, username) VALUES ($1, $2)"
        );
        assert_eq!(stmt.params_ref().len(), 2);
    }

    #[test]
    fn insert_or_ignore_appends_do_nothing() {
        let stmt = build_insert(&USERS, &row(), OnConflict::Ignore).unwrap();
        assert_eq!(
            stmt.to_sql(),
            "INSERT INTO users (id, username) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn insert_or_replace_overwrites_non_key_columns() {
        let stmt = build_insert(&USERS, &row(), OnConflict::Replace).unwrap();
        assert_eq!(
            stmt.to_sql(),
            "INSERT INTO users (id, username) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username"
        );
    }

    #[test]
    fn insert_or_replace_with_key_only_row_degenerates_to_do_nothing() {
        let key_only = Values::new().set("id", 1_i64);
        let stmt = build_insert(&USERS, &key_only, OnConflict::Replace).unwrap();
        assert_eq!(
            stmt.to_sql(),
            "INSERT INTO users (id) VALUES ($1) ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn insert_or_replace_without_key_columns_is_rejected() {
        let err = build_insert(&LOGS, &row(), OnConflict::Replace).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn insert_of_empty_row_is_rejected() {
        let err = build_insert(&USERS, &Values::new(), OnConflict::Error).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn update_numbers_set_params_before_where_params() {
        let changes = Values::new().set("bio", "x").set("age", 30_i32);
        let pred = Values::new().set("id", 1_i64).predicate().unwrap();
        let stmt = build_update(&USERS, pred, &changes).unwrap();

        assert_eq!(
            stmt.to_sql(),
            "UPDATE users SET bio = $1, age = $2 WHERE id = $3"
        );
        assert_eq!(stmt.params_ref().len(), 3);
    }

    #[test]
    fn update_with_empty_set_is_rejected() {
        let pred = Values::new().set("id", 1_i64).predicate().unwrap();
        let err = build_update(&USERS, pred, &Values::new()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn delete_renders_predicate() {
        let pred = Values::new().set("id", 1_i64).predicate().unwrap();
        let stmt = build_delete(&USERS, pred).unwrap();
        assert_eq!(stmt.to_sql(), "DELETE FROM users WHERE id = $1");
    }

    #[test]
    fn select_with_empty_mapping_matches_every_row() {
        let stmt = build_fetch(&USERS, &Values::new(), &FetchOptions::new()).unwrap();
        assert_eq!(stmt.to_sql(), "SELECT * FROM users WHERE 1=1");
        assert_eq!(stmt.params_ref().len(), 0);
    }

    #[test]
    fn select_appends_order_and_limit() {
        let opts = FetchOptions::new()
            .order_by(&["age"])
            .direction(Direction::Desc)
            .limit(1);
        let stmt = build_fetch(&USERS, &Values::new(), &opts).unwrap();
        assert_eq!(
            stmt.to_sql(),
            "SELECT * FROM users WHERE 1=1 ORDER BY age DESC LIMIT 1"
        );
    }

    #[test]
    fn select_orders_multiple_columns_with_one_direction() {
        let opts = FetchOptions::new().order_by(&["last_name", "first_name"]);
        let stmt = build_fetch(&USERS, &Values::new(), &opts).unwrap();
        assert_eq!(
            stmt.to_sql(),
            "SELECT * FROM users WHERE 1=1 ORDER BY last_name ASC, first_name ASC"
        );
    }

    #[test]
    fn empty_order_by_list_is_rejected() {
        let opts = FetchOptions::new().order_by(&[]);
        let err = build_fetch(&USERS, &Values::new(), &opts).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn negative_limit_is_rejected() {
        let opts = FetchOptions::new().limit(-1);
        let err = build_fetch(&USERS, &Values::new(), &opts).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn single_row_select_is_capped_at_two() {
        let pred = Values::new().set("id", 1_i64).predicate().unwrap();
        let stmt = build_select_one(&USERS, pred).unwrap();
        assert_eq!(stmt.to_sql(), "SELECT * FROM users WHERE id = $1 LIMIT 2");
    }

    #[test]
    fn at_most_one_enforces_cardinality() {
        assert_eq!(at_most_one(Vec::<i32>::new()).unwrap(), None);
        assert_eq!(at_most_one(vec![7]).unwrap(), Some(7));

        let err = at_most_one(vec![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            TableError::RowCount {
                expected: 1,
                got: 2
            }
        ));
    }

    // ==================== Dispatch against a stub connection ====================

    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_postgres::types::ToSql;

    /// A connection stub: returns no rows and counts executed statements.
    #[derive(Default)]
    struct StubConn {
        executed: AtomicUsize,
    }

    impl Client for StubConn {
        async fn query(
            &self,
            _sql: &str,
            _params: &[&(dyn ToSql + Sync)],
        ) -> TableResult<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn execute(&self, _sql: &str, _params: &[&(dyn ToSql + Sync)]) -> TableResult<u64> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    #[tokio::test]
    async fn multi_row_insert_dispatches_one_statement_per_row() {
        let conn = StubConn::default();
        let users = USERS.bind(&conn);

        let rows = vec![
            Values::new().set("id", 1_i64),
            Values::new().set("id", 2_i64),
            Values::new().set("id", 3_i64),
        ];
        users.insert(&rows).await.unwrap();

        assert_eq!(conn.executed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_insert_batch_is_rejected_before_dispatch() {
        let conn = StubConn::default();
        let users = USERS.bind(&conn);

        let err = users.insert(&[]).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(conn.executed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_row_rejects_the_whole_batch_before_dispatch() {
        let conn = StubConn::default();
        let users = USERS.bind(&conn);

        let rows = vec![Values::new().set("id", 1_i64), Values::new()];
        let err = users.insert(&rows).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(conn.executed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_opt_returns_none_for_zero_matches() {
        let conn = StubConn::default();
        let users = USERS.bind(&conn);

        let row = users
            .fetch_opt(&Values::new().set("id", 1_i64))
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn fetch_one_reports_zero_matches_as_row_count() {
        let conn = StubConn::default();
        let users = USERS.bind(&conn);

        let err = users
            .fetch_one(&Values::new().set("id", 1_i64))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::RowCount {
                expected: 1,
                got: 0
            }
        ));
    }

    #[tokio::test]
    async fn update_passes_through_the_engine_count() {
        let conn = StubConn::default();
        let users = USERS.bind(&conn);

        let n = users
            .update(
                &Values::new().set("id", 1_i64),
                &Values::new().set("bio", "x"),
            )
            .await
            .unwrap();
        assert_eq!(n, 1);
    }
}
