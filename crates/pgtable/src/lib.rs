//! # pgtable
//!
//! A thin single-table data-access layer for PostgreSQL.
//!
//! ## Features
//!
//! - **One table, one accessor**: declare a const [`TableDef`] per known
//!   table and bind it to a connection (no reflective table lookup)
//! - **Partial-row predicates**: [`Values`] compiles to equality predicates,
//!   insert lists, and SET clauses with parameter-safe placeholders
//! - **Cardinality checks**: `fetch_opt` / `fetch_one` enforce the
//!   zero/one/many contract after the query completes
//! - **Transaction-friendly**: pass a `tokio_postgres::Transaction` anywhere
//!   a [`Client`] is expected
//! - **Raw escape hatch**: every mutating/selecting operation has a `_sql`
//!   variant taking a prebuilt [`Fragment`] predicate
//!
//! ```ignore
//! use pgtable::{Direction, FetchOptions, TableDef, Values};
//!
//! const USERS: TableDef = TableDef::new("users").with_key(&["id"]);
//!
//! let users = USERS.bind(&client);
//!
//! users
//!     .insert(&[Values::new().set("id", 1_i64).set("username", "alice")])
//!     .await?;
//!
//! let alice = users.fetch_one(&Values::new().set("id", 1_i64)).await?;
//!
//! let oldest = users
//!     .fetch_all(
//!         &Values::new(),
//!         &FetchOptions::new()
//!             .order_by(&["age"])
//!             .direction(Direction::Desc)
//!             .limit(1),
//!     )
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod fragment;
pub mod predicate;
pub mod table;

pub use client::{Client, RowExt};
pub use error::{TableError, TableResult};
pub use fragment::{Fragment, frag};
pub use predicate::{Direction, Values, match_all, order_by};
pub use table::{FetchOptions, Table, TableDef};
