//! # pgtable-codegen
//!
//! Generates textual type declarations from a schema definition script.
//!
//! The script is executed inside a disposable, uniquely named scratch schema
//! (so it never touches caller data), column metadata is read back from
//! `pg_catalog`, and one declaration entry is rendered per table with each
//! column's inferred base type (`number` / `string`) and nullability.
//!
//! # Example
//!
//! ```ignore
//! use pgtable_codegen::declare_tables;
//!
//! let decl = declare_tables(
//!     &client,
//!     "CREATE TABLE users (
//!          id integer PRIMARY KEY,
//!          name varchar(64) NOT NULL,
//!          bio text
//!      );",
//!     None,
//!     "Schema",
//! )
//! .await?;
//!
//! // interface Schema {
//! //   users: {
//! //     id: number;
//! //     name: string;
//! //     bio: string | null;
//! //   }
//! // }
//! ```

pub mod declare;
pub mod error;
pub mod introspect;
pub mod scratch;
pub mod script;

pub use declare::{BaseType, base_type, declare_tables, render_interface};
pub use error::{CodegenError, CodegenResult};
pub use introspect::{ColumnInfo, TableInfo, list_tables, table_columns};
pub use scratch::ScratchSchema;
pub use script::split_script;
