//! Column metadata introspection from `pg_catalog`.

use crate::error::{CodegenError, CodegenResult};
use pgtable::{Client, RowExt};

/// Metadata for one column of an introspected table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type text, e.g. `integer` or `character varying(64)`.
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub has_default: bool,
    pub ordinal: i32,
}

/// Metadata for one introspected table, columns in natural order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// List ordinary tables in a schema, ordered lexicographically by name.
pub async fn list_tables<C: Client>(conn: &C, schema: &str) -> CodegenResult<Vec<String>> {
    let rows = conn
        .query(
            r#"
SELECT c.relname AS table_name
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind = 'r'
  AND n.nspname = $1
ORDER BY c.relname
"#,
            &[&schema],
        )
        .await?;

    rows.iter()
        .map(|row| row.try_get_column("table_name").map_err(CodegenError::from))
        .collect()
}

/// Read one table's columns in natural (ordinal) order.
///
/// Fails with a validation error if the table does not exist in the schema.
pub async fn table_columns<C: Client>(
    conn: &C,
    schema: &str,
    table: &str,
) -> CodegenResult<TableInfo> {
    let rows = conn
        .query(
            r#"
SELECT
  a.attname AS column_name,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
  a.attnotnull AS not_null,
  COALESCE(i.indisprimary, false) AS primary_key,
  ad.adbin IS NOT NULL AS has_default,
  a.attnum::int AS ordinal
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
LEFT JOIN pg_catalog.pg_index i
  ON i.indrelid = c.oid AND i.indisprimary AND a.attnum = ANY(i.indkey)
WHERE c.relkind = 'r'
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname = $1
  AND c.relname = $2
ORDER BY a.attnum
"#,
            &[&schema, &table],
        )
        .await?;

    if rows.is_empty() {
        return Err(CodegenError::validation(format!(
            "table '{table}' does not exist after running the script"
        )));
    }

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        columns.push(ColumnInfo {
            name: row.try_get_column("column_name")?,
            data_type: row.try_get_column("data_type")?,
            not_null: row.try_get_column("not_null")?,
            primary_key: row.try_get_column("primary_key")?,
            has_default: row.try_get_column("has_default")?,
            ordinal: row.try_get_column("ordinal")?,
        });
    }

    Ok(TableInfo {
        name: table.to_string(),
        columns,
    })
}
