//! Type-declaration rendering from introspected column metadata.

use crate::error::CodegenResult;
use crate::introspect::{self, TableInfo};
use crate::scratch::ScratchSchema;
use crate::script::split_script;
use pgtable::Client;

/// Base types distinguished by the declaration output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Number,
    String,
}

impl BaseType {
    fn as_decl(self) -> &'static str {
        match self {
            BaseType::Number => "number",
            BaseType::String => "string",
        }
    }
}

const NUMERIC_MARKERS: [&str; 6] = ["int", "real", "double", "float", "bool", "bit"];

/// Coarse base-type heuristic over a column's declared type text.
///
/// A case-insensitive substring match, not a SQL type parser: anything
/// mentioning int/real/double/float/bool/bit reads as a number, everything
/// else as a string.
pub fn base_type(declared: &str) -> BaseType {
    let declared = declared.to_ascii_lowercase();
    if NUMERIC_MARKERS.iter().any(|m| declared.contains(m)) {
        BaseType::Number
    } else {
        BaseType::String
    }
}

/// Render the declaration block for a set of tables.
///
/// A column renders nullable unless it is NOT NULL or part of the primary
/// key; primary keys are always non-nullable in output, regardless of an
/// explicit NOT NULL marker.
pub fn render_interface(name: &str, tables: &[TableInfo]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(&mut out, "interface {name} {{");
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        let _ = writeln!(&mut out, "  {}: {{", table.name);
        for column in &table.columns {
            let ty = base_type(&column.data_type).as_decl();
            let nullable = !(column.not_null || column.primary_key);
            if nullable {
                let _ = writeln!(&mut out, "    {}: {} | null;", column.name, ty);
            } else {
                let _ = writeln!(&mut out, "    {}: {};", column.name, ty);
            }
        }
        out.push_str("  }");
    }
    out.push_str("\n}\n");
    out
}

/// Execute `script` in a disposable scratch schema, introspect the requested
/// tables, and render the declaration block.
///
/// With `tables = None`, every table that exists after the script runs is
/// declared, ordered lexicographically by name; an explicit list is declared
/// in the order given. The scratch schema is dropped on success and failure
/// alike.
pub async fn declare_tables<C: Client>(
    conn: &C,
    script: &str,
    tables: Option<&[&str]>,
    interface_name: &str,
) -> CodegenResult<String> {
    let scratch = ScratchSchema::create(conn).await?;
    let rendered = declare_in_schema(conn, &scratch, script, tables, interface_name).await;
    let dropped = scratch.drop(conn).await;

    let rendered = rendered?;
    dropped?;
    Ok(rendered)
}

async fn declare_in_schema<C: Client>(
    conn: &C,
    scratch: &ScratchSchema,
    script: &str,
    tables: Option<&[&str]>,
    interface_name: &str,
) -> CodegenResult<String> {
    for stmt in split_script(script) {
        scratch.execute(conn, stmt).await?;
    }

    let names: Vec<String> = match tables {
        Some(list) => list.iter().map(|name| name.to_string()).collect(),
        None => introspect::list_tables(conn, scratch.name()).await?,
    };

    let mut infos = Vec::with_capacity(names.len());
    for name in &names {
        infos.push(introspect::table_columns(conn, scratch.name(), name).await?);
    }

    Ok(render_interface(interface_name, &infos))
}
