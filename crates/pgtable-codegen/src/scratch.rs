//! Disposable scratch schema for executing schema scripts.

use crate::error::CodegenResult;
use pgtable::Client;
use uuid::Uuid;

/// A uniquely named scratch schema.
///
/// The schema exists purely so a caller's DDL script can run somewhere that
/// is not the caller's data; it is dropped with `CASCADE` afterwards, on the
/// error path included.
pub struct ScratchSchema {
    name: String,
}

impl ScratchSchema {
    /// Create the schema and point `search_path` at it, so the script's
    /// unqualified DDL lands inside it.
    pub async fn create<C: Client>(conn: &C) -> CodegenResult<Self> {
        let name = format!("pgtable_scratch_{}", Uuid::new_v4().simple());
        tracing::trace!(schema = %name, "creating scratch schema");
        conn.execute(&format!("CREATE SCHEMA {name}"), &[]).await?;
        conn.execute(&format!("SET search_path TO {name}"), &[])
            .await?;
        Ok(Self { name })
    }

    /// The generated schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one script statement inside the schema.
    pub async fn execute<C: Client>(&self, conn: &C, stmt: &str) -> CodegenResult<()> {
        conn.execute(stmt, &[]).await?;
        Ok(())
    }

    /// Drop the schema and everything in it, restoring `search_path`.
    pub async fn drop<C: Client>(self, conn: &C) -> CodegenResult<()> {
        tracing::trace!(schema = %self.name, "dropping scratch schema");
        conn.execute(&format!("DROP SCHEMA {} CASCADE", self.name), &[])
            .await?;
        conn.execute("RESET search_path", &[]).await?;
        Ok(())
    }
}
