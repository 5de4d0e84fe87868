use std::fmt;

use migledger_common::{Error, Result};
use tracing::debug;

use crate::connection::Connection;
use crate::dialect::Dialect;

/// Bookkeeping of applied migration versions.
///
/// Implementations are bound to one dialect at construction and borrow the
/// caller's connection for each call. Versions are opaque strings that sort
/// in application order, e.g. `20230101120000`.
pub trait VersionStore {
    /// Dialect the store renders SQL for.
    fn dialect(&self) -> Dialect;

    /// Unquoted name of the bookkeeping table.
    fn table_name(&self) -> &str;

    /// All applied versions in ascending order.
    fn fetch_all(&self, conn: &mut dyn Connection) -> Result<Vec<String>>;

    /// Record `version` as applied. Does not check for duplicates.
    fn up(&self, conn: &mut dyn Connection, version: &str) -> Result<()>;

    /// Forget `version`. Removing an absent version is a no-op.
    fn down(&self, conn: &mut dyn Connection, version: &str) -> Result<()>;

    /// Whether the bookkeeping table exists, according to the catalog.
    fn has_schema(&self, conn: &mut dyn Connection) -> Result<bool>;

    /// Create the bookkeeping table (and its namespace, where applicable).
    fn create_schema(&self, conn: &mut dyn Connection) -> Result<()>;

    /// Create the schema unless it already exists. Returns `true` when it
    /// was created by this call.
    fn ensure_schema(&self, conn: &mut dyn Connection) -> Result<bool> {
        if self.has_schema(conn)? {
            return Ok(false);
        }
        self.create_schema(conn)?;
        Ok(true)
    }

    fn is_applied(&self, conn: &mut dyn Connection, version: &str) -> Result<bool> {
        Ok(self.fetch_all(conn)?.iter().any(|v| v == version))
    }
}

/// The individual SQL steps a store issues, used for error context and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    FetchAll,
    Up,
    Down,
    HasSchema,
    CreateSchema,
    NamespaceExists,
    CreateNamespace,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::FetchAll => "fetch_all",
            QueryKind::Up => "up",
            QueryKind::Down => "down",
            QueryKind::HasSchema => "has_schema",
            QueryKind::CreateSchema => "create_schema",
            QueryKind::NamespaceExists => "namespace_exists",
            QueryKind::CreateNamespace => "create_namespace",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run a catalog or data query, tagging failures with dialect and step.
pub(crate) fn query_column(
    conn: &mut dyn Connection,
    dialect: Dialect,
    kind: QueryKind,
    sql: &str,
    params: &[&str],
) -> Result<Vec<String>> {
    debug!(%dialect, step = %kind, "{sql}");
    conn.query_column(sql, params)
        .map_err(|e| Error::Query(format!("{dialect} {kind}: {e}")))
}

pub(crate) fn execute(
    conn: &mut dyn Connection,
    dialect: Dialect,
    kind: QueryKind,
    sql: &str,
    params: &[&str],
) -> Result<u64> {
    debug!(%dialect, step = %kind, "{sql}");
    conn.execute(sql, params)
        .map_err(|e| Error::Query(format!("{dialect} {kind}: {e}")))
}
