use migledger_common::{Error, Result};
use tracing::{info, warn};

use crate::connection::Connection;
use crate::dialect::{Dialect, render};
use crate::identifier::validate_identifier;
use crate::store::{QueryKind, VersionStore, execute, query_column};

/// Fully rendered statements for one store instance.
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub fetch_all: String,
    pub up: String,
    pub down: String,
    pub has_schema: String,
    pub create_schema: String,
}

/// Portable version store for MySQL, Postgres, SQLite and SQL Server.
///
/// The dialect is read from the connection once, at construction, and all
/// statements are rendered up front. Drivers without a profile get MySQL
/// flavoured SQL.
#[derive(Debug, Clone)]
pub struct SqlVersionStore {
    dialect: Dialect,
    table_name: String,
    statements: Statements,
}

impl SqlVersionStore {
    pub fn new(conn: &dyn Connection, table_name: &str) -> Result<Self> {
        Self::with_dialect(Dialect::resolve(conn.driver_name()), table_name)
    }

    /// Build a store for an explicit dialect, bypassing driver detection.
    pub fn with_dialect(dialect: Dialect, table_name: &str) -> Result<Self> {
        validate_identifier("table name", table_name)?;

        let profile = dialect.profile();
        let table = profile.quote.quote(table_name);
        let version = profile.quote.quote("version");
        let p1 = profile.placeholder.render(1);
        let subs = [
            ("table", table.as_str()),
            ("version", version.as_str()),
            ("p1", p1.as_str()),
        ];
        let t = &profile.templates;

        Ok(Self {
            dialect,
            table_name: table_name.to_string(),
            statements: Statements {
                fetch_all: render(t.fetch_all, &subs),
                up: render(t.up, &subs),
                down: render(t.down, &subs),
                has_schema: render(t.has_schema, &subs),
                create_schema: render(t.create_schema, &subs),
            },
        })
    }

    /// The SQL text issued for `kind`, if this store issues it.
    pub fn sql(&self, kind: QueryKind) -> Option<&str> {
        let s = &self.statements;
        match kind {
            QueryKind::FetchAll => Some(s.fetch_all.as_str()),
            QueryKind::Up => Some(s.up.as_str()),
            QueryKind::Down => Some(s.down.as_str()),
            QueryKind::HasSchema => Some(s.has_schema.as_str()),
            QueryKind::CreateSchema => Some(s.create_schema.as_str()),
            QueryKind::NamespaceExists | QueryKind::CreateNamespace => None,
        }
    }
}

impl VersionStore for SqlVersionStore {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn fetch_all(&self, conn: &mut dyn Connection) -> Result<Vec<String>> {
        query_column(
            conn,
            self.dialect,
            QueryKind::FetchAll,
            &self.statements.fetch_all,
            &[],
        )
    }

    fn up(&self, conn: &mut dyn Connection, version: &str) -> Result<()> {
        execute(
            conn,
            self.dialect,
            QueryKind::Up,
            &self.statements.up,
            &[version],
        )?;
        Ok(())
    }

    fn down(&self, conn: &mut dyn Connection, version: &str) -> Result<()> {
        execute(
            conn,
            self.dialect,
            QueryKind::Down,
            &self.statements.down,
            &[version],
        )?;
        Ok(())
    }

    fn has_schema(&self, conn: &mut dyn Connection) -> Result<bool> {
        let tables = query_column(
            conn,
            self.dialect,
            QueryKind::HasSchema,
            &self.statements.has_schema,
            &[],
        )?;
        Ok(tables.iter().any(|t| *t == self.table_name))
    }

    fn create_schema(&self, conn: &mut dyn Connection) -> Result<()> {
        let created = execute(
            conn,
            self.dialect,
            QueryKind::CreateSchema,
            &self.statements.create_schema,
            &[],
        );

        match created {
            Ok(_) => {
                info!("created migration table {} ({})", self.table_name, self.dialect);
                Ok(())
            }
            // Another writer may have created it first; only the end state matters.
            Err(e) => match self.has_schema(conn) {
                Ok(true) => {
                    warn!(
                        "migration table {} already present after failed create: {e}",
                        self.table_name
                    );
                    Ok(())
                }
                Ok(false) => Err(Error::Schema(format!(
                    "{} {}: failed to create table {}: {e}",
                    self.dialect,
                    QueryKind::CreateSchema,
                    self.table_name
                ))),
                Err(recheck) => Err(Error::Schema(format!(
                    "{} {}: failed to create table {}: {e}; re-check failed: {recheck}",
                    self.dialect,
                    QueryKind::CreateSchema,
                    self.table_name
                ))),
            },
        }
    }
}
