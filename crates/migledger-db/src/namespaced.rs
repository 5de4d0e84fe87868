use migledger_common::{Error, Result};
use tracing::{info, warn};

use crate::connection::Connection;
use crate::dialect::{Dialect, render};
use crate::identifier::validate_identifier;
use crate::store::{QueryKind, VersionStore, execute, query_column};

/// Version store whose table lives inside a named schema, e.g.
/// `"app_migrations"."phpmig"` on Postgres or `[dbo].[phpmig]` on SQL Server.
///
/// The table carries a `migrate_date` column next to `version`. Catalog
/// lookups are scoped to the configured namespace, so a same-named table in
/// another schema is not mistaken for ours.
#[derive(Debug, Clone)]
pub struct NamespacedVersionStore {
    dialect: Dialect,
    namespace: String,
    table_name: String,
    fetch_all: String,
    up: String,
    down: String,
    list_tables: String,
    namespace_exists: String,
    create_namespace: String,
    create_table: String,
}

impl NamespacedVersionStore {
    /// `namespace` defaults to the engine's conventional schema (`public`,
    /// `dbo`); MySQL requires one. SQLite has no schemas and is rejected.
    /// Unknown drivers are treated as Postgres, quoting included.
    pub fn new(conn: &dyn Connection, table_name: &str, namespace: Option<&str>) -> Result<Self> {
        let driver = conn.driver_name();
        let dialect = Dialect::from_driver_name(driver).unwrap_or_else(|| {
            warn!("no namespace profile for driver '{driver}', falling back to pgsql");
            Dialect::Postgres
        });
        Self::with_dialect(dialect, table_name, namespace)
    }

    pub fn with_dialect(
        dialect: Dialect,
        table_name: &str,
        namespace: Option<&str>,
    ) -> Result<Self> {
        let ns_profile = dialect.namespace_profile().ok_or_else(|| {
            Error::Config(format!("{dialect} does not support schema namespaces"))
        })?;
        let namespace = namespace
            .or(ns_profile.default_namespace)
            .ok_or_else(|| Error::Config(format!("{dialect} requires an explicit namespace")))?;
        validate_identifier("table name", table_name)?;
        validate_identifier("namespace", namespace)?;

        let profile = dialect.profile();
        let quote = profile.quote;
        let table = quote.qualify(namespace, table_name);
        let quoted_namespace = quote.quote(namespace);
        let version = quote.quote("version");
        let migrate_date = quote.quote("migrate_date");
        let p1 = profile.placeholder.render(1);
        let subs = [
            ("table", table.as_str()),
            ("namespace", quoted_namespace.as_str()),
            ("version", version.as_str()),
            ("migrate_date", migrate_date.as_str()),
            ("p1", p1.as_str()),
        ];
        let t = &profile.templates;

        Ok(Self {
            dialect,
            namespace: namespace.to_string(),
            table_name: table_name.to_string(),
            fetch_all: render(t.fetch_all, &subs),
            up: render(t.up, &subs),
            down: render(t.down, &subs),
            list_tables: render(ns_profile.list_tables, &subs),
            namespace_exists: render(ns_profile.namespace_exists, &subs),
            create_namespace: render(ns_profile.create_namespace, &subs),
            create_table: render(ns_profile.create_table, &subs),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The SQL text issued for `kind`.
    pub fn sql(&self, kind: QueryKind) -> &str {
        match kind {
            QueryKind::FetchAll => &self.fetch_all,
            QueryKind::Up => &self.up,
            QueryKind::Down => &self.down,
            QueryKind::HasSchema => &self.list_tables,
            QueryKind::CreateSchema => &self.create_table,
            QueryKind::NamespaceExists => &self.namespace_exists,
            QueryKind::CreateNamespace => &self.create_namespace,
        }
    }

    pub fn has_namespace(&self, conn: &mut dyn Connection) -> Result<bool> {
        let found = query_column(
            conn,
            self.dialect,
            QueryKind::NamespaceExists,
            &self.namespace_exists,
            &[self.namespace.as_str()],
        )?;
        Ok(found.iter().any(|ns| *ns == self.namespace))
    }

    fn create_namespace(&self, conn: &mut dyn Connection) -> Result<()> {
        if let Err(e) = execute(
            conn,
            self.dialect,
            QueryKind::CreateNamespace,
            &self.create_namespace,
            &[],
        ) {
            return match self.has_namespace(conn) {
                Ok(true) => {
                    warn!("namespace {} already present after failed create: {e}", self.namespace);
                    Ok(())
                }
                Ok(false) => Err(self.schema_error(QueryKind::CreateNamespace, &self.namespace, e)),
                Err(recheck) => Err(self.recheck_error(
                    QueryKind::CreateNamespace,
                    &self.namespace,
                    e,
                    recheck,
                )),
            };
        }
        info!("created namespace {} ({})", self.namespace, self.dialect);
        Ok(())
    }

    fn schema_error(&self, kind: QueryKind, object: &str, cause: Error) -> Error {
        Error::Schema(format!(
            "{} {kind}: could not establish {object}: {cause}",
            self.dialect
        ))
    }

    fn recheck_error(&self, kind: QueryKind, object: &str, cause: Error, recheck: Error) -> Error {
        Error::Schema(format!(
            "{} {kind}: could not establish {object}: {cause}; re-check failed: {recheck}",
            self.dialect
        ))
    }
}

impl VersionStore for NamespacedVersionStore {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn fetch_all(&self, conn: &mut dyn Connection) -> Result<Vec<String>> {
        query_column(conn, self.dialect, QueryKind::FetchAll, &self.fetch_all, &[])
    }

    fn up(&self, conn: &mut dyn Connection, version: &str) -> Result<()> {
        execute(conn, self.dialect, QueryKind::Up, &self.up, &[version])?;
        Ok(())
    }

    fn down(&self, conn: &mut dyn Connection, version: &str) -> Result<()> {
        execute(conn, self.dialect, QueryKind::Down, &self.down, &[version])?;
        Ok(())
    }

    fn has_schema(&self, conn: &mut dyn Connection) -> Result<bool> {
        let tables = query_column(
            conn,
            self.dialect,
            QueryKind::HasSchema,
            &self.list_tables,
            &[self.namespace.as_str()],
        )?;
        Ok(tables.iter().any(|t| *t == self.table_name))
    }

    fn create_schema(&self, conn: &mut dyn Connection) -> Result<()> {
        let namespace_present = self
            .has_namespace(conn)
            .map_err(|e| self.schema_error(QueryKind::NamespaceExists, &self.namespace, e))?;
        if !namespace_present {
            self.create_namespace(conn)?;
        }

        let qualified = format!("{}.{}", self.namespace, self.table_name);
        if let Err(e) = execute(
            conn,
            self.dialect,
            QueryKind::CreateSchema,
            &self.create_table,
            &[],
        ) {
            return match self.has_schema(conn) {
                Ok(true) => {
                    warn!("migration table {qualified} already present after failed create: {e}");
                    Ok(())
                }
                Ok(false) => Err(self.schema_error(QueryKind::CreateSchema, &qualified, e)),
                Err(recheck) => {
                    Err(self.recheck_error(QueryKind::CreateSchema, &qualified, e, recheck))
                }
            };
        }
        info!("created migration table {qualified} ({})", self.dialect);
        Ok(())
    }
}
