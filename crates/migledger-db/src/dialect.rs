use std::fmt;

use tracing::warn;

use crate::identifier::QuoteStyle;

/// SQL engine family a connection speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
    SqlServer,
}

/// Driver names and the dialect each one maps to.
const DRIVERS: &[(&str, Dialect)] = &[
    ("mysql", Dialect::MySql),
    ("mariadb", Dialect::MySql),
    ("pgsql", Dialect::Postgres),
    ("postgres", Dialect::Postgres),
    ("postgresql", Dialect::Postgres),
    ("sqlite", Dialect::Sqlite),
    ("sqlite3", Dialect::Sqlite),
    ("sqlsrv", Dialect::SqlServer),
    ("dblib", Dialect::SqlServer),
    ("mssql", Dialect::SqlServer),
];

impl Dialect {
    /// Look up a driver name; `None` when the driver is not known.
    pub fn from_driver_name(driver: &str) -> Option<Self> {
        DRIVERS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(driver))
            .map(|(_, dialect)| *dialect)
    }

    /// Resolve a driver name, falling back to MySQL-flavoured SQL for
    /// unknown drivers.
    pub fn resolve(driver: &str) -> Self {
        Self::from_driver_name(driver).unwrap_or_else(|| {
            warn!("no SQL profile for driver '{driver}', falling back to mysql");
            Dialect::MySql
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "pgsql",
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "sqlsrv",
        }
    }

    pub fn profile(self) -> &'static DialectProfile {
        PROFILES
            .iter()
            .find(|p| p.dialect == self)
            .unwrap_or(&PROFILES[0])
    }

    /// Namespace support for this dialect, if any.
    pub fn namespace_profile(self) -> Option<&'static NamespaceProfile> {
        NAMESPACE_PROFILES.iter().find(|p| p.dialect == self)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bound-parameter syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`
    Question,
    /// `?1`
    Numbered,
    /// `$1`
    Dollar,
    /// `@P1`
    AtP,
}

impl Placeholder {
    /// Placeholder for the 1-based parameter `index`.
    pub fn render(self, index: usize) -> String {
        match self {
            Placeholder::Question => "?".to_string(),
            Placeholder::Numbered => format!("?{index}"),
            Placeholder::Dollar => format!("${index}"),
            Placeholder::AtP => format!("@P{index}"),
        }
    }
}

/// Statement templates for the five store operations.
///
/// `{table}` is replaced with the quoted table reference, `{version}` with
/// the quoted version column and `{p1}` with the first placeholder.
#[derive(Debug)]
pub struct SqlTemplates {
    pub fetch_all: &'static str,
    pub up: &'static str,
    pub down: &'static str,
    pub has_schema: &'static str,
    pub create_schema: &'static str,
}

#[derive(Debug)]
pub struct DialectProfile {
    pub dialect: Dialect,
    pub quote: QuoteStyle,
    pub placeholder: Placeholder,
    pub templates: SqlTemplates,
}

/// First entry is the fallback profile.
static PROFILES: [DialectProfile; 4] = [
    DialectProfile {
        dialect: Dialect::MySql,
        quote: QuoteStyle::Backtick,
        placeholder: Placeholder::Question,
        templates: SqlTemplates {
            fetch_all: "SELECT {version} FROM {table} ORDER BY {version} ASC",
            up: "INSERT INTO {table} ({version}) VALUES ({p1})",
            down: "DELETE FROM {table} WHERE {version} = {p1}",
            has_schema: "SHOW TABLES",
            create_schema: "CREATE TABLE {table} ({version} VARCHAR(255) NOT NULL)",
        },
    },
    DialectProfile {
        dialect: Dialect::Postgres,
        quote: QuoteStyle::DoubleQuote,
        placeholder: Placeholder::Dollar,
        templates: SqlTemplates {
            fetch_all: "SELECT {version} FROM {table} ORDER BY {version} ASC",
            up: "INSERT INTO {table} ({version}) VALUES ({p1})",
            down: "DELETE FROM {table} WHERE {version} = {p1}",
            has_schema: "SELECT \"tablename\"::text FROM \"pg_tables\" \
                         WHERE \"schemaname\" = ANY (current_schemas(false))",
            create_schema: "CREATE TABLE {table} ({version} VARCHAR(255) NOT NULL)",
        },
    },
    DialectProfile {
        dialect: Dialect::Sqlite,
        quote: QuoteStyle::Backtick,
        placeholder: Placeholder::Numbered,
        templates: SqlTemplates {
            fetch_all: "SELECT {version} FROM {table} ORDER BY {version} ASC",
            up: "INSERT INTO {table} ({version}) VALUES ({p1})",
            down: "DELETE FROM {table} WHERE {version} = {p1}",
            has_schema: "SELECT `name` FROM `sqlite_master` WHERE `type` = 'table'",
            create_schema: "CREATE TABLE {table} ({version} VARCHAR(255) NOT NULL)",
        },
    },
    DialectProfile {
        dialect: Dialect::SqlServer,
        quote: QuoteStyle::Bracket,
        placeholder: Placeholder::AtP,
        templates: SqlTemplates {
            fetch_all: "SELECT {version} FROM {table} ORDER BY {version} ASC",
            up: "INSERT INTO {table} ({version}) VALUES ({p1})",
            down: "DELETE FROM {table} WHERE {version} = {p1}",
            has_schema: "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
                         WHERE TABLE_TYPE = 'BASE TABLE' \
                         AND OBJECTPROPERTY(OBJECT_ID(TABLE_NAME), 'IsMsShipped') = 0",
            create_schema: "CREATE TABLE {table} ({version} VARCHAR(255) NOT NULL)",
        },
    },
];

/// Catalog queries and DDL for dialects that group tables into namespaces.
///
/// Besides the `SqlTemplates` tokens, `{namespace}` is replaced with the
/// quoted namespace and `{migrate_date}` with the quoted timestamp column.
#[derive(Debug)]
pub struct NamespaceProfile {
    pub dialect: Dialect,
    /// Conventional schema used when none is configured. MySQL has none: a
    /// schema there is a database and must be named.
    pub default_namespace: Option<&'static str>,
    pub list_tables: &'static str,
    pub namespace_exists: &'static str,
    pub create_namespace: &'static str,
    pub create_table: &'static str,
}

static NAMESPACE_PROFILES: [NamespaceProfile; 3] = [
    NamespaceProfile {
        dialect: Dialect::Postgres,
        default_namespace: Some("public"),
        list_tables: "SELECT table_name::text FROM information_schema.tables \
                      WHERE table_schema::text = {p1}",
        namespace_exists: "SELECT schema_name::text FROM information_schema.schemata \
                           WHERE schema_name::text = {p1}",
        create_namespace: "CREATE SCHEMA {namespace}",
        create_table: "CREATE TABLE {table} ({version} VARCHAR(255) NOT NULL, \
                       {migrate_date} TIMESTAMP(6) WITH TIME ZONE DEFAULT now())",
    },
    NamespaceProfile {
        dialect: Dialect::SqlServer,
        default_namespace: Some("dbo"),
        list_tables: "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
                      WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_SCHEMA = {p1}",
        namespace_exists: "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA \
                           WHERE SCHEMA_NAME = {p1}",
        create_namespace: "CREATE SCHEMA {namespace}",
        create_table: "CREATE TABLE {table} ({version} VARCHAR(255) NOT NULL, \
                       {migrate_date} DATETIMEOFFSET(6) DEFAULT SYSDATETIMEOFFSET())",
    },
    NamespaceProfile {
        dialect: Dialect::MySql,
        default_namespace: None,
        list_tables: "SELECT TABLE_NAME FROM information_schema.TABLES \
                      WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_SCHEMA = {p1}",
        namespace_exists: "SELECT SCHEMA_NAME FROM information_schema.SCHEMATA \
                           WHERE SCHEMA_NAME = {p1}",
        create_namespace: "CREATE SCHEMA {namespace}",
        create_table: "CREATE TABLE {table} ({version} VARCHAR(255) NOT NULL, \
                       {migrate_date} TIMESTAMP(6) DEFAULT CURRENT_TIMESTAMP(6))",
    },
];

/// Substitute `{token}` markers in a template.
pub(crate) fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |sql, (token, value)| {
            sql.replace(&format!("{{{token}}}"), value)
        })
}
