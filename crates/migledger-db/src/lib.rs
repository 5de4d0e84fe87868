pub mod connection;
pub mod dialect;
pub mod identifier;
pub mod namespaced;
pub mod sql_store;
pub mod store;

#[cfg(test)]
mod fake;

pub use connection::{Connection, DriverError};
pub use dialect::{Dialect, DialectProfile, NamespaceProfile, Placeholder, SqlTemplates};
pub use identifier::{QuoteStyle, validate_identifier};
pub use namespaced::NamespacedVersionStore;
pub use sql_store::SqlVersionStore;
pub use store::{QueryKind, VersionStore};

use migledger_common::Result;

/// Build the store matching the requested layout: namespace-qualified when a
/// namespace is given, plain otherwise. The dialect is taken from `conn`.
pub fn open_version_store(
    conn: &dyn Connection,
    table_name: &str,
    namespace: Option<&str>,
) -> Result<Box<dyn VersionStore>> {
    match namespace {
        Some(ns) => Ok(Box::new(NamespacedVersionStore::new(
            conn,
            table_name,
            Some(ns),
        )?)),
        None => Ok(Box::new(SqlVersionStore::new(conn, table_name)?)),
    }
}
