use migledger_common::Result;
use migledger_db::{Connection, VersionStore, open_version_store, validate_identifier};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE_NAME: &str = "migrations";

/// Where applied versions are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub table_name: String,
    /// Schema holding the table. When set, the namespace-aware store is used.
    pub namespace: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            namespace: None,
        }
    }
}

impl StoreConfig {
    /// Check identifiers without needing a connection.
    pub fn validate(&self) -> Result<()> {
        validate_identifier("table name", &self.table_name)?;
        if let Some(ns) = &self.namespace {
            validate_identifier("namespace", ns)?;
        }
        Ok(())
    }

    pub fn open_store(&self, conn: &dyn Connection) -> Result<Box<dyn VersionStore>> {
        open_version_store(conn, &self.table_name, self.namespace.as_deref())
    }
}
