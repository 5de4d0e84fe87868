//! In-memory stand-in for server engines, emulating just enough of an
//! information_schema catalog with namespaces to drive both stores.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::connection::{Connection, DriverError};

static TABLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:FROM|INTO|TABLE|SCHEMA)\s+((?:[`"\[]\w+[`"\]]\.)?[`"\[]\w+[`"\]])"#).unwrap()
});
static IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[`"\[](\w+)[`"\]]"#).unwrap());

pub(crate) struct FakeConnection {
    driver: String,
    default_namespace: String,
    namespaces: BTreeSet<String>,
    tables: BTreeMap<(String, String), Vec<String>>,
    fail_on: Vec<String>,
    pub statements: Vec<(String, Vec<String>)>,
}

impl FakeConnection {
    pub fn new(driver: &str, default_namespace: &str) -> Self {
        Self {
            driver: driver.to_string(),
            default_namespace: default_namespace.to_string(),
            namespaces: BTreeSet::from([default_namespace.to_string()]),
            tables: BTreeMap::new(),
            fail_on: Vec::new(),
            statements: Vec::new(),
        }
    }

    /// Fail every statement containing `fragment`. May be given repeatedly.
    pub fn fail_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    pub fn clear_failure(&mut self) {
        self.fail_on.clear();
    }

    pub fn with_table(mut self, namespace: &str, table: &str) -> Self {
        self.namespaces.insert(namespace.to_string());
        self.tables
            .insert((namespace.to_string(), table.to_string()), Vec::new());
        self
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    pub fn has_table(&self, namespace: &str, table: &str) -> bool {
        self.tables
            .contains_key(&(namespace.to_string(), table.to_string()))
    }

    pub fn last_sql(&self) -> &str {
        self.statements.last().map(|(sql, _)| sql.as_str()).unwrap_or("")
    }

    fn table_ref(&self, sql: &str) -> Result<(String, String), DriverError> {
        let reference = TABLE_REF
            .captures(sql)
            .and_then(|c| c.get(1))
            .ok_or_else(|| format!("no table reference in: {sql}"))?;
        let parts: Vec<String> = IDENT
            .captures_iter(reference.as_str())
            .map(|c| c[1].to_string())
            .collect();
        match parts.as_slice() {
            [table] => Ok((self.default_namespace.clone(), table.clone())),
            [namespace, table] => Ok((namespace.clone(), table.clone())),
            _ => Err(format!("unparseable table reference in: {sql}").into()),
        }
    }

    fn tables_in(&self, namespace: &str) -> Vec<String> {
        self.tables
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, table)| table.clone())
            .collect()
    }

    fn rows_mut(&mut self, sql: &str) -> Result<&mut Vec<String>, DriverError> {
        let key = self.table_ref(sql)?;
        self.tables
            .get_mut(&key)
            .ok_or_else(|| format!("relation {}.{} does not exist", key.0, key.1).into())
    }

    fn record(&mut self, sql: &str, params: &[&str]) -> Result<(), DriverError> {
        self.statements.push((
            sql.to_string(),
            params.iter().map(|p| p.to_string()).collect(),
        ));
        match self.fail_on.iter().find(|f| sql.contains(f.as_str())) {
            Some(fragment) => Err(format!("injected failure on '{fragment}'").into()),
            None => Ok(()),
        }
    }
}

impl Connection for FakeConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn query_column(&mut self, sql: &str, params: &[&str]) -> Result<Vec<String>, DriverError> {
        self.record(sql, params)?;
        let lower = sql.to_ascii_lowercase();

        if lower.contains("information_schema.schemata") {
            let wanted = params.first().copied().unwrap_or_default();
            return Ok(self
                .namespaces
                .iter()
                .filter(|ns| ns.as_str() == wanted)
                .cloned()
                .collect());
        }
        if lower.contains("information_schema.tables") {
            let namespace = match params.first() {
                Some(ns) => ns.to_string(),
                None => self.default_namespace.clone(),
            };
            return Ok(self.tables_in(&namespace));
        }
        if lower.starts_with("show tables") || lower.contains("pg_tables") {
            let namespace = self.default_namespace.clone();
            return Ok(self.tables_in(&namespace));
        }

        // Rows come back in insertion order unless the statement asks otherwise.
        let mut rows = self.rows_mut(sql)?.clone();
        if lower.contains("order by") {
            rows.sort();
        }
        Ok(rows)
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError> {
        self.record(sql, params)?;
        let upper = sql.to_ascii_uppercase();

        if upper.starts_with("CREATE SCHEMA") {
            let (_, namespace) = self.table_ref(sql)?;
            if !self.namespaces.insert(namespace.clone()) {
                return Err(format!("schema {namespace} already exists").into());
            }
            return Ok(0);
        }
        if upper.starts_with("CREATE TABLE") {
            let (namespace, table) = self.table_ref(sql)?;
            if !self.namespaces.contains(&namespace) {
                return Err(format!("schema {namespace} does not exist").into());
            }
            if self.has_table(&namespace, &table) {
                return Err(format!("relation {table} already exists").into());
            }
            self.tables.insert((namespace, table), Vec::new());
            return Ok(0);
        }

        let value = params.first().map(|p| p.to_string()).unwrap_or_default();
        let rows = self.rows_mut(sql)?;
        if upper.starts_with("INSERT") {
            rows.push(value);
            Ok(1)
        } else if upper.starts_with("DELETE") {
            let before = rows.len();
            rows.retain(|v| *v != value);
            Ok((before - rows.len()) as u64)
        } else {
            Err(format!("unsupported statement: {sql}").into())
        }
    }
}
