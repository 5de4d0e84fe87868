/// Error produced by a driver while running a statement.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// An open, caller-owned database connection.
///
/// Stores borrow a connection for the duration of one operation and never
/// open or close it. Parameters are always bound positionally, using the
/// placeholder syntax of the connection's dialect.
pub trait Connection {
    /// Driver identifier, e.g. `sqlite`, `mysql`, `pgsql`, `sqlsrv`.
    fn driver_name(&self) -> &str;

    /// Run a query and return the first column of every row as text.
    fn query_column(&mut self, sql: &str, params: &[&str]) -> Result<Vec<String>, DriverError>;

    /// Run a statement and return the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError>;
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use rusqlite::params_from_iter;

    use super::{Connection, DriverError};

    impl Connection for rusqlite::Connection {
        fn driver_name(&self) -> &str {
            "sqlite"
        }

        fn query_column(
            &mut self,
            sql: &str,
            params: &[&str],
        ) -> Result<Vec<String>, DriverError> {
            let mut stmt = self.prepare(sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                row.get::<_, String>(0)
            })?;

            let mut values = Vec::new();
            for row in rows {
                values.push(row?);
            }
            Ok(values)
        }

        fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError> {
            let affected = rusqlite::Connection::execute(self, sql, params_from_iter(params.iter()))?;
            Ok(affected as u64)
        }
    }
}

#[cfg(feature = "mysql")]
mod mysql_conn {
    use mysql::prelude::Queryable;
    use mysql::{Params, Value};

    use super::{Connection, DriverError};

    fn bind(params: &[&str]) -> Params {
        if params.is_empty() {
            Params::Empty
        } else {
            Params::Positional(params.iter().map(|p| Value::from(*p)).collect())
        }
    }

    impl Connection for mysql::Conn {
        fn driver_name(&self) -> &str {
            "mysql"
        }

        fn query_column(
            &mut self,
            sql: &str,
            params: &[&str],
        ) -> Result<Vec<String>, DriverError> {
            let values: Vec<String> = self.exec(sql, bind(params))?;
            Ok(values)
        }

        fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError> {
            self.exec_drop(sql, bind(params))?;
            Ok(self.affected_rows())
        }
    }
}

#[cfg(feature = "postgres")]
mod postgres_conn {
    use postgres::types::ToSql;

    use super::{Connection, DriverError};

    fn bind<'a>(params: &'a [&'a str]) -> Vec<&'a (dyn ToSql + Sync)> {
        params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    impl Connection for postgres::Client {
        fn driver_name(&self) -> &str {
            "pgsql"
        }

        fn query_column(
            &mut self,
            sql: &str,
            params: &[&str],
        ) -> Result<Vec<String>, DriverError> {
            let rows = self.query(sql, &bind(params))?;

            let mut values = Vec::with_capacity(rows.len());
            for row in &rows {
                values.push(row.try_get::<_, String>(0)?);
            }
            Ok(values)
        }

        fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError> {
            Ok(postgres::Client::execute(self, sql, &bind(params))?)
        }
    }
}
