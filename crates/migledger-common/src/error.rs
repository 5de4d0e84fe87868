use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A well-formed statement could not be executed.
    #[error("query error: {0}")]
    Query(String),

    /// The bookkeeping table or its namespace could not be established.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_query(&self) -> bool {
        matches!(self, Error::Query(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
