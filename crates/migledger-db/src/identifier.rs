use std::sync::LazyLock;

use migledger_common::{Error, Result};
use regex::Regex;

/// Longest identifier accepted; Postgres truncates beyond 63 bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Validate a table or namespace name before it is interpolated into SQL.
///
/// Identifiers cannot be bound as parameters, so only ASCII letters, digits
/// and underscores are accepted, starting with a letter or underscore.
pub fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config(format!("{kind} cannot be empty")));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::Config(format!(
            "{kind} '{name}' exceeds {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if !IDENTIFIER.is_match(name) {
        return Err(Error::Config(format!(
            "{kind} '{name}' may only contain letters, digits and underscores"
        )));
    }
    Ok(())
}

/// Identifier quoting convention of a dialect family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `` `name` `` (MySQL, SQLite)
    Backtick,
    /// `"name"` (ANSI, Postgres)
    DoubleQuote,
    /// `[name]` (SQL Server)
    Bracket,
}

impl QuoteStyle {
    fn delimiters(self) -> (char, char) {
        match self {
            QuoteStyle::Backtick => ('`', '`'),
            QuoteStyle::DoubleQuote => ('"', '"'),
            QuoteStyle::Bracket => ('[', ']'),
        }
    }

    /// Quote a single identifier, doubling any embedded closing delimiter.
    pub fn quote(self, name: &str) -> String {
        let (open, close) = self.delimiters();
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(open);
        for c in name.chars() {
            if c == close {
                quoted.push(close);
            }
            quoted.push(c);
        }
        quoted.push(close);
        quoted
    }

    /// Quote `namespace.name` as two separately quoted parts.
    pub fn qualify(self, namespace: &str, name: &str) -> String {
        format!("{}.{}", self.quote(namespace), self.quote(name))
    }
}
