use std::path::Path;

use migledger_common::{Error, Result};
use tracing::info;

use crate::model::StoreConfig;

/// Loads a `StoreConfig` from YAML or TOML, chosen by file extension.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> Result<StoreConfig> {
        let contents = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => Self::from_yaml_str(&contents)?,
            "toml" => Self::from_toml_str(&contents)?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("loaded store config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<StoreConfig> {
        let config: StoreConfig = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<StoreConfig> {
        let config: StoreConfig = serde_yaml::from_str(contents)
            .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_toml_with_namespace() {
        let file = write_config(
            ".toml",
            "table_name = \"phpmig\"\nnamespace = \"app_migrations\"\n",
        );
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.table_name, "phpmig");
        assert_eq!(config.namespace.as_deref(), Some("app_migrations"));
    }

    #[test]
    fn loads_yaml_and_fills_defaults() {
        let file = write_config(".yaml", "namespace: app_migrations\n");
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.table_name, "migrations");
        assert_eq!(config.namespace.as_deref(), Some("app_migrations"));
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        assert_eq!(ConfigLoader::from_toml_str("").unwrap(), StoreConfig::default());
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = write_config(".json", "{}");
        let err = ConfigLoader::load(file.path()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("unsupported config extension: json"));
    }

    #[test]
    fn rejects_unsafe_table_name() {
        let err = ConfigLoader::from_toml_str("table_name = \"x; DROP TABLE y\"").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn parse_errors_are_config_errors() {
        let err = ConfigLoader::from_yaml_str("table_name: [unclosed").unwrap_err();
        assert!(err.to_string().starts_with("configuration error: YAML parse error"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ConfigLoader::load(Path::new("/nonexistent/migledger.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
