//! Configuration file handling for plumb.
//!
//! Looks for `.config/plumb.styx` in the current directory or any parent directory.
//!
//! ```text
//! {
//!     dialect postgres
//!     exclude (sessions schema_migrations)
//!     orders_table orders
//!     failure_delay_secs 60
//!     exit_on_failure true
//! }
//! ```

use facet::Facet;
use std::path::{Path, PathBuf};

/// Relative location of the configuration file inside a project directory.
pub const CONFIG_PATH: &str = ".config/plumb.styx";

/// Contents of `.config/plumb.styx`.
///
/// Every field is optional; unset fields fall back to the verifier's defaults.
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Database dialect (`postgres` or `mysql`).
    #[facet(default)]
    pub dialect: Option<String>,

    /// Postgres schema to introspect (`public` when unset).
    #[facet(default)]
    pub schema: Option<String>,

    /// Tables that are never verified and never reported as unmatched.
    #[facet(default)]
    pub exclude: Option<Vec<String>>,

    /// Table whose timestamp columns must track the order lifecycle.
    #[facet(default)]
    pub orders_table: Option<String>,

    /// Timestamp columns on the orders table that are not lifecycle states.
    #[facet(default)]
    pub audit_columns: Option<Vec<String>>,

    /// Substring identifying timestamp columns.
    #[facet(default)]
    pub timestamp_marker: Option<String>,

    /// How long to hold the process after a failed verification.
    #[facet(default)]
    pub failure_delay_secs: Option<u64>,

    /// Exit the process after the failure delay (off when unset).
    #[facet(default)]
    pub exit_on_failure: Option<bool>,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No `.config/plumb.styx` found in any parent directory
    #[error("no {CONFIG_PATH} found in current directory or any parent")]
    NotFound,
    /// I/O error reading the file
    #[error("failed to read {CONFIG_PATH}: {0}")]
    Io(String),
    /// Parse error in the Styx file
    #[error("failed to parse {CONFIG_PATH}: {0}")]
    Parse(String),
}

/// Load configuration from `.config/plumb.styx`, searching up the directory tree.
pub fn load() -> Result<(Config, PathBuf), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Path) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = find_config_file(start)?;
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    Ok((parse(&content)?, config_path))
}

/// Parse configuration from Styx source.
pub fn parse(source: &str) -> Result<Config, ConfigError> {
    facet_styx::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Find `.config/plumb.styx` by searching up the directory tree.
pub fn find_config_file(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_PATH);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("plumb-config-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_scalars() {
        let config = parse("{dialect mysql, orders_table purchase, failure_delay_secs 30}").unwrap();
        assert_eq!(config.dialect.as_deref(), Some("mysql"));
        assert_eq!(config.orders_table.as_deref(), Some("purchase"));
        assert_eq!(config.failure_delay_secs, Some(30));
        assert!(config.exclude.is_none());
        assert!(config.exit_on_failure.is_none());
    }

    #[test]
    fn test_find_config_walks_up() {
        let root = scratch_dir("walk");
        std::fs::create_dir_all(root.join(".config")).unwrap();
        std::fs::write(root.join(CONFIG_PATH), "{dialect postgres}").unwrap();

        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, root.join(CONFIG_PATH));

        let (config, path) = load_from(&nested).unwrap();
        assert_eq!(path, root.join(CONFIG_PATH));
        assert_eq!(config.dialect.as_deref(), Some("postgres"));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse("{dialect").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
