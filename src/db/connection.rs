use rusqlite::Connection;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::db::migrations::MigrationManager;

/// Name of the data directory under HOME
const DATA_DIR: &str = ".shukatsu";

/// Database connection manager
pub struct DbConnection;

impl DbConnection {
    fn home_dir() -> Result<PathBuf> {
        dirs::home_dir().context("Failed to locate home directory (is HOME set?)")
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join(DATA_DIR).join("ledger.db"))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join(DATA_DIR).join("rc"))
    }

    /// Read `data.location` from config file contents.
    /// Relative paths resolve against the directory holding the config file.
    pub fn location_from_config(config: &str, config_dir: &Path) -> Option<PathBuf> {
        config
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with('#'))
            .find_map(|line| line.strip_prefix("data.location="))
            .map(|value| {
                let path = PathBuf::from(value.trim());
                if path.is_relative() {
                    config_dir.join(path)
                } else {
                    path
                }
            })
    }

    /// Get database path from configuration file or default
    pub fn resolve_path() -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let config = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
            let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
            if let Some(path) = Self::location_from_config(&config, config_dir) {
                log::debug!("Using data.location from {}: {}", config_path.display(), path.display());
                return Ok(path);
            }
        }

        Self::default_path()
    }

    /// Connect to the database, creating it and parent directories if needed
    pub fn connect() -> Result<Connection> {
        let db_path = Self::resolve_path()?;
        Self::connect_at(&db_path)
    }

    /// Connect to a database file at an explicit path
    pub fn connect_at(db_path: &Path) -> Result<Connection> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        log::debug!("Opened database {}", db_path.display());

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }
}
