use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Overrides the database file location.
pub(crate) const DB_ENV: &str = "COSTSHARE_DB";
/// Log filter directives, e.g. `debug` or `costshare=trace`.
pub(crate) const LOG_ENV: &str = "COSTSHARE_LOG";

const DEFAULT_LOG_FILTER: &str = "info";
const DB_FILE: &str = "costshare.db";
const LOG_FILE: &str = "costshare.log";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub(crate) data_dir: PathBuf,
    pub(crate) db_path: PathBuf,
    pub(crate) log_path: PathBuf,
    pub(crate) log_filter: String,
}

impl Config {
    /// Resolve paths from the platform data directory and the environment.
    pub(crate) fn load() -> Result<Self> {
        let proj_dirs = directories::ProjectDirs::from("no", "costshare", "CostShare")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let config = Self::resolve(
            proj_dirs.data_dir(),
            std::env::var(DB_ENV).ok(),
            std::env::var(LOG_ENV).ok(),
        );
        config.ensure_dirs()?;
        Ok(config)
    }

    fn resolve(data_dir: &Path, db_override: Option<String>, log_filter: Option<String>) -> Self {
        let db_path = db_override
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(|p| PathBuf::from(expand_home(&p)))
            .unwrap_or_else(|| data_dir.join(DB_FILE));
        let log_filter = log_filter
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

        Self {
            data_dir: data_dir.to_path_buf(),
            db_path,
            log_path: data_dir.join(LOG_FILE),
            log_filter,
        }
    }

    fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                self.data_dir.display()
            )
        })?;
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }
}

/// Expand a leading `~/` to `$HOME`.
pub(crate) fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
