use std::time::Duration;

use crate::error::TemplateError;

/// Options for opening a `SQLite` session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    /// File path, or `:memory:` for a private in-memory database per session.
    pub db_path: String,
    /// How long to wait on a locked database before failing.
    pub busy_timeout: Duration,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Read the database path from `DB_NAME`.
    ///
    /// # Errors
    /// Returns `TemplateError::ConfigError` if `DB_NAME` is not set.
    pub fn from_env() -> Result<Self, TemplateError> {
        std::env::var("DB_NAME")
            .map(Self::new)
            .map_err(|e| TemplateError::ConfigError(format!("DB_NAME: {e}")))
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.opts.busy_timeout = busy_timeout;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    #[must_use]
    pub fn build(self) -> super::SqliteConnector {
        super::SqliteConnector::new(self.finish())
    }
}
