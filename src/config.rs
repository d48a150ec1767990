//! Backend selection.

use crate::error::TemplateError;
use crate::executor::Connector;
use crate::types::DatabaseType;

#[cfg(feature = "postgres")]
use crate::postgres::{PostgresConnector, PostgresOptions};
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteConnector, SqliteOptions};

/// Connection options for any supported backend.
#[derive(Debug, Clone)]
pub enum ConnectionOptions {
    #[cfg(feature = "postgres")]
    Postgres(PostgresOptions),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteOptions),
}

impl ConnectionOptions {
    /// Load options for `db_type` from the process environment (`DB_*` variables).
    ///
    /// # Errors
    /// Returns `TemplateError::ConfigError` if required variables are missing.
    pub fn from_env(db_type: &DatabaseType) -> Result<Self, TemplateError> {
        match db_type {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => Ok(Self::Postgres(PostgresOptions::from_env()?)),
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Ok(Self::Sqlite(SqliteOptions::from_env()?)),
        }
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => DatabaseType::Sqlite,
        }
    }

    /// Build the connector for these options. Nothing is opened yet.
    ///
    /// # Errors
    /// Returns `TemplateError::ConfigError` if the options are incomplete.
    pub fn into_connector(self) -> Result<Box<dyn Connector>, TemplateError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(opts) => Ok(Box::new(PostgresConnector::new(opts)?)),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(opts) => Ok(Box::new(SqliteConnector::new(opts))),
        }
    }
}
