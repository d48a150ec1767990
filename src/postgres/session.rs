use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use super::config::PostgresOptions;
use super::query::build_result_set;
use crate::error::TemplateError;
use crate::executor::{Connector, Session};
use crate::results::ResultSet;

/// Opens Postgres sessions from captured [`PostgresOptions`].
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    config: tokio_postgres::Config,
}

impl PostgresConnector {
    /// # Errors
    /// Returns `TemplateError::ConfigError` if a required option is missing.
    pub fn new(opts: PostgresOptions) -> Result<Self, TemplateError> {
        Ok(Self {
            config: opts.to_pg_config()?,
        })
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self) -> Result<Box<dyn Session>, TemplateError> {
        let (client, connection) = self.config.connect(NoTls).await.map_err(|e| {
            TemplateError::ConnectionError(format!("Failed to connect to Postgres: {e}"))
        })?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection ended with an error");
            }
        });

        Ok(Box::new(PostgresSession { client, driver }))
    }
}

/// A client plus the task driving its connection.
///
/// Dropping the session aborts the connection task, closing the socket.
pub struct PostgresSession {
    client: Client,
    driver: JoinHandle<()>,
}

#[async_trait]
impl Session for PostgresSession {
    async fn run(&mut self, sql: &str, fetch: bool) -> Result<ResultSet, TemplateError> {
        let tx = self.client.transaction().await?;
        let stmt = tx.prepare(sql).await?;

        let result_set = if fetch {
            let rows = tx.query(&stmt, &[]).await?;
            build_result_set(&stmt, &rows)?
        } else {
            let affected = tx.execute(&stmt, &[]).await?;
            ResultSet::affected(usize::try_from(affected).map_err(|e| {
                TemplateError::ExecutionError(format!("Invalid rows affected count: {e}"))
            })?)
        };

        tx.commit().await?;
        debug!(rows = result_set.rows_affected, "postgres statement committed");
        Ok(result_set)
    }

    fn is_usable(&self) -> bool {
        !self.client.is_closed()
    }
}

impl Drop for PostgresSession {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
