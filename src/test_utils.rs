//! Embedded Postgres server for integration tests.

use postgresql_embedded::PostgreSQL;
use tracing::info;

use crate::error::TemplateError;
use crate::postgres::PostgresOptions;

/// A running embedded Postgres instance and the options that reach it.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub options: PostgresOptions,
}

impl EmbeddedPostgres {
    #[must_use]
    pub fn port(&self) -> u16 {
        self.postgresql.settings().port
    }
}

fn embedded_error(e: postgresql_embedded::Error) -> TemplateError {
    TemplateError::ConnectionError(format!("embedded postgres: {e}"))
}

/// Install (from the bundled archive), start and provision a throwaway server with
/// an empty `db_name` database.
///
/// # Errors
/// Returns `TemplateError::ConnectionError` if the server cannot be set up, started
/// or given the database.
pub async fn setup_postgres_embedded(db_name: &str) -> Result<EmbeddedPostgres, TemplateError> {
    let mut postgresql = PostgreSQL::default();
    postgresql.setup().await.map_err(embedded_error)?;
    postgresql.start().await.map_err(embedded_error)?;
    postgresql
        .create_database(db_name)
        .await
        .map_err(embedded_error)?;

    let settings = postgresql.settings();
    let options = PostgresOptions::builder()
        .host(settings.host.clone())
        .port(settings.port)
        .dbname(db_name)
        .user(settings.username.clone())
        .password(settings.password.clone())
        .finish();
    info!(port = settings.port, db_name, "embedded postgres started");

    Ok(EmbeddedPostgres {
        postgresql,
        options,
    })
}

/// Stop a server started by [`setup_postgres_embedded`].
pub async fn stop_postgres_embedded(server: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = server;
    let _ = postgresql.stop().await;
}
