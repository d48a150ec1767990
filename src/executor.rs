//! Statement execution and the lazily (re)opened session behind it.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::TemplateError;
use crate::results::ResultSet;

/// An open database session able to run one statement at a time.
#[async_trait]
pub trait Session: Send {
    /// Execute `sql` as a single statement and commit immediately, reads included.
    ///
    /// With `fetch` set, the returned `ResultSet` carries the statement's columns and
    /// rows; otherwise only the affected-row count.
    ///
    /// # Errors
    /// Returns `TemplateError::ExecutionError` if execution, row extraction or the
    /// commit fails.
    async fn run(&mut self, sql: &str, fetch: bool) -> Result<ResultSet, TemplateError>;

    /// Whether the session can still be used. A session that reports `false` is
    /// discarded and a new one is opened on the next call.
    fn is_usable(&self) -> bool;
}

/// Opens sessions from connection options captured at construction time.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a fresh session.
    ///
    /// # Errors
    /// Returns `TemplateError::ConnectionError` if the database cannot be reached.
    async fn connect(&self) -> Result<Box<dyn Session>, TemplateError>;
}

/// Owns the connector and, once opened, the current session.
///
/// The session is opened on first use and reopened whenever the held one is gone or
/// unusable. Dropping the handle drops the session, which releases the connection.
pub struct ConnectionHandle {
    connector: Box<dyn Connector>,
    session: Option<Box<dyn Session>>,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    #[must_use]
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            session: None,
        }
    }

    /// Whether a usable session is currently held.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_usable())
    }

    /// Return the held session, opening a new one if there is none or it is unusable.
    ///
    /// Calling this repeatedly with a healthy session opens nothing.
    ///
    /// # Errors
    /// Returns `TemplateError::ConnectionError` if a new session cannot be opened.
    pub async fn ensure_connected(&mut self) -> Result<&mut dyn Session, TemplateError> {
        let session = match self.session.take() {
            Some(session) if session.is_usable() => session,
            stale => {
                if stale.is_some() {
                    warn!("discarding unusable session; reconnecting");
                }
                drop(stale);
                let session = self.connector.connect().await?;
                info!("database session opened");
                session
            }
        };
        Ok(&mut **self.session.insert(session))
    }

    /// Run one finished statement on the current session.
    ///
    /// When `fetch` is set the statement must produce a result set; one that does not
    /// (a plain `DELETE`, DDL) is reported as an execution error after it has been
    /// committed.
    ///
    /// # Errors
    /// Returns `TemplateError::ConnectionError` if no session can be opened, or
    /// `TemplateError::ExecutionError` if the statement, commit or fetch fails.
    pub async fn run(&mut self, sql: &str, fetch: bool) -> Result<ResultSet, TemplateError> {
        let session = self.ensure_connected().await?;
        debug!(statement = sql, fetch, "executing statement");
        let outcome = session.run(sql, fetch).await;
        let usable = session.is_usable();

        if let Err(e) = &outcome {
            warn!(error = %e, "statement failed");
            if !usable {
                self.session = None;
            }
        }

        let result_set = outcome?;
        if fetch && !result_set.has_result_columns() {
            return Err(TemplateError::ExecutionError(
                "the statement did not return a result set".to_string(),
            ));
        }
        Ok(result_set)
    }

    /// Drop the current session, if any.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            info!("database session closed");
        }
    }
}
