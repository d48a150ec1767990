use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::debug;

use super::config::SqliteOptions;
use super::query::build_result_set;
use crate::error::TemplateError;
use crate::executor::{Connector, Session};
use crate::results::ResultSet;

type SharedConnection = Arc<Mutex<Connection>>;

/// Opens `SQLite` sessions on a database path.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    opts: SqliteOptions,
}

impl SqliteConnector {
    #[must_use]
    pub fn new(opts: SqliteOptions) -> Self {
        Self { opts }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self) -> Result<Box<dyn Session>, TemplateError> {
        let opts = self.opts.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&opts))
            .await
            .map_err(|e| {
                TemplateError::ConnectionError(format!("sqlite spawn_blocking join error: {e}"))
            })??;
        Ok(Box::new(SqliteSession {
            conn: Arc::new(Mutex::new(conn)),
        }))
    }
}

fn open_connection(opts: &SqliteOptions) -> Result<Connection, TemplateError> {
    let conn = Connection::open(&opts.db_path).map_err(|e| {
        TemplateError::ConnectionError(format!(
            "Failed to open SQLite database {}: {e}",
            opts.db_path
        ))
    })?;
    conn.busy_timeout(opts.busy_timeout).map_err(|e| {
        TemplateError::ConnectionError(format!("Failed to set SQLite busy timeout: {e}"))
    })?;
    Ok(conn)
}

/// A single `rusqlite` connection.
///
/// Statements run on tokio's blocking pool, so a statement waiting on a locked
/// database never stalls the caller's runtime.
pub struct SqliteSession {
    conn: SharedConnection,
}

async fn run_blocking<F, R>(conn: SharedConnection, func: F) -> Result<R, TemplateError>
where
    F: FnOnce(&mut Connection) -> Result<R, TemplateError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| TemplateError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

fn total_changes(conn: &Connection) -> Result<i64, TemplateError> {
    Ok(conn.query_row("SELECT total_changes()", [], |row| row.get(0))?)
}

/// Run one statement in its own transaction and commit it.
///
/// Without `fetch` the count reports rows written by this statement only: `SQLite`
/// leaves `changes()` untouched for DDL and reads, so a statement that wrote nothing
/// reports 0 instead of the previous statement's count.
fn run_statement(conn: &mut Connection, sql: &str, fetch: bool) -> Result<ResultSet, TemplateError> {
    let tx = conn.transaction()?;
    let before = total_changes(&tx)?;
    let result_set = {
        let mut stmt = tx.prepare(sql)?;
        build_result_set(&mut stmt, fetch)?
    };
    let result_set = if fetch {
        result_set
    } else if total_changes(&tx)? == before {
        ResultSet::affected(0)
    } else {
        ResultSet::affected(usize::try_from(tx.changes()).unwrap_or(usize::MAX))
    };
    tx.commit()?;
    Ok(result_set)
}

#[async_trait]
impl Session for SqliteSession {
    async fn run(&mut self, sql: &str, fetch: bool) -> Result<ResultSet, TemplateError> {
        let sql = sql.to_string();
        let result_set = run_blocking(Arc::clone(&self.conn), move |conn| {
            run_statement(conn, &sql, fetch)
        })
        .await?;
        debug!(rows = result_set.rows_affected, "sqlite statement committed");
        Ok(result_set)
    }

    fn is_usable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn affected_count_covers_only_the_current_statement() {
        let mut conn = memory();
        run_statement(&mut conn, "CREATE TABLE t (id INTEGER)", false).unwrap();
        let rs = run_statement(&mut conn, "INSERT INTO t VALUES (1), (2), (3)", false).unwrap();
        assert_eq!(rs.rows_affected, 3);

        // Neither a read nor DDL writes rows, so neither inherits the insert's count.
        let rs = run_statement(&mut conn, "SELECT id FROM t", false).unwrap();
        assert_eq!(rs.rows_affected, 0);
        let rs = run_statement(&mut conn, "CREATE INDEX t_id ON t (id)", false).unwrap();
        assert_eq!(rs.rows_affected, 0);

        let rs = run_statement(&mut conn, "DELETE FROM t WHERE id > 1", false).unwrap();
        assert_eq!(rs.rows_affected, 2);
        let rs = run_statement(&mut conn, "DELETE FROM t WHERE id > 100", false).unwrap();
        assert_eq!(rs.rows_affected, 0);
    }

    #[tokio::test]
    async fn statements_run_off_the_calling_task() {
        let mut session = SqliteSession {
            conn: Arc::new(Mutex::new(memory())),
        };
        let rs = session.run("SELECT 1 AS one", true).await.unwrap();
        assert_eq!(**rs.get_column_names().unwrap(), vec!["one".to_string()]);
        assert_eq!(rs.results.len(), 1);
    }
}
