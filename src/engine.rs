//! The template engine: store, substitution and execution behind two entry points.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::ConnectionOptions;
use crate::error::TemplateError;
use crate::executor::{ConnectionHandle, Connector};
use crate::results::Record;
use crate::substitution::{
    LiteralRenderer, ParameterRenderer, ParameterSet, SubstitutionOrder, Substituter,
};
use crate::template::TemplateStore;

/// Resolves, fills in and runs SQL templates over one lazily opened session.
///
/// Every executing call takes `&mut self`, so an engine never has more than one
/// statement in flight. Use one engine per task that needs its own connection.
///
/// ```rust,no_run
/// use sql_template_runner::prelude::*;
///
/// # async fn demo() -> Result<(), TemplateError> {
/// let connector = SqliteOptionsBuilder::new("app.db").build();
/// let mut engine = TemplateEngine::new("./sql", connector);
///
/// let params = ParameterSet::new().with("id", 5);
/// let users = engine.run_template("users_byId", Some(&params)).await?;
/// engine.run_sql("DELETE FROM sessions", false).await?;
/// # let _ = users;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TemplateEngine {
    store: TemplateStore,
    substituter: Substituter,
    connection: ConnectionHandle,
}

impl TemplateEngine {
    /// An engine reading templates under `root`, with the literal renderer.
    pub fn new(root: impl Into<PathBuf>, connector: impl Connector + 'static) -> Self {
        Self::builder(root).build(connector)
    }

    #[must_use]
    pub fn builder(root: impl Into<PathBuf>) -> TemplateEngineBuilder {
        TemplateEngineBuilder::new(root)
    }

    /// An engine for whichever backend `options` describes.
    ///
    /// # Errors
    /// Returns `TemplateError::ConfigError` if the options are incomplete.
    pub fn from_options(
        root: impl Into<PathBuf>,
        options: ConnectionOptions,
    ) -> Result<Self, TemplateError> {
        Ok(Self::builder(root).build_boxed(options.into_connector()?))
    }

    #[must_use]
    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Resolve and fill in a template without executing it.
    ///
    /// # Errors
    /// Returns `InvalidTemplate`, `SubstitutionError` or `MissingParameters`.
    pub fn render(
        &self,
        template_id: &str,
        parameters: Option<&ParameterSet>,
    ) -> Result<String, TemplateError> {
        let sql = self.store.resolve(template_id)?;
        self.substituter.substitute(&sql, parameters)
    }

    /// Resolve, fill in, execute and commit a template, returning its rows.
    ///
    /// Nothing touches the database unless the template resolves and every placeholder
    /// is filled.
    ///
    /// # Errors
    /// Returns `InvalidTemplate`, `SubstitutionError` or `MissingParameters` before
    /// execution; `ConnectionError` or `ExecutionError` from it.
    pub async fn run_template(
        &mut self,
        template_id: &str,
        parameters: Option<&ParameterSet>,
    ) -> Result<Vec<Record>, TemplateError> {
        let query = self.render(template_id, parameters)?;
        debug!(template = template_id, "running template");
        let result_set = self.connection.run(&query, true).await?;
        Ok(result_set.into_records())
    }

    /// Execute and commit a finished statement, bypassing the template store.
    ///
    /// With `expect_results` unset the fetch step is skipped and `Ok(None)` is returned;
    /// use that for statements that produce no result set.
    ///
    /// # Errors
    /// Returns `ConnectionError` or `ExecutionError`.
    pub async fn run_sql(
        &mut self,
        query: &str,
        expect_results: bool,
    ) -> Result<Option<Vec<Record>>, TemplateError> {
        let result_set = self.connection.run(query, expect_results).await?;
        Ok(expect_results.then(|| result_set.into_records()))
    }

    /// Open the session now instead of on the first statement.
    ///
    /// # Errors
    /// Returns `TemplateError::ConnectionError` if the session cannot be opened.
    pub async fn ensure_connected(&mut self) -> Result<(), TemplateError> {
        self.connection.ensure_connected().await.map(|_| ())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Release the session. The next statement opens a new one.
    pub fn close(&mut self) {
        self.connection.close();
    }
}

/// Configures how an engine renders parameters before it is built.
#[derive(Clone)]
pub struct TemplateEngineBuilder {
    root: PathBuf,
    renderer: Arc<dyn ParameterRenderer>,
    order: SubstitutionOrder,
}

impl TemplateEngineBuilder {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            renderer: Arc::new(LiteralRenderer),
            order: SubstitutionOrder::default(),
        }
    }

    #[must_use]
    pub fn renderer(mut self, renderer: impl ParameterRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    #[must_use]
    pub fn substitution_order(mut self, order: SubstitutionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn build(self, connector: impl Connector + 'static) -> TemplateEngine {
        self.build_boxed(Box::new(connector))
    }

    #[must_use]
    pub fn build_boxed(self, connector: Box<dyn Connector>) -> TemplateEngine {
        TemplateEngine {
            store: TemplateStore::new(self.root),
            substituter: Substituter::new(self.renderer, self.order),
            connection: ConnectionHandle::new(connector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::executor::tests::FakeDb;
    use crate::substitution::EscapingRenderer;
    use crate::types::RowValues;
    use std::fs;
    use std::sync::atomic::Ordering;

    fn engine_with(files: &[(&str, &str)], db: &FakeDb) -> (tempfile::TempDir, TemplateEngine) {
        let dir = tempfile::tempdir().unwrap();
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let engine = TemplateEngine::new(dir.path(), db.clone());
        (dir, engine)
    }

    #[tokio::test]
    async fn invalid_template_never_connects() {
        let db = FakeDb::default();
        let (_dir, mut engine) = engine_with(&[], &db);
        let err = engine.run_template("nofolder", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTemplate);
        let err = engine.run_template("users_getAll", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTemplate);
        assert_eq!(db.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_parameters_never_execute() {
        let db = FakeDb::default();
        let (_dir, mut engine) = engine_with(
            &[("t/t_byId.sql", "SELECT * FROM t WHERE id = @id AND name = @name")],
            &db,
        );
        let params = ParameterSet::new().with("id", 5);
        let err = engine
            .run_template("t_byId", Some(&params))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameters);
        assert!(db.statements.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn runs_substituted_statement() {
        let db = FakeDb::default();
        let (_dir, mut engine) = engine_with(
            &[("t/t_byId.sql", "SELECT * FROM t WHERE id = @id AND name = @name")],
            &db,
        );
        let params = ParameterSet::new().with("id", 5).with("name", "Ann");
        let records = engine.run_template("t_byId", Some(&params)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("id"), Some(&RowValues::Int(1)));
        assert_eq!(
            db.statements.lock().unwrap().as_slice(),
            ["SELECT * FROM t WHERE id = 5 AND name = 'Ann'"]
        );
    }

    #[tokio::test]
    async fn run_sql_without_fetch_returns_none() {
        let db = FakeDb::default();
        let (_dir, mut engine) = engine_with(&[], &db);
        let out = engine.run_sql("DELETE FROM t", false).await.unwrap();
        assert!(out.is_none());
        assert_eq!(db.commits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn builder_swaps_renderer() {
        let db = FakeDb::default();
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("u")).unwrap();
        fs::write(dir.path().join("u/u_find.sql"), "SELECT @name").unwrap();

        let engine = TemplateEngine::builder(dir.path())
            .renderer(EscapingRenderer)
            .substitution_order(SubstitutionOrder::LongestFirst)
            .build(db);
        let params = ParameterSet::new().with("name", "it's");
        assert_eq!(
            engine.render("u_find", Some(&params)).unwrap(),
            "SELECT 'it''s'"
        );
    }
}
