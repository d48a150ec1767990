use thiserror::Error;

/// Every failure the engine can report.
///
/// Public entry points never panic; they hand one of these back instead.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Identifier malformed, or its category directory / SQL file is missing.
    #[error("Invalid template name: {0}")]
    InvalidTemplate(String),

    /// Placeholders survived substitution.
    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    /// A parameter value could not be rendered into the statement text.
    #[error("Error while building the query: {0}")]
    SubstitutionError(String),

    /// The database rejected the statement, or the commit/fetch failed.
    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Fieldless mirror of [`TemplateError`] for matching without the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidTemplate,
    MissingParameters,
    SubstitutionError,
    ExecutionError,
    ConnectionError,
    ConfigError,
}

impl TemplateError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            TemplateError::InvalidTemplate(_) => ErrorKind::InvalidTemplate,
            TemplateError::MissingParameters(_) => ErrorKind::MissingParameters,
            TemplateError::SubstitutionError(_) => ErrorKind::SubstitutionError,
            TemplateError::ExecutionError(_) => ErrorKind::ExecutionError,
            TemplateError::ConnectionError(_) => ErrorKind::ConnectionError,
            TemplateError::ConfigError(_) => ErrorKind::ConfigError,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for TemplateError {
    fn from(err: tokio_postgres::Error) -> Self {
        // `Display` on a db error only says "db error"; the source carries the server text.
        let detail = err
            .as_db_error()
            .map_or_else(|| err.to_string(), |db| db.to_string());
        TemplateError::ExecutionError(detail)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for TemplateError {
    fn from(err: rusqlite::Error) -> Self {
        TemplateError::ExecutionError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = TemplateError::MissingParameters("not all parameters were supplied".into());
        assert_eq!(err.kind(), ErrorKind::MissingParameters);
        assert_eq!(
            err.to_string(),
            "Missing parameters: not all parameters were supplied"
        );
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_errors_become_execution_errors() {
        let err: TemplateError = rusqlite::Error::InvalidQuery.into();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
    }
}
