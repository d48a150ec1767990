//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types so an application can get
//! going with a single `use`.

pub use crate::config::ConnectionOptions;
pub use crate::engine::{TemplateEngine, TemplateEngineBuilder};
pub use crate::error::{ErrorKind, TemplateError};
pub use crate::executor::{ConnectionHandle, Connector, Session};
pub use crate::results::{Record, ResultSet, map_rows};
pub use crate::substitution::{
    EscapingRenderer, LiteralRenderer, ParameterRenderer, ParameterSet, SubstitutionOrder,
    Substituter,
};
pub use crate::template::{TemplateId, TemplateStore};
pub use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
pub use crate::postgres::{PostgresConnector, PostgresOptions, PostgresOptionsBuilder};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnector, SqliteOptions, SqliteOptionsBuilder};
