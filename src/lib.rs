//! Run file-backed SQL templates.
//!
//! Templates live under a root directory as `<category>/<category>_<name>.sql` and use
//! `@name` placeholders. A [`TemplateEngine`] resolves a template, substitutes the
//! caller's parameters as SQL literals, executes the statement on a lazily opened
//! session, commits, and maps the rows into ordered [`Record`]s.
//!
//! The default [`LiteralRenderer`] splices text values between single quotes without
//! escaping them; never feed it untrusted input. [`EscapingRenderer`] doubles embedded
//! quotes, and any [`ParameterRenderer`] can be plugged in through
//! [`TemplateEngine::builder`].

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod results;
pub mod substitution;
pub mod template;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "test-utils-postgres")]
pub mod test_utils;

pub use config::ConnectionOptions;
pub use engine::{TemplateEngine, TemplateEngineBuilder};
pub use error::{ErrorKind, TemplateError};
pub use results::{Record, ResultSet};
pub use substitution::{EscapingRenderer, LiteralRenderer, ParameterRenderer, ParameterSet};
pub use types::{DatabaseType, RowValues};
