// PostgreSQL backend
//
// - config: connection options, builder and environment loading
// - query: row value extraction and result set building
// - session: connector and session running statements in a committed transaction

pub mod config;
pub mod query;
pub mod session;

pub use config::{PostgresOptions, PostgresOptionsBuilder};
pub use query::build_result_set;
pub use session::{PostgresConnector, PostgresSession};
