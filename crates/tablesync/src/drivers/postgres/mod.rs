//! PostgreSQL driver.
//!
//! - [`PostgresDialect`]: SQL syntax strategy
//! - [`PostgresDriver`]: live connection over `tokio-postgres`

mod dialect;
mod driver;

pub use dialect::PostgresDialect;
pub use driver::PostgresDriver;
