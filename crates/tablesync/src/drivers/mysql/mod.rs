//! MySQL/MariaDB driver.
//!
//! - [`MysqlDialect`]: SQL syntax strategy
//! - [`MysqlDriver`]: live connection over `mysql_async`
//!
//! Tested against MySQL 5.7+/8.0 and MariaDB 10.2+.

mod dialect;
mod driver;

pub use dialect::MysqlDialect;
pub use driver::MysqlDriver;
