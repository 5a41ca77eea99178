//! Declarative table definitions and their reconciliation with the live
//! database.
//!
//! - [`reader`]: XML definition lookup and parsing
//! - [`differ`]: pure desired-vs-live diff producing DDL
//! - [`updater`]: `ensure(table)` and friends over a [`Database`](crate::Database)

pub mod differ;
pub mod reader;
pub mod updater;

pub use differ::{column_changed, plan_create, plan_update};
pub use reader::DefinitionReader;
pub use updater::DatabaseUpdater;
