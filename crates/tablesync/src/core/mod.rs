//! Core abstractions shared by drivers, the facade and the updater.
//!
//! - [`schema`]: desired and live table structure types
//! - [`value`]: literal values and result rows
//! - [`traits`]: the `Dialect` and `Driver` contracts

pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{
    ColumnDefinition, ColumnType, ConstraintDefinition, ConstraintKind, LiveColumn,
    LiveConstraint, LiveTable, TableStructure,
};
pub use traits::{Dialect, Driver};
pub use value::{Row, SqlValue};
