//! Type and default normalization shared by the dialects.
//!
//! Raw catalog spellings are mapped onto [`CanonicalType`] before any
//! comparison; see [`canonical`] for the equivalence rules.

mod canonical;

pub use canonical::{
    defaults_match, normalize_default, normalize_mysql, normalize_postgres, CanonicalType,
};
