//! Utilities shared across database drivers.
//!
//! - [`tls`]: `ssl_mode` parsing and TLS connector construction

pub mod tls;

pub use tls::{install_crypto_provider, SslMode, TlsBuilder};
