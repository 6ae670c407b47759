//! Transport layer for the relaykit runtime connection.
//!
//! Establishes the single duplex byte stream to the connector runtime:
//! - Unix domain sockets on Linux/macOS (preferred)
//! - TCP loopback as fallback, or when forced by configuration
//!
//! This is the lowest layer of relaykit. Everything else builds on top of
//! the [`RuntimeStream`] type provided here.

pub mod config;
pub mod error;
pub mod stream;

pub use config::TransportConfig;
pub use error::{Result, TransportError};
pub use stream::{connect, RuntimeStream, StreamReadHalf, StreamWriteHalf};
