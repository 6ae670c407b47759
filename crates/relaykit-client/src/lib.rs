//! Multiplexing client for the relaykit connector runtime.
//!
//! A [`RuntimeClient`] owns exactly one duplex connection to the runtime
//! process and multiplexes any number of concurrent logical calls over it.
//! Each call is correlated back to its caller by request ID; responses may
//! arrive in any order. One read loop runs for the lifetime of the
//! connection, and every outstanding call is guaranteed to complete —
//! with a response, a timeout, or a connection failure.
//!
//! ```no_run
//! use relaykit_client::{ClientConfig, HttpRequest, RuntimeClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RuntimeClient::connect(ClientConfig::default()).await?;
//!     let response = client.execute_http(HttpRequest::get("http://example.com")).await?;
//!     println!("{} {}", response.status_code, response.body);
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod pending;

pub use client::{ClientConfig, ConnectionState, ExecuteOptions, RuntimeClient};
pub use error::{ClientError, Result};
pub use http::{HttpRequest, HttpResponse};
pub use pending::PendingTable;
