//! Client library for a connector runtime: issue work requests over one
//! persistent IPC connection and receive correlated results asynchronously.
//!
//! relaykit multiplexes many concurrent logical calls over a single duplex
//! byte stream to an always-running runtime process (Unix domain socket
//! preferred, TCP fallback), correlating responses back to callers by
//! request ID.
//!
//! # Crate Structure
//!
//! - [`transport`] — Connection establishment (UDS, TCP fallback)
//! - [`frame`] — Length-prefixed frame codec for the runtime wire protocol
//! - [`wire`] — Request/response envelopes and the error taxonomy
//! - [`client`] — The multiplexing client: correlation, deadlines, HTTP helper

/// Re-export transport types.
pub mod transport {
    pub use relaykit_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use relaykit_frame::*;
}

/// Re-export wire envelope types.
pub mod wire {
    pub use relaykit_wire::*;
}

/// Re-export client types.
pub mod client {
    pub use relaykit_client::*;
}

pub mod logging;

pub use relaykit_client::{
    ClientConfig, ClientError, HttpRequest, HttpResponse, RuntimeClient,
};
pub use relaykit_wire::ErrorClass;
