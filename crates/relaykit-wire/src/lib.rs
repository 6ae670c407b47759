//! Request/response envelopes for the relaykit runtime protocol.
//!
//! An envelope is the structured record carried inside a frame's payload.
//! Fields are encoded as a tagged binary table — `[u8 tag][u32 BE len][value]`
//! per present field — so optional fields can be omitted entirely and
//! decoders can skip tags they do not know about.
//!
//! The envelope `payload` field is opaque at this layer: it belongs to the
//! connector operation (for HTTP calls, a small JSON object) and is never
//! inspected here.

pub mod class;
pub mod envelope;
pub mod error;

pub use class::ErrorClass;
pub use envelope::{ExecuteRequest, ExecuteResponse};
pub use error::{Result, WireError};
