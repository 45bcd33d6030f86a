//! Transport-only client primitives for the streaming agent service.
//!
//! This crate owns endpoint selection, request building and the incremental
//! frame decoding of streamed responses. It contains no transcript or
//! classification logic; callers receive decoded [`StreamRecord`] values and
//! decide what they mean.
//!
//! Wire contract: the response body is a sequence of newline-delimited UTF-8
//! records. A record of interest starts with [`frame::RECORD_PREFIX`] followed
//! by one JSON object `{"type": ..., "data": ...}`. Any other line is ignored
//! and the stream ends when the transport closes.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod frame;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::{AgentApiClient, CancellationSignal, RecordStream};
pub use config::AgentApiConfig;
pub use endpoint::{Endpoint, EndpointPool};
pub use error::AgentApiError;
pub use frame::{FrameDecoder, LineBuffer, StreamRecord};
pub use payload::AgentRequest;
pub use url::normalize_endpoint_url;
