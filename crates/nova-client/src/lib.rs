//! Transport client for the Nova chat completions API.
//!
//! Issues a bearer-authenticated streaming POST against an OpenAI-compatible
//! `/chat/completions` endpoint, decodes the SSE frame stream into cumulative
//! text, and maps HTTP failures to user-facing errors. The [`ChatTransport`]
//! trait is the seam the session layer talks through, so tests can substitute
//! a scripted transport.

pub mod config;
pub mod error;
mod payload;
mod sse;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use transport::{ChatClient, ChatTransport, DeltaCallback, UploadCallback};
