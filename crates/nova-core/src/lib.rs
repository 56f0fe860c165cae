//! Shared domain types for the Nova chat client.
//!
//! Everything here is plain serde-serializable data: chat messages with
//! their streaming lifecycle, file attachments, and the attachment
//! acceptance policy injected into the transport layer.

pub mod types;

pub use types::{
    AttachmentError, AttachmentPolicy, FileAttachment, Message, MessageId, Role,
};
