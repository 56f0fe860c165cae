pub mod attachment;
pub mod message;

pub use attachment::{AttachmentError, AttachmentPolicy, FileAttachment};
pub use message::{Message, MessageId, Role};
