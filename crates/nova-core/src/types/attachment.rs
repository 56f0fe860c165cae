use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A file attached to an outgoing message.
///
/// Immutable after construction except for `upload_progress`, which only
/// moves upward to 100 or is cleared when the exchange fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub data: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_progress: Option<u8>,
}

impl FileAttachment {
    /// Create an attachment from raw bytes
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
            upload_progress: None,
        }
    }

    /// Whether this attachment is an image
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Advance the upload progress; never moves backwards, caps at 100
    pub fn set_upload_progress(&mut self, progress: u8) {
        let progress = progress.min(100);
        match self.upload_progress {
            Some(current) if current >= progress => {}
            _ => self.upload_progress = Some(progress),
        }
    }

    /// Drop any progress marker (used when the exchange fails)
    pub fn clear_upload_progress(&mut self) {
        self.upload_progress = None;
    }
}

/// Attachment acceptance policy, injected into the transport configuration.
///
/// The accepted set is a list of MIME prefixes so a deployment can widen it
/// for models that take more than images, without touching transport code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentPolicy {
    pub accepted_mime_prefixes: Vec<String>,
    pub max_bytes: u64,
    pub max_count: usize,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            accepted_mime_prefixes: vec!["image/".to_string()],
            max_bytes: 10 * 1024 * 1024,
            max_count: 4,
        }
    }
}

impl AttachmentPolicy {
    /// Policy accepting the given MIME prefixes
    pub fn accepting(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            accepted_mime_prefixes: prefixes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Whether a single attachment's type is accepted
    pub fn accepts(&self, attachment: &FileAttachment) -> bool {
        self.accepted_mime_prefixes
            .iter()
            .any(|prefix| attachment.mime_type.starts_with(prefix.as_str()))
    }

    /// Validate a batch of attachments against the policy
    pub fn check(&self, attachments: &[FileAttachment]) -> Result<(), AttachmentError> {
        if attachments.len() > self.max_count {
            return Err(AttachmentError::TooMany {
                count: attachments.len(),
                limit: self.max_count,
            });
        }
        for attachment in attachments {
            if !self.accepts(attachment) {
                return Err(AttachmentError::Unsupported {
                    name: attachment.name.clone(),
                    mime_type: attachment.mime_type.clone(),
                });
            }
            if attachment.size > self.max_bytes {
                return Err(AttachmentError::TooLarge {
                    name: attachment.name.clone(),
                    size: attachment.size,
                    limit: self.max_bytes,
                });
            }
        }
        Ok(())
    }
}

/// Attachment validation failure
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("unsupported attachment type for {name}: {mime_type}")]
    Unsupported { name: String, mime_type: String },

    #[error("attachment {name} is too large: {size} bytes (limit {limit})")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("too many attachments: {count} (limit {limit})")]
    TooMany { count: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, len: usize) -> FileAttachment {
        FileAttachment::new(name, "image/png", vec![0u8; len])
    }

    #[test]
    fn test_default_policy_accepts_images_only() {
        let policy = AttachmentPolicy::default();
        assert!(policy.check(&[png("a.png", 16)]).is_ok());

        let pdf = FileAttachment::new("doc.pdf", "application/pdf", vec![0u8; 16]);
        match policy.check(&[pdf]) {
            Err(AttachmentError::Unsupported { name, .. }) => assert_eq!(name, "doc.pdf"),
            other => panic!("expected unsupported error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_policy_size_and_count_limits() {
        let policy = AttachmentPolicy {
            max_bytes: 8,
            max_count: 2,
            ..AttachmentPolicy::default()
        };

        assert!(matches!(
            policy.check(&[png("big.png", 9)]),
            Err(AttachmentError::TooLarge { .. })
        ));
        assert!(matches!(
            policy.check(&[png("a.png", 1), png("b.png", 1), png("c.png", 1)]),
            Err(AttachmentError::TooMany { .. })
        ));
    }

    #[test]
    fn test_widened_policy() {
        let policy = AttachmentPolicy::accepting(["image/", "application/pdf"]);
        let pdf = FileAttachment::new("doc.pdf", "application/pdf", vec![0u8; 16]);
        assert!(policy.check(&[pdf]).is_ok());
    }

    #[test]
    fn test_upload_progress_is_monotonic() {
        let mut file = png("a.png", 4);
        file.set_upload_progress(40);
        file.set_upload_progress(20);
        assert_eq!(file.upload_progress, Some(40));

        file.set_upload_progress(120);
        assert_eq!(file.upload_progress, Some(100));

        file.clear_upload_progress();
        assert_eq!(file.upload_progress, None);
    }
}
