//! The single staged file awaiting the next outgoing turn

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// A file payload with its media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Attachment data is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),
    #[error("Attachment media type is empty")]
    EmptyMediaType,
    #[error("Attachment is {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },
}

impl Attachment {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Result<Self, AttachmentError> {
        let media_type = media_type.into();
        if media_type.trim().is_empty() {
            return Err(AttachmentError::EmptyMediaType);
        }
        Ok(Self { bytes, media_type })
    }

    /// Decode a base64 payload
    pub fn from_base64(data: &str, media_type: impl Into<String>) -> Result<Self, AttachmentError> {
        let bytes = STANDARD.decode(data.trim())?;
        Self::new(bytes, media_type)
    }

    /// Parse `data:<media_type>;base64,<payload>`
    pub fn from_data_url(url: &str) -> Result<Self, AttachmentError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| AttachmentError::MalformedDataUrl("missing `data:` prefix".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AttachmentError::MalformedDataUrl("missing `,` separator".into()))?;
        let media_type = header.strip_suffix(";base64").ok_or_else(|| {
            AttachmentError::MalformedDataUrl("only base64 data URLs are supported".into())
        })?;
        Self::from_base64(payload, media_type)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Reject payloads over `max` bytes
    pub fn check_size(&self, max: usize) -> Result<(), AttachmentError> {
        if self.size() > max {
            return Err(AttachmentError::TooLarge {
                size: self.size(),
                max,
            });
        }
        Ok(())
    }
}

/// Holds at most one pending attachment
#[derive(Debug, Default)]
pub struct AttachmentStore {
    staged: Option<Attachment>,
}

impl AttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file, replacing whatever was staged before
    pub fn stage(&mut self, attachment: Attachment) -> Option<Attachment> {
        self.staged.replace(attachment)
    }

    /// Discard the staged file. Returns whether anything was discarded.
    pub fn clear(&mut self) -> bool {
        self.staged.take().is_some()
    }

    pub fn peek(&self) -> Option<&Attachment> {
        self.staged.as_ref()
    }

    /// Remove and return the staged file
    pub fn take(&mut self) -> Option<Attachment> {
        self.staged.take()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_none()
    }
}
