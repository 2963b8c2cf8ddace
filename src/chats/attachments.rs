//! Files attached to messages.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::chats::errors::{ChatError, ChatResult};
use crate::json::{decode_record, expect_object};

/// Where the bytes of an attachment live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentPayload {
    /// Bytes held in memory.
    Inline(Vec<u8>),
    /// Bytes stored in a file outside the JSON document.
    Linked(PathBuf),
}

/// Wire form of an attachment: base64 bytes or a path.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AttachmentRecord {
    Inline { filename: String, data: String },
    Linked { filename: String, path: String },
}

/// A file attached to a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    filename: String,
    payload: AttachmentPayload,
}

impl Attachment {
    /// Attachment carrying its bytes.
    ///
    /// # Errors
    /// Returns an error if the filename is empty.
    pub fn inline(filename: impl Into<String>, data: Vec<u8>) -> ChatResult<Self> {
        Self::with_payload(filename.into(), AttachmentPayload::Inline(data))
    }

    /// Attachment pointing at a file.
    ///
    /// # Errors
    /// Returns an error if the filename is empty.
    pub fn linked(filename: impl Into<String>, path: impl Into<PathBuf>) -> ChatResult<Self> {
        Self::with_payload(filename.into(), AttachmentPayload::Linked(path.into()))
    }

    fn with_payload(filename: String, payload: AttachmentPayload) -> ChatResult<Self> {
        if filename.trim().is_empty() {
            return Err(ChatError::InvalidAttachment(
                "filename is empty".to_string(),
            ));
        }
        Ok(Self { filename, payload })
    }

    /// File name of the attachment.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Payload of the attachment.
    #[must_use]
    pub const fn payload(&self) -> &AttachmentPayload {
        &self.payload
    }

    /// Encode the attachment.
    ///
    /// Inline bytes are written as base64 unless `attachment_path` is given,
    /// in which case the record points at `attachment_path/filename` and the
    /// caller is responsible for writing the file there.
    #[must_use]
    pub fn to_json(&self, attachment_path: Option<&Path>) -> Value {
        let filename = self.filename.clone();
        let record = match (&self.payload, attachment_path) {
            (AttachmentPayload::Inline(_), Some(dir)) => AttachmentRecord::Linked {
                path: dir.join(&filename).to_string_lossy().into_owned(),
                filename,
            },
            (AttachmentPayload::Inline(data), None) => AttachmentRecord::Inline {
                filename,
                data: STANDARD.encode(data),
            },
            (AttachmentPayload::Linked(path), _) => AttachmentRecord::Linked {
                filename,
                path: path.to_string_lossy().into_owned(),
            },
        };
        json!(record)
    }

    /// Decode an attachment record.
    ///
    /// # Errors
    /// Returns a type error for wrongly typed records, and a value error when
    /// the filename is missing, neither `data` nor `path` is present, or the
    /// base64 payload is invalid.
    pub fn from_json(value: &Value) -> ChatResult<Self> {
        let object = expect_object(value, "attachment")?;
        if !object.contains_key("data") && !object.contains_key("path") {
            return Err(ChatError::MissingField("data"));
        }

        match decode_record(value, "attachment", &["filename"])? {
            AttachmentRecord::Inline { filename, data } => {
                let bytes = STANDARD
                    .decode(&data)
                    .map_err(|err| ChatError::InvalidAttachment(format!("{filename}: {err}")))?;
                Self::inline(filename, bytes)
            }
            AttachmentRecord::Linked { filename, path } => Self::linked(filename, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_attachment_json() {
        let attachment = Attachment::inline("photo.jpg", b"abc".to_vec()).unwrap();
        let json = attachment.to_json(None);
        assert_eq!(json, json!({"filename": "photo.jpg", "data": "YWJj"}));
        assert_eq!(Attachment::from_json(&json).unwrap(), attachment);
    }

    #[test]
    fn test_attachment_path_override() {
        let attachment = Attachment::inline("photo.jpg", b"abc".to_vec()).unwrap();
        let json = attachment.to_json(Some(Path::new("media")));
        let expected = Path::new("media").join("photo.jpg");
        assert_eq!(json["path"], json!(expected.to_string_lossy()));
        assert!(json.get("data").is_none());

        let decoded = Attachment::from_json(&json).unwrap();
        assert_eq!(decoded.payload(), &AttachmentPayload::Linked(expected));
    }

    #[test]
    fn test_attachment_requires_payload() {
        let err = Attachment::from_json(&json!({"filename": "x.txt"})).unwrap_err();
        assert!(matches!(err, ChatError::MissingField("data")));

        let err = Attachment::from_json(&json!({"filename": "x.txt", "data": "!!"})).unwrap_err();
        assert!(matches!(err, ChatError::InvalidAttachment(_)));
    }

    #[test]
    fn test_linked_attachment_json() {
        let attachment = Attachment::linked("notes.txt", "/tmp/notes.txt").unwrap();
        let json = attachment.to_json(Some(Path::new("ignored")));
        assert_eq!(json, json!({"filename": "notes.txt", "path": "/tmp/notes.txt"}));
        assert_eq!(Attachment::from_json(&json).unwrap(), attachment);
    }

    #[test]
    fn test_attachment_record_types_checked() {
        let err = Attachment::from_json(&json!(["x.txt"])).unwrap_err();
        assert!(err.is_type_error());

        let err = Attachment::from_json(&json!({"filename": 1, "data": "YWJj"})).unwrap_err();
        assert!(err.is_type_error());

        let err = Attachment::from_json(&json!({"data": "YWJj"})).unwrap_err();
        assert!(matches!(err, ChatError::MissingField("filename")));
    }

    #[test]
    fn test_empty_filename_rejected() {
        assert!(Attachment::inline("", Vec::new()).is_err());
    }
}
