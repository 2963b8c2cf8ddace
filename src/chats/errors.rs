//! Error types for the chat model.

use thiserror::Error;

/// Chat model error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A JSON record was expected to be an object.
    #[error("{0} record must be a JSON object")]
    NotAnObject(&'static str),
    /// A JSON record has a field of the wrong type.
    #[error("invalid {record} record: {source}")]
    InvalidRecord {
        /// Kind of record being decoded.
        record: &'static str,
        /// Underlying decoding error.
        source: serde_json::Error,
    },
    /// A required JSON field is absent.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    /// The message is already part of the conversation.
    #[error("message is already present in the conversation")]
    DuplicateMessage,
    /// A record claims to come from another backup source.
    #[error("expected a {expected} record, found source {found:?}")]
    UnexpectedSource {
        /// Source the decoder handles.
        expected: &'static str,
        /// Source named by the record.
        found: String,
    },
    /// The message is not part of the conversation.
    #[error("message is not present in the conversation")]
    MessageNotFound,
    /// The conversation is already part of the chat log.
    #[error("conversation {0} is already present in the chat log")]
    DuplicateConversation(String),
    /// The conversation is not part of the chat log.
    #[error("conversation {0} is not present in the chat log")]
    ConversationNotFound(String),
    /// Names must be non-empty.
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    /// Timestamp could not be parsed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Attachment payload could not be decoded.
    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),
    /// `merge` was called without any conversation.
    #[error("merge requires at least one conversation")]
    NothingToMerge,
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The backup does not have the expected structure.
    #[error("malformed export: {0}")]
    MalformedExport(String),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl ChatError {
    /// Whether the error signals a wrongly typed argument rather than a bad value.
    #[must_use]
    pub const fn is_type_error(&self) -> bool {
        matches!(self, Self::NotAnObject(_) | Self::InvalidRecord { .. })
    }
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// A message refused because the conversation already holds the same one.
///
/// The rejected message is handed back. Converts into
/// [`ChatError::DuplicateMessage`] for callers that only propagate.
#[derive(Debug, Error)]
#[error("message is already present in the conversation")]
pub struct AlreadyPresent<M>(M);

impl<M> AlreadyPresent<M> {
    pub(crate) const fn new(message: M) -> Self {
        Self(message)
    }

    /// The rejected message.
    #[must_use]
    pub const fn message(&self) -> &M {
        &self.0
    }

    /// Take the rejected message back.
    #[must_use]
    pub fn into_message(self) -> M {
        self.0
    }
}

impl<M> From<AlreadyPresent<M>> for ChatError {
    fn from(_: AlreadyPresent<M>) -> Self {
        Self::DuplicateMessage
    }
}
