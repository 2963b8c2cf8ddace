//! Chat model: contacts, messages, conversations and chat logs.
//!
//! - `people`: contacts with identity-based equality
//! - `messages`: the message capability and the generic message
//! - `sorting`: chronological ordering shared by insertion and merge
//! - `conversations`: ordered, de-duplicated message sets and their merge
//! - `chatlogs`: conversations recovered from one account

pub mod attachments;
pub mod chatlogs;
pub mod conversations;
pub mod errors;
pub mod ids;
pub mod messages;
pub mod people;
pub mod sorting;

pub use attachments::{Attachment, AttachmentPayload};
pub use chatlogs::ChatLog;
pub use conversations::Conversation;
pub use errors::{AlreadyPresent, ChatError, ChatResult};
pub use ids::{ChatLogId, ContactId, ConversationId, MessageId};
pub use messages::{ChatMessage, ConversationLink, LinkKey, Message};
pub use people::{Contact, ContactBook};
pub use sorting::sort_messages;
