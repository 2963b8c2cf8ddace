//! Chat backup model: contacts, messages, ordered conversations and their merge.

// Strict lint policy
#![deny(warnings)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(dead_code)]
#![deny(non_camel_case_types)]
#![deny(unused_imports)]
#![deny(unused_variables)]
#![deny(unused_must_use)]
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
#![deny(overflowing_literals)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Contacts, messages, conversations and chat logs.
pub mod chats;
/// Importers for exported chat backups.
pub mod importers;
/// JSON helpers and timestamp formatting.
pub mod json;
/// Tracing subscriber setup.
pub mod telemetry;

pub use chats::{
    AlreadyPresent, Attachment, AttachmentPayload, ChatError, ChatLog, ChatMessage, ChatResult,
    Contact, ContactBook, Conversation, ConversationLink, LinkKey, Message, sort_messages,
};
pub use importers::{FacebookMessage, ImportConfig, parse_backup};
