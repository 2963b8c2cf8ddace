//! Conversations: de-duplicated, time-ordered message sets.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::chats::errors::{AlreadyPresent, ChatError, ChatResult};
use crate::chats::ids::{ChatLogId, ConversationId};
use crate::chats::messages::{LinkKey, Message};
use crate::chats::people::{Contact, ContactBook};
use crate::chats::sorting::{insertion_index, sort_messages};
use crate::json::decode_record;

/// Wire form of a conversation; messages are decoded by their own type.
#[derive(Debug, Serialize, Deserialize)]
struct ConversationRecord {
    messages: Vec<Value>,
}

/// A chat thread.
///
/// Invariants kept by every operation:
/// - no two messages are [`Message::same_as`] each other;
/// - messages are sorted by non-decreasing timestamp;
/// - a message added with [`Conversation::add_message`] links back to this
///   conversation until it is removed again.
#[derive(Clone, Debug)]
pub struct Conversation<M: Message> {
    id: ConversationId,
    messages: Vec<M>,
    chatlog: Option<ChatLogId>,
}

impl<M: Message> Default for Conversation<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> Conversation<M> {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            chatlog: None,
        }
    }

    /// Conversation built from an already sorted, duplicate-free list.
    fn from_sorted(messages: Vec<M>) -> Self {
        Self {
            messages,
            ..Self::new()
        }
    }

    /// Identity of this conversation.
    #[must_use]
    pub const fn id(&self) -> ConversationId {
        self.id
    }

    /// Decode a `{"messages": [...]}` record.
    ///
    /// Records are trusted to be duplicate-free; they are sorted and linked to
    /// the new conversation. Senders with the same name resolve to one
    /// contact.
    ///
    /// # Errors
    /// Returns a type error if `value` is not an object or `messages` is not
    /// an array, a value error if `messages` is missing, and any error raised
    /// while decoding a message.
    pub fn from_json(value: &Value) -> ChatResult<Self> {
        Self::from_json_with(value, &mut ContactBook::new())
    }

    /// Decode a conversation, resolving senders through a book shared with
    /// other records of the same document.
    ///
    /// # Errors
    /// Same as [`Conversation::from_json`].
    pub fn from_json_with(value: &Value, contacts: &mut ContactBook) -> ChatResult<Self> {
        let record: ConversationRecord = decode_record(value, "conversation", &["messages"])?;
        let messages = record
            .messages
            .iter()
            .map(|message| M::from_json(message, contacts))
            .collect::<ChatResult<Vec<_>>>()?;

        let mut conversation = Self::from_sorted(sort_messages(messages));
        let id = conversation.id;
        for message in &mut conversation.messages {
            message.link_mut(LinkKey::new()).attach(id);
        }
        Ok(conversation)
    }

    /// Encode the conversation as `{"messages": [...]}` in timestamp order.
    #[must_use]
    pub fn to_json(&self, attachment_path: Option<&Path>) -> Value {
        let messages = self
            .messages
            .iter()
            .map(|message| message.to_json(attachment_path))
            .collect();
        json!(ConversationRecord { messages })
    }

    /// Whether a message that is the same as `message` is present.
    #[must_use]
    pub fn contains(&self, message: &M) -> bool {
        self.messages
            .iter()
            .any(|present| present.same_as(message) || message.same_as(present))
    }

    /// Insert a message at its chronological position and link it here.
    ///
    /// Messages sharing a timestamp keep insertion order.
    ///
    /// # Errors
    /// Returns [`AlreadyPresent`] holding the rejected message if the same
    /// message is already present; the conversation is left unchanged.
    pub fn add_message(&mut self, mut message: M) -> Result<(), AlreadyPresent<M>> {
        if self.contains(&message) {
            return Err(AlreadyPresent::new(message));
        }
        let index = insertion_index(&self.messages, message.timestamp());
        message.link_mut(LinkKey::new()).attach(self.id);
        self.messages.insert(index, message);
        Ok(())
    }

    /// Remove a message and hand it back unlinked.
    ///
    /// # Errors
    /// Returns [`ChatError::MessageNotFound`] if no present message is the
    /// same as `message`.
    pub fn remove_message(&mut self, message: &M) -> ChatResult<M> {
        let index = self
            .messages
            .iter()
            .position(|present| present.same_as(message) || message.same_as(present))
            .ok_or(ChatError::MessageNotFound)?;
        let mut removed = self.messages.remove(index);
        removed.link_mut(LinkKey::new()).detach();
        Ok(removed)
    }

    /// Owned copy of the messages, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<M> {
        self.messages.clone()
    }

    /// Borrowing iterator over the messages, in order.
    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.messages.iter()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Distinct senders of the current messages.
    #[must_use]
    pub fn participants(&self) -> HashSet<Contact> {
        self.messages
            .iter()
            .map(|message| message.sender().clone())
            .collect()
    }

    /// The chat log holding this conversation, if any.
    #[must_use]
    pub const fn chatlog(&self) -> Option<ChatLogId> {
        self.chatlog
    }

    pub(crate) const fn set_chatlog(&mut self, chatlog: Option<ChatLogId>) {
        self.chatlog = chatlog;
    }

    /// Combine several exports of the same thread into one conversation.
    ///
    /// Messages of the first conversation are all kept. Each later
    /// conversation contributes only the messages that are not the same as a
    /// message gathered from an earlier conversation; the earlier instance
    /// wins. The result is sorted by timestamp. Inputs are left untouched and
    /// the merged messages keep whatever conversation link they had.
    ///
    /// # Errors
    /// Returns [`ChatError::NothingToMerge`] if `conversations` is empty.
    pub fn merge(conversations: &[&Self]) -> ChatResult<Self> {
        let (first, rest) = conversations
            .split_first()
            .ok_or(ChatError::NothingToMerge)?;

        let mut merged = first.messages();
        let mut dropped = 0_usize;
        for conversation in rest {
            let prior = merged.len();
            for message in conversation.iter() {
                let duplicate = merged[..prior]
                    .iter()
                    .any(|seen| seen.same_as(message) || message.same_as(seen));
                if duplicate {
                    dropped += 1;
                } else {
                    merged.push(message.clone());
                }
            }
        }

        debug!(
            sources = conversations.len(),
            kept = merged.len(),
            dropped,
            "merged conversations"
        );
        Ok(Self::from_sorted(sort_messages(merged)))
    }
}

impl<'a, M: Message> IntoIterator for &'a Conversation<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl<M: Message> fmt::Display for Conversation<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.messages.len();
        let plural = if count == 1 { "" } else { "s" };
        write!(f, "<Conversation ({count} message{plural})>")
    }
}
