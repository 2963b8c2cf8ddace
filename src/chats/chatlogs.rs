//! Chat logs: the set of conversations recovered from one account.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::chats::conversations::Conversation;
use crate::chats::errors::{ChatError, ChatResult};
use crate::chats::ids::{ChatLogId, ConversationId};
use crate::chats::messages::Message;
use crate::chats::people::{Contact, ContactBook};
use crate::json::decode_record;

#[derive(Debug, Serialize, Deserialize)]
struct ChatLogRecord {
    name: String,
    conversations: Vec<Value>,
}

/// Owns conversations and keeps their `chatlog` link pointing at itself.
#[derive(Clone, Debug)]
pub struct ChatLog<M: Message> {
    id: ChatLogId,
    name: String,
    conversations: Vec<Conversation<M>>,
}

impl<M: Message> ChatLog<M> {
    /// Create an empty chat log.
    ///
    /// # Errors
    /// Returns [`ChatError::InvalidName`] if the name is empty.
    pub fn new(name: impl Into<String>) -> ChatResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ChatError::InvalidName(name));
        }
        Ok(Self {
            id: ChatLogId::new(),
            name,
            conversations: Vec::new(),
        })
    }

    /// Identity of this chat log.
    #[must_use]
    pub const fn id(&self) -> ChatLogId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the chat log.
    ///
    /// # Errors
    /// Returns [`ChatError::InvalidName`] if the name is empty.
    pub fn set_name(&mut self, name: impl Into<String>) -> ChatResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ChatError::InvalidName(name));
        }
        self.name = name;
        Ok(())
    }

    /// Take ownership of a conversation and link it to this log.
    ///
    /// # Errors
    /// Returns [`ChatError::DuplicateConversation`] if a conversation with the
    /// same id is already held.
    pub fn add_conversation(&mut self, mut conversation: Conversation<M>) -> ChatResult<()> {
        if self.conversation(conversation.id()).is_some() {
            return Err(ChatError::DuplicateConversation(conversation.id().to_string()));
        }
        conversation.set_chatlog(Some(self.id));
        self.conversations.push(conversation);
        Ok(())
    }

    /// Detach a conversation and hand it back.
    ///
    /// # Errors
    /// Returns [`ChatError::ConversationNotFound`] if no conversation has `id`.
    pub fn remove_conversation(&mut self, id: ConversationId) -> ChatResult<Conversation<M>> {
        let index = self
            .conversations
            .iter()
            .position(|conversation| conversation.id() == id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))?;
        let mut removed = self.conversations.remove(index);
        removed.set_chatlog(None);
        Ok(removed)
    }

    /// Conversations in insertion order.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation<M>] {
        &self.conversations
    }

    /// Find a conversation by id.
    #[must_use]
    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation<M>> {
        self.conversations
            .iter()
            .find(|conversation| conversation.id() == id)
    }

    /// Number of conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the log holds no conversations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Total number of messages across conversations.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.conversations.iter().map(Conversation::len).sum()
    }

    /// Everyone who sent a message in any conversation.
    #[must_use]
    pub fn participants(&self) -> HashSet<Contact> {
        self.conversations
            .iter()
            .flat_map(Conversation::participants)
            .collect()
    }

    /// Encode as `{"name": ..., "conversations": [...]}`.
    #[must_use]
    pub fn to_json(&self, attachment_path: Option<&Path>) -> Value {
        let conversations = self
            .conversations
            .iter()
            .map(|conversation| conversation.to_json(attachment_path))
            .collect();
        json!(ChatLogRecord {
            name: self.name.clone(),
            conversations,
        })
    }

    /// Decode a chat log record. A sender name maps to one contact across
    /// all conversations of the log.
    ///
    /// # Errors
    /// Returns a type error for wrongly typed records, a value error when
    /// `name` or `conversations` is missing, and any conversation error.
    pub fn from_json(value: &Value) -> ChatResult<Self> {
        let record: ChatLogRecord =
            decode_record(value, "chat log", &["name", "conversations"])?;
        let mut log = Self::new(record.name)?;
        let mut contacts = ContactBook::new();
        for conversation in &record.conversations {
            log.add_conversation(Conversation::from_json_with(conversation, &mut contacts)?)?;
        }
        Ok(log)
    }
}
