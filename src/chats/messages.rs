//! Message capability and the generic chat message.

use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::chats::attachments::Attachment;
use crate::chats::errors::ChatResult;
use crate::chats::ids::{ConversationId, MessageId};
use crate::chats::people::{Contact, ContactBook};
use crate::json::contact_json::{contact_to_json, json_to_known_contact};
use crate::json::{decode_record, format_timestamp, parse_timestamp};

/// Non-owning reference from a message to the conversation holding it.
///
/// Only [`Conversation`](crate::chats::Conversation) changes it: it is set
/// when a message is added and cleared when the message is removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversationLink(Option<ConversationId>);

impl ConversationLink {
    /// An empty link.
    #[must_use]
    pub const fn new() -> Self {
        Self(None)
    }

    /// The linked conversation, if any.
    #[must_use]
    pub const fn get(&self) -> Option<ConversationId> {
        self.0
    }

    pub(crate) const fn attach(&mut self, conversation: ConversationId) {
        self.0 = Some(conversation);
    }

    pub(crate) const fn detach(&mut self) {
        self.0 = None;
    }
}

/// Permission to mutate a [`ConversationLink`] through [`Message::link_mut`].
///
/// Only this crate can create one, so code outside it cannot rewrite the
/// back-reference of a message it does not own.
///
/// ```compile_fail
/// let key = pychats::chats::messages::LinkKey(());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LinkKey(());

impl LinkKey {
    pub(crate) const fn new() -> Self {
        Self(())
    }
}

/// What a conversation needs from a message.
///
/// Each backup source provides its own implementation. Equality used for
/// de-duplication is [`Message::same_as`], which defaults to identity and may
/// be overridden when a source can recognise the same message across
/// exports.
pub trait Message: Clone + fmt::Debug {
    /// Identity of this message.
    fn message_id(&self) -> MessageId;

    /// Who sent the message.
    fn sender(&self) -> &Contact;

    /// When the message was sent.
    fn timestamp(&self) -> NaiveDateTime;

    /// Text body, if any.
    fn text(&self) -> Option<&str>;

    /// Attached files.
    fn attachments(&self) -> &[Attachment] {
        &[]
    }

    /// Back-reference to the owning conversation.
    fn link(&self) -> &ConversationLink;

    /// Mutable access for [`Conversation`](crate::chats::Conversation),
    /// gated by a [`LinkKey`].
    fn link_mut(&mut self, key: LinkKey) -> &mut ConversationLink;

    /// The conversation this message currently belongs to.
    fn conversation(&self) -> Option<ConversationId> {
        self.link().get()
    }

    /// Whether `other` is the same logical message.
    fn same_as(&self, other: &Self) -> bool {
        self.message_id() == other.message_id()
    }

    /// Encode the message. With `attachment_path`, attachments are written as
    /// paths relative to it instead of inline.
    fn to_json(&self, attachment_path: Option<&Path>) -> Value;

    /// Decode a message, resolving the sender through `contacts`.
    ///
    /// # Errors
    /// Returns a type error for wrongly typed records and a value error when
    /// required fields are absent.
    fn from_json(value: &Value, contacts: &mut ContactBook) -> ChatResult<Self>;
}

/// Wire form of a [`ChatMessage`]. Nested records stay as values so that
/// contacts and attachments go through their own decoders.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessageRecord {
    #[serde(default)]
    id: Option<MessageId>,
    sender: Value,
    timestamp: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    attachments: Option<Vec<Value>>,
}

/// A source-agnostic message. Two `ChatMessage`s are the same message only
/// if they share a [`MessageId`].
#[derive(Clone, Debug)]
pub struct ChatMessage {
    id: MessageId,
    sender: Contact,
    timestamp: NaiveDateTime,
    text: Option<String>,
    attachments: Vec<Attachment>,
    link: ConversationLink,
}

impl ChatMessage {
    /// Create a message with a fresh identity.
    #[must_use]
    pub fn new(sender: Contact, timestamp: NaiveDateTime, text: Option<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            timestamp,
            text,
            attachments: Vec::new(),
            link: ConversationLink::new(),
        }
    }

    /// Attach files to the message.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Replace the identity, e.g. when restoring a stored message.
    #[must_use]
    pub const fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }
}

impl Message for ChatMessage {
    fn message_id(&self) -> MessageId {
        self.id
    }

    fn sender(&self) -> &Contact {
        &self.sender
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    fn link(&self) -> &ConversationLink {
        &self.link
    }

    fn link_mut(&mut self, _key: LinkKey) -> &mut ConversationLink {
        &mut self.link
    }

    fn to_json(&self, attachment_path: Option<&Path>) -> Value {
        let attachments = self
            .attachments
            .iter()
            .map(|attachment| attachment.to_json(attachment_path))
            .collect();
        json!(ChatMessageRecord {
            id: Some(self.id),
            sender: contact_to_json(&self.sender),
            timestamp: format_timestamp(self.timestamp),
            text: self.text.clone(),
            attachments: Some(attachments),
        })
    }

    fn from_json(value: &Value, contacts: &mut ContactBook) -> ChatResult<Self> {
        let record: ChatMessageRecord = decode_record(value, "message", &["sender", "timestamp"])?;
        let sender = json_to_known_contact(&record.sender, contacts)?;
        let timestamp = parse_timestamp(&record.timestamp)?;
        let attachments = record
            .attachments
            .unwrap_or_default()
            .iter()
            .map(Attachment::from_json)
            .collect::<ChatResult<Vec<_>>>()?;

        let message = Self::new(sender, timestamp, record.text).with_attachments(attachments);
        Ok(match record.id {
            Some(id) => message.with_id(id),
            None => message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::errors::ChatError;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2009, 5, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_message_is_unlinked() {
        let sender = Contact::new("Lyra").unwrap();
        let message = ChatMessage::new(sender.clone(), at(1), Some("hi".to_string()));
        assert_eq!(message.conversation(), None);
        assert_eq!(message.sender(), &sender);
        assert_eq!(message.text(), Some("hi"));
        assert!(message.attachments().is_empty());
    }

    #[test]
    fn test_sender_rename_reaches_message() {
        let lyra = Contact::new("Lyra").unwrap();
        let message = ChatMessage::new(lyra.clone(), at(1), Some("hi".to_string()));

        lyra.set_name("Lyra Silvertongue").unwrap();
        assert_eq!(message.sender().name(), "Lyra Silvertongue");
        assert_eq!(message.to_json(None)["sender"], json!({"name": "Lyra Silvertongue"}));
    }

    #[test]
    fn test_link_mut_requires_key() {
        let mut message = ChatMessage::new(Contact::new("Will").unwrap(), at(1), None);
        let id = ConversationId::new();
        message.link_mut(LinkKey::new()).attach(id);
        assert_eq!(message.conversation(), Some(id));
    }

    #[test]
    fn test_same_as_is_identity() {
        let sender = Contact::new("Lyra").unwrap();
        let a = ChatMessage::new(sender.clone(), at(1), Some("hi".to_string()));
        let b = ChatMessage::new(sender, at(1), Some("hi".to_string()));
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }

    #[test]
    fn test_link_attach_detach() {
        let mut link = ConversationLink::new();
        let id = ConversationId::new();
        link.attach(id);
        assert_eq!(link.get(), Some(id));
        link.detach();
        assert_eq!(link.get(), None);
    }

    #[test]
    fn test_json_roundtrip_keeps_identity() {
        let sender = Contact::new("Lyra").unwrap();
        let attachment = Attachment::inline("map.png", vec![1, 2, 3]).unwrap();
        let message = ChatMessage::new(sender, at(3), None).with_attachments(vec![attachment]);

        let json = message.to_json(None);
        assert_eq!(json["timestamp"], json!("2009-05-03 12:00:00"));
        assert_eq!(json["sender"], json!({"name": "Lyra"}));
        assert_eq!(json["text"], Value::Null);

        let mut book = ContactBook::new();
        let decoded = ChatMessage::from_json(&json, &mut book).unwrap();
        assert!(decoded.same_as(&message));
        assert_eq!(decoded.timestamp(), message.timestamp());
        assert_eq!(decoded.attachments(), message.attachments());
        assert_eq!(decoded.sender().name(), "Lyra");
        assert_eq!(decoded.conversation(), None);
    }

    #[test]
    fn test_from_json_without_id_gets_fresh_identity() {
        let value = json!({
            "sender": {"name": "Will"},
            "timestamp": "2009-05-01 12:00:00",
            "text": "knife",
        });
        let mut book = ContactBook::new();
        let a = ChatMessage::from_json(&value, &mut book).unwrap();
        let b = ChatMessage::from_json(&value, &mut book).unwrap();
        assert!(!a.same_as(&b));
        assert_eq!(a.sender(), b.sender());
    }

    #[test]
    fn test_from_json_errors() {
        let mut book = ContactBook::new();

        let err = ChatMessage::from_json(&json!("text"), &mut book).unwrap_err();
        assert!(err.is_type_error());

        let err = ChatMessage::from_json(&json!({"timestamp": "2009-05-01 12:00:00"}), &mut book)
            .unwrap_err();
        assert!(matches!(err, ChatError::MissingField("sender")));

        let err =
            ChatMessage::from_json(&json!({"sender": {"name": "Will"}}), &mut book).unwrap_err();
        assert!(matches!(err, ChatError::MissingField("timestamp")));

        let value = json!({
            "sender": {"name": "Will"},
            "timestamp": "2009-05-01 12:00:00",
            "attachments": "none",
        });
        let err = ChatMessage::from_json(&value, &mut book).unwrap_err();
        assert!(err.is_type_error());
    }
}
