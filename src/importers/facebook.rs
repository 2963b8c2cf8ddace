//! Facebook `messages.htm` backup importer.
//!
//! The legacy export lists every thread as a `div.thread`: a text node with
//! the comma-separated members, then for each message a `div.message` header
//! (`span.user`, `span.meta`) followed by a `<p>` with the body. Messages are
//! listed newest first.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::chats::chatlogs::ChatLog;
use crate::chats::conversations::Conversation;
use crate::chats::errors::{ChatError, ChatResult};
use crate::chats::ids::MessageId;
use crate::chats::messages::{ConversationLink, LinkKey, Message};
use crate::chats::people::{Contact, ContactBook};
use crate::importers::config::ImportConfig;
use crate::json::contact_json::{contact_to_json, json_to_known_contact};
use crate::json::{decode_record, format_timestamp, parse_timestamp};

/// Value of the `source` field in Facebook message records.
pub const SOURCE_TAG: &str = "facebook";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Wire form of a [`FacebookMessage`].
#[derive(Debug, Serialize, Deserialize)]
struct FacebookRecord {
    #[serde(default)]
    source: Option<String>,
    sender: Value,
    timestamp: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    from_me: bool,
}

/// A message recovered from a Facebook export.
///
/// Exports carry no message ids, so two messages are the same when sender
/// name, minute and text all match. This lets successive backups of a thread
/// be merged without duplicates.
#[derive(Clone, Debug)]
pub struct FacebookMessage {
    id: MessageId,
    sender: Contact,
    timestamp: NaiveDateTime,
    text: String,
    from_me: bool,
    link: ConversationLink,
}

impl FacebookMessage {
    /// Create a message.
    #[must_use]
    pub fn new(
        sender: Contact,
        timestamp: NaiveDateTime,
        text: impl Into<String>,
        from_me: bool,
    ) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            timestamp,
            text: text.into(),
            from_me,
            link: ConversationLink::new(),
        }
    }

    /// Whether the backup owner sent this message.
    #[must_use]
    pub const fn from_me(&self) -> bool {
        self.from_me
    }
}

impl Message for FacebookMessage {
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
        Some(&self.text)
    }

    fn link(&self) -> &ConversationLink {
        &self.link
    }

    fn link_mut(&mut self, _key: LinkKey) -> &mut ConversationLink {
        &mut self.link
    }

    fn same_as(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && (self.sender == other.sender || other.sender.is_named(&self.sender.name()))
            && self.text == other.text
    }

    fn to_json(&self, _attachment_path: Option<&Path>) -> Value {
        json!(FacebookRecord {
            source: Some(SOURCE_TAG.to_string()),
            sender: contact_to_json(&self.sender),
            timestamp: format_timestamp(self.timestamp),
            text: Some(self.text.clone()),
            from_me: self.from_me,
        })
    }

    fn from_json(value: &Value, contacts: &mut ContactBook) -> ChatResult<Self> {
        let record: FacebookRecord =
            decode_record(value, "facebook message", &["sender", "timestamp"])?;
        if let Some(found) = record.source
            && found != SOURCE_TAG
        {
            return Err(ChatError::UnexpectedSource {
                expected: SOURCE_TAG,
                found,
            });
        }

        let sender = json_to_known_contact(&record.sender, contacts)?;
        let timestamp = parse_timestamp(&record.timestamp)?;
        let text = record.text.unwrap_or_default();
        Ok(Self::new(sender, timestamp, text, record.from_me))
    }
}

fn time_pattern() -> ChatResult<Regex> {
    Ok(Regex::new(
        r"(\d{1,2}) ([A-Z][a-z]+) (\d{4}) at (\d{1,2}):(\d{2})",
    )?)
}

fn parse_time_with(pattern: &Regex, text: &str) -> ChatResult<NaiveDateTime> {
    let invalid = || ChatError::InvalidTimestamp(text.to_string());
    let caps = pattern.captures(text).ok_or_else(invalid)?;

    let day: u32 = caps[1].parse().map_err(|_| invalid())?;
    let month = (1_u32..)
        .zip(MONTHS)
        .find_map(|(number, name)| (name == &caps[2]).then_some(number))
        .ok_or_else(invalid)?;
    let year: i32 = caps[3].parse().map_err(|_| invalid())?;
    let hour: u32 = caps[4].parse().map_err(|_| invalid())?;
    let minute: u32 = caps[5].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .ok_or_else(invalid)
}

/// Parse a Facebook export timestamp such as
/// `"Tuesday, 3 May 2011 at 12:45 UTC+01"`. The zone suffix is ignored.
///
/// # Errors
/// Returns [`ChatError::InvalidTimestamp`] if the text is not in that form or
/// names an impossible date.
pub fn parse_facebook_time(text: &str) -> ChatResult<NaiveDateTime> {
    parse_time_with(&time_pattern()?, text)
}

fn selector(css: &str) -> ChatResult<Selector> {
    Selector::parse(css)
        .map_err(|err| ChatError::MalformedExport(format!("invalid selector {css}: {err:?}")))
}

struct BackupParser<'c> {
    config: &'c ImportConfig,
    user: Selector,
    meta: Selector,
    time: Regex,
}

impl<'c> BackupParser<'c> {
    fn new(config: &'c ImportConfig) -> ChatResult<Self> {
        Ok(Self {
            config,
            user: selector("span.user")?,
            meta: selector("span.meta")?,
            time: time_pattern()?,
        })
    }

    /// Names listed in the thread heading, handles excluded.
    fn members(&self, thread: ElementRef<'_>) -> Vec<String> {
        let heading = thread
            .children()
            .find_map(|child| {
                child
                    .value()
                    .as_text()
                    .map(|text| text.trim().to_string())
                    .filter(|text| !text.is_empty())
            })
            .unwrap_or_default();

        heading
            .split(", ")
            .map(str::trim)
            .filter(|name| !name.is_empty() && !self.config.is_handle(name))
            .map(str::to_string)
            .collect()
    }

    /// Sender name and raw timestamp of a `div.message` header.
    fn header(&self, header: ElementRef<'_>) -> ChatResult<(String, String)> {
        let field = |query: &Selector, what: &str| {
            header
                .select(query)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
                .ok_or_else(|| ChatError::MalformedExport(format!("message header without {what}")))
        };
        Ok((field(&self.user, "sender")?, field(&self.meta, "timestamp")?))
    }

    fn thread(
        &self,
        thread: ElementRef<'_>,
        contacts: &mut ContactBook,
    ) -> ChatResult<Option<Conversation<FacebookMessage>>> {
        let mut members = self.members(thread);
        let mut messages = Vec::new();
        let mut pending = None;

        for child in thread.children().filter_map(ElementRef::wrap) {
            let element = child.value();
            if element.name() == "div" && element.classes().any(|class| class == "message") {
                pending = Some(self.header(child)?);
            } else if element.name() == "p"
                && let Some((sender, meta)) = pending.take()
            {
                if self.config.is_handle(&sender) {
                    continue;
                }
                let timestamp = parse_time_with(&self.time, &meta)?;
                if timestamp <= self.config.since {
                    continue;
                }
                if !members.contains(&sender) {
                    members.push(sender.clone());
                }
                let from_me = sender == self.config.owner_name;
                let contact = contacts.resolve(&sender)?;
                let text: String = child.text().collect();
                messages.push(FacebookMessage::new(contact, timestamp, text, from_me));
            }
        }

        members.retain(|member| *member != self.config.owner_name);
        if members.is_empty() {
            debug!("skipping thread without other members");
            return Ok(None);
        }

        // Oldest first, so same-minute messages keep their export order.
        messages.reverse();
        let mut conversation = Conversation::new();
        for message in messages {
            if let Err(rejected) = conversation.add_message(message) {
                debug!(
                    members = ?members,
                    sent = %rejected.message().timestamp(),
                    "skipping repeated message"
                );
            }
        }
        Ok(Some(conversation))
    }
}

/// Parse a Facebook `messages.htm` export into a chat log named after the
/// owner. Senders with the same name share one contact across threads.
///
/// # Errors
/// Returns an error if the config is invalid, a message header lacks a sender
/// or timestamp, or a timestamp cannot be parsed.
pub fn parse_backup(html: &str, config: &ImportConfig) -> ChatResult<ChatLog<FacebookMessage>> {
    config.validate()?;
    let parser = BackupParser::new(config)?;
    let thread_selector = selector("div.thread")?;

    let document = Html::parse_document(html);
    let threads: Vec<ElementRef<'_>> = document.select(&thread_selector).collect();
    info!(threads = threads.len(), "found conversation threads");

    let mut contacts = ContactBook::new();
    let mut log = ChatLog::new(config.owner_name.clone())?;
    for thread in threads {
        if let Some(conversation) = parser.thread(thread, &mut contacts)? {
            log.add_conversation(conversation)?;
        }
    }
    Ok(log)
}
