//! Contacts taking part in conversations.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use crate::chats::errors::{ChatError, ChatResult};
use crate::chats::ids::ContactId;

/// A person who sends messages.
///
/// Clones are handles on the same person: messages keep a clone of their
/// sender, so renaming any handle renames the sender everywhere.
///
/// Equality and hashing go through [`ContactId`] only: two contacts sharing a
/// display name are different people, and a renamed contact is the same one.
#[derive(Clone, Debug)]
pub struct Contact {
    id: ContactId,
    name: Arc<RwLock<String>>,
}

impl Contact {
    /// Create a contact with a fresh identity.
    ///
    /// # Errors
    /// Returns [`ChatError::InvalidName`] if the name is empty.
    pub fn new(name: impl Into<String>) -> ChatResult<Self> {
        let name = validate_name(name.into())?;
        Ok(Self {
            id: ContactId::new(),
            name: Arc::new(RwLock::new(name)),
        })
    }

    /// Identity of this contact.
    #[must_use]
    pub const fn id(&self) -> ContactId {
        self.id
    }

    /// Current display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the current display name is `name`.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        *self.name.read().unwrap_or_else(PoisonError::into_inner) == name
    }

    /// Replace the display name for every handle on this contact.
    ///
    /// # Errors
    /// Returns [`ChatError::InvalidName`] if the name is empty; the previous
    /// name is kept.
    pub fn set_name(&self, name: impl Into<String>) -> ChatResult<()> {
        let name = validate_name(name.into())?;
        *self.name.write().unwrap_or_else(PoisonError::into_inner) = name;
        Ok(())
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Contact: {}>", self.name())
    }
}

fn validate_name(name: String) -> ChatResult<String> {
    if name.trim().is_empty() {
        return Err(ChatError::InvalidName(name));
    }
    Ok(name)
}

/// Resolves display names to contacts while decoding a document.
///
/// Serialized contacts only carry a name, so decoding a backup twice would
/// otherwise invent a new person for every message. Lookups use the current
/// name, so a contact renamed after decoding is found under its new name.
#[derive(Clone, Debug, Default)]
pub struct ContactBook {
    contacts: Vec<Contact>,
}

impl ContactBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the contact known under `name`, creating it on first sight.
    ///
    /// # Errors
    /// Returns [`ChatError::InvalidName`] if the name is empty.
    pub fn resolve(&mut self, name: &str) -> ChatResult<Contact> {
        if let Some(contact) = self.get(name) {
            return Ok(contact.clone());
        }
        let contact = Contact::new(name)?;
        self.contacts.push(contact.clone());
        Ok(contact)
    }

    /// Register an existing contact. A contact already in the book is not
    /// added twice.
    pub fn insert(&mut self, contact: Contact) {
        if !self.contacts.contains(&contact) {
            self.contacts.push(contact);
        }
    }

    /// Look up a contact by its current name without creating it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Contact> {
        self.contacts.iter().find(|contact| contact.is_named(name))
    }

    /// All known contacts, in order of first sight.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    /// Number of known contacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
