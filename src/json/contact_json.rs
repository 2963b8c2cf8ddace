//! Contact records: `{"name": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::chats::errors::ChatResult;
use crate::chats::people::{Contact, ContactBook};
use crate::json::decode_record;

/// Wire form of a contact. Identity is not serialized.
#[derive(Debug, Serialize, Deserialize)]
struct ContactRecord {
    name: String,
}

fn decode(value: &Value) -> ChatResult<ContactRecord> {
    decode_record(value, "contact", &["name"])
}

/// Encode a contact.
#[must_use]
pub fn contact_to_json(contact: &Contact) -> Value {
    json!(ContactRecord {
        name: contact.name(),
    })
}

/// Decode a contact with a fresh identity.
///
/// # Errors
/// Returns a type error if `value` is not an object or the name is not a
/// string, and a value error if the name is missing or empty.
pub fn json_to_contact(value: &Value) -> ChatResult<Contact> {
    Contact::new(decode(value)?.name)
}

/// Decode a contact, reusing the identity already known for its name.
pub(crate) fn json_to_known_contact(value: &Value, book: &mut ContactBook) -> ChatResult<Contact> {
    book.resolve(&decode(value)?.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::errors::ChatError;

    #[test]
    fn test_can_make_json_from_contact() {
        let contact = Contact::new("Lord Asriel").unwrap();
        assert_eq!(contact_to_json(&contact), json!({"name": "Lord Asriel"}));
    }

    #[test]
    fn test_json_follows_renames() {
        let contact = Contact::new("Asriel").unwrap();
        contact.clone().set_name("Lord Asriel").unwrap();
        assert_eq!(contact_to_json(&contact), json!({"name": "Lord Asriel"}));
    }

    #[test]
    fn test_can_make_contact_from_json() {
        let contact = json_to_contact(&json!({"name": "Lord Asriel"})).unwrap();
        assert_eq!(contact.name(), "Lord Asriel");
    }

    #[test]
    fn test_contact_from_json_requires_object() {
        let err = json_to_contact(&json!("some string")).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_contact_from_json_requires_name_key() {
        let err = json_to_contact(&json!({"wrongkey": "Lord Asriel"})).unwrap_err();
        assert!(matches!(err, ChatError::MissingField("name")));
    }

    #[test]
    fn test_contact_name_must_be_a_string() {
        let err = json_to_contact(&json!({"name": 7})).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_known_contact_reuses_identity() {
        let mut book = ContactBook::new();
        let a = json_to_known_contact(&json!({"name": "Mary"}), &mut book).unwrap();
        let b = json_to_known_contact(&json!({"name": "Mary"}), &mut book).unwrap();
        assert_eq!(a, b);
    }
}
