//! JSON encode/decode glue shared by the chat model.
//!
//! Each record has a derived serde wire struct next to the type it encodes.
//! Records are exchanged as [`serde_json::Value`] trees so that callers can
//! embed them in larger documents. [`decode_record`] keeps the error
//! taxonomy: wrongly typed input is a type error, a missing required key is a
//! value error.

pub mod contact_json;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::chats::errors::{ChatError, ChatResult};

pub use contact_json::{contact_to_json, json_to_contact};

/// Wire format for message timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp for a JSON record.
#[must_use]
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp from a JSON record.
///
/// # Errors
/// Returns [`ChatError::InvalidTimestamp`] if the text does not match
/// [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(text: &str) -> ChatResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|err| ChatError::InvalidTimestamp(format!("{text:?}: {err}")))
}

pub(crate) fn expect_object<'a>(
    value: &'a Value,
    what: &'static str,
) -> ChatResult<&'a Map<String, Value>> {
    value.as_object().ok_or(ChatError::NotAnObject(what))
}

/// Deserialize a `what` record after checking that it is an object holding
/// every key in `required`.
pub(crate) fn decode_record<T: for<'de> Deserialize<'de>>(
    value: &Value,
    what: &'static str,
    required: &[&'static str],
) -> ChatResult<T> {
    let record = expect_object(value, what)?;
    if let Some(field) = required.iter().copied().find(|field| !record.contains_key(*field)) {
        return Err(ChatError::MissingField(field));
    }
    T::deserialize(value).map_err(|source| ChatError::InvalidRecord {
        record: what,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        note: Option<String>,
    }

    #[test]
    fn test_timestamp_format() {
        let ts = parse_timestamp("2011-05-03 12:45:00").unwrap();
        assert_eq!(format_timestamp(ts), "2011-05-03 12:45:00");
        assert!(matches!(
            parse_timestamp("3 May 2011"),
            Err(ChatError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_decode_record() {
        let sample: Sample =
            decode_record(&json!({"name": "Pan", "note": null}), "sample", &["name"]).unwrap();
        assert_eq!(sample.name, "Pan");
        assert_eq!(sample.note, None);

        let err = decode_record::<Sample>(&json!([1, 2]), "sample", &["name"]).unwrap_err();
        assert!(matches!(err, ChatError::NotAnObject("sample")));

        let err = decode_record::<Sample>(&json!({"note": "x"}), "sample", &["name"]).unwrap_err();
        assert!(matches!(err, ChatError::MissingField("name")));
        assert!(!err.is_type_error());

        let err = decode_record::<Sample>(&json!({"name": 3}), "sample", &["name"]).unwrap_err();
        assert!(matches!(err, ChatError::InvalidRecord { record: "sample", .. }));
        assert!(err.is_type_error());
    }
}
