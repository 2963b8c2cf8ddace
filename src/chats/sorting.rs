//! Chronological ordering of messages.

use chrono::NaiveDateTime;

use crate::chats::messages::Message;

/// Return `messages` ordered by ascending timestamp.
///
/// The sort is stable: messages sharing a timestamp keep their relative input
/// order, so concatenating already sorted sources and sorting once never
/// shuffles same-instant messages.
#[must_use]
pub fn sort_messages<M: Message>(mut messages: Vec<M>) -> Vec<M> {
    messages.sort_by_key(M::timestamp);
    messages
}

/// Position for a message sent at `timestamp`: right before the first message
/// that is strictly later, or the end.
pub(crate) fn insertion_index<M: Message>(messages: &[M], timestamp: NaiveDateTime) -> usize {
    messages.partition_point(|message| message.timestamp() <= timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::messages::ChatMessage;
    use crate::chats::people::Contact;
    use chrono::NaiveDate;

    fn messages() -> Vec<ChatMessage> {
        let sender = Contact::new("Lyra").unwrap();
        (1..=5)
            .map(|day| {
                let ts = NaiveDate::from_ymd_opt(2009, 5, day)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap();
                ChatMessage::new(sender.clone(), ts, Some(format!("day {day}")))
            })
            .collect()
    }

    fn ids(messages: &[ChatMessage]) -> Vec<crate::chats::ids::MessageId> {
        messages.iter().map(Message::message_id).collect()
    }

    #[test]
    fn test_can_sort_messages() {
        let expected = messages();
        let mut shuffled: Vec<_> = expected[2..5].iter().rev().cloned().collect();
        shuffled.extend_from_slice(&expected[..2]);

        assert_eq!(ids(&sort_messages(shuffled)), ids(&expected));
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let sender = Contact::new("Will").unwrap();
        let ts = NaiveDate::from_ymd_opt(2009, 5, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let first = ChatMessage::new(sender.clone(), ts, Some("first".to_string()));
        let second = ChatMessage::new(sender, ts, Some("second".to_string()));
        let later = messages().remove(4);

        let sorted = sort_messages(vec![later.clone(), first.clone(), second.clone()]);
        assert_eq!(ids(&sorted), ids(&[first, second, later]));
    }

    #[test]
    fn test_insertion_index_goes_after_equal_timestamps() {
        let existing = messages();
        let ts = existing[1].timestamp();
        assert_eq!(insertion_index(&existing, ts), 2);
        assert_eq!(insertion_index::<ChatMessage>(&[], ts), 0);

        let early = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(insertion_index(&existing, early), 0);
    }
}
