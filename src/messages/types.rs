use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Voice;

/// A raw message as delivered by the chat collaborator.
///
/// Created once per chat event and consumed once by the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: user.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// A message that survived the rule engine and is waiting to be spoken.
///
/// Owned exclusively by the playback queue until played, then discarded.
#[derive(Debug, Clone)]
pub struct SpeechJob {
    /// Resolved voice, including its playback rate
    pub voice: Voice,

    /// Per-user pitch shift applied by the player
    pub pitch_shift: f32,

    /// Transformed, speakable text. Never empty inside the queue.
    pub text: String,

    /// The chat message this job came from, kept for logging
    pub source: ChatMessage,
}

impl SpeechJob {
    pub fn new(voice: Voice, pitch_shift: f32, text: String, source: ChatMessage) -> Self {
        Self {
            voice,
            pitch_shift,
            text,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_fields() {
        let msg = ChatMessage::new("kae", "hello chat");
        assert_eq!(msg.user, "kae");
        assert_eq!(msg.text, "hello chat");
        assert!(msg.received_at <= Utc::now());
    }

    #[test]
    fn test_chat_message_ids_unique() {
        let a = ChatMessage::new("kae", "one");
        let b = ChatMessage::new("kae", "one");
        assert_ne!(a.id, b.id);
    }
}
