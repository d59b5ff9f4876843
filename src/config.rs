//! Configuration for the chat-to-speech pipeline
//!
//! The core consumes an already-parsed configuration object; the binary shell
//! is free to deserialize one from JSON. All lookups keyed by username expect
//! lowercase keys.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ChatvoxError, Result};

/// Default capacity of the playback queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// A named voice with its playback rate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    /// Configuration key, e.g. "brian"
    pub key: String,

    /// Name the synthesis endpoint knows the voice by, e.g. "Brian"
    pub name: String,

    /// Playback rate passed to the media player (1.0 = normal)
    pub rate: f32,
}

impl Voice {
    pub fn new(key: impl Into<String>, name: impl Into<String>, rate: f32) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            rate,
        }
    }
}

/// The stock voice catalog
pub fn builtin_voices() -> Vec<Voice> {
    vec![
        Voice::new("matthew", "Matthew", 1.0),
        Voice::new("brian", "Brian", 1.1),
        Voice::new("amy", "Amy", 1.0),
        Voice::new("emma", "Emma", 1.0),
        Voice::new("geraint", "Geraint", 1.1),
        Voice::new("russell", "Russell", 1.0),
        Voice::new("nicole", "Nicole", 1.0),
        Voice::new("joey", "Joey", 1.2),
        Voice::new("justin", "Justin", 1.0),
        Voice::new("joanna", "Joanna", 1.0),
        Voice::new("kendra", "Kendra", 1.0),
        Voice::new("kimberly", "Kimberly", 1.2),
        Voice::new("salli", "Salli", 1.1),
    ]
}

/// How a replacement rule matches the text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Exact, case-sensitive substring match
    #[default]
    Literal,

    /// Regular expression, validated at configuration load
    Regex,
}

/// A single text replacement, applied in configured order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplacementRule {
    pub pattern: String,
    pub replacement: String,

    #[serde(default)]
    pub kind: RuleKind,
}

impl ReplacementRule {
    pub fn literal(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            kind: RuleKind::Literal,
        }
    }

    pub fn regex(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            kind: RuleKind::Regex,
        }
    }
}

/// Configuration for the complete pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Available voices
    pub voices: Vec<Voice>,

    /// Voice used when a user has no override
    pub default_voice: String,

    /// Per-user voice assignments, username (lowercase) -> voice key
    pub voice_overrides: HashMap<String, String>,

    /// Per-user pitch shifts, username (lowercase) -> shift
    pub pitch_overrides: HashMap<String, f32>,

    /// Assign users without an override a stable catalog voice derived from
    /// their name instead of the default voice
    pub randomize_voices: bool,

    /// Ordered replacement rules
    pub replacements: Vec<ReplacementRule>,

    /// Words kept from a transformed message; overflow is truncated.
    /// Zero or negative suppresses every message.
    pub max_word_count: i32,

    /// A message containing any word at or over this length is suppressed
    pub max_word_length: Option<usize>,

    /// Users whose messages are never spoken (lowercase)
    pub blacklist: Vec<String>,

    /// Strip a leading "@mention " before transforming
    pub ignore_replies: bool,

    /// Capacity of the playback queue
    pub queue_capacity: usize,

    /// Per-message playback timeout in seconds; None waits indefinitely
    pub playback_timeout_secs: Option<u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            voices: builtin_voices(),
            default_voice: "brian".to_string(),
            voice_overrides: HashMap::new(),
            pitch_overrides: HashMap::new(),
            randomize_voices: false,
            replacements: Vec::new(),
            max_word_count: 50,
            max_word_length: Some(16),
            blacklist: Vec::new(),
            ignore_replies: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            playback_timeout_secs: None,
        }
    }
}

impl Configuration {
    /// Append a literal replacement rule
    pub fn with_rule(
        mut self,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.replacements
            .push(ReplacementRule::literal(pattern, replacement));
        self
    }

    /// Append a regex replacement rule
    pub fn with_regex_rule(
        mut self,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.replacements
            .push(ReplacementRule::regex(pattern, replacement));
        self
    }

    /// Assign a voice to a user
    pub fn with_voice_override(
        mut self,
        user: impl Into<String>,
        voice: impl Into<String>,
    ) -> Self {
        self.voice_overrides
            .insert(user.into().to_lowercase(), voice.into());
        self
    }

    /// Set the default voice key
    pub fn with_default_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }

    /// Set the word-count cutoff
    pub fn with_word_limit(mut self, limit: i32) -> Self {
        self.max_word_count = limit;
        self
    }

    /// Set the playback queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the per-message playback timeout
    pub fn with_playback_timeout(mut self, secs: u64) -> Self {
        self.playback_timeout_secs = Some(secs);
        self
    }

    /// Look up a voice by key
    pub fn voice(&self, key: &str) -> Option<&Voice> {
        self.voices.iter().find(|v| v.key == key)
    }

    /// Per-message playback timeout, if configured
    pub fn playback_timeout(&self) -> Option<Duration> {
        self.playback_timeout_secs.map(Duration::from_secs)
    }

    /// Validate everything except replacement patterns, which are checked
    /// when the rule engine compiles them.
    pub fn validate(&self) -> Result<()> {
        if self.voices.is_empty() {
            return Err(ChatvoxError::ConfigError(
                "Voice catalog is empty".to_string(),
            ));
        }

        if self.voice(&self.default_voice).is_none() {
            return Err(ChatvoxError::ConfigError(format!(
                "Default voice '{}' is not in the catalog",
                self.default_voice
            )));
        }

        for (user, key) in &self.voice_overrides {
            if self.voice(key).is_none() {
                return Err(ChatvoxError::ConfigError(format!(
                    "Voice override for '{}' names unknown voice '{}'",
                    user, key
                )));
            }
        }

        if self.queue_capacity == 0 {
            return Err(ChatvoxError::ConfigError(
                "Queue capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Configuration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.voice("brian").is_some());
    }

    #[test]
    fn test_config_builder() {
        let config = Configuration::default()
            .with_rule("brb", "be right back")
            .with_voice_override("VoxelFoxKae", "matthew")
            .with_word_limit(20)
            .with_playback_timeout(30);

        assert_eq!(config.replacements.len(), 1);
        assert_eq!(
            config.voice_overrides.get("voxelfoxkae"),
            Some(&"matthew".to_string())
        );
        assert_eq!(config.max_word_count, 20);
        assert_eq!(config.playback_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_unknown_default_voice_rejected() {
        let config = Configuration::default().with_default_voice("hal9000");
        assert!(matches!(
            config.validate(),
            Err(ChatvoxError::ConfigError(_))
        ));
    }

    #[test]
    fn test_unknown_override_voice_rejected() {
        let config = Configuration::default().with_voice_override("kae", "hal9000");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let mut config = Configuration::default();
        config.voices.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = Configuration::default().with_queue_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rule_kind_from_json() {
        let rule: ReplacementRule =
            serde_json::from_str(r#"{"pattern": "a", "replacement": "b"}"#).unwrap();
        assert_eq!(rule.kind, RuleKind::Literal);

        let rule: ReplacementRule = serde_json::from_str(
            r#"{"pattern": "a+", "replacement": "b", "kind": "regex"}"#,
        )
        .unwrap();
        assert_eq!(rule.kind, RuleKind::Regex);
    }
}
