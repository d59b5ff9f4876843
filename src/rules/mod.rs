//! The rule engine: filters, voice assignment and text transformation
//!
//! Turns a raw chat message into a speakable job, or suppresses it. All
//! configuration is validated when the engine is built; processing a message
//! can never fail.

pub mod transform;

pub use transform::{apply_rules, compile_rules, limit_words, CompiledRule};

use tracing::{debug, info};

use crate::config::{Configuration, Voice};
use crate::messages::{ChatMessage, SpeechJob};
use crate::{ChatvoxError, Result};

/// A validated configuration plus its compiled replacement rules
pub struct RuleEngine {
    config: Configuration,
    rules: Vec<CompiledRule>,
    default_voice: Voice,
}

impl RuleEngine {
    /// Build an engine, validating the configuration and compiling every
    /// replacement pattern. This is the only place configuration errors can
    /// surface; a constructed engine processes any message without failing.
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        let rules = transform::compile_rules(&config.replacements)?;
        let default_voice = config
            .voice(&config.default_voice)
            .cloned()
            .ok_or_else(|| {
                ChatvoxError::ConfigError(format!(
                    "Default voice '{}' is not in the catalog",
                    config.default_voice
                ))
            })?;

        Ok(Self {
            config,
            rules,
            default_voice,
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Get the voice for a user: override map first, else the default voice
    /// (or a stable per-user catalog pick when `randomize_voices` is set).
    /// Total over any username.
    pub fn resolve_voice(&self, user: &str) -> &Voice {
        let key = user.to_lowercase();

        if let Some(voice) = self
            .config
            .voice_overrides
            .get(&key)
            .and_then(|k| self.config.voice(k))
        {
            return voice;
        }

        if self.config.randomize_voices && !self.config.voices.is_empty() {
            let idx = (user_seed(&key) % self.config.voices.len() as u64) as usize;
            return &self.config.voices[idx];
        }

        &self.default_voice
    }

    /// Get the pitch shift for a user: override map first, else a
    /// deterministic value in [-1.0, 0.8] derived from the username.
    pub fn resolve_pitch(&self, user: &str) -> f32 {
        let key = user.to_lowercase();

        if let Some(shift) = self.config.pitch_overrides.get(&key) {
            return *shift;
        }

        // Same choice range as picking from -10..10 step 2, then /10
        let step = (user_seed(&key) % 10) as i64;
        (step * 2 - 10) as f32 / 10.0
    }

    /// Run a chat message through the full rule set.
    ///
    /// Returns the speech job to enqueue, or None when the message is
    /// suppressed: blacklisted user, command, bare link, an over-long word,
    /// or text that transformed away to nothing.
    pub fn process(&self, msg: &ChatMessage) -> Option<SpeechJob> {
        let user_key = msg.user.to_lowercase();

        if self.config.blacklist.iter().any(|u| *u == user_key) {
            info!(user = %msg.user, "Skipping blacklisted user");
            return None;
        }

        let text = msg.text.trim();
        if text.starts_with('!') {
            info!(user = %msg.user, "Ignoring command");
            return None;
        }
        if text.starts_with("http") {
            info!(user = %msg.user, "Ignoring URL");
            return None;
        }

        let text = if self.config.ignore_replies {
            strip_reply(text)
        } else {
            text
        };

        let replaced = transform::apply_rules(text, &self.rules);

        if let Some(max_len) = self.config.max_word_length {
            if replaced
                .split_whitespace()
                .any(|w| w.chars().count() >= max_len)
            {
                info!(user = %msg.user, "Hit max word length");
                return None;
            }
        }

        let spoken = transform::limit_words(&replaced, self.config.max_word_count);
        if spoken.is_empty() {
            debug!(user = %msg.user, "Message transformed away to nothing");
            return None;
        }

        let voice = self.resolve_voice(&msg.user).clone();
        let pitch_shift = self.resolve_pitch(&msg.user);

        Some(SpeechJob::new(voice, pitch_shift, spoken, msg.clone()))
    }
}

/// Drop a leading "@mention " so replies read naturally. A message that is
/// only a mention becomes empty and gets suppressed downstream.
fn strip_reply(text: &str) -> &str {
    if text.starts_with('@') {
        text.split_once(' ').map(|(_, rest)| rest).unwrap_or("")
    } else {
        text
    }
}

/// Stable FNV-1a fold of a lowercased username, so voice and pitch picks
/// survive restarts.
fn user_seed(user: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in user.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    hash
}
