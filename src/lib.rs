pub mod config;
pub mod integration;
pub mod messages;
pub mod playback;
pub mod rules;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ChatvoxError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Rule error: {0}")]
    RuleError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Unsupported voice: {0}")]
    UnsupportedVoice(String),

    #[error("Player unavailable: {0}")]
    PlayerUnavailable(String),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("Playback timed out after {0:?}")]
    PlaybackTimeout(std::time::Duration),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl ChatvoxError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Bad configuration has to be fixed before the pipeline starts
            ChatvoxError::ConfigError(_) => false,
            ChatvoxError::RuleError(_) => false,
            // Per-job errors: the worker logs and moves on
            ChatvoxError::SynthesisError(_) => true,
            ChatvoxError::UnsupportedVoice(_) => true,
            ChatvoxError::PlaybackError(_) => true,
            ChatvoxError::PlaybackTimeout(_) => true,
            // A missing player affects every job that follows
            ChatvoxError::PlayerUnavailable(_) => false,
            ChatvoxError::ChannelError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatvoxError>;
