//! Speech capabilities: synthesis and playback
//!
//! This module provides:
//! - The `Synthesizer` and `Player` seams the playback worker drives
//! - A remote URL-building synthesizer (StreamElements-style endpoint)
//! - A media-player subprocess implementation of `Player`

pub mod player;
pub mod remote;

pub use player::MediaPlayer;
pub use remote::RemoteSynthesizer;

use crate::config::Voice;
use crate::messages::SpeechJob;
use crate::Result;

/// Opaque reference to synthesized audio, ready for a player to consume.
///
/// For the remote synthesizer this is a URL the media player streams from;
/// other synthesizers may point at a temp file or an in-memory sink.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioHandle {
    pub uri: String,
}

impl AudioHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Turns speakable text into audio the player can reach.
pub trait Synthesizer: Send + Sync {
    /// May fail with `SynthesisError` or `UnsupportedVoice`; failures are
    /// per-job and never stop the pipeline.
    fn synthesize(&self, text: &str, voice: &Voice) -> Result<AudioHandle>;
}

/// Plays synthesized audio. Starting returns a handle the worker polls for
/// completion, so a stuck player can be stopped from outside.
pub trait Player: Send + Sync {
    /// May fail with `PlayerUnavailable` or `PlaybackError`.
    fn start(&self, job: &SpeechJob, handle: &AudioHandle) -> Result<Box<dyn PlaybackHandle>>;
}

/// One in-flight playback.
pub trait PlaybackHandle: Send {
    /// True while audio is still coming out
    fn is_playing(&mut self) -> bool;

    /// Stop playback early. Must be safe to call more than once.
    fn stop(&mut self);
}
