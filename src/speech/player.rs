//! Media-player subprocess playback
//!
//! Each job is handed to a headless player process (VLC by default) that
//! streams the audio handle's URI and exits when done. Voice rate and the
//! per-user pitch shift are applied with the player's own filters.

use std::process::{Child, Command, Stdio};

use tracing::debug;

use crate::messages::SpeechJob;
use crate::speech::{AudioHandle, PlaybackHandle, Player};
use crate::{ChatvoxError, Result};

/// Player binary used when none is configured
pub const DEFAULT_PLAYER_COMMAND: &str = "vlc";

/// `Player` implementation that shells out to a media player
#[derive(Clone, Debug)]
pub struct MediaPlayer {
    command: String,
}

impl MediaPlayer {
    pub fn new() -> Self {
        Self {
            command: DEFAULT_PLAYER_COMMAND.to_string(),
        }
    }

    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for MediaPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for MediaPlayer {
    fn start(&self, job: &SpeechJob, handle: &AudioHandle) -> Result<Box<dyn PlaybackHandle>> {
        let child = Command::new(&self.command)
            .arg("-I")
            .arg("dummy")
            .arg("--dummy-quiet")
            .arg("--rate")
            .arg(job.voice.rate.to_string())
            .arg("--audio-filter")
            .arg("scaletempo_pitch")
            .arg("--pitch-shift")
            .arg(job.pitch_shift.to_string())
            .arg(&handle.uri)
            .arg("vlc://quit")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ChatvoxError::PlayerUnavailable(format!(
                    "Failed to launch '{}': {}",
                    self.command, e
                ))
            })?;

        debug!(pid = child.id(), uri = %handle.uri, "Player process started");

        Ok(Box::new(ProcessPlayback { child }))
    }
}

/// A running player process
struct ProcessPlayback {
    child: Child,
}

impl PlaybackHandle for ProcessPlayback {
    fn is_playing(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn stop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
        }
        // Reap so a stopped player never lingers as a zombie
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Voice;
    use crate::messages::ChatMessage;

    fn job() -> SpeechJob {
        SpeechJob::new(
            Voice::new("brian", "Brian", 1.1),
            0.0,
            "hello".to_string(),
            ChatMessage::new("kae", "hello"),
        )
    }

    #[test]
    fn test_missing_binary_is_player_unavailable() {
        let player = MediaPlayer::with_command("chatvox-test-no-such-player");
        let err = player
            .start(&job(), &AudioHandle::new("file:///dev/null"))
            .err()
            .unwrap();

        assert!(matches!(err, ChatvoxError::PlayerUnavailable(_)));
        assert!(!err.is_recoverable());
    }
}
