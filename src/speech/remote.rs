//! Remote speech synthesis via a URL-based endpoint
//!
//! The endpoint renders speech for a `voice` + `text` query string and the
//! media player streams the result, so "synthesis" here is building the URL.

use url::Url;

use crate::config::Voice;
use crate::speech::{AudioHandle, Synthesizer};
use crate::{ChatvoxError, Result};

/// Speech endpoint used when none is configured
pub const DEFAULT_SPEECH_ENDPOINT: &str = "https://api.streamelements.com/kappa/v2/speech";

/// Synthesizer backed by a remote speech endpoint
#[derive(Clone, Debug)]
pub struct RemoteSynthesizer {
    endpoint: String,
}

impl RemoteSynthesizer {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_SPEECH_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for RemoteSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer for RemoteSynthesizer {
    fn synthesize(&self, text: &str, voice: &Voice) -> Result<AudioHandle> {
        if voice.name.is_empty() {
            return Err(ChatvoxError::UnsupportedVoice(voice.key.clone()));
        }

        let url = Url::parse_with_params(
            &self.endpoint,
            &[("voice", voice.name.as_str()), ("text", text)],
        )
        .map_err(|e| {
            ChatvoxError::SynthesisError(format!("Bad speech endpoint '{}': {}", self.endpoint, e))
        })?;

        Ok(AudioHandle::new(url))
    }
}
