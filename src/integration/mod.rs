//! Wiring for the end-to-end pipeline
//!
//! Connects the components: chat intake -> rule engine -> playback queue ->
//! playback worker -> synth/play capabilities.

pub mod dispatcher;

pub use dispatcher::Dispatcher;

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use tracing::info;

use crate::config::Configuration;
use crate::messages::ChatMessage;
use crate::playback::{PlaybackEvent, PlaybackQueue, PlaybackWorker};
use crate::rules::RuleEngine;
use crate::speech::{Player, Synthesizer};
use crate::{ChatvoxError, Result};

/// A running chat-to-speech pipeline.
///
/// Construction validates the configuration and spawns the single playback
/// worker; fails fast on configuration errors so a broken setup never starts.
pub struct Pipeline {
    dispatcher: Arc<Dispatcher>,
    events: Receiver<PlaybackEvent>,
    worker: JoinHandle<()>,
}

impl Pipeline {
    pub fn start(
        config: Configuration,
        synthesizer: Arc<dyn Synthesizer>,
        player: Arc<dyn Player>,
    ) -> Result<Self> {
        let timeout = config.playback_timeout();
        let capacity = config.queue_capacity;

        let engine = RuleEngine::new(config)?;
        let queue = PlaybackQueue::new(capacity);
        let jobs = queue.sender();

        let worker = PlaybackWorker::new(queue, synthesizer, player).with_timeout(timeout);
        let events = worker.event_receiver();
        let worker = worker.start();

        info!(capacity, "Pipeline started");

        Ok(Self {
            dispatcher: Arc::new(Dispatcher::new(engine, jobs)),
            events,
            worker,
        })
    }

    /// Intake for chat events
    pub fn on_message(&self, msg: ChatMessage) {
        self.dispatcher.on_message(msg);
    }

    /// Shared dispatcher handle, e.g. for a chat source running on its own
    /// thread or for hot reloads
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Get a receiver for playback worker events
    pub fn events(&self) -> Receiver<PlaybackEvent> {
        self.events.clone()
    }

    /// Drop the intake, let the worker drain what is queued, and wait for it
    /// to stop. Dispatcher handles obtained from [`dispatcher`](Self::dispatcher)
    /// must be dropped first or the worker keeps waiting for more jobs.
    pub fn shutdown(self) -> Result<()> {
        drop(self.dispatcher);
        self.worker
            .join()
            .map_err(|_| ChatvoxError::ChannelError("Playback worker panicked".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Voice;
    use crate::messages::SpeechJob;
    use crate::speech::{AudioHandle, PlaybackHandle};

    struct UrlSynth;

    impl Synthesizer for UrlSynth {
        fn synthesize(&self, text: &str, _voice: &Voice) -> crate::Result<AudioHandle> {
            Ok(AudioHandle::new(format!("test://{}", text)))
        }
    }

    struct InstantPlayer;

    struct DonePlayback;

    impl Player for InstantPlayer {
        fn start(
            &self,
            _job: &SpeechJob,
            _handle: &AudioHandle,
        ) -> crate::Result<Box<dyn PlaybackHandle>> {
            Ok(Box::new(DonePlayback))
        }
    }

    impl PlaybackHandle for DonePlayback {
        fn is_playing(&mut self) -> bool {
            false
        }

        fn stop(&mut self) {}
    }

    #[test]
    fn test_bad_config_never_starts() {
        let config = Configuration::default().with_regex_rule("(broken", "x");
        let result = Pipeline::start(config, Arc::new(UrlSynth), Arc::new(InstantPlayer));
        assert!(matches!(result, Err(ChatvoxError::RuleError(_))));
    }

    #[test]
    fn test_pipeline_speaks_and_shuts_down() {
        let pipeline =
            Pipeline::start(Configuration::default(), Arc::new(UrlSynth), Arc::new(InstantPlayer))
                .unwrap();
        let events = pipeline.events();

        pipeline.on_message(ChatMessage::new("kae", "hello chat"));
        pipeline.shutdown().unwrap();

        let seen: Vec<PlaybackEvent> = events.try_iter().collect();
        assert!(seen
            .iter()
            .any(|e| matches!(e, PlaybackEvent::Finished { text, .. } if text == "hello chat")));
        assert!(matches!(seen.last(), Some(PlaybackEvent::Shutdown)));
    }
}
