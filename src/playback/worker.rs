//! The single playback worker
//!
//! Drains the queue one job at a time: synthesize, start the player, wait for
//! completion, advance. A failing job is logged and skipped; the loop itself
//! only ends when every producer is gone.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{error, info, warn};

use crate::messages::SpeechJob;
use crate::playback::queue::PlaybackQueue;
use crate::speech::{Player, Synthesizer};
use crate::{ChatvoxError, Result};

/// How often the worker checks a running playback for completion
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Consecutive per-job failures before the log severity is raised
const FAILURE_ESCALATION_THRESHOLD: u32 = 3;

/// Buffered observability events; stale ones are dropped, never blocking
const EVENT_BUFFER: usize = 256;

/// Event emitted by the playback worker
#[derive(Clone, Debug)]
pub enum PlaybackEvent {
    /// A job moved from the queue into playback
    Started { user: String, text: String },

    /// Playback finished normally
    Finished { user: String, text: String },

    /// Synthesis or playback failed; the worker moved on
    Failed {
        user: String,
        text: String,
        error: String,
    },

    /// The worker loop has ended
    Shutdown,
}

/// Owns the queue's consumer side and the two capabilities.
///
/// Spawning consumes the worker (and with it the queue), so a second
/// concurrent consumer cannot exist.
pub struct PlaybackWorker {
    queue: PlaybackQueue,
    synthesizer: Arc<dyn Synthesizer>,
    player: Arc<dyn Player>,
    timeout: Option<Duration>,
    event_tx: Sender<PlaybackEvent>,
    event_rx: Receiver<PlaybackEvent>,
}

impl PlaybackWorker {
    pub fn new(
        queue: PlaybackQueue,
        synthesizer: Arc<dyn Synthesizer>,
        player: Arc<dyn Player>,
    ) -> Self {
        let (event_tx, event_rx) = bounded(EVENT_BUFFER);
        Self {
            queue,
            synthesizer,
            player,
            timeout: None,
            event_tx,
            event_rx,
        }
    }

    /// Cancel any single playback that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get a receiver for worker events
    pub fn event_receiver(&self) -> Receiver<PlaybackEvent> {
        self.event_rx.clone()
    }

    /// Start the worker thread. Returns its JoinHandle; the thread exits once
    /// every [`JobSender`](crate::playback::JobSender) has been dropped and
    /// the queue is drained.
    pub fn start(self) -> thread::JoinHandle<()> {
        let Self {
            queue,
            synthesizer,
            player,
            timeout,
            event_tx,
            ..
        } = self;
        let job_rx = queue.into_receiver();

        thread::spawn(move || {
            info!("Playback worker starting");
            let mut consecutive_failures = 0u32;

            while let Ok(job) = job_rx.recv() {
                let _ = event_tx.try_send(PlaybackEvent::Started {
                    user: job.source.user.clone(),
                    text: job.text.clone(),
                });

                match play_job(&*synthesizer, &*player, &job, timeout) {
                    Ok(()) => {
                        consecutive_failures = 0;
                        info!(
                            voice = %job.voice.name,
                            user = %job.source.user,
                            text = %job.text,
                            "Spoke message"
                        );
                        let _ = event_tx.try_send(PlaybackEvent::Finished {
                            user: job.source.user.clone(),
                            text: job.text.clone(),
                        });
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        if !e.is_recoverable()
                            || consecutive_failures >= FAILURE_ESCALATION_THRESHOLD
                        {
                            error!(
                                user = %job.source.user,
                                failures = consecutive_failures,
                                error = %e,
                                "Playback failing"
                            );
                        } else {
                            warn!(
                                user = %job.source.user,
                                error = %e,
                                "Playback failed, skipping message"
                            );
                        }
                        let _ = event_tx.try_send(PlaybackEvent::Failed {
                            user: job.source.user.clone(),
                            text: job.text.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            let _ = event_tx.try_send(PlaybackEvent::Shutdown);
            info!("Playback worker stopped");
        })
    }
}

/// Synthesize one job and wait for its playback to complete.
fn play_job(
    synthesizer: &dyn Synthesizer,
    player: &dyn Player,
    job: &SpeechJob,
    timeout: Option<Duration>,
) -> Result<()> {
    let handle = synthesizer.synthesize(&job.text, &job.voice)?;
    let mut playback = player.start(job, &handle)?;

    let started = Instant::now();
    while playback.is_playing() {
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                playback.stop();
                return Err(ChatvoxError::PlaybackTimeout(limit));
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Voice;
    use crate::messages::ChatMessage;
    use crate::speech::{AudioHandle, PlaybackHandle};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    fn job(text: &str) -> SpeechJob {
        SpeechJob::new(
            Voice::new("brian", "Brian", 1.1),
            0.0,
            text.to_string(),
            ChatMessage::new("kae", text),
        )
    }

    struct UrlSynth;

    impl Synthesizer for UrlSynth {
        fn synthesize(&self, text: &str, _voice: &Voice) -> Result<AudioHandle> {
            Ok(AudioHandle::new(format!("test://{}", text)))
        }
    }

    struct FailingSynth;

    impl Synthesizer for FailingSynth {
        fn synthesize(&self, text: &str, _voice: &Voice) -> Result<AudioHandle> {
            Err(ChatvoxError::SynthesisError(format!("no audio for {}", text)))
        }
    }

    /// Plays for a fixed number of polls, recording whether it was stopped
    struct TimedPlayer {
        polls: u32,
        stopped: Arc<AtomicBool>,
    }

    struct TimedPlayback {
        remaining: u32,
        stopped: Arc<AtomicBool>,
    }

    impl Player for TimedPlayer {
        fn start(&self, _job: &SpeechJob, _handle: &AudioHandle) -> Result<Box<dyn PlaybackHandle>> {
            Ok(Box::new(TimedPlayback {
                remaining: self.polls,
                stopped: Arc::clone(&self.stopped),
            }))
        }
    }

    impl PlaybackHandle for TimedPlayback {
        fn is_playing(&mut self) -> bool {
            if self.remaining == 0 {
                return false;
            }
            self.remaining -= 1;
            true
        }

        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
            self.remaining = 0;
        }
    }

    #[test]
    fn test_play_job_waits_for_completion() {
        let stopped = Arc::new(AtomicBool::new(false));
        let player = TimedPlayer {
            polls: 3,
            stopped: Arc::clone(&stopped),
        };

        play_job(&UrlSynth, &player, &job("hello"), None).unwrap();
        assert!(!stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_play_job_timeout_stops_playback() {
        let stopped = Arc::new(AtomicBool::new(false));
        let player = TimedPlayer {
            polls: u32::MAX,
            stopped: Arc::clone(&stopped),
        };

        let err = play_job(
            &UrlSynth,
            &player,
            &job("endless"),
            Some(Duration::from_millis(50)),
        )
        .unwrap_err();

        assert!(matches!(err, ChatvoxError::PlaybackTimeout(_)));
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_play_job_propagates_synthesis_error() {
        let stopped = Arc::new(AtomicBool::new(false));
        let player = TimedPlayer { polls: 0, stopped };

        let err = play_job(&FailingSynth, &player, &job("hello"), None).unwrap_err();
        assert!(matches!(err, ChatvoxError::SynthesisError(_)));
    }

    struct BrokenPlayer;

    impl Player for BrokenPlayer {
        fn start(&self, _job: &SpeechJob, _handle: &AudioHandle) -> Result<Box<dyn PlaybackHandle>> {
            Err(ChatvoxError::PlaybackError("output device lost".to_string()))
        }
    }

    #[test]
    fn test_play_job_propagates_player_error() {
        let err = play_job(&UrlSynth, &BrokenPlayer, &job("hello"), None).unwrap_err();
        assert!(matches!(err, ChatvoxError::PlaybackError(_)));
        assert!(err.is_recoverable());
    }

    /// Player that counts how many jobs it was asked to start
    struct CountingPlayer {
        started: Arc<AtomicU32>,
    }

    impl Player for CountingPlayer {
        fn start(&self, _job: &SpeechJob, _handle: &AudioHandle) -> Result<Box<dyn PlaybackHandle>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(TimedPlayback {
                remaining: 0,
                stopped: Arc::new(AtomicBool::new(false)),
            }))
        }
    }

    #[test]
    fn test_worker_drains_queue_and_shuts_down() {
        let queue = PlaybackQueue::new(8);
        let sender = queue.sender();
        let started = Arc::new(AtomicU32::new(0));

        let worker = PlaybackWorker::new(
            queue,
            Arc::new(UrlSynth),
            Arc::new(CountingPlayer {
                started: Arc::clone(&started),
            }),
        );
        let events = worker.event_receiver();
        let handle = worker.start();

        for text in ["one", "two", "three"] {
            assert!(sender.enqueue(job(text)));
        }
        drop(sender);

        handle.join().unwrap();
        assert_eq!(started.load(Ordering::SeqCst), 3);

        let seen: Vec<PlaybackEvent> = events.try_iter().collect();
        assert!(matches!(seen.last(), Some(PlaybackEvent::Shutdown)));
    }
}
