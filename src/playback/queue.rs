//! The bounded job queue between chat ingestion and the playback worker

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

use crate::messages::SpeechJob;

/// Bounded FIFO of pending speech jobs.
///
/// Producers hold clonable [`JobSender`]s; the single consumer side is
/// surrendered wholesale with [`into_receiver`](Self::into_receiver), which is
/// what guarantees at most one worker ever drains it.
pub struct PlaybackQueue {
    job_tx: Sender<SpeechJob>,
    job_rx: Receiver<SpeechJob>,
    capacity: usize,
}

impl PlaybackQueue {
    pub fn new(capacity: usize) -> Self {
        let (job_tx, job_rx) = bounded(capacity);
        Self {
            job_tx,
            job_rx,
            capacity,
        }
    }

    /// Get a producer handle. Safe to clone across threads.
    pub fn sender(&self) -> JobSender {
        JobSender {
            tx: self.job_tx.clone(),
            capacity: self.capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.job_rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.job_rx.is_empty()
    }

    /// Consume the queue, yielding the single consumer side. The queue's own
    /// sender is dropped here, so once every handed-out [`JobSender`] goes
    /// away the consumer sees disconnection and can shut down.
    pub fn into_receiver(self) -> Receiver<SpeechJob> {
        self.job_rx
    }
}

/// Producer handle for the playback queue
#[derive(Clone)]
pub struct JobSender {
    tx: Sender<SpeechJob>,
    capacity: usize,
}

impl JobSender {
    /// Append a job to the tail of the queue.
    ///
    /// Returns false when the queue is at capacity (the job is dropped,
    /// favoring real-time chat over a growing audio backlog) or when the
    /// worker is gone. Never blocks.
    pub fn enqueue(&self, job: SpeechJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                debug!(user = %job.source.user, "Playback queue full, dropping message");
                false
            }
            Err(TrySendError::Disconnected(job)) => {
                debug!(user = %job.source.user, "Playback worker gone, dropping message");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
