//! Ordered, bounded playback of speech jobs
//!
//! A bounded FIFO queue fed by any number of producers and drained by exactly
//! one worker, so no two messages are ever spoken at the same time.

pub mod queue;
pub mod worker;

pub use queue::{JobSender, PlaybackQueue};
pub use worker::{PlaybackEvent, PlaybackWorker};
