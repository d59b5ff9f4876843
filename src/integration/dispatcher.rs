//! Dispatcher: the intake between the chat source and the playback queue

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::messages::ChatMessage;
use crate::playback::JobSender;
use crate::rules::RuleEngine;

/// Receives chat events, runs them through the rule engine and enqueues
/// surviving jobs. Never blocks on playback: a full queue drops the message.
pub struct Dispatcher {
    engine: RwLock<Arc<RuleEngine>>,
    jobs: JobSender,
}

impl Dispatcher {
    pub fn new(engine: RuleEngine, jobs: JobSender) -> Self {
        Self {
            engine: RwLock::new(Arc::new(engine)),
            jobs,
        }
    }

    /// Intake for the chat collaborator. Safe to call from any thread.
    pub fn on_message(&self, msg: ChatMessage) {
        let engine = self.engine();

        if let Some(job) = engine.process(&msg) {
            // enqueue logs the drop itself when the queue is full
            self.jobs.enqueue(job);
        } else {
            debug!(user = %msg.user, "Message suppressed");
        }
    }

    /// The currently active rule engine
    pub fn engine(&self) -> Arc<RuleEngine> {
        self.engine.read().clone()
    }

    /// Swap in a new rule engine. Atomic: concurrent `on_message` calls see
    /// either the old or the new configuration in full, never a mix.
    pub fn reload(&self, engine: RuleEngine) {
        *self.engine.write() = Arc::new(engine);
        info!("Configuration reloaded");
    }
}
