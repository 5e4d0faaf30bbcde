//! Per-user FIFO turn queue.
//!
//! Transports may deliver events for one user concurrently (webhooks in
//! particular). The queue keeps one worker task per active user that
//! dispatches that user's messages strictly in arrival order. A worker
//! retires after sitting idle for the configured time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::error::ChatError;
use crate::transport::{ChatTransport, IncomingMessage};

type Workers = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<IncomingMessage>>>>;

#[derive(Clone)]
pub struct TurnQueue {
    dispatcher: Arc<Dispatcher>,
    transport: Arc<dyn ChatTransport>,
    idle: Duration,
    workers: Workers,
}

impl TurnQueue {
    pub fn new(dispatcher: Arc<Dispatcher>, transport: Arc<dyn ChatTransport>, idle: Duration) -> Self {
        Self {
            dispatcher,
            transport,
            idle,
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Queue a message behind any earlier ones from the same sender.
    pub fn enqueue(&self, message: IncomingMessage) -> Result<(), ChatError> {
        let mut workers = self
            .workers
            .lock()
            .map_err(|e| ChatError::SessionLock(format!("turn queue poisoned: {}", e)))?;

        let message = match workers.get(&message.sender) {
            Some(tx) => match tx.send(message) {
                Ok(()) => return Ok(()),
                // Worker is gone; start a fresh one below.
                Err(mpsc::error::SendError(message)) => message,
            },
            None => message,
        };

        let sender = message.sender.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(message)
            .map_err(|_| ChatError::Internal("turn queue channel closed".to_string()))?;
        workers.insert(sender.clone(), tx);
        debug!(user_id = %sender, "Starting turn worker");

        tokio::spawn(run_worker(
            sender,
            rx,
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.transport),
            Arc::clone(&self.workers),
            self.idle,
        ));
        Ok(())
    }

    /// Number of users with a live worker.
    pub fn active_workers(&self) -> usize {
        self.workers.lock().map(|w| w.len()).unwrap_or(0)
    }
}

async fn run_worker(
    sender: String,
    mut rx: mpsc::UnboundedReceiver<IncomingMessage>,
    dispatcher: Arc<Dispatcher>,
    transport: Arc<dyn ChatTransport>,
    workers: Workers,
    idle: Duration,
) {
    loop {
        let next = match tokio::time::timeout(idle, rx.recv()).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(_) => match retire_or_take(&sender, &mut rx, &workers) {
                Some(message) => message,
                None => break,
            },
        };

        if let Err(e) = dispatcher.dispatch(&next, transport.as_ref()).await {
            warn!(user_id = %sender, kind = e.kind(), error = %e, "Reply delivery failed");
        }
    }
    debug!(user_id = %sender, "Turn worker retired");
}

/// Under the map lock, either pick up a message that raced the idle timeout
/// or deregister this worker. Senders only push while holding the same
/// lock, so nothing can be lost in between.
fn retire_or_take(
    sender: &str,
    rx: &mut mpsc::UnboundedReceiver<IncomingMessage>,
    workers: &Workers,
) -> Option<IncomingMessage> {
    let mut workers = match workers.lock() {
        Ok(w) => w,
        Err(poisoned) => poisoned.into_inner(),
    };
    match rx.try_recv() {
        Ok(message) => Some(message),
        Err(_) => {
            workers.remove(sender);
            None
        }
    }
}
