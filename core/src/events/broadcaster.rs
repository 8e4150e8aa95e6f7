use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use super::sink::EventSinkTx;
use super::types::ExecutionEvent;

/// Fans execution events out to connected observers.
///
/// The observer set is channel-owned: each observer holds a broadcast
/// receiver, and `emit` ignores send errors, so a closed or lagging
/// observer is silently skipped and never affects other observers or the
/// run that emitted the event.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<ExecutionEvent>,
    connected: Arc<AtomicUsize>,
    sink: Option<EventSinkTx>,
}

/// One connected observer; dropping it unregisters from the counter.
pub struct Observer {
    rx: broadcast::Receiver<ExecutionEvent>,
    connected: Arc<AtomicUsize>,
}

impl Observer {
    pub async fn recv(&mut self) -> Result<ExecutionEvent, broadcast::error::RecvError> {
        self.rx.recv().await
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.connected.fetch_sub(1, Ordering::Relaxed);
    }
}

impl EventBroadcaster {
    pub fn new(capacity: usize, sink: Option<EventSinkTx>) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            connected: Arc::new(AtomicUsize::new(0)),
            sink,
        }
    }

    pub fn subscribe(&self) -> Observer {
        self.connected.fetch_add(1, Ordering::Relaxed);
        Observer {
            rx: self.tx.subscribe(),
            connected: self.connected.clone(),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.connected.load(Ordering::Relaxed)
    }

    /// Best-effort fan-out; also mirrors the event to the JSONL sink when
    /// one is configured.
    pub async fn emit(&self, event: ExecutionEvent) {
        if let Some(sink) = &self.sink {
            if let Ok(line) = serde_json::to_string(&event) {
                sink.send_line(line).await;
            }
        }
        // No observers is fine; the error carries the event back, drop it.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(256, None)
    }
}
