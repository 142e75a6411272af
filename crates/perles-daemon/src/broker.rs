// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pub/Sub Broker (§4.5, §4.5.1): generic fan-out over `ControlPlaneEvent`s.
//! Each subscriber gets a bounded channel; a slow subscriber is dropped
//! silently and counted, never allowed to stall the publisher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use perles_core::{ControlPlaneEvent, EventFilter};
use tokio::sync::mpsc;

/// How long a critical (non-droppable) publish waits on a full subscriber
/// channel before giving up and counting it as a drop (§4.5.1: "a
/// deliberately slow-draining subscriber cannot stall the publisher
/// indefinitely").
const CRITICAL_SEND_GRACE: Duration = Duration::from_millis(50);

/// A live subscription: receives filtered events until dropped or cancelled.
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::Receiver<ControlPlaneEvent>,
}

struct Subscriber {
    id: u64,
    filter: EventFilter,
    sender: mpsc::Sender<ControlPlaneEvent>,
}

/// Fan-out broker. Cloneable; internal state is shared.
#[derive(Clone)]
pub struct Broker {
    capacity: usize,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    next_id: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl Broker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push(Subscriber { id, filter, sender });
        Subscription { id, receiver }
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().retain(|s| s.id != id);
    }

    /// Total events dropped across all subscribers since broker creation.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Droppable event types (`ProcessOutput`, `ProcessTokenUsage`, see
    /// `EventType::is_droppable`) use `try_send` and drop immediately on a
    /// full channel. Critical types get a short bounded wait first so a
    /// momentarily busy subscriber still receives them, then fall back to
    /// the same drop-and-count path (§4.5.1). Either way the publisher
    /// never blocks indefinitely on a subscriber.
    pub async fn publish(&self, event: ControlPlaneEvent) {
        let critical = !event.event_type.is_droppable();
        let targets: Vec<(u64, mpsc::Sender<ControlPlaneEvent>)> = {
            let subscribers = self.subscribers.lock();
            subscribers
                .iter()
                .filter(|s| s.filter.matches(&event))
                .map(|s| (s.id, s.sender.clone()))
                .collect()
        };

        let mut dead = Vec::new();
        for (id, sender) in targets {
            let outcome = if critical {
                match tokio::time::timeout(CRITICAL_SEND_GRACE, sender.send(event.clone())).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(_)) => Err(true),
                    Err(_) => Err(false),
                }
            } else {
                match sender.try_send(event.clone()) {
                    Ok(()) => Ok(()),
                    Err(mpsc::error::TrySendError::Full(_)) => Err(false),
                    Err(mpsc::error::TrySendError::Closed(_)) => Err(true),
                }
            };
            match outcome {
                Ok(()) => {}
                Err(closed) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    if closed {
                        dead.push(id);
                    }
                }
            }
        }
        if !dead.is_empty() {
            self.subscribers.lock().retain(|s| !dead.contains(&s.id));
        }
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
