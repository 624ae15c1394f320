//! Typed, in-process publish/subscribe substrate (spec.md §4.1).
//!
//! Every message type on the Bus implements [`crate::model::Topic`], which
//! binds it to exactly one topic name. Publishing clones an `Arc` per
//! subscriber and applies that subscriber's overflow policy via
//! `crossbeam-channel`'s `try_send`/`send_timeout`, the same
//! try-send-then-count-drops idiom the teacher codebase uses in
//! `audio/dispatch.rs::FrameDispatcher::push` for its single hardcoded
//! channel, generalized here to an arbitrary number of named topics and
//! subscribers.

mod dispatch;
#[cfg(test)]
mod tests;

pub use dispatch::{DropRecord, OverflowPolicy};

use crate::error::FocusFieldError;
use crate::model::Topic;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use dispatch::{ErasedSlots, SubscriberMeta, SubscriberSlot};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct TopicEntry {
    name: &'static str,
    slots: Box<dyn ErasedSlots>,
    meta: Vec<SubscriberMeta>,
}

/// The Bus itself. Cheap to clone (wraps an `Arc` internally is not needed —
/// callers share one `Bus` behind their own `Arc<Bus>` per the Runtime).
pub struct Bus {
    topics: Mutex<HashMap<TypeId, TopicEntry>>,
    next_id: AtomicU64,
    shut_down: AtomicBool,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Non-blocking publish. Delivers to every current subscriber of `T`'s
    /// topic, applying each subscriber's overflow policy. Late subscribers
    /// (those that call `subscribe` after this publish) never see this
    /// message — spec.md §4.1, "Late subscribers do not receive backlog."
    pub fn publish<T: Topic>(&self, msg: T) -> Result<(), FocusFieldError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(FocusFieldError::BusShutDown);
        }
        let mut topics = self.topics.lock().unwrap_or_else(|p| p.into_inner());
        let Some(entry) = topics.get_mut(&TypeId::of::<T>()) else {
            return Ok(());
        };
        let slots = entry
            .slots
            .as_any_mut()
            .downcast_mut::<Vec<SubscriberSlot<T>>>()
            .expect("TypeId keys the slot vector's element type");
        let payload = Arc::new(msg);
        for slot in slots.iter() {
            slot.deliver(payload.clone());
        }
        Ok(())
    }

    /// Subscribe to `T`'s topic. Messages are delivered in publish order on
    /// that topic (spec.md §4.1 invariant a); there is no ordering guarantee
    /// across topics (invariant b).
    pub fn subscribe<T: Topic>(&self, capacity: usize, policy: OverflowPolicy) -> Subscription<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = bounded(capacity.max(1));
        let dropped_total = Arc::new(AtomicU64::new(0));
        let dropped_since_report = Arc::new(AtomicU64::new(0));
        let slot = SubscriberSlot {
            id,
            sender: tx,
            receiver: rx.clone(),
            policy,
            dropped_total: dropped_total.clone(),
            dropped_since_report: dropped_since_report.clone(),
        };
        let meta = SubscriberMeta {
            topic: T::NAME,
            id,
            policy,
            dropped_total: dropped_total.clone(),
            dropped_since_report,
        };

        let mut topics = self.topics.lock().unwrap_or_else(|p| p.into_inner());
        let entry = topics.entry(TypeId::of::<T>()).or_insert_with(|| TopicEntry {
            name: T::NAME,
            slots: Box::new(Vec::<SubscriberSlot<T>>::new()),
            meta: Vec::new(),
        });
        entry
            .slots
            .as_any_mut()
            .downcast_mut::<Vec<SubscriberSlot<T>>>()
            .expect("TypeId keys the slot vector's element type")
            .push(slot);
        entry.meta.push(meta);

        Subscription { id, receiver: rx, dropped_total }
    }

    /// Signal shutdown: every outstanding `Subscription` drains whatever is
    /// already queued, then observes `Disconnected`. Subsequent `publish`
    /// calls are a no-op that returns `Err` (spec.md §4.1).
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        let mut topics = self.topics.lock().unwrap_or_else(|p| p.into_inner());
        for entry in topics.values_mut() {
            entry.slots.drop_all_senders();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Snapshot and reset the "dropped since last report" counters for
    /// every subscriber on every topic, coalescing repeated drops within a
    /// window into one record per subscriber (spec.md §4.1 "Failure"). The
    /// Health aggregator (§4.6) drains this on its own cadence and republishes
    /// non-zero records as `log.events` entries — the Bus itself never
    /// publishes onto `log.events` to avoid a self-referential publish path.
    pub fn drain_drop_events(&self) -> Vec<DropRecord> {
        let topics = self.topics.lock().unwrap_or_else(|p| p.into_inner());
        let mut out = Vec::new();
        for entry in topics.values() {
            for meta in &entry.meta {
                let count = meta.dropped_since_report.swap(0, Ordering::Relaxed);
                if count > 0 {
                    out.push(DropRecord {
                        topic: entry.name,
                        subscriber_id: meta.id,
                        count,
                        policy: meta.policy,
                    });
                }
            }
        }
        out
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

/// A receive handle for one subscriber on one topic.
pub struct Subscription<T> {
    id: u64,
    receiver: Receiver<Arc<T>>,
    dropped_total: Arc<AtomicU64>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }

    /// Block until a message arrives or the Bus shuts down.
    pub fn recv(&self) -> Option<Arc<T>> {
        self.receiver.recv().ok()
    }

    /// Block up to `timeout`. `None` on timeout *or* shutdown — callers that
    /// need a heartbeat (spec.md §5) treat both the same: emit a tick with
    /// the last known input.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Arc<T>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<Arc<T>> {
        self.receiver.try_recv().ok()
    }

    /// Drain everything currently queued without blocking, keeping only the
    /// most recent message — the pattern the Lock machine and Beamformer use
    /// to look at "the most recent heatmap" rather than processing a stale
    /// backlog one at a time (spec.md §5).
    pub fn try_recv_latest(&self) -> Option<Arc<T>> {
        let mut last = None;
        while let Some(msg) = self.try_recv() {
            last = Some(msg);
        }
        last
    }
}
