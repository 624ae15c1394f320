//! Per-subscriber delivery mechanics: overflow policies, drop accounting,
//! and the small amount of `Any` downcasting needed to keep one `Bus`
//! instance hosting many distinct topic types.
//!
//! The try-send-then-count-drops shape mirrors
//! `audio/dispatch.rs::FrameDispatcher::push` in the teacher codebase
//! almost exactly: `try_send`, match `TrySendError::Full` to bump a drop
//! counter, match `TrySendError::Disconnected` to give up silently.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a full subscriber queue does with a new message (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop the incoming message, keep what's queued. Default.
    DropNewest,
    /// Evict the oldest queued message to make room for the incoming one.
    DropOldest,
    /// Wait briefly for room, then drop and log if it never appears.
    Block,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::DropNewest
    }
}

/// Bounded spin duration for `OverflowPolicy::Block`, per spec.md §4.1
/// ("bounded spin then drop with log").
const BLOCK_SPIN: Duration = Duration::from_millis(5);

pub(super) struct SubscriberSlot<T> {
    pub(super) id: u64,
    pub(super) sender: Sender<Arc<T>>,
    /// Clone of the subscriber's own receive end, kept only so `DropOldest`
    /// can evict the head of the queue before re-sending. The subscriber's
    /// `Subscription` holds the other clone and is the sole consumer in
    /// practice (spec.md §5 "Resource policy": one writer, one reader per
    /// queue) — the dispatcher only ever reads from this clone to make room.
    pub(super) receiver: Receiver<Arc<T>>,
    pub(super) policy: OverflowPolicy,
    pub(super) dropped_total: Arc<AtomicU64>,
    pub(super) dropped_since_report: Arc<AtomicU64>,
}

impl<T> SubscriberSlot<T> {
    fn record_drop(&self) {
        self.dropped_total.fetch_add(1, Ordering::Relaxed);
        self.dropped_since_report.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn deliver(&self, msg: Arc<T>) {
        match self.policy {
            OverflowPolicy::DropNewest => {
                if let Err(TrySendError::Full(_)) = self.sender.try_send(msg) {
                    self.record_drop();
                }
                // Disconnected: subscriber is gone, nothing to count or log.
            }
            OverflowPolicy::DropOldest => {
                // Single-producer-per-topic assumption (spec.md §5
                // "Resource policy"): evicting then re-sending is not
                // atomic across producers, but FocusField components each
                // own exactly one output topic.
                match self.sender.try_send(msg) {
                    Ok(()) => {}
                    Err(TrySendError::Full(msg)) => {
                        let _ = self.receiver.try_recv();
                        self.record_drop();
                        if self.sender.try_send(msg).is_err() {
                            self.record_drop();
                        }
                    }
                    Err(TrySendError::Disconnected(_)) => {}
                }
            }
            OverflowPolicy::Block => match self.sender.send_timeout(msg, BLOCK_SPIN) {
                Ok(()) => {}
                Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => self.record_drop(),
                Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {}
            },
        }
    }
}

/// Type-erasure-free summary of one subscriber, used for drop reporting
/// without downcasting (spec.md §4.1 "Failure": `(topic, subscriber_id,
/// count since last report, policy)`).
pub(super) struct SubscriberMeta {
    pub(super) topic: &'static str,
    pub(super) id: u64,
    pub(super) policy: OverflowPolicy,
    pub(super) dropped_total: Arc<AtomicU64>,
    pub(super) dropped_since_report: Arc<AtomicU64>,
}

/// A coalesced drop report for one subscriber since the last drain
/// (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct DropRecord {
    pub topic: &'static str,
    pub subscriber_id: u64,
    pub count: u64,
    pub policy: OverflowPolicy,
}

/// Lets `Bus` hold `Vec<SubscriberSlot<T>>` for many distinct `T` behind one
/// `HashMap<TypeId, Box<dyn ErasedSlots>>`, downcasting back to the concrete
/// vector when `T` is known at the call site (`publish`/`subscribe`), and
/// clearing every slot's sender generically at `shutdown` without knowing
/// `T` at all.
pub(super) trait ErasedSlots: Any + Send {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn drop_all_senders(&mut self);
}

impl<T: Send + Sync + 'static> ErasedSlots for Vec<SubscriberSlot<T>> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn drop_all_senders(&mut self) {
        self.clear();
    }
}
