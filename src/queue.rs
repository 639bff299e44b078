//! Outstation message queue.
//!
//! A fixed-capacity FIFO of ASDUs awaiting transmission. Capacity is set
//! at creation and never grows; the overflow policy decides whether a
//! full queue evicts its oldest entry (fresh telemetry beats stale) or
//! rejects the new one. The shared wrapper adds the wakeup signal for
//! parked connection tasks; critical sections cover enqueue/dequeue only,
//! encoding always happens outside the lock.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::debug;

use crate::error::{Iec104Error, Result};
use crate::types::Asdu;

/// Behavior when enqueueing into a full queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the oldest queued entry to admit the newest (default)
    #[default]
    DropOldest,
    /// Reject the new entry with [`Iec104Error::QueueFull`]
    Reject,
}

/// One queued ASDU with its enqueue time.
#[derive(Debug, Clone)]
pub(crate) struct QueueEntry {
    pub asdu: Asdu,
    pub enqueued_at: Instant,
}

impl QueueEntry {
    pub(crate) fn new(asdu: Asdu) -> Self {
        Self {
            asdu,
            enqueued_at: Instant::now(),
        }
    }
}

/// Fixed-capacity FIFO of pending ASDUs.
#[derive(Debug)]
pub struct AsduQueue {
    entries: VecDeque<QueueEntry>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl AsduQueue {
    /// Create a queue with the given capacity (at least 1) and policy.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            policy,
        }
    }

    /// Enqueue an ASDU, applying the overflow policy when full.
    pub fn enqueue(&mut self, asdu: Asdu) -> Result<()> {
        if self.entries.len() >= self.capacity {
            match self.policy {
                OverflowPolicy::DropOldest => {
                    if let Some(dropped) = self.entries.pop_front() {
                        debug!(
                            age_ms = dropped.enqueued_at.elapsed().as_millis() as u64,
                            "queue full, dropping oldest entry"
                        );
                    }
                }
                OverflowPolicy::Reject => return Err(Iec104Error::QueueFull),
            }
        }
        self.entries.push_back(QueueEntry::new(asdu));
        Ok(())
    }

    /// Take the oldest pending ASDU.
    pub fn dequeue(&mut self) -> Option<Asdu> {
        self.entries.pop_front().map(|e| e.asdu)
    }

    pub(crate) fn dequeue_entry(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Restore entries to the queue front, oldest first, keeping their
    /// original enqueue times. Overflow drops from the front (oldest).
    pub(crate) fn requeue_front(&mut self, entries: Vec<QueueEntry>) {
        for entry in entries.into_iter().rev() {
            self.entries.push_front(entry);
        }
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Number of pending ASDUs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The fixed capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// An [`AsduQueue`] shared between the enqueue API and connection tasks.
#[derive(Debug)]
pub(crate) struct SharedQueue {
    inner: Mutex<AsduQueue>,
    notify: Notify,
}

impl SharedQueue {
    pub(crate) fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            inner: Mutex::new(AsduQueue::new(capacity, policy)),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AsduQueue> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn enqueue(&self, asdu: Asdu) -> Result<()> {
        self.lock().enqueue(asdu)?;
        self.notify.notify_waiters();
        Ok(())
    }

    pub(crate) fn dequeue_entry(&self) -> Option<QueueEntry> {
        self.lock().dequeue_entry()
    }

    pub(crate) fn requeue_front(&self, entries: Vec<QueueEntry>) {
        if entries.is_empty() {
            return;
        }
        self.lock().requeue_front(entries);
        self.notify.notify_waiters();
    }

    /// Wakeup future; register it before checking emptiness to avoid a
    /// missed notification.
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
