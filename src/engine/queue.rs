//! Bounded FIFO event queues.
//!
//! Two backings share the [`EventQueue`] interface:
//!
//! - [`RingQueue`]: a fixed array ring buffer owned by the engine. Only the
//!   engine's owner can push.
//! - [`SharedQueue`]: a bounded tokio channel. Any task holding an
//!   [`EventSender`] can push concurrently; the engine is the only consumer.
//!
//! Both discard on overflow instead of blocking the producer.

use crate::core::Event;
use crate::engine::error::FsmError;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

/// Queue capacity used by the default backings.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Bounded FIFO consumed by the engine's drain loop.
pub trait EventQueue<E: Event> {
    /// Append at the tail, or return `QueueFull` and drop the event.
    fn push(&mut self, event: E) -> Result<(), FsmError>;

    /// Remove the head, if any.
    fn pop(&mut self) -> Option<E>;

    /// Number of events currently pending.
    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    /// Drop every pending event.
    fn clear(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

fn queue_full<E: Event>(capacity: usize, event: E) -> FsmError {
    warn!(
        event = event.name(),
        capacity, "event queue full, event discarded"
    );
    FsmError::QueueFull {
        capacity,
        event: event.name().to_string(),
    }
}

/// Circular buffer of `N` slots.
///
/// Head and tail wrap modulo `N`; `len` is always in `[0, N]`.
pub struct RingQueue<E: Event, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    slots: [Option<E>; N],
    head: usize,
    tail: usize,
    len: usize,
}

impl<E: Event, const N: usize> RingQueue<E, N> {
    pub fn new() -> Self {
        Self {
            slots: [None; N],
            head: 0,
            tail: 0,
            len: 0,
        }
    }
}

impl<E: Event, const N: usize> Default for RingQueue<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event, const N: usize> EventQueue<E> for RingQueue<E, N> {
    fn push(&mut self, event: E) -> Result<(), FsmError> {
        if self.len >= N {
            return Err(queue_full(N, event));
        }
        self.slots[self.tail] = Some(event);
        self.tail = (self.tail + 1) % N;
        self.len += 1;
        Ok(())
    }

    fn pop(&mut self) -> Option<E> {
        if self.len == 0 {
            return None;
        }
        let event = self.slots[self.head].take();
        self.head = (self.head + 1) % N;
        self.len -= 1;
        event
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        N
    }

    fn clear(&mut self) {
        self.slots = [None; N];
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// Producer handle for a [`SharedQueue`].
///
/// Cheap to clone; safe to use from any task. Never blocks.
#[derive(Clone, Debug)]
pub struct EventSender<E: Event> {
    tx: mpsc::Sender<E>,
}

impl<E: Event> EventSender<E> {
    /// Enqueue without waiting. A full queue drops the event.
    pub fn try_push(&self, event: E) -> Result<(), FsmError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) | Err(TrySendError::Closed(event)) => {
                Err(queue_full(self.tx.max_capacity(), event))
            }
        }
    }
}

/// Bounded channel-backed queue with many producers and one consumer.
pub struct SharedQueue<E: Event> {
    tx: mpsc::Sender<E>,
    rx: mpsc::Receiver<E>,
}

impl<E: Event> SharedQueue<E> {
    /// Create a queue holding at most `capacity` events.
    ///
    /// A zero capacity cannot back a queue and is reported as `QueueInit`.
    pub fn new(capacity: usize) -> Result<Self, FsmError> {
        if capacity == 0 {
            return Err(FsmError::QueueInit {
                reason: "capacity must be at least 1".to_string(),
            });
        }
        let (tx, rx) = mpsc::channel(capacity);
        Ok(Self { tx, rx })
    }

    /// Handle for producers running on other tasks.
    pub fn sender(&self) -> EventSender<E> {
        EventSender {
            tx: self.tx.clone(),
        }
    }
}

impl<E: Event> EventQueue<E> for SharedQueue<E> {
    fn push(&mut self, event: E) -> Result<(), FsmError> {
        self.sender().try_push(event)
    }

    fn pop(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
    enum Tick {
        N(u8),
    }

    impl Event for Tick {
        fn name(&self) -> &str {
            "Tick"
        }
    }

    #[test]
    fn ring_is_fifo_across_wraparound() {
        let mut q: RingQueue<Tick, 3> = RingQueue::new();
        q.push(Tick::N(1)).unwrap();
        q.push(Tick::N(2)).unwrap();
        assert_eq!(q.pop(), Some(Tick::N(1)));
        q.push(Tick::N(3)).unwrap();
        q.push(Tick::N(4)).unwrap();

        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(Tick::N(2)));
        assert_eq!(q.pop(), Some(Tick::N(3)));
        assert_eq!(q.pop(), Some(Tick::N(4)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn ring_discards_when_full() {
        let mut q: RingQueue<Tick, 2> = RingQueue::new();
        q.push(Tick::N(1)).unwrap();
        q.push(Tick::N(2)).unwrap();

        let err = q.push(Tick::N(3)).unwrap_err();
        assert!(matches!(err, FsmError::QueueFull { capacity: 2, .. }));
        assert!(q.is_full());
        assert_eq!(q.pop(), Some(Tick::N(1)));
    }

    #[test]
    fn ring_clear_resets_indices() {
        let mut q: RingQueue<Tick, 2> = RingQueue::new();
        q.push(Tick::N(1)).unwrap();
        q.pop();
        q.push(Tick::N(2)).unwrap();
        q.clear();

        assert!(q.is_empty());
        q.push(Tick::N(5)).unwrap();
        assert_eq!(q.pop(), Some(Tick::N(5)));
    }

    #[test]
    fn zero_sized_ring_rejects_everything() {
        let mut q: RingQueue<Tick, 0> = RingQueue::new();
        assert!(q.push(Tick::N(1)).is_err());
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn shared_queue_requires_capacity() {
        let result = SharedQueue::<Tick>::new(0);
        assert!(matches!(result, Err(FsmError::QueueInit { .. })));
    }

    #[test]
    fn shared_queue_tracks_len_and_discards() {
        let mut q = SharedQueue::new(2).unwrap();
        let producer = q.sender();

        producer.try_push(Tick::N(1)).unwrap();
        q.push(Tick::N(2)).unwrap();
        assert_eq!(q.len(), 2);
        assert!(producer.try_push(Tick::N(3)).is_err());

        assert_eq!(q.pop(), Some(Tick::N(1)));
        assert_eq!(q.len(), 1);
        q.clear();
        assert!(q.is_empty());
    }

    #[test]
    fn shared_queue_accepts_concurrent_producers() {
        let mut q = SharedQueue::new(DEFAULT_QUEUE_CAPACITY).unwrap();
        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let producer = q.sender();
                std::thread::spawn(move || {
                    for j in 0..4u8 {
                        producer.try_push(Tick::N(i * 4 + j)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(q.len(), 16);
        let mut seen = Vec::new();
        while let Some(Tick::N(n)) = q.pop() {
            seen.push(n);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
    }
}
