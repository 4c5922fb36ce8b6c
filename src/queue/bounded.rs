//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Fixed-capacity FIFO queue of owned message payloads.

use super::error::QueueError;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time;

/// A bounded multi-producer, multi-consumer queue of message payloads.
///
/// The queue holds at most `capacity` payloads in FIFO order. Both
/// [`enqueue`](MessageQueue::enqueue) and [`dequeue`](MessageQueue::dequeue)
/// take an explicit retry budget: when the queue is full (or empty) the call
/// waits up to `retry_wait` per attempt for the state to change, for at most
/// `retries` attempts, then fails. Waiters are woken as soon as a slot (or a
/// payload) becomes available, so the budget is an upper bound, not a fixed
/// delay.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use tracelink::queue::MessageQueue;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = MessageQueue::new(16);
/// queue
///     .enqueue(b"payload".to_vec(), Duration::from_millis(500), 2)
///     .await?;
/// let payload = queue.dequeue(Duration::from_millis(20), 5).await?;
/// assert_eq!(payload, b"payload");
/// # Ok(())
/// # }
/// ```
pub struct MessageQueue {
    ring: Mutex<Ring>,
    not_full: Notify,
    not_empty: Notify,
    capacity: usize,
}

impl MessageQueue {
    /// Creates a queue holding at most `capacity` payloads.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be greater than zero");
        Self {
            ring: Mutex::new(Ring::new(capacity)),
            not_full: Notify::new(),
            not_empty: Notify::new(),
            capacity,
        }
    }

    /// Returns the maximum number of payloads the queue can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of payloads currently queued.
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    /// Returns `true` if the queue holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }

    /// Returns `true` if the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.ring.lock().is_full()
    }

    /// Appends a payload, waiting for space within the retry budget.
    ///
    /// Makes up to `retries` attempts (at least one); after each failed
    /// attempt it waits up to `retry_wait` for a consumer to free a slot.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] if the queue stayed full for the whole
    /// budget.
    pub async fn enqueue(
        &self,
        payload: Vec<u8>,
        retry_wait: Duration,
        retries: u32,
    ) -> Result<(), QueueError> {
        let mut payload = payload;
        for _ in 0..retries.max(1) {
            match self.try_enqueue(payload) {
                Ok(()) => {
                    self.not_empty.notify_one();
                    return Ok(());
                }
                Err(rejected) => payload = rejected,
            }
            let _ = time::timeout(retry_wait, self.not_full.notified()).await;
        }
        Err(QueueError::Full {
            capacity: self.capacity,
        })
    }

    /// Removes the oldest payload, waiting for one within the retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Empty`] if the queue stayed empty for the whole
    /// budget.
    pub async fn dequeue(&self, retry_wait: Duration, retries: u32) -> Result<Vec<u8>, QueueError> {
        for _ in 0..retries.max(1) {
            if let Some(payload) = self.try_dequeue() {
                self.not_full.notify_one();
                return Ok(payload);
            }
            let _ = time::timeout(retry_wait, self.not_empty.notified()).await;
        }
        Err(QueueError::Empty)
    }

    /// Discards every queued payload and wakes blocked producers.
    pub fn purge(&self) {
        self.ring.lock().clear();
        self.not_full.notify_waiters();
    }

    fn try_enqueue(&self, payload: Vec<u8>) -> Result<(), Vec<u8>> {
        let mut ring = self.ring.lock();
        if ring.is_full() {
            return Err(payload);
        }
        ring.push(payload);
        Ok(())
    }

    fn try_dequeue(&self) -> Option<Vec<u8>> {
        self.ring.lock().pop()
    }
}

impl std::fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

/// Ring buffer with one spare slot to distinguish full from empty.
///
/// `head == tail` means empty; `head` one step behind `tail` (modulo the
/// storage size of `capacity + 1`) means full.
struct Ring {
    slots: Vec<Option<Vec<u8>>>,
    head: usize,
    tail: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity + 1, || None);
        Self {
            slots,
            head: 0,
            tail: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    fn is_full(&self) -> bool {
        (self.head + 1) % self.slots.len() == self.tail
    }

    fn len(&self) -> usize {
        (self.head + self.slots.len() - self.tail) % self.slots.len()
    }

    fn push(&mut self, payload: Vec<u8>) {
        debug_assert!(!self.is_full());
        self.slots[self.head] = Some(payload);
        self.head = (self.head + 1) % self.slots.len();
    }

    fn pop(&mut self) -> Option<Vec<u8>> {
        if self.is_empty() {
            return None;
        }
        let payload = self.slots[self.tail].take();
        self.tail = (self.tail + 1) % self.slots.len();
        payload
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
    }
}
