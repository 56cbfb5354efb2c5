//! A blocking FIFO handoff queue.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// An unbounded FIFO queue shared between producer and consumer threads.
///
/// `send` never blocks. `receive` parks the calling thread until a value is available. Each value is handed to
/// exactly one receiver, so several consumers draining the same queue compete for entries.
pub struct BlockingQueue<T> {
    data: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        BlockingQueue {
            data: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    // VecDeque push/pop cannot leave the buffer half-written, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` to the back of the queue and wakes one waiting receiver.
    pub fn send(&self, item: T) {
        {
            let mut queue = self.lock();
            queue.push_back(item);
        }
        self.not_empty.notify_one();
    }

    /// Removes and returns the front item, blocking until one is available.
    pub fn receive(&self) -> T {
        let mut queue = self.lock();
        loop {
            // re-checked after every wake, spurious or not
            if let Some(item) = queue.pop_front() {
                return item;
            }
            queue = self
                .not_empty
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes and returns the front item, or `None` if the queue is empty.
    pub fn try_receive(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Like [`receive`](Self::receive), but gives up after `timeout`.
    pub fn receive_timeout(&self, timeout: Duration) -> Option<T> {
        let (mut queue, _) = self
            .not_empty
            .wait_timeout_while(self.lock(), timeout, |queue| queue.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        queue.pop_front()
    }

    /// Number of items waiting to be received.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no items are waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
