//! Unbounded FIFO queue with a blocking pop.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Thread-safe unbounded FIFO queue for pending calls.
///
/// Any number of producers may [`push`](Self::push) concurrently; a single
/// consumer drains it with [`pop_blocking`](Self::pop_blocking). Once
/// [`close`](Self::close)d, the queue rejects new items but still hands out
/// the ones already queued.
///
/// # Example
///
/// ```
/// use rest_dispatch::dispatch::CallQueue;
///
/// let queue = CallQueue::new();
/// queue.push(1).unwrap();
/// queue.push(2).unwrap();
/// queue.close();
///
/// assert_eq!(queue.pop_blocking(), Some(1));
/// assert_eq!(queue.pop_blocking(), Some(2));
/// assert_eq!(queue.pop_blocking(), None);
/// assert_eq!(queue.push(3), Err(3));
/// ```
#[derive(Debug)]
pub struct CallQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> CallQueue<T> {
    /// Creates an empty, open queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends an item and wakes one waiting consumer.
    ///
    /// Never blocks beyond the queue's critical section.
    ///
    /// # Errors
    ///
    /// Returns the item back if the queue has been closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(item);
        }
        state.items.push_back(item);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Removes the oldest item, blocking while the queue is empty.
    ///
    /// Returns `None` only once the queue is closed and fully drained.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Removes the oldest item without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Closes the queue and wakes every waiting consumer.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns the number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Returns true if no items are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}

impl<T> Default for CallQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
