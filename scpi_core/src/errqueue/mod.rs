//! FIFO queues of instrument diagnostic entries.
//!
//! Two variants share the [`ErrorSink`] trait: the unbounded [`ErrorQueue`]
//! (default, simple mode) and the fixed-capacity [`BoundedErrorQueue`] for
//! long-running firmware where sustained error conditions must not grow the
//! heap. FIFO arrival order is the only ordering guarantee.

use std::borrow::Cow;
use std::collections::VecDeque;

use tracing::debug;

/// Error code of the sentinel entry inserted when a bounded queue is full.
pub const QUEUE_OVERFLOW_CODE: i16 = -350;

/// A single diagnostic entry: an instrument error code plus its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    code: i16,
    message: Cow<'static, str>,
}

impl ErrorEntry {
    /// Builds an entry from a code and a borrowed or owned message.
    pub fn new(code: i16, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The synthetic entry reported by [`ErrorSink::pop`] on an empty queue.
    pub fn no_error() -> Self {
        Self::new(0, "No error")
    }

    /// Returns the instrument error code.
    pub fn code(&self) -> i16 {
        self.code
    }

    /// Returns the error text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Renders the entry in the fixed report format `<code>,"<message>"`
    /// terminated by a newline.
    pub fn response(&self) -> String {
        format!("{},\"{}\"\n", self.code, self.message)
    }
}

/// Destination for diagnostic entries, shared by dispatch callbacks.
///
/// `pop` on an empty queue yields the synthetic `0,"No error"` entry and
/// leaves the queue untouched; it can be called repeatedly.
pub trait ErrorSink {
    /// Appends an entry at the tail.
    fn push(&mut self, entry: ErrorEntry);

    /// Removes and returns the head entry, or [`ErrorEntry::no_error`] when
    /// the queue is empty.
    fn pop(&mut self) -> ErrorEntry;

    /// Returns the number of queued entries.
    fn len(&self) -> usize;

    /// Returns `true` when no entries are queued.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all queued entries.
    fn clear(&mut self);
}

/// The default, unbounded FIFO error queue.
#[derive(Debug, Default)]
pub struct ErrorQueue {
    entries: VecDeque<ErrorEntry>,
}

impl ErrorQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorSink for ErrorQueue {
    fn push(&mut self, entry: ErrorEntry) {
        debug!(code = entry.code(), text = entry.message(), "queued error");
        self.entries.push_back(entry);
    }

    fn pop(&mut self) -> ErrorEntry {
        self.entries.pop_front().unwrap_or_else(ErrorEntry::no_error)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A fixed-capacity FIFO error queue for the production-hardened mode.
///
/// When the queue is full the newest slot is replaced by the SCPI overflow
/// sentinel `-350,"Queue overflow"` and further pushes are discarded until
/// space frees up, so the oldest diagnostics survive.
#[derive(Debug, Default)]
pub struct BoundedErrorQueue<const N: usize> {
    entries: heapless::Deque<ErrorEntry, N>,
}

impl<const N: usize> BoundedErrorQueue<N> {
    /// Creates an empty queue with capacity `N`.
    pub fn new() -> Self {
        Self {
            entries: heapless::Deque::new(),
        }
    }

    /// Returns the fixed capacity.
    pub fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> ErrorSink for BoundedErrorQueue<N> {
    fn push(&mut self, entry: ErrorEntry) {
        if self.entries.is_full() {
            if let Some(newest) = self.entries.back_mut() {
                if newest.code() != QUEUE_OVERFLOW_CODE {
                    debug!(dropped = entry.code(), "error queue overflow");
                    *newest = ErrorEntry::new(QUEUE_OVERFLOW_CODE, "Queue overflow");
                }
            }
            return;
        }
        debug!(code = entry.code(), text = entry.message(), "queued error");
        // Full case handled above, the push cannot fail.
        let _ = self.entries.push_back(entry);
    }

    fn pop(&mut self) -> ErrorEntry {
        self.entries.pop_front().unwrap_or_else(ErrorEntry::no_error)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
