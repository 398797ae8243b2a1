//! Fixed-capacity byte FIFO.

use std::collections::VecDeque;

/// Bounded FIFO of outbound bytes.
///
/// A push onto a full queue drops the new byte. Real keyboards have no way
/// to push back on the host, so the caller is expected to retry later or
/// accept the loss.
#[derive(Debug, Clone)]
pub struct ByteQueue<const N: usize> {
    bytes: VecDeque<u8>,
}

impl<const N: usize> ByteQueue<N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: VecDeque::with_capacity(N),
        }
    }

    /// Append a byte. Returns `false` (and drops the byte) if the queue is full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.bytes.len() >= N {
            return false;
        }
        self.bytes.push_back(byte);
        true
    }

    /// Remove and return the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.bytes.len() >= N
    }

    /// Free slots left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        N - self.bytes.len()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Iterate oldest to newest without consuming.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.bytes.iter().copied()
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
