//! Fixed-capacity FIFO of outbound command entries.
//!
//! ```text
//!   enqueue ──▶ [ in ] ... [ out ] ──▶ peek / commit
//! ```
//!
//! One slot is always kept empty so `in == out` means empty and
//! `next(in) == out` means full: a queue of `N` slots holds `N - 1`
//! entries. Producers only advance `in`, the owning engine only advances
//! `out`. Entries are values moved into the slot; nothing outlives it.

use crate::error::QueueFull;

pub struct CommandQueue<T, const N: usize> {
    slots: [Option<T>; N],
    idx_in: usize,
    idx_out: usize,
}

impl<T, const N: usize> CommandQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; N],
            idx_in: 0,
            idx_out: 0,
        }
    }

    const fn next(idx: usize) -> usize {
        (idx + 1) % N
    }

    /// Append `entry`. A full queue drops the new entry and leaves the
    /// existing ones untouched.
    pub fn enqueue(&mut self, entry: T) -> Result<(), QueueFull> {
        let next = Self::next(self.idx_in);
        if next == self.idx_out {
            return Err(QueueFull);
        }
        self.slots[self.idx_in] = Some(entry);
        self.idx_in = next;
        Ok(())
    }

    /// Oldest entry, left in place.
    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            self.slots[self.idx_out].as_ref()
        }
    }

    /// Release the oldest entry and return it.
    pub fn commit(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let entry = self.slots[self.idx_out].take();
        self.idx_out = Self::next(self.idx_out);
        entry
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.idx_in = 0;
        self.idx_out = 0;
    }

    pub fn len(&self) -> usize {
        (self.idx_in + N - self.idx_out) % N
    }

    pub fn is_empty(&self) -> bool {
        self.idx_in == self.idx_out
    }

    pub fn is_full(&self) -> bool {
        Self::next(self.idx_in) == self.idx_out
    }

    /// Usable capacity (`N - 1`).
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len()).filter_map(move |i| self.slots[(self.idx_out + i) % N].as_ref())
    }
}

impl<T, const N: usize> Default for CommandQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
