//! The sample staging buffer (spec.md §4.2).
//!
//! A linear, non-circular buffer of interleaved 48 kHz float samples that
//! reconciles the caller's push-based writes with the codec's pull-based
//! frame model. Grounded structurally on `quark-zju-sndcat`'s `VecDeque<f32>`
//! staging buffer in `output/opus.rs`, but kept as a plain contiguous
//! `Vec` with `start`/`end` cursors per spec.md's explicit non-circular,
//! shift-on-full discipline (a `VecDeque` already does its own internal
//! wraparound, which would hide the shift boundary the spec requires to be
//! observable).

/// Sample-frames of look-ahead the staging buffer must be able to hold
/// before a shift is forced.
pub const MAX_LOOKAHEAD: usize = 96_000;
/// Extra headroom beyond `MAX_LOOKAHEAD`, absorbing one write burst.
pub const EXTRA: usize = 24_000;

/// Non-circular interleaved-float sample buffer with look-ahead.
pub struct StagingBuffer {
    channels: usize,
    /// Interleaved samples, `channels` per frame.
    data: Vec<f32>,
    /// Sample-frame index of the first unconsumed frame.
    start: usize,
    /// Sample-frame index one past the last written frame.
    end: usize,
    capacity: usize,
}

impl StagingBuffer {
    #[must_use]
    pub fn new(channels: usize) -> Self {
        let capacity = MAX_LOOKAHEAD + EXTRA;
        Self { channels, data: vec![0.0; capacity * channels], start: 0, end: 0, capacity }
    }

    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Number of sample-frames available to consume.
    #[must_use]
    pub const fn available(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// A read-only interleaved view of the unconsumed region.
    #[must_use]
    pub fn view(&self) -> &[f32] {
        &self.data[self.start * self.channels..self.end * self.channels]
    }

    /// Appends `frames` interleaved sample-frames at `end`.
    ///
    /// # Panics
    ///
    /// Panics if there is not enough remaining capacity; callers must
    /// shift first (see [`StagingBuffer::shift_if_full`]).
    pub fn append(&mut self, frames: &[f32]) {
        assert_eq!(frames.len() % self.channels, 0, "frames must be a whole number of sample-frames");
        let n = frames.len() / self.channels;
        assert!(self.end + n <= self.capacity, "staging buffer append would overflow capacity");
        let offset = self.end * self.channels;
        self.data[offset..offset + frames.len()].copy_from_slice(frames);
        self.end += n;
    }

    /// Advances `start` by `k` sample-frames, consuming them.
    ///
    /// # Panics
    ///
    /// Panics if `k` exceeds [`StagingBuffer::available`].
    pub fn consume(&mut self, k: usize) {
        assert!(k <= self.available(), "cannot consume more frames than are available");
        self.start += k;
    }

    /// Moves `[start, end)` down to index 0 if the buffer has reached
    /// capacity, restoring room to append. A no-op otherwise.
    ///
    /// Post-condition: `end < capacity`.
    pub fn shift_if_full(&mut self) {
        if self.end < self.capacity {
            return;
        }
        let len = (self.end - self.start) * self.channels;
        let src_offset = self.start * self.channels;
        self.data.copy_within(src_offset..src_offset + len, 0);
        self.end -= self.start;
        self.start = 0;
        debug_assert!(self.end < self.capacity);
    }

    /// Remaining sample-frame room before a shift becomes mandatory.
    #[must_use]
    pub const fn remaining_capacity(&self) -> usize {
        self.capacity - self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_consume_tracks_available() {
        let mut buf = StagingBuffer::new(2);
        buf.append(&[1.0, 2.0, 3.0, 4.0]); // 2 frames, stereo
        assert_eq!(buf.available(), 2);
        buf.consume(1);
        assert_eq!(buf.available(), 1);
        assert_eq!(buf.view(), &[3.0, 4.0]);
    }

    #[test]
    fn shift_is_a_no_op_before_capacity() {
        let mut buf = StagingBuffer::new(1);
        buf.append(&[1.0, 2.0, 3.0]);
        buf.consume(2);
        buf.shift_if_full();
        assert_eq!(buf.available(), 1);
    }

    #[test]
    fn shift_compacts_to_index_zero_once_full() {
        let mut buf = StagingBuffer::new(1);
        let cap = buf.capacity();
        buf.append(&vec![0.5; cap]);
        buf.consume(cap - 1);
        assert_eq!(buf.available(), 1);
        buf.shift_if_full();
        assert!(buf.available() < buf.capacity());
    }
}
