//! Cursor over an accepted uniform sequence
//!
//! The simulation never generates randomness itself. It reads an already
//! validated sequence through a [`UniformStream`], one value per stochastic
//! decision, and wraps back to the first value when the sequence runs out.

use super::UniformSequence;
use tracing::trace;

/// Source of uniform draws in [0, 1)
///
/// Implementations must be deterministic: the same offset over the same
/// underlying data reproduces the same draws in the same order.
pub trait UniformStream {
    /// Next value in [0, 1); never fails, wraps when exhausted
    fn next_uniform(&mut self) -> f64;

    /// Reposition the stream; offsets past the end are reduced modulo the length
    fn reset(&mut self, offset: usize);

    /// Current position, always in `[0, len)`
    fn position(&self) -> usize;

    /// Number of values in one full cycle
    fn cycle_len(&self) -> usize;
}

/// Wrapping cursor over a shared [`UniformSequence`]
///
/// Cloning a cursor is cheap and yields an independent position over the same
/// immutable data, so each replication can own its own cursor.
#[derive(Debug, Clone)]
pub struct SequenceCursor {
    sequence: UniformSequence,
    index: usize,
    draws: u64,
    wraps: u64,
}

impl SequenceCursor {
    /// Create a cursor positioned at the first value
    pub fn new(sequence: UniformSequence) -> Self {
        Self { sequence, index: 0, draws: 0, wraps: 0 }
    }

    /// Create a cursor positioned at `offset` (reduced modulo the length)
    pub fn with_offset(sequence: UniformSequence, offset: usize) -> Self {
        let mut cursor = Self::new(sequence);
        cursor.reset(offset);
        cursor
    }

    /// Total draws taken since creation or the last reset
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// How many times the cursor wrapped back to index 0 since the last reset
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    /// The underlying sequence
    pub fn sequence(&self) -> &UniformSequence {
        &self.sequence
    }
}

impl UniformStream for SequenceCursor {
    fn next_uniform(&mut self) -> f64 {
        let value = self.sequence.values()[self.index];
        self.index += 1;
        self.draws += 1;
        if self.index == self.sequence.len() {
            self.index = 0;
            self.wraps += 1;
            trace!(draws = self.draws, "Random sequence exhausted, wrapping to index 0");
        }
        value
    }

    fn reset(&mut self, offset: usize) {
        self.index = offset % self.sequence.len();
        self.draws = 0;
        self.wraps = 0;
    }

    fn position(&self) -> usize {
        self.index
    }

    fn cycle_len(&self) -> usize {
        self.sequence.len()
    }
}
