//! Per-sample timestamp derivation

use std::collections::HashMap;

use crate::types::RecordKind;

/// Clock may run this far ahead of a timeline before the timeline jumps forward.
pub const REBASE_THRESHOLD_MS: u64 = 1_000;

/// Timestamps of `count` samples starting at `base_ms`, `interval_ms` apart.
///
/// Each timestamp is computed from the base, never by accumulating the previous one.
pub fn batch_timestamps(base_ms: u64, interval_ms: u64, count: usize) -> impl Iterator<Item = u64> {
    (0..count as u64).map(move |i| base_ms.saturating_add(i.saturating_mul(interval_ms)))
}

/// Continuous timeline for batches that arrive without a device timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeline {
    next_ms: Option<u64>,
}

impl Timeline {
    /// Base timestamp for the next batch of `count` samples.
    ///
    /// Continues right after the previous batch unless `now_ms` is more than
    /// [`REBASE_THRESHOLD_MS`] ahead, in which case the timeline restarts at `now_ms`.
    pub fn next_base(&mut self, now_ms: u64, interval_ms: u64, count: usize) -> u64 {
        let base = match self.next_ms {
            Some(next) if now_ms <= next.saturating_add(REBASE_THRESHOLD_MS) => next,
            _ => now_ms,
        };
        let span = (count as u64).saturating_mul(interval_ms);
        self.next_ms = Some(base.saturating_add(span));
        base
    }
}

/// One [`Timeline`] per record kind.
#[derive(Debug, Clone, Default)]
pub struct Timelines {
    lines: HashMap<RecordKind, Timeline>,
}

impl Timelines {
    pub fn next_base(&mut self, kind: RecordKind, now_ms: u64, interval_ms: u64, count: usize) -> u64 {
        self.lines.entry(kind).or_default().next_base(now_ms, interval_ms, count)
    }

    pub fn reset(&mut self) {
        self.lines.clear();
    }
}
