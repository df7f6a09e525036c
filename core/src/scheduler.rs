//! Timed event scheduling for encounter scripts
//!
//! The scheduler decouples "what happens" from "when": boss logic declares a
//! sequence of future actions by id and the per-tick update advances and
//! drains them, without any script polling wall-clock time itself.
//!
//! # Ordering
//!
//! Due events drain in remaining-delay order, ascending; ties break by
//! insertion order (stable). `pop_due` must be called in a loop each tick so
//! that multiple events due in the same tick all fire in that tick, in order.

use std::time::Duration;

use delve_types::EventId;

/// A pending scheduled event.
///
/// Remaining time is kept signed: an `advance` that overshoots several events
/// leaves them with distinct negative remainders, so the drain order still
/// reflects when each one actually came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimedEvent {
    id: EventId,
    /// Remaining delay in microseconds; due once <= 0.
    remaining_us: i64,
    /// Insertion sequence, for stable tie-breaking.
    seq: u64,
}

impl TimedEvent {
    /// Ordering key for the drain: delay ascending, then insertion order.
    fn sort_key(&self) -> (i64, u64) {
        (self.remaining_us, self.seq)
    }
}

/// Priority-ordered list of pending (event, delay) pairs for one encounter.
///
/// Scheduling and cancellation are total operations: unknown ids are simply
/// absent and cancelling them is a no-op. Multiple entries with the same id
/// are allowed (re-arming) unless the caller cancels first.
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    pending: Vec<TimedEvent>,
    next_seq: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending event that comes due after `delay`.
    pub fn schedule(&mut self, id: EventId, delay: Duration) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(TimedEvent {
            id,
            remaining_us: delay.as_micros().min(i64::MAX as u128) as i64,
            seq,
        });
    }

    /// Remove all pending entries matching `id`. No-op if absent.
    pub fn cancel(&mut self, id: EventId) {
        self.pending.retain(|e| e.id != id);
    }

    /// Remove every pending entry. Atomic with respect to the tick: nothing
    /// scheduled before the call can fire afterwards.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Decrement all pending delays by `elapsed`. Entries reaching zero or
    /// below become due; their remainders are not clamped.
    pub fn advance(&mut self, elapsed: Duration) {
        let elapsed_us = elapsed.as_micros().min(i64::MAX as u128) as i64;
        for event in &mut self.pending {
            event.remaining_us = event.remaining_us.saturating_sub(elapsed_us);
        }
    }

    /// Pop one due event, lowest remaining delay first, stable on ties.
    /// Returns None once all currently-due events have drained.
    pub fn pop_due(&mut self) -> Option<EventId> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.remaining_us <= 0)
            .min_by_key(|(_, e)| e.sort_key())
            .map(|(idx, _)| idx)?;
        Some(self.pending.swap_remove(idx).id)
    }

    /// Whether any entry (due or not) exists for `id`.
    pub fn is_scheduled(&self, id: EventId) -> bool {
        self.pending.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
