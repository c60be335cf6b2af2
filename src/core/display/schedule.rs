//! Display pacing: per-chunk durations, the cancellable chunk schedule, and the
//! per-target slot that decides which schedule may still render.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::format::DisplayChunk;

/// Reading pace for the glasses: `min(base + per_char * len, cap)` milliseconds per chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub base_ms: u64,
    pub per_char_ms: u64,
    pub cap_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            base_ms: 6000,
            per_char_ms: 60,
            cap_ms: 15000,
        }
    }
}

impl Pacing {
    /// On-screen time for a chunk of `text`.
    pub fn duration_ms(&self, text: &str) -> u64 {
        let chars = text.chars().count() as u64;
        self.base_ms
            .saturating_add(self.per_char_ms.saturating_mul(chars))
            .min(self.cap_ms)
    }

    /// Fill in `duration_ms` for every chunk.
    pub fn assign(&self, chunks: &mut [DisplayChunk]) {
        for chunk in chunks {
            chunk.duration_ms = self.duration_ms(&chunk.text);
        }
    }
}

/// Timed, ordered delivery of one answer's chunks.
///
/// `next()` yields the first chunk immediately and every later chunk once the
/// previous one has been on screen for its duration. Finite and not restartable;
/// once the cancellation token fires no further chunk is yielded.
pub struct Schedule {
    chunks: VecDeque<DisplayChunk>,
    pending_delay: Option<Duration>,
    cancel: CancellationToken,
}

impl Schedule {
    /// Build a schedule, assigning durations from `pacing`.
    pub fn new(mut chunks: Vec<DisplayChunk>, pacing: &Pacing, cancel: CancellationToken) -> Self {
        pacing.assign(&mut chunks);
        Self {
            chunks: chunks.into(),
            pending_delay: None,
            cancel,
        }
    }

    /// Chunks not yet yielded.
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }

    /// The chunks not yet yielded, durations filled in.
    pub fn pending(&self) -> impl Iterator<Item = &DisplayChunk> {
        self.chunks.iter()
    }

    /// Sum of all remaining chunk durations.
    pub fn total_duration(&self) -> Duration {
        let ms: u64 = self.chunks.iter().map(|c| c.duration_ms).sum();
        Duration::from_millis(ms)
    }

    /// Wait out the previous chunk and return the next one, or `None` when the
    /// schedule is exhausted or cancelled.
    pub async fn next(&mut self) -> Option<DisplayChunk> {
        if self.cancel.is_cancelled() {
            self.chunks.clear();
            return None;
        }
        let chunk = self.chunks.pop_front()?;
        if let Some(delay) = self.pending_delay.take()
            && !self.wait(delay).await
        {
            self.chunks.clear();
            return None;
        }
        self.pending_delay = Some(Duration::from_millis(chunk.duration_ms));
        Some(chunk)
    }

    /// Keep the last yielded chunk on screen for its duration.
    /// Returns `false` if cancelled meanwhile.
    pub async fn hold_last(&mut self) -> bool {
        match self.pending_delay.take() {
            Some(delay) => self.wait(delay).await,
            None => !self.cancel.is_cancelled(),
        }
    }

    /// Sleep for `delay` unless cancelled first. Returns `true` when the full delay elapsed.
    async fn wait(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

/// Right to render into a [`DisplaySlot`], handed out by [`DisplaySlot::begin`].
#[derive(Debug, Clone)]
pub struct Ticket {
    pub generation: u64,
    pub cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct SlotInner {
    generation: u64,
    active: Option<CancellationToken>,
}

/// The "current schedule" slot of one output target. Last `begin()` wins: it
/// cancels the previous holder, and rendering is only allowed for the current
/// generation. Callbacks run under the slot lock so renders and hand-overs
/// cannot interleave.
#[derive(Debug, Default)]
pub struct DisplaySlot {
    inner: Mutex<SlotInner>,
}

impl DisplaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take over the slot, cancelling any previous holder. `on_begin` runs under the lock.
    pub fn begin(&self, on_begin: impl FnOnce()) -> Ticket {
        let mut inner = self.lock();
        if let Some(previous) = inner.active.take() {
            previous.cancel();
        }
        inner.generation += 1;
        let cancel = CancellationToken::new();
        inner.active = Some(cancel.clone());
        on_begin();
        Ticket {
            generation: inner.generation,
            cancel,
        }
    }

    /// Whether `ticket` still owns the slot and has not been cancelled.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let inner = self.lock();
        Self::owns(&inner, ticket)
    }

    fn owns(inner: &SlotInner, ticket: &Ticket) -> bool {
        inner.generation == ticket.generation && !ticket.cancel.is_cancelled()
    }

    /// Run `render` only if `ticket` still owns the slot. Returns whether it ran.
    pub fn render_if_current(&self, ticket: &Ticket, render: impl FnOnce()) -> bool {
        let inner = self.lock();
        if !Self::owns(&inner, ticket) {
            return false;
        }
        render();
        true
    }

    /// Release the slot after the schedule ran to completion. `on_finish` runs
    /// under the lock, and only if `ticket` still owned the slot.
    pub fn finish(&self, ticket: &Ticket, on_finish: impl FnOnce()) -> bool {
        let mut inner = self.lock();
        if !Self::owns(&inner, ticket) {
            return false;
        }
        inner.active = None;
        on_finish();
        true
    }

    /// Cancel the current holder, if any. `on_cancel` runs under the lock only
    /// when something was cancelled.
    pub fn cancel(&self, on_cancel: impl FnOnce()) -> bool {
        let mut inner = self.lock();
        match inner.active.take() {
            Some(active) => {
                active.cancel();
                on_cancel();
                true
            }
            None => false,
        }
    }

    /// Whether `ticket` lost the slot to a later `begin()` (rather than being cancelled in place).
    pub fn was_superseded(&self, ticket: &Ticket) -> bool {
        self.lock().generation != ticket.generation
    }

    /// Run `f` under the lock only while no schedule holds the slot.
    pub fn when_vacant(&self, f: impl FnOnce() -> bool) -> bool {
        let inner = self.lock();
        if inner.active.is_some() {
            return false;
        }
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn chunks(texts: &[&str]) -> Vec<DisplayChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| DisplayChunk {
                index,
                total_count: texts.len(),
                text: text.to_string(),
                contains_code: false,
                duration_ms: 0,
            })
            .collect()
    }

    const FAST: Pacing = Pacing {
        base_ms: 100,
        per_char_ms: 10,
        cap_ms: 1000,
    };

    #[test]
    fn duration_grows_with_length_and_caps() {
        let pacing = Pacing::default();
        assert_eq!(pacing.duration_ms(""), 6000);
        assert_eq!(pacing.duration_ms("Short text"), 6600);
        assert_eq!(pacing.duration_ms(&"x".repeat(100)), 12000);
        assert_eq!(pacing.duration_ms(&"x".repeat(300)), 15000);
    }

    #[test]
    fn duration_counts_characters_not_bytes() {
        assert_eq!(FAST.duration_ms("héé"), 130);
    }

    #[test]
    fn assign_fills_durations() {
        let mut list = chunks(&["ab", "abcd"]);
        FAST.assign(&mut list);
        assert_eq!(list[0].duration_ms, 120);
        assert_eq!(list[1].duration_ms, 140);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_waits_previous_duration_between_chunks() {
        let mut schedule = Schedule::new(chunks(&["a", "bb", "ccc"]), &FAST, CancellationToken::new());
        assert_eq!(schedule.total_duration(), Duration::from_millis(110 + 120 + 130));
        let start = Instant::now();

        let first = schedule.next().await.unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(start.elapsed(), Duration::ZERO);

        let second = schedule.next().await.unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(start.elapsed(), Duration::from_millis(110));

        let third = schedule.next().await.unwrap();
        assert_eq!(third.index, 2);
        assert_eq!(start.elapsed(), Duration::from_millis(230));

        assert!(schedule.next().await.is_none());
        assert_eq!(start.elapsed(), Duration::from_millis(230));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_schedule_yields_nothing_more() {
        let cancel = CancellationToken::new();
        let mut schedule = Schedule::new(chunks(&["a", "b", "c"]), &FAST, cancel.clone());
        assert!(schedule.next().await.is_some());

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });
        let start = Instant::now();
        assert!(schedule.next().await.is_none());
        assert_eq!(start.elapsed(), Duration::from_millis(50));
        assert_eq!(schedule.remaining(), 0);
        assert!(schedule.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn hold_last_keeps_final_chunk_on_screen() {
        let mut schedule = Schedule::new(chunks(&["abc"]), &FAST, CancellationToken::new());
        let start = Instant::now();
        assert!(schedule.next().await.is_some());
        assert!(schedule.next().await.is_none());
        assert!(schedule.hold_last().await);
        assert_eq!(start.elapsed(), Duration::from_millis(130));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_shrinks_as_chunks_are_yielded() {
        let mut schedule = Schedule::new(chunks(&["a", "b", "c", "d"]), &FAST, CancellationToken::new());
        assert_eq!(schedule.remaining(), 4);
        assert!(schedule.pending().all(|c| c.duration_ms == 110));
        schedule.next().await.unwrap();
        let indices: Vec<usize> = schedule.pending().map(|c| c.index).collect();
        assert_eq!(indices, [1, 2, 3]);
        assert_eq!(schedule.total_duration(), Duration::from_millis(330));
    }

    #[test]
    fn begin_cancels_previous_holder() {
        let slot = DisplaySlot::new();
        let first = slot.begin(|| {});
        let second = slot.begin(|| {});
        assert!(first.cancel.is_cancelled());
        assert!(!slot.is_current(&first));
        assert!(slot.was_superseded(&first));
        assert!(slot.is_current(&second));
    }

    #[test]
    fn stale_ticket_cannot_render_or_finish() {
        let slot = DisplaySlot::new();
        let stale = slot.begin(|| {});
        let current = slot.begin(|| {});
        let mut rendered = Vec::new();
        assert!(!slot.render_if_current(&stale, || rendered.push("stale")));
        assert!(slot.render_if_current(&current, || rendered.push("current")));
        assert_eq!(rendered, ["current"]);
        assert!(!slot.finish(&stale, || panic!("stale finish")));
        let mut finished = false;
        assert!(slot.finish(&current, || finished = true));
        assert!(finished);
    }

    #[test]
    fn cancel_in_place_is_not_superseded() {
        let slot = DisplaySlot::new();
        let ticket = slot.begin(|| {});
        let mut called = false;
        assert!(slot.cancel(|| called = true));
        assert!(called);
        assert!(ticket.cancel.is_cancelled());
        assert!(!slot.is_current(&ticket));
        assert!(!slot.was_superseded(&ticket));
        assert!(!slot.cancel(|| panic!("nothing to cancel")));
    }

    #[test]
    fn when_vacant_skips_while_held() {
        let slot = DisplaySlot::new();
        assert!(slot.when_vacant(|| true));
        let ticket = slot.begin(|| {});
        assert!(!slot.when_vacant(|| panic!("slot is held")));
        slot.finish(&ticket, || {});
        assert!(slot.when_vacant(|| true));
    }
}
