//! Per-user display session: owns the current-schedule slot, the display state
//! machine and the last answer (for "repeat that").

pub mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::core::config::Config;
use crate::core::display::{Display, DisplaySlot, Pacing, Schedule, Ticket, render_chunk};
use crate::core::format::{self, DisplayChunk, FormatError};

pub use state::{Event, SessionState, Transition};

const TRANSITION_CHANNEL_SIZE: usize = 16;

/// Presentation settings for one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub max_chunk_length: usize,
    pub pacing: Pacing,
    /// Idle time before the display cools down.
    pub idle_timeout: Duration,
    /// Echo final transcripts as "You said: ..." while nothing is presented.
    pub show_live_transcription: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_chunk_length: 150,
            pacing: Pacing::default(),
            idle_timeout: Duration::from_secs(30),
            show_live_transcription: true,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_chunk_length: config.max_chunk_length,
            pacing: config.pacing,
            idle_timeout: config.idle_timeout,
            show_live_transcription: config.show_live_transcription,
        }
    }
}

/// How a presentation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationOutcome {
    /// Every chunk was shown and the last one stayed up for its duration.
    Completed,
    /// A newer presentation or status took over the display.
    Superseded,
    /// Stopped via [`Session::cancel`] or [`Session::end`].
    Cancelled,
}

/// Handle to a running presentation.
pub struct PresentationHandle {
    join: JoinHandle<PresentationOutcome>,
}

impl PresentationHandle {
    /// Wait for the presentation to finish.
    pub async fn wait(self) -> PresentationOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Presentation task failed: {}", e);
                PresentationOutcome::Cancelled
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One output target (a user's glasses). The most recent `present_*` call owns
/// the display; earlier presentations are cancelled before it renders.
pub struct Session {
    id: String,
    display: Arc<dyn Display>,
    options: SessionOptions,
    slot: DisplaySlot,
    state: Mutex<SessionState>,
    transitions: broadcast::Sender<Transition>,
    last_answer: Mutex<Option<String>>,
    last_activity: Mutex<Instant>,
}

impl Session {
    pub fn new(id: impl Into<String>, display: Arc<dyn Display>, options: SessionOptions) -> Arc<Self> {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_SIZE);
        Arc::new(Self {
            id: id.into(),
            display,
            options,
            slot: DisplaySlot::new(),
            state: Mutex::new(SessionState::Idle),
            transitions,
            last_answer: Mutex::new(None),
            last_activity: Mutex::new(Instant::now()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// Receive every state transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }

    /// Apply `event`; returns whether the state changed.
    fn fire(&self, event: Event) -> bool {
        let mut state = lock(&self.state);
        let Some(next) = state.on(event) else {
            return false;
        };
        let transition = Transition {
            from: *state,
            to: next,
        };
        *state = next;
        log::debug!("session {}: {:?} -> {:?}", self.id, transition.from, transition.to);
        let _ = self.transitions.send(transition);
        true
    }

    fn touch(&self) {
        *lock(&self.last_activity) = Instant::now();
    }

    /// Format `raw` and present it, replacing whatever is being shown.
    ///
    /// If formatting fails the raw answer is shown as a single chunk, so the user
    /// always sees something.
    pub fn present_answer(self: &Arc<Self>, raw: &str) -> PresentationHandle {
        let prepared = format::prepare(raw, self.options.max_chunk_length);
        self.present_prepared(raw, prepared)
    }

    fn present_prepared(
        self: &Arc<Self>,
        raw: &str,
        prepared: Result<Vec<DisplayChunk>, FormatError>,
    ) -> PresentationHandle {
        let chunks = match prepared {
            Ok(chunks) => chunks,
            Err(e) => {
                log::warn!("session {}: formatting failed ({}), showing raw answer", self.id, e);
                format::unprocessed(raw)
            }
        };
        if !raw.trim().is_empty() {
            *lock(&self.last_answer) = Some(raw.to_string());
        }
        self.present_chunks(chunks)
    }

    /// Present already segmented chunks, cancelling any earlier presentation.
    pub fn present_chunks(self: &Arc<Self>, chunks: Vec<DisplayChunk>) -> PresentationHandle {
        self.touch();
        let ticket = self.slot.begin(|| {
            self.fire(Event::Activity);
            self.fire(Event::PresentStarted);
        });
        log::info!(
            "session {}: presenting {} chunk(s) (generation {})",
            self.id,
            chunks.len(),
            ticket.generation
        );
        let schedule = Schedule::new(chunks, &self.options.pacing, ticket.cancel.clone());
        let join = tokio::spawn(run_presentation(Arc::clone(self), ticket, schedule));
        PresentationHandle { join }
    }

    /// Show a one-off status line (e.g. "Thinking..."), superseding any presentation.
    pub fn show_status(&self, text: &str) {
        self.touch();
        let ticket = self.slot.begin(|| {
            self.fire(Event::Activity);
        });
        self.slot
            .render_if_current(&ticket, || self.display.show_text(text));
        self.slot.finish(&ticket, || {
            self.fire(Event::PresentEnded);
        });
    }

    /// Echo a final transcript unless echoes are disabled or an answer is on screen.
    /// Returns whether it was shown.
    pub fn echo_transcript(&self, text: &str) -> bool {
        if !self.options.show_live_transcription {
            return false;
        }
        let shown = self.slot.when_vacant(|| {
            if self.state().is_busy() {
                return false;
            }
            self.display.show_text(&format!("You said: {}", text));
            true
        });
        if !shown {
            log::debug!("session {}: transcript echo suppressed", self.id);
        }
        shown
    }

    /// Record user activity, waking a cooled-down display.
    pub fn note_activity(&self) {
        self.touch();
        if self.fire(Event::Activity) {
            log::info!("session {}: display woke up", self.id);
        }
    }

    /// Cool the display down when idle for longer than the timeout. Returns
    /// whether it cooled down.
    pub fn check_idle(&self) -> bool {
        self.slot.when_vacant(|| {
            let idle_for = lock(&self.last_activity).elapsed();
            if idle_for < self.options.idle_timeout || !self.fire(Event::Inactive) {
                return false;
            }
            log::info!("session {}: idle for {:?}, cooling down", self.id, idle_for);
            self.display.clear();
            true
        })
    }

    /// Stop the current presentation, if any.
    pub fn cancel(&self) -> bool {
        self.slot.cancel(|| {
            self.fire(Event::PresentEnded);
        })
    }

    /// The most recent non-empty answer presented in this session.
    pub fn last_answer(&self) -> Option<String> {
        lock(&self.last_answer).clone()
    }

    /// Session over: stop presenting and forget the last answer.
    pub fn end(&self) {
        self.cancel();
        *lock(&self.last_answer) = None;
        log::info!("session {} ended", self.id);
    }
}

async fn run_presentation(
    session: Arc<Session>,
    ticket: Ticket,
    mut schedule: Schedule,
) -> PresentationOutcome {
    while let Some(chunk) = schedule.next().await {
        let text = render_chunk(&chunk);
        let shown = session
            .slot
            .render_if_current(&ticket, || session.display.show_text(&text));
        if !shown {
            break;
        }
        log::debug!(
            "session {}: chunk {}/{} shown for {}ms",
            session.id,
            chunk.index + 1,
            chunk.total_count,
            chunk.duration_ms
        );
    }

    if session.slot.is_current(&ticket)
        && schedule.hold_last().await
        && session.slot.finish(&ticket, || {
            session.fire(Event::PresentEnded);
            session.touch();
        })
    {
        return PresentationOutcome::Completed;
    }
    if session.slot.was_superseded(&ticket) {
        PresentationOutcome::Superseded
    } else {
        PresentationOutcome::Cancelled
    }
}
