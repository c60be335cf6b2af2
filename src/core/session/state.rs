//! Per-session display state machine.

/// What the glasses display is doing for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing scheduled; live transcription may be echoed.
    Idle,
    /// An answer is being presented chunk by chunk.
    Presenting,
    /// Display blanked after inactivity; the next activity wakes it.
    Cooldown,
}

/// Inputs that drive [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    PresentStarted,
    PresentEnded,
    Inactive,
    Activity,
}

/// A state change, published to session subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
}

impl SessionState {
    /// Next state for `event`, or `None` when the event does not apply.
    pub fn on(self, event: Event) -> Option<SessionState> {
        match (self, event) {
            (SessionState::Idle, Event::PresentStarted) => Some(SessionState::Presenting),
            (SessionState::Presenting, Event::PresentEnded) => Some(SessionState::Idle),
            (SessionState::Idle, Event::Inactive) => Some(SessionState::Cooldown),
            (SessionState::Cooldown, Event::Activity) => Some(SessionState::Idle),
            _ => None,
        }
    }

    pub fn is_busy(self) -> bool {
        self == SessionState::Presenting
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, SessionState};

    #[test]
    fn presenting_round_trip() {
        let s = SessionState::Idle.on(Event::PresentStarted).unwrap();
        assert_eq!(s, SessionState::Presenting);
        assert!(s.is_busy());
        assert_eq!(s.on(Event::PresentEnded), Some(SessionState::Idle));
    }

    #[test]
    fn cooldown_round_trip() {
        let s = SessionState::Idle.on(Event::Inactive).unwrap();
        assert_eq!(s, SessionState::Cooldown);
        assert_eq!(s.on(Event::Activity), Some(SessionState::Idle));
    }

    #[test]
    fn irrelevant_events_are_ignored() {
        assert_eq!(SessionState::Presenting.on(Event::Inactive), None);
        assert_eq!(SessionState::Presenting.on(Event::PresentStarted), None);
        assert_eq!(SessionState::Cooldown.on(Event::PresentStarted), None);
        assert_eq!(SessionState::Idle.on(Event::Activity), None);
        assert_eq!(SessionState::Idle.on(Event::PresentEnded), None);
    }
}
