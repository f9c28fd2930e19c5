//! # Session State Machine
//!
//! Derives the game outcome from telemetry. A session starts in
//! [`SessionState::Playing`] and ends in exactly one of two sticky terminal
//! states:
//!
//! ```text
//! PLAYING --crashed--------------------> CRASHED
//! PLAYING --!flying && !crashed--------> LANDED
//! ```
//!
//! Once terminal, telemetry is no longer evaluated; only [`SessionMachine::reset`]
//! starts a new session.

use crate::protocol::types::TelemetryState;

/// Current phase of the game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Playing,
    Crashed,
    Landed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionState::Playing)
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Crashed,
    Landed,
}

impl SessionOutcome {
    /// Lines shown on the display when the session ends
    pub fn banner(self) -> &'static [&'static str] {
        match self {
            SessionOutcome::Crashed => &["GAME OVER"],
            SessionOutcome::Landed => &["SUCCESSFUL LANDING!", "Reset to play again"],
        }
    }

    pub fn state(self) -> SessionState {
        match self {
            SessionOutcome::Crashed => SessionState::Crashed,
            SessionOutcome::Landed => SessionState::Landed,
        }
    }
}

/// Tracks the session phase across status checks
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    state: SessionState,
}

impl SessionMachine {
    pub const fn new() -> Self {
        Self {
            state: SessionState::Playing,
        }
    }

    /// Evaluate the transition rule against the latest telemetry.
    ///
    /// Returns the outcome only on the cycle the session becomes terminal;
    /// afterwards it always returns `None`.
    pub fn evaluate(&mut self, telemetry: &TelemetryState) -> Option<SessionOutcome> {
        if self.state.is_terminal() {
            return None;
        }

        let outcome = if telemetry.crashed {
            SessionOutcome::Crashed
        } else if !telemetry.flying {
            SessionOutcome::Landed
        } else {
            return None;
        };

        self.state = outcome.state();
        Some(outcome)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Start a new session
    pub fn reset(&mut self) {
        self.state = SessionState::Playing;
    }
}
