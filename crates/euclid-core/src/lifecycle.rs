//! Per-request state machine.
//!
//! ```text
//! Received ─┬─> Unmatched                                   (terminal)
//!           └─> Matched ─> Validating ─┬─> Valid ─> Dispatched      (terminal)
//!                                      └─> Invalid ─> FailureHandled (terminal)
//! ```
//!
//! Every received request reaches exactly one terminal state.

use std::fmt;

/// A state of the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// The router has the request.
    Received,
    /// No route matched the path and method.
    Unmatched,
    /// An operation was found.
    Matched,
    /// Parameters and body are being checked.
    Validating,
    /// Validation passed.
    Valid,
    /// Validation failed.
    Invalid,
    /// The handler, or the default behaviour of a handler-less operation, ran.
    Dispatched,
    /// The failure handler produced the response.
    FailureHandled,
}

impl RequestState {
    /// Returns true for states that end the lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Unmatched | Self::Dispatched | Self::FailureHandled)
    }

    /// Returns true if `next` may follow `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Matched | Self::Unmatched)
                | (Self::Matched, Self::Validating)
                | (Self::Validating, Self::Valid | Self::Invalid)
                | (Self::Valid, Self::Dispatched)
                | (Self::Invalid, Self::FailureHandled)
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Unmatched => "unmatched",
            Self::Matched => "matched",
            Self::Validating => "validating",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Dispatched => "dispatched",
            Self::FailureHandled => "failure_handled",
        };
        f.write_str(name)
    }
}

/// The states one request went through.
///
/// Transitions that the state machine does not allow are refused, so the
/// trail always describes a legal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLifecycle {
    trail: Vec<RequestState>,
}

impl Default for RequestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLifecycle {
    /// Starts a lifecycle in [`RequestState::Received`].
    #[must_use]
    pub fn new() -> Self {
        let mut trail = Vec::with_capacity(5);
        trail.push(RequestState::Received);
        Self { trail }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> RequestState {
        self.trail
            .last()
            .copied()
            .unwrap_or(RequestState::Received)
    }

    /// Moves to `next`, returning false if the move is illegal.
    pub fn advance(&mut self, next: RequestState) -> bool {
        if self.state().can_transition_to(next) {
            self.trail.push(next);
            true
        } else {
            false
        }
    }

    /// Returns true once a terminal state is reached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state().is_terminal()
    }

    /// Returns every visited state in order.
    #[must_use]
    pub fn trail(&self) -> &[RequestState] {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestState::*;

    #[test]
    fn test_happy_path() {
        let mut lifecycle = RequestLifecycle::new();
        for next in [Matched, Validating, Valid, Dispatched] {
            assert!(lifecycle.advance(next), "refused {next}");
        }
        assert!(lifecycle.is_complete());
        assert_eq!(
            lifecycle.trail(),
            &[Received, Matched, Validating, Valid, Dispatched]
        );
    }

    #[test]
    fn test_invalid_path() {
        let mut lifecycle = RequestLifecycle::new();
        for next in [Matched, Validating, Invalid, FailureHandled] {
            assert!(lifecycle.advance(next));
        }
        assert_eq!(lifecycle.state(), FailureHandled);
    }

    #[test]
    fn test_illegal_transitions_refused() {
        let mut lifecycle = RequestLifecycle::new();
        assert!(!lifecycle.advance(Dispatched));
        assert!(lifecycle.advance(Unmatched));
        assert!(!lifecycle.advance(Matched));
        assert_eq!(lifecycle.trail(), &[Received, Unmatched]);
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = [
            Received, Unmatched, Matched, Validating, Valid, Invalid, Dispatched, FailureHandled,
        ]
        .into_iter()
        .filter(|s| s.is_terminal())
        .collect();
        assert_eq!(terminal, vec![Unmatched, Dispatched, FailureHandled]);
    }
}
