//! Session lifecycle states.

use std::fmt;

/// Lifecycle of the single pairing session.
///
/// Progress is strictly forward:
/// `Created → Listening → Accepted → Handshaking → Established → Closed`,
/// with `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Listening,
    Accepted,
    Handshaking,
    Established,
    Closed,
    Failed,
}

impl SessionState {
    /// `Closed` and `Failed` end the session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(self, next: Self) -> bool {
        use SessionState::*;

        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Created, Listening)
            | (Listening, Accepted)
            | (Accepted, Handshaking)
            | (Handshaking, Established)
            | (Established, Closed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Listening => "listening",
            Self::Accepted => "accepted",
            Self::Handshaking => "handshaking",
            Self::Established => "established",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState::*;
    use super::*;

    const ALL: [SessionState; 7] = [
        Created,
        Listening,
        Accepted,
        Handshaking,
        Established,
        Closed,
        Failed,
    ];

    #[test]
    fn test_forward_path() {
        let path = [Created, Listening, Accepted, Handshaking, Established, Closed];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_backward_or_skipping() {
        assert!(!Listening.can_advance_to(Created));
        assert!(!Established.can_advance_to(Handshaking));
        assert!(!Created.can_advance_to(Accepted));
        assert!(!Accepted.can_advance_to(Established));
        assert!(!Listening.can_advance_to(Closed));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        for state in ALL {
            assert_eq!(state.can_advance_to(Failed), !state.is_terminal());
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in ALL {
            assert!(!Closed.can_advance_to(next));
            assert!(!Failed.can_advance_to(next));
        }
    }
}
