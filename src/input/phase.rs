// Action phase lifecycle

use std::fmt;

/// Position of an action (or of a single modifier) in its trigger lifecycle
///
/// `Performed` and `Cancelled` are instantaneous: listeners observe them, but
/// the owner falls back to `Waiting` before control returns to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not receiving input
    Disabled,
    /// Enabled and idle
    Waiting,
    /// A gesture is in progress
    Started,
    /// The gesture completed
    Performed,
    /// The gesture was abandoned
    Cancelled,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Disabled
    }
}

impl Phase {
    /// Check whether `self -> target` is an edge of the trigger lifecycle
    pub fn can_transition_to(&self, target: Phase) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Started)
                | (Self::Waiting, Self::Performed)
                | (Self::Started, Self::Performed)
                | (Self::Started, Self::Cancelled)
        )
    }

    /// Check if this phase ends a gesture cycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Performed | Self::Cancelled)
    }

    pub fn is_waiting(&self) -> bool {
        *self == Self::Waiting
    }

    pub fn is_started(&self) -> bool {
        *self == Self::Started
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Waiting => "waiting",
            Self::Started => "started",
            Self::Performed => "performed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Phase; 5] = [
        Phase::Disabled,
        Phase::Waiting,
        Phase::Started,
        Phase::Performed,
        Phase::Cancelled,
    ];

    #[test]
    fn test_default_is_disabled() {
        assert_eq!(Phase::default(), Phase::Disabled);
    }

    #[test]
    fn test_legal_edges() {
        assert!(Phase::Waiting.can_transition_to(Phase::Started));
        assert!(Phase::Waiting.can_transition_to(Phase::Performed));
        assert!(Phase::Started.can_transition_to(Phase::Performed));
        assert!(Phase::Started.can_transition_to(Phase::Cancelled));
    }

    #[test]
    fn test_exactly_four_edges() {
        let count = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (from, to)))
            .filter(|(from, to)| from.can_transition_to(**to))
            .count();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_cancel_requires_started() {
        assert!(!Phase::Waiting.can_transition_to(Phase::Cancelled));
        assert!(!Phase::Disabled.can_transition_to(Phase::Cancelled));
    }

    #[test]
    fn test_nothing_leaves_disabled() {
        for target in ALL {
            assert!(!Phase::Disabled.can_transition_to(target));
        }
    }

    #[test]
    fn test_terminal_phases() {
        assert!(Phase::Performed.is_terminal());
        assert!(Phase::Cancelled.is_terminal());
        assert!(!Phase::Started.is_terminal());
        assert!(!Phase::Waiting.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(Phase::Started.to_string(), "started");
    }
}
