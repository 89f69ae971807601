//! Per-message processing states

use serde::Serialize;

/// Where a message is in the pipeline.
///
/// ```text
/// Pending -> RuleScored -> RemoteScored | RemoteSkipped -> Finalized
///   Finalized (toxic) -> ContextDecided -> Removed
///                                       -> Rewritten | RewriteFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageState {
    Pending,
    RuleScored,
    RemoteScored,
    RemoteSkipped,
    Finalized,
    ContextDecided,
    Removed,
    Rewritten,
    RewriteFailed,
}

impl MessageState {
    /// Whether `next` may follow this state
    pub fn can_transition_to(self, next: MessageState) -> bool {
        use MessageState::*;

        matches!(
            (self, next),
            (Pending, RuleScored)
                | (RuleScored, RemoteScored)
                | (RuleScored, RemoteSkipped)
                | (RemoteScored, Finalized)
                | (RemoteSkipped, Finalized)
                | (Finalized, ContextDecided)
                | (ContextDecided, Removed)
                | (ContextDecided, Rewritten)
                | (ContextDecided, RewriteFailed)
        )
    }

    /// States a message may end in.
    ///
    /// `Finalized` is terminal only for non-toxic messages.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Finalized | Self::Removed | Self::Rewritten | Self::RewriteFailed
        )
    }
}

/// Ordered record of the states one message passed through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateTrail(Vec<MessageState>);

impl StateTrail {
    pub fn new() -> Self {
        Self(vec![MessageState::Pending])
    }

    /// Record a transition.
    ///
    /// Illegal transitions are a pipeline bug; they are logged and still
    /// recorded so the trail shows what actually happened.
    pub fn advance(&mut self, next: MessageState) {
        let current = self.current();
        if !current.can_transition_to(next) {
            tracing::error!("Illegal message state transition {:?} -> {:?}", current, next);
        }
        self.0.push(next);
    }

    pub fn current(&self) -> MessageState {
        self.0.last().copied().unwrap_or(MessageState::Pending)
    }

    pub fn states(&self) -> &[MessageState] {
        &self.0
    }

    /// Every recorded step was a legal transition
    pub fn is_valid(&self) -> bool {
        self.0.first() == Some(&MessageState::Pending)
            && self.0.windows(2).all(|w| w[0].can_transition_to(w[1]))
    }
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MessageState::*;

    #[test]
    fn test_non_toxic_path() {
        let mut trail = StateTrail::new();
        for state in [RuleScored, RemoteSkipped, Finalized] {
            trail.advance(state);
        }

        assert!(trail.is_valid());
        assert!(trail.current().is_terminal());
    }

    #[test]
    fn test_rewrite_path() {
        let mut trail = StateTrail::new();
        for state in [RuleScored, RemoteScored, Finalized, ContextDecided, Rewritten] {
            trail.advance(state);
        }

        assert!(trail.is_valid());
        assert_eq!(trail.current(), Rewritten);
        assert_eq!(trail.states().len(), 6);
    }

    #[test]
    fn test_illegal_transition_is_recorded() {
        let mut trail = StateTrail::new();
        trail.advance(Rewritten);

        assert!(!trail.is_valid());
        assert_eq!(trail.current(), Rewritten);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&StateTrail::new()).unwrap();
        assert_eq!(json, r#"["PENDING"]"#);
        assert!(!ContextDecided.is_terminal());
    }
}
