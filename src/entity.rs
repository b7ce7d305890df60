use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing lifecycle of an entity.
///
/// Submitted → Processing → {Complete, Failed}. The two right-hand
/// states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Submitted,
    Processing,
    Failed,
    Complete,
}

impl Status {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Complete | Status::Failed)
    }

    /// Whether moving to `next` is a legal forward transition.
    ///
    /// Failed is reachable from any non-terminal state, so marking an
    /// entity failed is safe to call defensively.
    pub fn can_transition_to(self, next: Status) -> bool {
        match (self, next) {
            (Status::Submitted, Status::Processing) => true,
            (Status::Processing, Status::Complete) => true,
            (current, Status::Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Submitted => write!(f, "SUBMITTED"),
            Status::Processing => write!(f, "PROCESSING"),
            Status::Failed => write!(f, "FAILED"),
            Status::Complete => write!(f, "COMPLETE"),
        }
    }
}

/// A unit of work tracked by the store.
///
/// The id is immutable once created; the status only ever changes through
/// the store's atomic update, never on a cached copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Create a freshly submitted entity.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: Status::Submitted,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entity_is_submitted() {
        let entity = Entity::new();
        assert_eq!(entity.status, Status::Submitted);
        assert_eq!(entity.created_at, entity.updated_at);
    }

    #[test]
    fn terminal_states() {
        assert!(!Status::Submitted.is_terminal());
        assert!(!Status::Processing.is_terminal());
        assert!(Status::Failed.is_terminal());
        assert!(Status::Complete.is_terminal());
    }

    #[test]
    fn forward_transitions_are_legal() {
        assert!(Status::Submitted.can_transition_to(Status::Processing));
        assert!(Status::Processing.can_transition_to(Status::Complete));
        assert!(Status::Submitted.can_transition_to(Status::Failed));
        assert!(Status::Processing.can_transition_to(Status::Failed));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for next in [
            Status::Submitted,
            Status::Processing,
            Status::Failed,
            Status::Complete,
        ] {
            assert!(!Status::Complete.can_transition_to(next));
            assert!(!Status::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn skipping_processing_is_illegal() {
        assert!(!Status::Submitted.can_transition_to(Status::Complete));
        assert!(!Status::Submitted.can_transition_to(Status::Submitted));
        assert!(!Status::Processing.can_transition_to(Status::Submitted));
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::Submitted.to_string(), "SUBMITTED");
        assert_eq!(Status::Processing.to_string(), "PROCESSING");
        assert_eq!(Status::Failed.to_string(), "FAILED");
        assert_eq!(Status::Complete.to_string(), "COMPLETE");
    }

    #[test]
    fn entity_serialization_roundtrip() {
        let entity = Entity::new();
        let json = serde_json::to_string(&entity).unwrap();
        let deserialized: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, entity);
    }
}
