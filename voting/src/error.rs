//! # Error Handling
//!
//! `VotingError` is returned by every engine and store operation. `kind()` folds the
//! variants into the coarse taxonomy surfaced to API callers.

use derive_more::Display;
use larder_shared::Cancelled;

/// Coarse error classes shared with API callers.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or incomplete input.
    #[display("invalid input")]
    InvalidInput,
    /// A referenced entity is missing or archived.
    #[display("not found")]
    NotFound,
    /// The request conflicts with the current state.
    #[display("conflict")]
    Conflict,
    /// The caller may not perform the action.
    #[display("unauthorized")]
    Unauthorized,
    /// Anything the caller cannot fix.
    #[display("internal")]
    Internal,
}

/// Errors raised by the voting engine.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum VotingError {
    /// A referenced entity is missing or archived.
    #[display("{_0} not found")]
    NotFound(String),

    /// The voter is not an eligible member of the plan's household.
    #[display("user {voter_id} may not vote on meal plan {meal_plan_id}")]
    VoterNotEligible {
        /// The rejected voter.
        voter_id: String,
        /// The plan voted on.
        meal_plan_id: String,
    },

    /// A ranked option is not a live option of the event.
    #[display("option {option_id} does not belong to event {event_id}")]
    OptionNotInEvent {
        /// The offending option.
        option_id: String,
        /// The event voted on.
        event_id: String,
    },

    /// The plan no longer accepts ballots.
    #[display("meal plan {_0} is already finalized")]
    PlanAlreadyFinalized(String),

    /// The ranking is not a permutation: an option appears twice.
    #[display("option {_0} is ranked more than once")]
    DuplicateRank(String),

    /// Malformed input.
    #[display("invalid input: {_0}")]
    InvalidInput(String),

    /// The caller's context was cancelled; nothing was committed.
    #[display("operation cancelled")]
    Cancelled,

    /// The backing store failed.
    #[display("storage error: {_0}")]
    Storage(String),

    /// A data-change notification could not be delivered.
    #[display("publishing data change: {_0}")]
    Publish(String),
}

impl VotingError {
    /// The taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::VoterNotEligible { .. } => ErrorKind::Unauthorized,
            Self::PlanAlreadyFinalized(_) => ErrorKind::Conflict,
            Self::OptionNotInEvent { .. } | Self::DuplicateRank(_) | Self::InvalidInput(_) => {
                ErrorKind::InvalidInput
            }
            Self::Cancelled | Self::Storage(_) | Self::Publish(_) => ErrorKind::Internal,
        }
    }
}

impl std::error::Error for VotingError {}

impl From<Cancelled> for VotingError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Helper type alias for Result using VotingError.
pub type VotingResult<T> = Result<T, VotingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            VotingError::PlanAlreadyFinalized("p".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            VotingError::VoterNotEligible {
                voter_id: "u".into(),
                meal_plan_id: "p".into()
            }
            .kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(VotingError::DuplicateRank("o".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(VotingError::from(Cancelled), VotingError::Cancelled);
    }
}
