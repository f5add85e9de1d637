#![deny(missing_docs)]

//! # Larder Voting
//!
//! Ranked-choice voting on meal plan options. Household members submit ballots per
//! event; a plan is finalized once every eligible member has voted on every event or
//! once its voting deadline passes, whichever comes first. Finalization tallies each
//! event with the plan's election method (instant-runoff or Schulze), marks the
//! winners chosen and moves the plan to `finalized`, all in one transaction.

/// The voting engine operations.
pub mod engine;

/// Error types.
pub mod error;

/// Data-change notifications.
pub mod events;

/// Domain records.
pub mod models;

/// Storage abstraction and the in-memory implementation.
pub mod store;

/// The deadline sweep worker.
pub mod sweep;

/// Election methods.
pub mod tally;

pub use engine::{decide_winners, is_ready, VoteReceipt, VotingEngine};
pub use error::{ErrorKind, VotingError, VotingResult};
pub use events::{
    ChannelPublisher, DataChangeEventType, DataChangeMessage, DataChangePublisher, NoopPublisher,
};
pub use models::{
    Ballot, ElectionMethod, EventDecision, FinalizeOutcome, HouseholdMembership, MealName,
    MealPlan, MealPlanCreationInput, MealPlanEvent, MealPlanEventCreationInput, MealPlanOption,
    MealPlanOptionCreationInput, MealPlanOptionVote, MealPlanStatus, PlanSnapshot,
};
pub use store::{DecideFn, MemoryStore, VotingStore};
pub use sweep::{Sweeper, SweeperHandle};
pub use tally::TallyResult;
