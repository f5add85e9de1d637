//! # Storage
//!
//! The engine talks to persistence only through `VotingStore`. Implementations must
//! make `replace_ballot` and `finalize_plan` atomic and must serialize finalization
//! per plan: the second of two concurrent attempts observes `finalized` and reports
//! `AlreadyFinalized`.

use crate::error::VotingResult;
use crate::models::{Ballot, EventDecision, FinalizeOutcome, MealPlan, PlanSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use larder_shared::{Context, QueryFilter, QueryFilteredResult};

mod memory;

pub use memory::MemoryStore;

/// Picks winners from a snapshot; run inside the finalization transaction.
pub type DecideFn = fn(&PlanSnapshot) -> Vec<EventDecision>;

/// Persistence for plans, ballots and household memberships.
#[async_trait]
pub trait VotingStore: Send + Sync {
    /// Persists a new plan with its events and options.
    async fn create_meal_plan(&self, ctx: &Context, plan: &MealPlan) -> VotingResult<()>;

    /// The plan tree with live options and votes. Archived plans are not found.
    async fn get_meal_plan(&self, ctx: &Context, plan_id: &str) -> VotingResult<MealPlan>;

    /// One page of the household's plans, oldest first unless the filter says otherwise.
    ///
    /// `total_count` counts the household's live plans; `filtered_count` counts
    /// those matching the filter before paging.
    async fn list_meal_plans(
        &self,
        ctx: &Context,
        household_id: &str,
        filter: &QueryFilter,
    ) -> VotingResult<QueryFilteredResult<MealPlan>>;

    /// The plan tree plus its eligible voters.
    async fn load_plan_snapshot(&self, ctx: &Context, plan_id: &str) -> VotingResult<PlanSnapshot>;

    /// Replaces the voter's previous ballot for the event in one transaction.
    ///
    /// Fails with `PlanAlreadyFinalized` if the plan was finalized after the caller
    /// last looked, and with `OptionNotInEvent` if any vote names an option that is
    /// not a live option of the event.
    async fn replace_ballot(&self, ctx: &Context, ballot: &Ballot) -> VotingResult<()>;

    /// Reads the plan under a serializable transaction, applies `decide`'s winners,
    /// and moves the plan to `finalized`.
    ///
    /// Nothing is committed if `ctx` is cancelled before the commit.
    async fn finalize_plan(
        &self,
        ctx: &Context,
        plan_id: &str,
        decide: DecideFn,
    ) -> VotingResult<FinalizeOutcome>;

    /// Plans still awaiting votes whose deadline is at or before `now`.
    async fn expired_plan_ids(&self, ctx: &Context, now: DateTime<Utc>) -> VotingResult<Vec<String>>;
}
