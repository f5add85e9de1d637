use super::{DecideFn, VotingStore};
use crate::error::{VotingError, VotingResult};
use crate::models::{
    Ballot, FinalizeOutcome, HouseholdMembership, MealPlan, MealPlanStatus, PlanSnapshot,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use larder_shared::{Context, Pagination, QueryFilter, QueryFilteredResult, SortBy};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    plans: BTreeMap<String, MealPlan>,
    memberships: Vec<HouseholdMembership>,
}

/// A `VotingStore` held in process memory.
///
/// One mutex guards all state, which serializes every write. Clones share the
/// same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a household membership.
    pub async fn add_membership(&self, membership: HouseholdMembership) {
        self.state.lock().await.memberships.push(membership);
    }

    /// Adds `user_id` to `household_id` as of now.
    pub async fn add_household_member(&self, household_id: &str, user_id: &str) {
        self.add_membership(HouseholdMembership {
            household_id: household_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            archived_at: None,
        })
        .await;
    }

    /// Archives an option so it no longer takes votes or counts in the tally.
    pub async fn archive_option(&self, option_id: &str) -> VotingResult<()> {
        let mut state = self.state.lock().await;
        let option = state
            .plans
            .values_mut()
            .flat_map(|plan| plan.events.iter_mut())
            .flat_map(|event| event.options.iter_mut())
            .find(|option| option.id == option_id && option.archived_at.is_none())
            .ok_or_else(|| VotingError::NotFound(format!("meal plan option {}", option_id)))?;
        option.archived_at = Some(Utc::now());
        Ok(())
    }
}

fn plan_not_found(plan_id: &str) -> VotingError {
    VotingError::NotFound(format!("meal plan {}", plan_id))
}

fn live_tree(plan: &MealPlan) -> MealPlan {
    let mut plan = plan.clone();
    for event in &mut plan.events {
        event.options.retain(|option| option.archived_at.is_none());
    }
    plan
}

fn snapshot_of(memberships: &[HouseholdMembership], plan: &MealPlan) -> PlanSnapshot {
    let eligible_voters = memberships
        .iter()
        .filter(|m| m.household_id == plan.household_id && m.active_at(plan.created_at))
        .map(|m| m.user_id.clone())
        .collect();
    PlanSnapshot {
        plan: live_tree(plan),
        eligible_voters,
    }
}

#[async_trait]
impl VotingStore for MemoryStore {
    async fn create_meal_plan(&self, ctx: &Context, plan: &MealPlan) -> VotingResult<()> {
        let mut state = ctx.run(self.state.lock()).await?;
        if state.plans.contains_key(&plan.id) {
            return Err(VotingError::Storage(format!("meal plan {} already exists", plan.id)));
        }
        state.plans.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    async fn get_meal_plan(&self, ctx: &Context, plan_id: &str) -> VotingResult<MealPlan> {
        let state = ctx.run(self.state.lock()).await?;
        state
            .plans
            .get(plan_id)
            .filter(|plan| plan.archived_at.is_none())
            .map(live_tree)
            .ok_or_else(|| plan_not_found(plan_id))
    }

    async fn list_meal_plans(
        &self,
        ctx: &Context,
        household_id: &str,
        filter: &QueryFilter,
    ) -> VotingResult<QueryFilteredResult<MealPlan>> {
        let state = ctx.run(self.state.lock()).await?;
        let owned: Vec<&MealPlan> = state
            .plans
            .values()
            .filter(|plan| plan.household_id == household_id)
            .collect();
        let total_count = owned.iter().filter(|p| p.archived_at.is_none()).count() as u64;

        let include_archived = filter.include_archived.unwrap_or(false);
        let mut matching: Vec<&MealPlan> = owned
            .into_iter()
            .filter(|p| include_archived || p.archived_at.is_none())
            .filter(|p| filter.created_before.map_or(true, |t| p.created_at < t))
            .filter(|p| filter.created_after.map_or(true, |t| p.created_at > t))
            .filter(|p| {
                filter
                    .updated_before
                    .map_or(true, |t| p.last_updated_at.map_or(false, |u| u < t))
            })
            .filter(|p| {
                filter
                    .updated_after
                    .map_or(true, |t| p.last_updated_at.map_or(false, |u| u > t))
            })
            .collect();
        matching.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        if filter.sort_by == SortBy::Descending {
            matching.reverse();
        }

        let filtered_count = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(usize::from(filter.limit))
            .map(live_tree)
            .collect();
        Ok(QueryFilteredResult {
            data,
            pagination: Pagination {
                page: filter.page,
                limit: filter.limit,
                filtered_count,
                total_count,
            },
        })
    }

    async fn load_plan_snapshot(&self, ctx: &Context, plan_id: &str) -> VotingResult<PlanSnapshot> {
        let state = ctx.run(self.state.lock()).await?;
        let plan = state
            .plans
            .get(plan_id)
            .filter(|plan| plan.archived_at.is_none())
            .ok_or_else(|| plan_not_found(plan_id))?;
        Ok(snapshot_of(&state.memberships, plan))
    }

    async fn replace_ballot(&self, ctx: &Context, ballot: &Ballot) -> VotingResult<()> {
        let mut state = ctx.run(self.state.lock()).await?;
        let plan = state
            .plans
            .get_mut(&ballot.meal_plan_id)
            .filter(|plan| plan.archived_at.is_none())
            .ok_or_else(|| plan_not_found(&ballot.meal_plan_id))?;
        if plan.status == MealPlanStatus::Finalized {
            return Err(VotingError::PlanAlreadyFinalized(plan.id.clone()));
        }
        let event = plan
            .events
            .iter_mut()
            .find(|event| event.id == ballot.event_id)
            .ok_or_else(|| VotingError::NotFound(format!("meal plan event {}", ballot.event_id)))?;

        for vote in &ballot.votes {
            if !event.live_options().any(|option| option.id == vote.option_id) {
                return Err(VotingError::OptionNotInEvent {
                    option_id: vote.option_id.clone(),
                    event_id: event.id.clone(),
                });
            }
        }
        ctx.check()?;

        for option in &mut event.options {
            option
                .votes
                .retain(|vote| vote.voter_user_id != ballot.voter_user_id);
        }
        for vote in &ballot.votes {
            if let Some(option) = event.options.iter_mut().find(|o| o.id == vote.option_id) {
                option.votes.push(vote.clone());
            }
        }
        Ok(())
    }

    async fn finalize_plan(
        &self,
        ctx: &Context,
        plan_id: &str,
        decide: DecideFn,
    ) -> VotingResult<FinalizeOutcome> {
        let mut guard = ctx.run(self.state.lock()).await?;
        let MemoryState { plans, memberships } = &mut *guard;
        let plan = plans
            .get_mut(plan_id)
            .filter(|plan| plan.archived_at.is_none())
            .ok_or_else(|| plan_not_found(plan_id))?;
        if plan.status == MealPlanStatus::Finalized {
            return Ok(FinalizeOutcome::AlreadyFinalized);
        }

        let decisions = decide(&snapshot_of(memberships, plan));
        ctx.check()?;

        for event in &mut plan.events {
            if let Some(decision) = decisions.iter().find(|d| d.event_id == event.id) {
                for option in &mut event.options {
                    option.chosen = option.id == decision.option_id;
                    option.tiebroken = option.chosen && decision.tiebroken;
                }
            }
        }
        plan.status = MealPlanStatus::Finalized;
        plan.last_updated_at = Some(Utc::now());

        Ok(FinalizeOutcome::Finalized {
            household_id: plan.household_id.clone(),
            decisions,
        })
    }

    async fn expired_plan_ids(&self, ctx: &Context, now: DateTime<Utc>) -> VotingResult<Vec<String>> {
        let state = ctx.run(self.state.lock()).await?;
        Ok(state
            .plans
            .values()
            .filter(|plan| {
                plan.archived_at.is_none()
                    && plan.status == MealPlanStatus::AwaitingVotes
                    && plan.voting_deadline <= now
            })
            .map(|plan| plan.id.clone())
            .collect())
    }
}
