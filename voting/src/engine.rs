//! # Voting Engine
//!
//! Ballot submission, readiness detection, finalization and the deadline sweep's
//! unit of work. The engine holds no state of its own; every decision is made from
//! a store snapshot, and finalization runs the tally inside the store's transaction.

use crate::error::{VotingError, VotingResult};
use crate::events::{DataChangeEventType, DataChangeMessage, DataChangePublisher};
use crate::models::{
    Ballot, EventDecision, FinalizeOutcome, MealPlan, MealPlanCreationInput, MealPlanEvent,
    MealPlanOption, MealPlanOptionVote, MealPlanStatus, PlanSnapshot,
};
use crate::store::VotingStore;
use crate::tally;
use chrono::Utc;
use larder_shared::{Context, QueryFilter, QueryFilteredResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What a successful ballot submission stored.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteReceipt {
    /// One row per live option of the event, abstentions included.
    pub votes: Vec<MealPlanOptionVote>,
    /// Whether this ballot completed the quorum and finalized the plan.
    pub finalized: bool,
}

/// Entry points of the voting engine.
#[derive(Clone)]
pub struct VotingEngine {
    store: Arc<dyn VotingStore>,
    publisher: Arc<dyn DataChangePublisher>,
}

impl std::fmt::Debug for VotingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingEngine").finish_non_exhaustive()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn require_id(name: &str, value: &str) -> VotingResult<()> {
    if value.is_empty() {
        return Err(VotingError::InvalidInput(format!("{} is required", name)));
    }
    Ok(())
}

impl VotingEngine {
    /// An engine over `store`, announcing changes through `publisher`.
    pub fn new(store: Arc<dyn VotingStore>, publisher: Arc<dyn DataChangePublisher>) -> Self {
        Self { store, publisher }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn VotingStore> {
        &self.store
    }

    /// Creates a plan for `household_id` in `awaiting_votes`.
    pub async fn create_meal_plan(
        &self,
        ctx: &Context,
        household_id: &str,
        input: MealPlanCreationInput,
    ) -> VotingResult<MealPlan> {
        ctx.check()?;
        require_id("householdID", household_id)?;
        if input.ends_at < input.starts_at {
            return Err(VotingError::InvalidInput(
                "meal plan ends before it starts".to_string(),
            ));
        }

        let now = Utc::now();
        let plan_id = new_id();
        let mut events = Vec::with_capacity(input.events.len());
        for event_input in input.events {
            if event_input.day > 6 {
                return Err(VotingError::InvalidInput(format!(
                    "day must be between 0 and 6, got {}",
                    event_input.day
                )));
            }
            let event_id = new_id();
            let mut options = Vec::with_capacity(event_input.options.len());
            for option_input in event_input.options {
                require_id("mealID", &option_input.meal_id)?;
                options.push(MealPlanOption {
                    id: new_id(),
                    event_id: event_id.clone(),
                    meal_id: option_input.meal_id,
                    notes: option_input.notes,
                    chosen: false,
                    tiebroken: false,
                    archived_at: None,
                    votes: Vec::new(),
                });
            }
            events.push(MealPlanEvent {
                id: event_id,
                meal_plan_id: plan_id.clone(),
                day: event_input.day,
                meal_name: event_input.meal_name,
                notes: event_input.notes,
                starts_at: event_input.starts_at,
                ends_at: event_input.ends_at,
                options,
            });
        }
        events.sort_by_key(|event| event.starts_at);

        let plan = MealPlan {
            id: plan_id,
            household_id: household_id.to_string(),
            status: MealPlanStatus::AwaitingVotes,
            voting_deadline: input.voting_deadline,
            election_method: input.election_method,
            notes: input.notes,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            created_at: now,
            last_updated_at: None,
            archived_at: None,
            events,
        };
        self.store.create_meal_plan(ctx, &plan).await?;
        info!(meal_plan_id = %plan.id, household_id, events = plan.events.len(), "meal plan created");
        Ok(plan)
    }

    /// The plan tree, visible only to its own household.
    pub async fn get_meal_plan(
        &self,
        ctx: &Context,
        plan_id: &str,
        household_id: &str,
    ) -> VotingResult<MealPlan> {
        require_id("mealPlanID", plan_id)?;
        let plan = self.store.get_meal_plan(ctx, plan_id).await?;
        if plan.household_id != household_id {
            return Err(VotingError::NotFound(format!("meal plan {}", plan_id)));
        }
        Ok(plan)
    }

    /// One page of the household's plans.
    pub async fn list_meal_plans(
        &self,
        ctx: &Context,
        household_id: &str,
        filter: &QueryFilter,
    ) -> VotingResult<QueryFilteredResult<MealPlan>> {
        ctx.check()?;
        require_id("householdID", household_id)?;
        self.store.list_meal_plans(ctx, household_id, filter).await
    }

    /// Replaces `voter_id`'s ballot for the event with `ranked_option_ids`, most
    /// preferred first. Live options left out are stored as abstentions; an empty
    /// ranking abstains on the whole event. Finalizes the plan when this ballot
    /// completes the quorum.
    pub async fn submit_vote(
        &self,
        ctx: &Context,
        plan_id: &str,
        event_id: &str,
        voter_id: &str,
        ranked_option_ids: &[String],
    ) -> VotingResult<VoteReceipt> {
        ctx.check()?;
        require_id("mealPlanID", plan_id)?;
        require_id("mealPlanEventID", event_id)?;
        require_id("userID", voter_id)?;

        let snapshot = self.store.load_plan_snapshot(ctx, plan_id).await?;
        if snapshot.plan.status == MealPlanStatus::Finalized {
            return Err(VotingError::PlanAlreadyFinalized(plan_id.to_string()));
        }
        if !snapshot.eligible_voters.contains(voter_id) {
            return Err(VotingError::VoterNotEligible {
                voter_id: voter_id.to_string(),
                meal_plan_id: plan_id.to_string(),
            });
        }
        let event = snapshot
            .plan
            .event(event_id)
            .ok_or_else(|| VotingError::NotFound(format!("meal plan event {}", event_id)))?;

        let mut seen = BTreeSet::new();
        for option_id in ranked_option_ids {
            if !seen.insert(option_id.as_str()) {
                return Err(VotingError::DuplicateRank(option_id.clone()));
            }
            if !event.live_options().any(|option| &option.id == option_id) {
                return Err(VotingError::OptionNotInEvent {
                    option_id: option_id.clone(),
                    event_id: event_id.to_string(),
                });
            }
        }

        let now = Utc::now();
        let vote = |option_id: &str, rank: u8, abstain: bool| MealPlanOptionVote {
            id: new_id(),
            option_id: option_id.to_string(),
            voter_user_id: voter_id.to_string(),
            rank,
            notes: String::new(),
            abstain,
            created_at: now,
        };
        let mut votes = Vec::with_capacity(event.options.len());
        for (position, option_id) in ranked_option_ids.iter().enumerate() {
            let rank = u8::try_from(position + 1)
                .map_err(|_| VotingError::InvalidInput("too many ranked options".to_string()))?;
            votes.push(vote(option_id.as_str(), rank, false));
        }
        for option in event.live_options() {
            if !seen.contains(option.id.as_str()) {
                votes.push(vote(option.id.as_str(), 0, true));
            }
        }

        let ballot = Ballot {
            meal_plan_id: plan_id.to_string(),
            event_id: event_id.to_string(),
            voter_user_id: voter_id.to_string(),
            votes,
        };
        self.store.replace_ballot(ctx, &ballot).await?;
        debug!(
            meal_plan_id = plan_id,
            meal_plan_event_id = event_id,
            voter_id,
            ranked = ranked_option_ids.len(),
            "ballot accepted"
        );

        // The ballot is committed; a failed notice must not hold back finalization.
        let published = self
            .publisher
            .publish(DataChangeMessage {
                meal_plan_event_id: Some(event_id.to_string()),
                user_id: Some(voter_id.to_string()),
                ..DataChangeMessage::new(
                    DataChangeEventType::MealPlanOptionVoteCreated,
                    plan_id,
                    &snapshot.plan.household_id,
                )
            })
            .await;
        if let Err(err) = &published {
            warn!(meal_plan_id = plan_id, error = %err, "vote notice not published");
        }

        let refreshed = self.store.load_plan_snapshot(ctx, plan_id).await?;
        let finalized = if is_ready(&refreshed) {
            self.finalize_plan(ctx, plan_id).await?
        } else {
            false
        };
        published?;

        Ok(VoteReceipt {
            votes: ballot.votes,
            finalized,
        })
    }

    /// Tallies every event and moves the plan to `finalized`.
    ///
    /// Returns `false` when the plan was already finalized. Notifications go out
    /// only after the commit.
    pub async fn finalize_plan(&self, ctx: &Context, plan_id: &str) -> VotingResult<bool> {
        ctx.check()?;
        require_id("mealPlanID", plan_id)?;

        let (household_id, decisions) =
            match self.store.finalize_plan(ctx, plan_id, decide_winners).await? {
                FinalizeOutcome::AlreadyFinalized => {
                    debug!(meal_plan_id = plan_id, "meal plan already finalized");
                    return Ok(false);
                }
                FinalizeOutcome::Finalized {
                    household_id,
                    decisions,
                } => (household_id, decisions),
            };
        info!(
            meal_plan_id = plan_id,
            events_decided = decisions.len(),
            tiebreaks = decisions.iter().filter(|d| d.tiebroken).count(),
            "meal plan finalized"
        );

        for decision in &decisions {
            self.publisher
                .publish(DataChangeMessage {
                    meal_plan_event_id: Some(decision.event_id.clone()),
                    meal_plan_option_id: Some(decision.option_id.clone()),
                    ..DataChangeMessage::new(
                        DataChangeEventType::MealPlanOptionFinalized,
                        plan_id,
                        &household_id,
                    )
                })
                .await?;
        }
        self.publisher
            .publish(DataChangeMessage::new(
                DataChangeEventType::MealPlanFinalized,
                plan_id,
                &household_id,
            ))
            .await?;
        Ok(true)
    }

    /// Finalizes every plan whose voting deadline has passed and returns how many
    /// this call finalized. A failing plan is logged and skipped; cancellation
    /// stops the sweep.
    pub async fn expire_due_voting_periods(&self, ctx: &Context) -> VotingResult<usize> {
        let due = self.store.expired_plan_ids(ctx, Utc::now()).await?;
        let mut finalized = 0;
        for plan_id in due {
            match self.finalize_plan(ctx, &plan_id).await {
                Ok(true) => finalized += 1,
                Ok(false) => {}
                Err(VotingError::Cancelled) => return Err(VotingError::Cancelled),
                Err(err) => {
                    error!(meal_plan_id = %plan_id, error = %err, "finalizing expired meal plan")
                }
            }
        }
        Ok(finalized)
    }
}

/// Whether every eligible voter has a ballot, possibly all abstentions, on every
/// event that has live options.
pub fn is_ready(snapshot: &PlanSnapshot) -> bool {
    snapshot.plan.events.iter().all(|event| {
        let mut options = event.live_options().peekable();
        if options.peek().is_none() {
            return true;
        }
        let voted: BTreeSet<&str> = options
            .flat_map(|option| option.votes.iter())
            .map(|vote| vote.voter_user_id.as_str())
            .collect();
        snapshot
            .eligible_voters
            .iter()
            .all(|voter| voted.contains(voter.as_str()))
    })
}

/// Runs the plan's election method over each event's ballots.
///
/// Events without live options or without a single ranked vote get no decision.
pub fn decide_winners(snapshot: &PlanSnapshot) -> Vec<EventDecision> {
    snapshot
        .plan
        .events
        .iter()
        .filter_map(|event| {
            let options: Vec<String> = event.live_options().map(|o| o.id.clone()).collect();
            let result = tally::tally(
                snapshot.plan.election_method,
                &options,
                &ranked_ballots(event),
            )?;
            Some(EventDecision {
                event_id: event.id.clone(),
                option_id: result.winner,
                tiebroken: result.tiebroken,
            })
        })
        .collect()
}

fn ranked_ballots(event: &MealPlanEvent) -> Vec<Vec<String>> {
    let mut by_voter: BTreeMap<&str, Vec<(u8, &str)>> = BTreeMap::new();
    for option in event.live_options() {
        for vote in option.votes.iter().filter(|v| !v.abstain) {
            by_voter
                .entry(vote.voter_user_id.as_str())
                .or_default()
                .push((vote.rank, option.id.as_str()));
        }
    }
    by_voter
        .into_values()
        .map(|mut ranks| {
            ranks.sort_unstable();
            ranks.into_iter().map(|(_, id)| id.to_string()).collect()
        })
        .collect()
}
