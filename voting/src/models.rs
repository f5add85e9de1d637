//! # Domain Records
//!
//! A meal plan owns its events, an event owns its candidate options, and an option
//! owns the votes cast on it. Stores hand these trees back whole.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Lifecycle state of a meal plan. `Finalized` is terminal.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealPlanStatus {
    /// Ballots are accepted.
    #[default]
    #[display("awaiting_votes")]
    AwaitingVotes,
    /// Winners are recorded; no further ballots.
    #[display("finalized")]
    Finalized,
}

impl FromStr for MealPlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_votes" => Ok(Self::AwaitingVotes),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!("unknown meal plan status: {}", other)),
        }
    }
}

/// How an event's ballots are counted.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionMethod {
    /// Condorcet method over widest paths.
    #[default]
    #[display("schulze")]
    Schulze,
    /// Repeated elimination of the weakest first preference.
    #[display("instant_runoff")]
    InstantRunoff,
}

impl FromStr for ElectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schulze" => Ok(Self::Schulze),
            "instant_runoff" => Ok(Self::InstantRunoff),
            other => Err(format!("unknown election method: {}", other)),
        }
    }
}

/// The meal slot an event fills.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealName {
    /// Morning meal.
    #[display("breakfast")]
    Breakfast,
    /// Midday meal.
    #[display("lunch")]
    Lunch,
    /// Evening meal.
    #[default]
    #[display("dinner")]
    Dinner,
    /// Anything in between.
    #[display("snack")]
    Snack,
}

impl FromStr for MealName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            other => Err(format!("unknown meal name: {}", other)),
        }
    }
}

/// A household's plan for a span of days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    /// Plan identifier.
    pub id: String,
    /// Owning household.
    #[serde(rename = "belongsToHousehold")]
    pub household_id: String,
    /// Lifecycle state.
    pub status: MealPlanStatus,
    /// When the sweep finalizes the plan regardless of participation.
    pub voting_deadline: DateTime<Utc>,
    /// Counting rule for every event of the plan.
    pub election_method: ElectionMethod,
    /// Free-form notes.
    pub notes: String,
    /// Start of the planned period.
    pub starts_at: DateTime<Utc>,
    /// End of the planned period.
    pub ends_at: DateTime<Utc>,
    /// Creation time; household membership is judged against it.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Soft-deletion time.
    pub archived_at: Option<DateTime<Utc>>,
    /// Events, ordered by start time.
    pub events: Vec<MealPlanEvent>,
}

impl MealPlan {
    /// The event with `event_id`, if it belongs to this plan.
    pub fn event(&self, event_id: &str) -> Option<&MealPlanEvent> {
        self.events.iter().find(|e| e.id == event_id)
    }
}

/// One meal slot of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanEvent {
    /// Event identifier.
    pub id: String,
    /// Owning plan.
    #[serde(rename = "belongsToMealPlan")]
    pub meal_plan_id: String,
    /// Day of the week, 0 through 6.
    pub day: u8,
    /// Meal slot.
    pub meal_name: MealName,
    /// Free-form notes.
    pub notes: String,
    /// Start of the meal.
    pub starts_at: DateTime<Utc>,
    /// End of the meal.
    pub ends_at: DateTime<Utc>,
    /// Candidate options.
    pub options: Vec<MealPlanOption>,
}

impl MealPlanEvent {
    /// Options that have not been archived.
    pub fn live_options(&self) -> impl Iterator<Item = &MealPlanOption> {
        self.options.iter().filter(|o| o.archived_at.is_none())
    }
}

/// A candidate meal for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanOption {
    /// Option identifier.
    pub id: String,
    /// Owning event.
    #[serde(rename = "belongsToMealPlanEvent")]
    pub event_id: String,
    /// The proposed meal.
    #[serde(rename = "mealID")]
    pub meal_id: String,
    /// Free-form notes.
    pub notes: String,
    /// Set on the event's winner at finalization.
    pub chosen: bool,
    /// Set when picking the winner needed identifier-based disambiguation.
    pub tiebroken: bool,
    /// Soft-deletion time; archived options take no votes.
    pub archived_at: Option<DateTime<Utc>>,
    /// Live votes on this option.
    pub votes: Vec<MealPlanOptionVote>,
}

/// One voter's ranking of one option. Rank 1 is most preferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanOptionVote {
    /// Vote identifier.
    pub id: String,
    /// The ranked option.
    #[serde(rename = "belongsToMealPlanOption")]
    pub option_id: String,
    /// The voter.
    #[serde(rename = "byUser")]
    pub voter_user_id: String,
    /// 1-based preference; 0 on abstentions.
    pub rank: u8,
    /// Free-form notes.
    pub notes: String,
    /// The voter declined to rank this option.
    pub abstain: bool,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// A user's membership in a household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdMembership {
    /// The household.
    pub household_id: String,
    /// The member.
    pub user_id: String,
    /// When the user joined.
    pub created_at: DateTime<Utc>,
    /// When the user left, if they did.
    pub archived_at: Option<DateTime<Utc>>,
}

impl HouseholdMembership {
    /// Whether the membership was in force at `at`.
    pub fn active_at(&self, at: DateTime<Utc>) -> bool {
        self.created_at <= at && self.archived_at.map_or(true, |archived| archived > at)
    }
}

/// A plan tree plus the voters eligible to vote on it.
///
/// Snapshots list live options only.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSnapshot {
    /// The plan with its events, live options and their votes.
    pub plan: MealPlan,
    /// Household members at plan creation time.
    pub eligible_voters: BTreeSet<String>,
}

/// A voter's complete ballot for one event, already expanded into vote rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Ballot {
    /// The plan voted on.
    pub meal_plan_id: String,
    /// The event voted on.
    pub event_id: String,
    /// The voter.
    pub voter_user_id: String,
    /// One row per live option of the event.
    pub votes: Vec<MealPlanOptionVote>,
}

/// The winner picked for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDecision {
    /// The event.
    pub event_id: String,
    /// The winning option.
    pub option_id: String,
    /// Whether picking it required identifier-based disambiguation.
    pub tiebroken: bool,
}

/// Result of an atomic finalization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// This call moved the plan to `finalized`.
    Finalized {
        /// Owning household, for notifications.
        household_id: String,
        /// Winners, one per event that had any.
        decisions: Vec<EventDecision>,
    },
    /// Someone else finalized the plan first.
    AlreadyFinalized,
}

/// Input for creating a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanCreationInput {
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// When voting closes.
    pub voting_deadline: DateTime<Utc>,
    /// Counting rule; Schulze when omitted.
    #[serde(default)]
    pub election_method: ElectionMethod,
    /// Start of the planned period.
    pub starts_at: DateTime<Utc>,
    /// End of the planned period.
    pub ends_at: DateTime<Utc>,
    /// The plan's events.
    #[serde(default)]
    pub events: Vec<MealPlanEventCreationInput>,
}

/// Input for one event of a new plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanEventCreationInput {
    /// Day of the week, 0 through 6.
    pub day: u8,
    /// Meal slot.
    pub meal_name: MealName,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Start of the meal.
    pub starts_at: DateTime<Utc>,
    /// End of the meal.
    pub ends_at: DateTime<Utc>,
    /// Candidate options.
    #[serde(default)]
    pub options: Vec<MealPlanOptionCreationInput>,
}

/// Input for one candidate option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanOptionCreationInput {
    /// The proposed meal.
    #[serde(rename = "mealID")]
    pub meal_id: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_strings() {
        assert_eq!(MealPlanStatus::AwaitingVotes.to_string(), "awaiting_votes");
        assert_eq!(
            "finalized".parse::<MealPlanStatus>(),
            Ok(MealPlanStatus::Finalized)
        );
        assert_eq!(
            serde_json::to_string(&ElectionMethod::InstantRunoff).unwrap(),
            "\"instant_runoff\""
        );
        assert!("borda".parse::<ElectionMethod>().is_err());
    }

    #[test]
    fn test_membership_window() {
        let joined = Utc::now();
        let mut membership = HouseholdMembership {
            household_id: "h".into(),
            user_id: "u".into(),
            created_at: joined,
            archived_at: None,
        };
        assert!(membership.active_at(joined));
        assert!(!membership.active_at(joined - Duration::seconds(1)));
        membership.archived_at = Some(joined + Duration::hours(1));
        assert!(membership.active_at(joined + Duration::minutes(59)));
        assert!(!membership.active_at(joined + Duration::hours(2)));
    }
}
