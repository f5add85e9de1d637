//! Row structs for the voting tables and their conversions to and from the
//! domain records of `larder_voting`.

use crate::schema::*;
use diesel::prelude::*;
use chrono::{DateTime, Utc};
use larder_voting::{
    MealPlan, MealPlanEvent, MealPlanOption, MealPlanOptionVote, VotingError, VotingResult,
};

fn corrupt(table: &str, id: &str, err: String) -> VotingError {
    VotingError::Storage(format!("{} row {}: {}", table, id, err))
}

/// Struct representing a row in table `meal_plans`
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name=meal_plans, primary_key(id))]
pub struct MealPlanRow {
    /// Field representing column `id`
    pub id: String,
    /// Field representing column `notes`
    pub notes: String,
    /// Field representing column `status`
    pub status: String,
    /// Field representing column `voting_deadline`
    pub voting_deadline: DateTime<Utc>,
    /// Field representing column `election_method`
    pub election_method: String,
    /// Field representing column `starts_at`
    pub starts_at: DateTime<Utc>,
    /// Field representing column `ends_at`
    pub ends_at: DateTime<Utc>,
    /// Field representing column `belongs_to_household`
    pub belongs_to_household: String,
    /// Field representing column `created_at`
    pub created_at: DateTime<Utc>,
    /// Field representing column `last_updated_at`
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Field representing column `archived_at`
    pub archived_at: Option<DateTime<Utc>>,
}

impl MealPlanRow {
    /// The row of `plan`, without its events.
    pub fn from_domain(plan: &MealPlan) -> Self {
        Self {
            id: plan.id.clone(),
            notes: plan.notes.clone(),
            status: plan.status.to_string(),
            voting_deadline: plan.voting_deadline,
            election_method: plan.election_method.to_string(),
            starts_at: plan.starts_at,
            ends_at: plan.ends_at,
            belongs_to_household: plan.household_id.clone(),
            created_at: plan.created_at,
            last_updated_at: plan.last_updated_at,
            archived_at: plan.archived_at,
        }
    }

    /// The plan with `events` attached.
    pub fn into_domain(self, events: Vec<MealPlanEvent>) -> VotingResult<MealPlan> {
        let status = self
            .status
            .parse()
            .map_err(|e| corrupt("meal_plans", &self.id, e))?;
        let election_method = self
            .election_method
            .parse()
            .map_err(|e| corrupt("meal_plans", &self.id, e))?;
        Ok(MealPlan {
            id: self.id,
            household_id: self.belongs_to_household,
            status,
            voting_deadline: self.voting_deadline,
            election_method,
            notes: self.notes,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            created_at: self.created_at,
            last_updated_at: self.last_updated_at,
            archived_at: self.archived_at,
            events,
        })
    }
}

/// Struct representing a row in table `meal_plan_events`
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name=meal_plan_events, primary_key(id))]
pub struct MealPlanEventRow {
    /// Field representing column `id`
    pub id: String,
    /// Field representing column `notes`
    pub notes: String,
    /// Field representing column `day`
    pub day: i16,
    /// Field representing column `meal_name`
    pub meal_name: String,
    /// Field representing column `starts_at`
    pub starts_at: DateTime<Utc>,
    /// Field representing column `ends_at`
    pub ends_at: DateTime<Utc>,
    /// Field representing column `belongs_to_meal_plan`
    pub belongs_to_meal_plan: String,
    /// Field representing column `created_at`
    pub created_at: DateTime<Utc>,
    /// Field representing column `last_updated_at`
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Field representing column `archived_at`
    pub archived_at: Option<DateTime<Utc>>,
}

impl MealPlanEventRow {
    /// The row of `event`, created at `created_at`.
    pub fn from_domain(event: &MealPlanEvent, created_at: DateTime<Utc>) -> Self {
        Self {
            id: event.id.clone(),
            notes: event.notes.clone(),
            day: i16::from(event.day),
            meal_name: event.meal_name.to_string(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            belongs_to_meal_plan: event.meal_plan_id.clone(),
            created_at,
            last_updated_at: None,
            archived_at: None,
        }
    }

    /// The event with `options` attached.
    pub fn into_domain(self, options: Vec<MealPlanOption>) -> VotingResult<MealPlanEvent> {
        let day = u8::try_from(self.day).map_err(|e| corrupt("meal_plan_events", &self.id, e.to_string()))?;
        let meal_name = self
            .meal_name
            .parse()
            .map_err(|e| corrupt("meal_plan_events", &self.id, e))?;
        Ok(MealPlanEvent {
            id: self.id,
            meal_plan_id: self.belongs_to_meal_plan,
            day,
            meal_name,
            notes: self.notes,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            options,
        })
    }
}

/// Struct representing a row in table `meal_plan_options`
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name=meal_plan_options, primary_key(id))]
pub struct MealPlanOptionRow {
    /// Field representing column `id`
    pub id: String,
    /// Field representing column `meal_id`
    pub meal_id: String,
    /// Field representing column `notes`
    pub notes: String,
    /// Field representing column `chosen`
    pub chosen: bool,
    /// Field representing column `tiebroken`
    pub tiebroken: bool,
    /// Field representing column `belongs_to_meal_plan_event`
    pub belongs_to_meal_plan_event: String,
    /// Field representing column `created_at`
    pub created_at: DateTime<Utc>,
    /// Field representing column `last_updated_at`
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Field representing column `archived_at`
    pub archived_at: Option<DateTime<Utc>>,
}

impl MealPlanOptionRow {
    /// The row of `option`, created at `created_at`.
    pub fn from_domain(option: &MealPlanOption, created_at: DateTime<Utc>) -> Self {
        Self {
            id: option.id.clone(),
            meal_id: option.meal_id.clone(),
            notes: option.notes.clone(),
            chosen: option.chosen,
            tiebroken: option.tiebroken,
            belongs_to_meal_plan_event: option.event_id.clone(),
            created_at,
            last_updated_at: None,
            archived_at: option.archived_at,
        }
    }

    /// The option with `votes` attached.
    pub fn into_domain(self, votes: Vec<MealPlanOptionVote>) -> MealPlanOption {
        MealPlanOption {
            id: self.id,
            event_id: self.belongs_to_meal_plan_event,
            meal_id: self.meal_id,
            notes: self.notes,
            chosen: self.chosen,
            tiebroken: self.tiebroken,
            archived_at: self.archived_at,
            votes,
        }
    }
}

/// Struct representing a row in table `meal_plan_option_votes`
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name=meal_plan_option_votes, primary_key(id))]
pub struct MealPlanOptionVoteRow {
    /// Field representing column `id`
    pub id: String,
    /// Field representing column `rank`
    pub rank: i16,
    /// Field representing column `abstain`
    pub abstain: bool,
    /// Field representing column `notes`
    pub notes: String,
    /// Field representing column `by_user`
    pub by_user: String,
    /// Field representing column `belongs_to_meal_plan_option`
    pub belongs_to_meal_plan_option: String,
    /// Field representing column `created_at`
    pub created_at: DateTime<Utc>,
    /// Field representing column `last_updated_at`
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Field representing column `archived_at`
    pub archived_at: Option<DateTime<Utc>>,
}

impl MealPlanOptionVoteRow {
    /// The row of `vote`.
    pub fn from_domain(vote: &MealPlanOptionVote) -> Self {
        Self {
            id: vote.id.clone(),
            rank: i16::from(vote.rank),
            abstain: vote.abstain,
            notes: vote.notes.clone(),
            by_user: vote.voter_user_id.clone(),
            belongs_to_meal_plan_option: vote.option_id.clone(),
            created_at: vote.created_at,
            last_updated_at: None,
            archived_at: None,
        }
    }

    /// The domain vote.
    pub fn into_domain(self) -> VotingResult<MealPlanOptionVote> {
        let rank = u8::try_from(self.rank)
            .map_err(|e| corrupt("meal_plan_option_votes", &self.id, e.to_string()))?;
        Ok(MealPlanOptionVote {
            id: self.id,
            option_id: self.belongs_to_meal_plan_option,
            voter_user_id: self.by_user,
            rank,
            notes: self.notes,
            abstain: self.abstain,
            created_at: self.created_at,
        })
    }
}
