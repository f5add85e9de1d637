//! # Postgres Store
//!
//! `VotingStore` over diesel and an r2d2 pool. Queries run on the blocking pool;
//! ballot replacement and finalization lock the plan row with `FOR UPDATE`, and
//! finalization runs under a serializable transaction.

use crate::error::{WebError, WebResult};
use crate::models::{MealPlanEventRow, MealPlanOptionRow, MealPlanOptionVoteRow, MealPlanRow};
use crate::schema::{
    household_user_memberships, meal_plan_events, meal_plan_option_votes, meal_plan_options,
    meal_plans,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::From;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use larder_shared::{Context, Pagination, QueryFilter, QueryFilteredResult, SortBy};
use larder_voting::{
    Ballot, DecideFn, FinalizeOutcome, MealPlan, MealPlanStatus, PlanSnapshot, VotingError,
    VotingResult, VotingStore,
};
use std::collections::{BTreeMap, BTreeSet};

/// Pool of Postgres connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Failure inside a transaction closure.
#[derive(Debug, From)]
enum TxError {
    Voting(VotingError),
    Diesel(DieselError),
}

impl From<TxError> for VotingError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Voting(err) => err,
            TxError::Diesel(DieselError::NotFound) => {
                VotingError::NotFound("record".to_string())
            }
            TxError::Diesel(err) => VotingError::Storage(err.to_string()),
        }
    }
}

fn storage(err: impl std::fmt::Display) -> VotingError {
    VotingError::Storage(err.to_string())
}

fn plan_not_found(plan_id: &str) -> TxError {
    TxError::Voting(VotingError::NotFound(format!("meal plan {}", plan_id)))
}

/// A `VotingStore` backed by Postgres.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

impl PgStore {
    /// Builds a pool of at most `pool_size` connections to `database_url`.
    pub fn connect(database_url: &str, pool_size: u32) -> WebResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| WebError::Startup(format!("building database pool: {}", e)))?;
        Ok(Self { pool })
    }

    /// Runs `f` with a pooled connection on the blocking pool.
    ///
    /// The context is checked before the connection is taken; once `f` starts
    /// it runs to completion so the caller always learns whether it committed.
    async fn with_conn<T, F>(&self, ctx: &Context, f: F) -> VotingResult<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, TxError> + Send + 'static,
        T: Send + 'static,
    {
        ctx.check()?;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(storage)?;
            f(&mut conn).map_err(VotingError::from)
        })
        .await
        .map_err(storage)?
    }
}

fn load_tree(conn: &mut PgConnection, plan_id: &str, lock: bool) -> Result<Option<MealPlan>, TxError> {
    let live_plan = meal_plans::table
        .filter(meal_plans::id.eq(plan_id))
        .filter(meal_plans::archived_at.is_null())
        .select(MealPlanRow::as_select());
    let row = if lock {
        live_plan.for_update().first(conn).optional()?
    } else {
        live_plan.first(conn).optional()?
    };
    let Some(row) = row else {
        return Ok(None);
    };

    let events = meal_plan_events::table
        .filter(meal_plan_events::belongs_to_meal_plan.eq(plan_id))
        .filter(meal_plan_events::archived_at.is_null())
        .order((meal_plan_events::starts_at.asc(), meal_plan_events::id.asc()))
        .select(MealPlanEventRow::as_select())
        .load(conn)?;
    let event_ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();

    let options = meal_plan_options::table
        .filter(meal_plan_options::belongs_to_meal_plan_event.eq_any(event_ids))
        .filter(meal_plan_options::archived_at.is_null())
        .order(meal_plan_options::id.asc())
        .select(MealPlanOptionRow::as_select())
        .load(conn)?;
    let option_ids: Vec<String> = options.iter().map(|o| o.id.clone()).collect();

    let votes = meal_plan_option_votes::table
        .filter(meal_plan_option_votes::belongs_to_meal_plan_option.eq_any(option_ids))
        .filter(meal_plan_option_votes::archived_at.is_null())
        .order((
            meal_plan_option_votes::by_user.asc(),
            meal_plan_option_votes::rank.asc(),
        ))
        .select(MealPlanOptionVoteRow::as_select())
        .load(conn)?;

    let mut votes_by_option: BTreeMap<String, Vec<_>> = BTreeMap::new();
    for vote in votes {
        votes_by_option
            .entry(vote.belongs_to_meal_plan_option.clone())
            .or_default()
            .push(vote.into_domain()?);
    }
    let mut options_by_event: BTreeMap<String, Vec<_>> = BTreeMap::new();
    for option in options {
        let votes = votes_by_option.remove(&option.id).unwrap_or_default();
        options_by_event
            .entry(option.belongs_to_meal_plan_event.clone())
            .or_default()
            .push(option.into_domain(votes));
    }
    let events = events
        .into_iter()
        .map(|event| {
            let options = options_by_event.remove(&event.id).unwrap_or_default();
            event.into_domain(options)
        })
        .collect::<VotingResult<Vec<_>>>()?;

    Ok(Some(row.into_domain(events)?))
}

fn eligible_voters(conn: &mut PgConnection, plan: &MealPlan) -> Result<BTreeSet<String>, TxError> {
    let voters = household_user_memberships::table
        .filter(household_user_memberships::belongs_to_household.eq(&plan.household_id))
        .filter(household_user_memberships::created_at.le(plan.created_at))
        .filter(
            household_user_memberships::archived_at
                .is_null()
                .or(household_user_memberships::archived_at.gt(plan.created_at)),
        )
        .select(household_user_memberships::belongs_to_user)
        .load::<String>(conn)?;
    Ok(voters.into_iter().collect())
}

fn filtered_plans<'a>(household_id: &'a str, filter: &QueryFilter) -> meal_plans::BoxedQuery<'a, Pg> {
    let mut query = meal_plans::table
        .filter(meal_plans::belongs_to_household.eq(household_id))
        .into_boxed();
    if !filter.include_archived.unwrap_or(false) {
        query = query.filter(meal_plans::archived_at.is_null());
    }
    if let Some(t) = filter.created_before {
        query = query.filter(meal_plans::created_at.lt(t));
    }
    if let Some(t) = filter.created_after {
        query = query.filter(meal_plans::created_at.gt(t));
    }
    if let Some(t) = filter.updated_before {
        query = query.filter(meal_plans::last_updated_at.lt(t));
    }
    if let Some(t) = filter.updated_after {
        query = query.filter(meal_plans::last_updated_at.gt(t));
    }
    query
}

#[async_trait]
impl VotingStore for PgStore {
    async fn create_meal_plan(&self, ctx: &Context, plan: &MealPlan) -> VotingResult<()> {
        let plan_row = MealPlanRow::from_domain(plan);
        let event_rows: Vec<_> = plan
            .events
            .iter()
            .map(|e| MealPlanEventRow::from_domain(e, plan.created_at))
            .collect();
        let option_rows: Vec<_> = plan
            .events
            .iter()
            .flat_map(|e| e.options.iter())
            .map(|o| MealPlanOptionRow::from_domain(o, plan.created_at))
            .collect();
        self.with_conn(ctx, move |conn| {
            conn.transaction(|conn| {
                diesel::insert_into(meal_plans::table)
                    .values(&plan_row)
                    .execute(conn)?;
                if !event_rows.is_empty() {
                    diesel::insert_into(meal_plan_events::table)
                        .values(&event_rows)
                        .execute(conn)?;
                }
                if !option_rows.is_empty() {
                    diesel::insert_into(meal_plan_options::table)
                        .values(&option_rows)
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn get_meal_plan(&self, ctx: &Context, plan_id: &str) -> VotingResult<MealPlan> {
        let plan_id = plan_id.to_string();
        self.with_conn(ctx, move |conn| {
            load_tree(conn, &plan_id, false)?.ok_or_else(|| plan_not_found(&plan_id))
        })
        .await
    }

    async fn list_meal_plans(
        &self,
        ctx: &Context,
        household_id: &str,
        filter: &QueryFilter,
    ) -> VotingResult<QueryFilteredResult<MealPlan>> {
        let household_id = household_id.to_string();
        let filter = filter.clone();
        self.with_conn(ctx, move |conn| {
            let total_count: i64 = meal_plans::table
                .filter(meal_plans::belongs_to_household.eq(&household_id))
                .filter(meal_plans::archived_at.is_null())
                .count()
                .get_result(conn)?;
            let filtered_count: i64 = filtered_plans(&household_id, &filter)
                .count()
                .get_result(conn)?;

            let ordered = match filter.sort_by {
                SortBy::Ascending => filtered_plans(&household_id, &filter)
                    .order((meal_plans::created_at.asc(), meal_plans::id.asc())),
                SortBy::Descending => filtered_plans(&household_id, &filter)
                    .order((meal_plans::created_at.desc(), meal_plans::id.desc())),
            };
            let ids: Vec<String> = ordered
                .offset(i64::try_from(filter.offset()).unwrap_or(i64::MAX))
                .limit(i64::from(filter.limit))
                .select(meal_plans::id)
                .load(conn)?;

            let mut data = Vec::with_capacity(ids.len());
            for id in &ids {
                if let Some(plan) = load_tree(conn, id, false)? {
                    data.push(plan);
                }
            }
            Ok(QueryFilteredResult {
                data,
                pagination: Pagination {
                    page: filter.page,
                    limit: filter.limit,
                    filtered_count: u64::try_from(filtered_count).unwrap_or_default(),
                    total_count: u64::try_from(total_count).unwrap_or_default(),
                },
            })
        })
        .await
    }

    async fn load_plan_snapshot(&self, ctx: &Context, plan_id: &str) -> VotingResult<PlanSnapshot> {
        let plan_id = plan_id.to_string();
        self.with_conn(ctx, move |conn| {
            conn.transaction(|conn| {
                let plan = load_tree(conn, &plan_id, false)?.ok_or_else(|| plan_not_found(&plan_id))?;
                let eligible_voters = eligible_voters(conn, &plan)?;
                Ok(PlanSnapshot {
                    plan,
                    eligible_voters,
                })
            })
        })
        .await
    }

    async fn replace_ballot(&self, ctx: &Context, ballot: &Ballot) -> VotingResult<()> {
        let ballot = ballot.clone();
        let ctx_inner = ctx.clone();
        self.with_conn(ctx, move |conn| {
            conn.transaction(|conn| {
                let status: String = meal_plans::table
                    .filter(meal_plans::id.eq(&ballot.meal_plan_id))
                    .filter(meal_plans::archived_at.is_null())
                    .select(meal_plans::status)
                    .for_update()
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| plan_not_found(&ballot.meal_plan_id))?;
                if status == MealPlanStatus::Finalized.to_string() {
                    return Err(VotingError::PlanAlreadyFinalized(ballot.meal_plan_id.clone()).into());
                }

                let event_exists: i64 = meal_plan_events::table
                    .filter(meal_plan_events::id.eq(&ballot.event_id))
                    .filter(meal_plan_events::belongs_to_meal_plan.eq(&ballot.meal_plan_id))
                    .filter(meal_plan_events::archived_at.is_null())
                    .count()
                    .get_result(conn)?;
                if event_exists == 0 {
                    return Err(VotingError::NotFound(format!(
                        "meal plan event {}",
                        ballot.event_id
                    ))
                    .into());
                }

                let event_options: Vec<(String, Option<DateTime<Utc>>)> = meal_plan_options::table
                    .filter(meal_plan_options::belongs_to_meal_plan_event.eq(&ballot.event_id))
                    .select((meal_plan_options::id, meal_plan_options::archived_at))
                    .load(conn)?;
                for vote in &ballot.votes {
                    let live = event_options
                        .iter()
                        .any(|(id, archived_at)| *id == vote.option_id && archived_at.is_none());
                    if !live {
                        return Err(VotingError::OptionNotInEvent {
                            option_id: vote.option_id.clone(),
                            event_id: ballot.event_id.clone(),
                        }
                        .into());
                    }
                }
                ctx_inner.check().map_err(VotingError::from)?;

                let option_ids: Vec<String> = event_options.iter().map(|(id, _)| id.clone()).collect();
                let now = Utc::now();
                diesel::update(
                    meal_plan_option_votes::table
                        .filter(meal_plan_option_votes::by_user.eq(&ballot.voter_user_id))
                        .filter(meal_plan_option_votes::belongs_to_meal_plan_option.eq_any(option_ids))
                        .filter(meal_plan_option_votes::archived_at.is_null()),
                )
                .set((
                    meal_plan_option_votes::archived_at.eq(Some(now)),
                    meal_plan_option_votes::last_updated_at.eq(Some(now)),
                ))
                .execute(conn)?;

                let rows: Vec<MealPlanOptionVoteRow> =
                    ballot.votes.iter().map(MealPlanOptionVoteRow::from_domain).collect();
                if !rows.is_empty() {
                    diesel::insert_into(meal_plan_option_votes::table)
                        .values(&rows)
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn finalize_plan(
        &self,
        ctx: &Context,
        plan_id: &str,
        decide: DecideFn,
    ) -> VotingResult<FinalizeOutcome> {
        let plan_id = plan_id.to_string();
        let ctx_inner = ctx.clone();
        self.with_conn(ctx, move |conn| {
            let attempt: Result<FinalizeOutcome, TxError> = conn.build_transaction().serializable().run(|conn| {
                let plan = load_tree(conn, &plan_id, true)?.ok_or_else(|| plan_not_found(&plan_id))?;
                if plan.status == MealPlanStatus::Finalized {
                    return Ok(FinalizeOutcome::AlreadyFinalized);
                }
                let household_id = plan.household_id.clone();
                let snapshot = PlanSnapshot {
                    eligible_voters: eligible_voters(conn, &plan)?,
                    plan,
                };
                let decisions = decide(&snapshot);

                let now = Utc::now();
                for decision in &decisions {
                    diesel::update(
                        meal_plan_options::table
                            .filter(meal_plan_options::belongs_to_meal_plan_event.eq(&decision.event_id)),
                    )
                    .set((
                        meal_plan_options::chosen.eq(false),
                        meal_plan_options::tiebroken.eq(false),
                    ))
                    .execute(conn)?;
                    diesel::update(meal_plan_options::table.find(&decision.option_id))
                        .set((
                            meal_plan_options::chosen.eq(true),
                            meal_plan_options::tiebroken.eq(decision.tiebroken),
                            meal_plan_options::last_updated_at.eq(Some(now)),
                        ))
                        .execute(conn)?;
                }
                diesel::update(meal_plans::table.find(&plan_id))
                    .set((
                        meal_plans::status.eq(MealPlanStatus::Finalized.to_string()),
                        meal_plans::last_updated_at.eq(Some(now)),
                    ))
                    .execute(conn)?;

                ctx_inner.check().map_err(VotingError::from)?;
                Ok(FinalizeOutcome::Finalized {
                    household_id,
                    decisions,
                })
            });

            match attempt {
                // A concurrent finalization won the race.
                Err(TxError::Diesel(DieselError::DatabaseError(
                    DatabaseErrorKind::SerializationFailure,
                    _,
                ))) => {
                    let status: String = meal_plans::table
                        .find(&plan_id)
                        .select(meal_plans::status)
                        .first(conn)?;
                    if status == MealPlanStatus::Finalized.to_string() {
                        Ok(FinalizeOutcome::AlreadyFinalized)
                    } else {
                        Err(VotingError::Storage(format!(
                            "serialization failure finalizing meal plan {}",
                            plan_id
                        ))
                        .into())
                    }
                }
                other => other,
            }
        })
        .await
    }

    async fn expired_plan_ids(&self, ctx: &Context, now: DateTime<Utc>) -> VotingResult<Vec<String>> {
        self.with_conn(ctx, move |conn| {
            Ok(meal_plans::table
                .filter(meal_plans::status.eq(MealPlanStatus::AwaitingVotes.to_string()))
                .filter(meal_plans::archived_at.is_null())
                .filter(meal_plans::voting_deadline.le(now))
                .order(meal_plans::voting_deadline.asc())
                .select(meal_plans::id)
                .load(conn)?)
        })
        .await
    }
}
