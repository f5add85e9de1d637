//! # Deadline Sweep
//!
//! A background task that periodically finalizes every plan whose voting deadline
//! has passed. Each tick is one call to `expire_due_voting_periods`, which finalizes
//! plans one transaction at a time.

use crate::engine::VotingEngine;
use larder_shared::{CancelHandle, Context};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Periodic deadline sweep.
#[derive(Debug, Clone)]
pub struct Sweeper {
    engine: VotingEngine,
    period: Duration,
}

impl Sweeper {
    /// A sweep over `engine` every `period`. The first sweep runs immediately.
    pub fn new(engine: VotingEngine, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Starts the sweep in a background task.
    ///
    /// Returns a handle that can be used to stop it.
    pub fn start(self) -> SweeperHandle {
        let (ctx, cancel) = Context::with_cancel();
        let task_handle = tokio::spawn(self.run(ctx));
        SweeperHandle {
            cancel,
            task_handle,
        }
    }

    /// Sweeps until `ctx` is cancelled. A sweep in flight is cancelled with it.
    pub async fn run(self, ctx: Context) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "deadline sweep started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.engine.expire_due_voting_periods(&ctx).await {
                        Ok(0) => debug!("no expired meal plans"),
                        Ok(finalized) => info!(finalized, "expired meal plans finalized"),
                        Err(err) if ctx.is_cancelled() => {
                            debug!(error = %err, "deadline sweep interrupted");
                        }
                        Err(err) => error!(error = %err, "deadline sweep failed"),
                    }
                }
                _ = ctx.cancelled() => {
                    info!("deadline sweep shutting down");
                    break;
                }
            }
        }
    }
}

/// Handle for stopping a running sweep.
#[derive(Debug)]
pub struct SweeperHandle {
    cancel: CancelHandle,
    task_handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the sweep and waits for the task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task_handle.await;
        info!("deadline sweep stopped");
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ElectionMethod, MealName, MealPlanCreationInput, MealPlanEventCreationInput,
        MealPlanOptionCreationInput, MealPlanStatus,
    };
    use crate::store::{MemoryStore, VotingStore};
    use crate::NoopPublisher;
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_finalizes_expired_plans_until_stopped() {
        let store = MemoryStore::new();
        let engine = VotingEngine::new(Arc::new(store.clone()), Arc::new(NoopPublisher));
        let ctx = Context::background();
        let now = Utc::now();
        let plan = engine
            .create_meal_plan(
                &ctx,
                "household",
                MealPlanCreationInput {
                    notes: String::new(),
                    voting_deadline: now - chrono::Duration::hours(1),
                    election_method: ElectionMethod::Schulze,
                    starts_at: now,
                    ends_at: now + chrono::Duration::days(1),
                    events: vec![MealPlanEventCreationInput {
                        day: 0,
                        meal_name: MealName::Breakfast,
                        notes: String::new(),
                        starts_at: now,
                        ends_at: now + chrono::Duration::hours(1),
                        options: vec![MealPlanOptionCreationInput {
                            meal_id: "porridge".into(),
                            notes: String::new(),
                        }],
                    }],
                },
            )
            .await
            .unwrap();

        let handle = Sweeper::new(engine, Duration::from_secs(60)).start();
        let mut status = MealPlanStatus::AwaitingVotes;
        for _ in 0..100 {
            status = store.get_meal_plan(&ctx, &plan.id).await.unwrap().status;
            if status == MealPlanStatus::Finalized {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, MealPlanStatus::Finalized);

        assert!(handle.is_running());
        handle.stop().await;
    }
}
