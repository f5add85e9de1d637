//! # Data-Change Bus
//!
//! Notifications emitted after a ballot or a finalization commits. Delivery is
//! at-most-once: a failed publish is reported to the caller but never rolls back the
//! change it describes.

use crate::error::{VotingError, VotingResult};
use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// What changed.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataChangeEventType {
    /// A ballot was stored.
    #[display("meal_plan_option_vote_created")]
    MealPlanOptionVoteCreated,
    /// An option was chosen for its event.
    #[display("meal_plan_option_finalized")]
    MealPlanOptionFinalized,
    /// A plan moved to `finalized`.
    #[display("meal_plan_finalized")]
    MealPlanFinalized,
}

/// One notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChangeMessage {
    /// What changed.
    pub event_type: DataChangeEventType,
    /// The plan concerned.
    #[serde(rename = "mealPlanID")]
    pub meal_plan_id: String,
    /// The event concerned, if any.
    #[serde(rename = "mealPlanEventID", skip_serializing_if = "Option::is_none")]
    pub meal_plan_event_id: Option<String>,
    /// The option concerned, if any.
    #[serde(rename = "mealPlanOptionID", skip_serializing_if = "Option::is_none")]
    pub meal_plan_option_id: Option<String>,
    /// The plan's household.
    #[serde(rename = "householdID")]
    pub household_id: String,
    /// The acting user; `None` for sweeps.
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl DataChangeMessage {
    /// A message about `meal_plan_id` with no event, option or user.
    pub fn new(
        event_type: DataChangeEventType,
        meal_plan_id: impl Into<String>,
        household_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            meal_plan_id: meal_plan_id.into(),
            meal_plan_event_id: None,
            meal_plan_option_id: None,
            household_id: household_id.into(),
            user_id: None,
        }
    }
}

/// Sink for data-change notifications.
#[async_trait]
pub trait DataChangePublisher: Send + Sync {
    /// Delivers `message`.
    async fn publish(&self, message: DataChangeMessage) -> VotingResult<()>;
}

/// Publishes into a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<DataChangeMessage>,
}

impl ChannelPublisher {
    /// A publisher and the receiving end of its channel.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DataChangeMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl DataChangePublisher for ChannelPublisher {
    async fn publish(&self, message: DataChangeMessage) -> VotingResult<()> {
        self.tx
            .send(message)
            .await
            .map_err(|e| VotingError::Publish(e.to_string()))
    }
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl DataChangePublisher for NoopPublisher {
    async fn publish(&self, _message: DataChangeMessage) -> VotingResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_publisher_delivers_in_order() {
        let (publisher, mut rx) = ChannelPublisher::new(4);
        publisher
            .publish(DataChangeMessage::new(
                DataChangeEventType::MealPlanOptionVoteCreated,
                "p",
                "h",
            ))
            .await
            .unwrap();
        publisher
            .publish(DataChangeMessage::new(DataChangeEventType::MealPlanFinalized, "p", "h"))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap().event_type,
            DataChangeEventType::MealPlanOptionVoteCreated
        );
        assert_eq!(
            rx.recv().await.unwrap().event_type,
            DataChangeEventType::MealPlanFinalized
        );
    }

    #[tokio::test]
    async fn test_closed_channel_is_a_publish_error() {
        let (publisher, rx) = ChannelPublisher::new(1);
        drop(rx);
        let err = publisher
            .publish(DataChangeMessage::new(DataChangeEventType::MealPlanFinalized, "p", "h"))
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::Publish(_)));
    }

    #[test]
    fn test_message_wire_shape() {
        let mut message =
            DataChangeMessage::new(DataChangeEventType::MealPlanOptionFinalized, "p", "h");
        message.meal_plan_option_id = Some("o".into());
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"eventType":"meal_plan_option_finalized","mealPlanID":"p","mealPlanOptionID":"o","householdID":"h"}"#
        );
    }
}
