use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use poolsync_api::PoolId;

use crate::error::CoreError;
use crate::ports::{Notifier, RecommendationEvent};

/// Writes every notification to the log at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn trigger(&self, pool: &PoolId, event: &RecommendationEvent) -> Result<(), CoreError> {
        info!(
            pool = %pool,
            id = %event.id,
            recommendation = %event.recommendation,
            "new recommendation"
        );
        Ok(())
    }
}

/// A notification as delivered over a [`ChannelNotifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub pool: PoolId,
    #[serde(flatten)]
    pub event: RecommendationEvent,
}

/// Forwards notifications to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn trigger(&self, pool: &PoolId, event: &RecommendationEvent) -> Result<(), CoreError> {
        self.tx
            .send(Notification {
                pool: pool.clone(),
                event: event.clone(),
            })
            .map_err(|_| CoreError::Notification {
                message: "receiver dropped".into(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_delivers_and_reports_closed_receiver() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let event = RecommendationEvent {
            id: "1".into(),
            recommendation: "Shock: add chlorine".into(),
        };

        notifier.trigger(&PoolId::from("9"), &event).await.unwrap();
        let got = rx.recv().await.unwrap();
        assert_eq!(got.pool, PoolId::from("9"));
        assert_eq!(got.event, event);

        drop(rx);
        assert!(notifier.trigger(&PoolId::from("9"), &event).await.is_err());
    }
}
