//! In-process outcome bus.
//!
//! Check results reported by clients are published here. Subscribers get
//! a live `broadcast` receiver plus the most recent events, taken under the
//! same lock so nothing falls between replay and live delivery.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use rollreq_domain::OutcomeEvent;

use crate::infrastructure::ports::{OutcomeSource, OutcomeSubscription};

/// Events kept for replay.
const RECENT_CAPACITY: usize = 50;

pub struct OutcomeBus {
    sender: broadcast::Sender<OutcomeEvent>,
    recent: Mutex<VecDeque<OutcomeEvent>>,
}

impl OutcomeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            recent: Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY)),
        }
    }

    pub async fn publish(&self, event: OutcomeEvent) {
        let mut recent = self.recent.lock().await;
        if recent.len() == RECENT_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(event.clone());

        // No receivers is fine: nobody is watching results right now.
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::debug!(receivers, "Outcome event published");
    }
}

#[async_trait]
impl OutcomeSource for OutcomeBus {
    async fn subscribe(&self, replay: usize) -> OutcomeSubscription {
        let recent = self.recent.lock().await;
        let skip = recent.len().saturating_sub(replay);
        OutcomeSubscription {
            replay: recent.iter().skip(skip).cloned().collect(),
            live: self.sender.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollreq_domain::{DegreeOfSuccess, ParticipantId, RecordId, RequestId, RollItemId};

    fn event(record: &str) -> OutcomeEvent {
        OutcomeEvent::result(
            RequestId::new(),
            RollItemId::new(),
            ParticipantId::new("u1"),
            RecordId::new(record),
            Some(DegreeOfSuccess::Success),
        )
    }

    #[tokio::test]
    async fn replay_returns_latest_events_oldest_first() {
        let bus = OutcomeBus::new(16);
        for i in 0..5 {
            bus.publish(event(&format!("m{i}"))).await;
        }

        let subscription = bus.subscribe(3).await;
        let records: Vec<&str> = subscription
            .replay
            .iter()
            .map(|e| e.record_id.as_str())
            .collect();
        assert_eq!(records, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn live_events_follow_replay_without_overlap() {
        let bus = OutcomeBus::new(16);
        bus.publish(event("old")).await;

        let mut subscription = bus.subscribe(10).await;
        bus.publish(event("new")).await;

        assert_eq!(subscription.replay.len(), 1);
        let live = subscription.live.recv().await.unwrap();
        assert_eq!(live.record_id.as_str(), "new");
    }

    #[tokio::test]
    async fn recent_buffer_is_bounded() {
        let bus = OutcomeBus::new(4);
        for i in 0..(RECENT_CAPACITY + 5) {
            bus.publish(event(&format!("m{i}"))).await;
        }
        let subscription = bus.subscribe(usize::MAX).await;
        assert_eq!(subscription.replay.len(), RECENT_CAPACITY);
        assert_eq!(subscription.replay[0].record_id.as_str(), "m5");
    }
}
