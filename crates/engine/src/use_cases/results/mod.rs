//! Live results for published requests.
//!
//! `CorrelationEngine::attach` ties one request to the outcome stream: it
//! replays recent events, then follows the live feed on a background task
//! until the handle is detached or dropped.

mod tracker;

pub use tracker::{Applied, IgnoreReason, ItemResult, ResultTracker, UNKNOWN_PARTICIPANT};

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex};
use tokio_util::sync::CancellationToken;

use rollreq_domain::{OutcomeEvent, RollRequest};
use rollreq_shared::ResultsSnapshot;

use crate::infrastructure::ports::{OutcomeSource, ParticipantDirectory};

/// Past events fed to a newly attached engine.
pub const REPLAY_WINDOW: usize = 10;

pub struct CorrelationEngine {
    source: Arc<dyn OutcomeSource>,
    directory: Arc<dyn ParticipantDirectory>,
}

impl CorrelationEngine {
    pub fn new(source: Arc<dyn OutcomeSource>, directory: Arc<dyn ParticipantDirectory>) -> Self {
        Self { source, directory }
    }

    pub async fn attach(&self, request: RollRequest) -> ResultsHandle {
        let mut names = BTreeMap::new();
        for participant in &request.recipients {
            if let Some(name) = self.directory.display_name(participant).await {
                names.insert(participant.clone(), name);
            }
        }

        let request_id = request.id;
        let mut tracker = ResultTracker::new(request).with_names(names);
        let subscription = self.source.subscribe(REPLAY_WINDOW).await;
        for event in &subscription.replay {
            apply_logged(&mut tracker, event);
        }
        tracing::debug!(
            request_id = %request_id,
            replayed = subscription.replay.len(),
            "Results engine attached"
        );

        let (tx, rx) = watch::channel(tracker.snapshot());
        let tracker = Arc::new(Mutex::new(tracker));
        let cancel = CancellationToken::new();

        tokio::spawn(follow(
            tracker.clone(),
            subscription.live,
            tx,
            cancel.clone(),
        ));

        ResultsHandle {
            tracker,
            snapshots: rx,
            cancel,
        }
    }
}

fn apply_logged(tracker: &mut ResultTracker, event: &OutcomeEvent) -> Applied {
    let applied = tracker.apply(event);
    if let Applied::Ignored(reason) = applied {
        tracing::debug!(
            request_id = %tracker.request().id,
            event_request_id = %event.request_id,
            participant = %event.participant_id,
            reason = reason.as_str(),
            "Outcome ignored"
        );
    }
    applied
}

async fn follow(
    tracker: Arc<Mutex<ResultTracker>>,
    mut live: broadcast::Receiver<OutcomeEvent>,
    tx: watch::Sender<ResultsSnapshot>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Results engine detached");
                break;
            }
            received = live.recv() => match received {
                Ok(event) => {
                    let mut tracker = tracker.lock().await;
                    if apply_logged(&mut tracker, &event).changed_results() {
                        tx.send_replace(tracker.snapshot());
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Results engine fell behind the outcome stream");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Outcome stream closed");
                    break;
                }
            }
        }
    }
}

/// A running results view. Dropping it stops the engine.
pub struct ResultsHandle {
    tracker: Arc<Mutex<ResultTracker>>,
    snapshots: watch::Receiver<ResultsSnapshot>,
    cancel: CancellationToken,
}

impl ResultsHandle {
    pub fn current_results(&self) -> ResultsSnapshot {
        self.snapshots.borrow().clone()
    }

    pub async fn item_results(&self) -> Vec<ItemResult> {
        self.tracker.lock().await.item_results()
    }

    /// Wait for the next change. `None` once the engine has stopped.
    pub async fn changed(&mut self) -> Option<ResultsSnapshot> {
        self.snapshots.changed().await.ok()?;
        Some(self.snapshots.borrow_and_update().clone())
    }

    pub fn detach(&self) {
        self.cancel.cancel();
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for ResultsHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::infrastructure::outcome_bus::OutcomeBus;
    use crate::infrastructure::ports::MockParticipantDirectory;
    use rollreq_domain::{
        DegreeOfSuccess, ParticipantId, RecordId, RollGroup, RollItem, RollItemId,
    };

    fn request() -> (RollRequest, RollItemId) {
        let item = RollItem::check("stealth", 18);
        let item_id = item.id;
        let request = RollRequest::new(
            vec![RollGroup::titled("Sneak").with_item(item)],
            [ParticipantId::new("p1")],
        );
        (request, item_id)
    }

    fn directory() -> Arc<MockParticipantDirectory> {
        let mut directory = MockParticipantDirectory::new();
        directory
            .expect_display_name()
            .returning(|p| (p.as_str() == "p1").then(|| "Ezren".to_string()));
        Arc::new(directory)
    }

    fn success(request: &RollRequest, item: RollItemId, record: &str) -> OutcomeEvent {
        OutcomeEvent::result(
            request.id,
            item,
            ParticipantId::new("p1"),
            RecordId::new(record),
            Some(DegreeOfSuccess::Success),
        )
    }

    async fn next(handle: &mut ResultsHandle) -> ResultsSnapshot {
        tokio::time::timeout(Duration::from_secs(1), handle.changed())
            .await
            .expect("timed out waiting for results")
            .expect("engine stopped")
    }

    #[tokio::test]
    async fn replays_recent_events_on_attach() {
        let bus = Arc::new(OutcomeBus::new(16));
        let (request, item) = request();
        bus.publish(success(&request, item, "m1")).await;

        let engine = CorrelationEngine::new(bus.clone(), directory());
        let handle = engine.attach(request).await;

        let snapshot = handle.current_results();
        assert_eq!(snapshot.participants[0].display_name, "Ezren");
        assert_eq!(snapshot.participants[0].groups.len(), 1);
        assert_eq!(snapshot.applied_events, 1);
    }

    #[tokio::test]
    async fn live_events_update_results() {
        let bus = Arc::new(OutcomeBus::new(16));
        let (request, item) = request();
        let engine = CorrelationEngine::new(bus.clone(), directory());
        let mut handle = engine.attach(request.clone()).await;
        assert!(handle.current_results().participants[0].groups.is_empty());

        bus.publish(success(&request, item, "m1")).await;
        let snapshot = next(&mut handle).await;
        assert_eq!(
            snapshot.participants[0].groups[0].record_id,
            RecordId::new("m1")
        );

        bus.publish(OutcomeEvent::retraction(
            request.id,
            item,
            ParticipantId::new("p1"),
            RecordId::new("m1"),
        ))
        .await;
        let snapshot = next(&mut handle).await;
        assert!(snapshot.participants[0].groups.is_empty());
        assert!(handle.item_results().await.is_empty());
    }

    #[tokio::test]
    async fn ignored_events_do_not_notify() {
        let bus = Arc::new(OutcomeBus::new(16));
        let (other, _) = request();
        let (request, item) = request();
        let engine = CorrelationEngine::new(bus.clone(), directory());
        let mut handle = engine.attach(request.clone()).await;

        bus.publish(success(&other, item, "x")).await;
        bus.publish(success(&request, item, "m1")).await;

        let snapshot = next(&mut handle).await;
        assert_eq!(snapshot.applied_events, 1);
        assert_eq!(snapshot.ignored_events, 1);
    }

    #[tokio::test]
    async fn detach_stops_updates() {
        let bus = Arc::new(OutcomeBus::new(16));
        let (request, item) = request();
        let engine = CorrelationEngine::new(bus.clone(), directory());
        let mut handle = engine.attach(request.clone()).await;

        handle.detach();
        assert!(handle.is_detached());
        assert!(handle.changed().await.is_none());

        bus.publish(success(&request, item, "late")).await;
        assert!(handle.current_results().participants[0].groups.is_empty());
    }

    #[tokio::test]
    async fn unnamed_recipient_shows_unknown() {
        let bus = Arc::new(OutcomeBus::new(16));
        let request = RollRequest::new(
            vec![RollGroup::new().with_item(RollItem::new_check())],
            [ParticipantId::new("ghost")],
        );
        let engine = CorrelationEngine::new(bus, directory());
        let handle = engine.attach(request).await;
        assert_eq!(
            handle.current_results().participants[0].display_name,
            UNKNOWN_PARTICIPANT
        );
    }
}
