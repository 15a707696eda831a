//! Application state and composition.

use std::sync::Arc;

use rollreq_domain::RollCatalog;

use crate::api::ConnectionManager;
use crate::config::EngineConfig;
use crate::infrastructure::{
    clock::SystemClock,
    outcome_bus::OutcomeBus,
    ports::{ClockPort, SettingsStore},
};
use crate::stores::{HistoryError, HistoryStore, RequestStore};
use crate::use_cases;

/// Main application state.
///
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub stores: Stores,
    pub use_cases: UseCases,
    pub outcome_bus: Arc<OutcomeBus>,
    pub catalog: Arc<RollCatalog>,
    pub connections: Arc<ConnectionManager>,
}

pub struct Stores {
    pub history: Arc<HistoryStore>,
    pub requests: Arc<RequestStore>,
}

/// Container for all use cases.
pub struct UseCases {
    pub publish: use_cases::Publisher,
    pub results: use_cases::CorrelationEngine,
    pub settings: Arc<use_cases::SettingsOps>,
    pub share: use_cases::ShareOps,
}

impl App {
    pub async fn new(
        settings_store: Arc<dyn SettingsStore>,
        catalog: RollCatalog,
        connections: Arc<ConnectionManager>,
        config: &EngineConfig,
    ) -> Result<Self, HistoryError> {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        Self::with_clock(settings_store, catalog, connections, config, clock).await
    }

    pub async fn with_clock(
        settings_store: Arc<dyn SettingsStore>,
        catalog: RollCatalog,
        connections: Arc<ConnectionManager>,
        config: &EngineConfig,
        clock: Arc<dyn ClockPort>,
    ) -> Result<Self, HistoryError> {
        let history = Arc::new(HistoryStore::load(settings_store.clone()).await?);
        let requests = Arc::new(RequestStore::new(config.request_limit));
        let outcome_bus = Arc::new(OutcomeBus::new(config.outcome_bus_capacity));
        let settings = Arc::new(use_cases::SettingsOps::new(settings_store));

        let publish = use_cases::Publisher::new(
            connections.clone(),
            connections.clone(),
            connections.clone(),
            history.clone(),
            settings.clone(),
            clock,
            catalog.lookups(),
        );
        let results = use_cases::CorrelationEngine::new(outcome_bus.clone(), connections.clone());

        Ok(Self {
            stores: Stores { history, requests },
            use_cases: UseCases {
                publish,
                results,
                settings,
                share: use_cases::ShareOps::new(config.decode_policy),
            },
            outcome_bus,
            catalog: Arc::new(catalog),
            connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::mpsc;
    use uuid::Uuid;

    use crate::infrastructure::settings::InMemorySettingsStore;
    use rollreq_domain::{
        DegreeOfSuccess, ParticipantId, RecordId, RollGroup, RollItem, REQUEST_ID_OPTION,
        ROLL_ID_OPTION,
    };
    use rollreq_shared::{
        CheckResultReport, DecodePolicy, ParticipantRole, ServerMessage, SocketMessage,
    };

    async fn connect(
        connections: &ConnectionManager,
        user: &str,
        role: ParticipantRole,
    ) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(16);
        let id = Uuid::new_v4();
        connections.register(id, tx).await;
        connections
            .join(id, ParticipantId::new(user), user.to_string(), role)
            .await
            .unwrap();
        rx
    }

    #[tokio::test]
    async fn share_decoding_follows_config() {
        let config = EngineConfig {
            decode_policy: DecodePolicy::Strict,
            ..EngineConfig::default()
        };
        let app = App::new(
            Arc::new(InMemorySettingsStore::new()),
            RollCatalog::standard(),
            Arc::new(ConnectionManager::new()),
            &config,
        )
        .await
        .unwrap();
        assert_eq!(app.use_cases.share.policy(), DecodePolicy::Strict);
    }

    #[tokio::test]
    async fn published_request_collects_player_results() {
        let connections = Arc::new(ConnectionManager::new());
        let app = App::new(
            Arc::new(InMemorySettingsStore::new()),
            RollCatalog::standard(),
            connections.clone(),
            &EngineConfig::default(),
        )
        .await
        .unwrap();
        let _gm = connect(&connections, "gm", ParticipantRole::Gm).await;
        let mut player = connect(&connections, "amiri", ParticipantRole::Player).await;

        let groups = vec![RollGroup::titled("Ambush").with_item(RollItem::check("perception", 20))];
        let published = app
            .use_cases
            .publish
            .publish(&ParticipantId::new("gm"), groups, None)
            .await
            .unwrap();
        app.stores.requests.insert(published.request.clone());
        assert!(published.open_results);

        let (request_id, item_id) = match player.try_recv().unwrap() {
            ServerMessage::Socket {
                message: SocketMessage::RollRequest { id, groups, .. },
                ..
            } => (id, groups[0].items[0].id),
            other => panic!("unexpected message: {other:?}"),
        };
        assert_eq!(request_id, published.request.id);

        let request = app.stores.requests.get(request_id).unwrap();
        let mut handle = app.use_cases.results.attach(request).await;

        let report = CheckResultReport {
            author_id: ParticipantId::new("amiri"),
            record_id: RecordId::new("msg-1"),
            outcome: Some("success".into()),
            is_reroll: false,
            options: vec![
                format!("{}{}", ROLL_ID_OPTION, item_id),
                format!("{}{}", REQUEST_ID_OPTION, request_id),
            ],
            deleted: false,
        };
        app.outcome_bus
            .publish(report.to_outcome_event().unwrap())
            .await;

        let snapshot = tokio::time::timeout(Duration::from_secs(1), handle.changed())
            .await
            .unwrap()
            .unwrap();
        let row = &snapshot.participants[0];
        assert_eq!(row.display_name, "amiri");
        assert_eq!(row.groups[0].outcome, Some(DegreeOfSuccess::Success));
        assert_eq!(app.stores.history.list().await.len(), 1);
    }
}
