use super::*;

use rollreq_shared::CheckResultReport;

use crate::api::websocket::error_sanitizer::messages;

pub(super) async fn handle_report_outcome(
    state: &WsState,
    connection_id: Uuid,
    mut report: CheckResultReport,
) -> Option<ServerMessage> {
    let (_, user_id) = match require_joined(state, connection_id).await {
        Ok(joined) => joined,
        Err(e) => return Some(e),
    };
    report.author_id = user_id;

    match report.to_outcome_event() {
        Some(event) => {
            tracing::debug!(
                request_id = %event.request_id,
                item_id = %event.item_id,
                participant = %event.participant_id,
                retraction = event.is_retraction,
                "Outcome reported"
            );
            state.app.outcome_bus.publish(event).await;
        }
        None => {
            tracing::trace!(record_id = %report.record_id, "Untracked check result");
        }
    }
    None
}

pub(super) async fn handle_watch_results(
    state: &WsState,
    connection_id: Uuid,
    request_id: RequestId,
    sender: mpsc::Sender<ServerMessage>,
) -> Option<ServerMessage> {
    let (info, _) = match require_joined(state, connection_id).await {
        Ok(joined) => joined,
        Err(e) => return Some(e),
    };
    if let Err(e) = require_gm(&info) {
        return Some(e);
    }

    let Some(request) = state.app.stores.requests.get(request_id) else {
        return Some(error_response("NOT_FOUND", messages::NOT_FOUND));
    };

    let mut handle = state.app.use_cases.results.attach(request).await;
    let cancel = CancellationToken::new();
    if let Some(previous) = state
        .watchers
        .insert((connection_id, request_id), cancel.clone())
    {
        previous.cancel();
    }

    let initial = ServerMessage::ResultsUpdated {
        request_id,
        results: handle.current_results(),
    };
    if sender.try_send(initial).is_err() {
        tracing::warn!(connection_id = %connection_id, "Failed to send initial results");
    }

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = handle.changed() => match changed {
                    Some(results) => {
                        let update = ServerMessage::ResultsUpdated { request_id, results };
                        if sender.send(update).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        handle.detach();
        tracing::debug!(connection_id = %connection_id, request_id = %request_id, "Stopped watching results");
    });

    None
}

pub(super) fn handle_unwatch_results(
    state: &WsState,
    connection_id: Uuid,
    request_id: RequestId,
) -> Option<ServerMessage> {
    if let Some((_, cancel)) = state.watchers.remove(&(connection_id, request_id)) {
        cancel.cancel();
    }
    None
}

/// Stop every results view a connection holds.
pub(super) fn stop_watching_all(state: &WsState, connection_id: Uuid) {
    state.watchers.retain(|(watcher, _), cancel| {
        if *watcher == connection_id {
            cancel.cancel();
            false
        } else {
            true
        }
    });
}
