use super::*;
use crate::api::websocket::error_sanitizer::sanitize_error;
use crate::use_cases::{NoRecipients, PublishError};

use rollreq_domain::RollGroup;
use rollreq_shared::StyleSettings;

pub(super) async fn handle_publish(
    state: &WsState,
    connection_id: Uuid,
    groups: Vec<RollGroup>,
    recipients: Option<Vec<ParticipantId>>,
) -> Option<ServerMessage> {
    let (info, user_id) = match require_joined(state, connection_id).await {
        Ok(joined) => joined,
        Err(e) => return Some(e),
    };
    if let Err(e) = require_gm(&info) {
        return Some(e);
    }

    match state
        .app
        .use_cases
        .publish
        .publish(&user_id, groups, recipients)
        .await
    {
        Ok(result) => {
            let request_id = result.request.id;
            state.app.stores.requests.insert(result.request);
            Some(ServerMessage::Published {
                request_id,
                history_entry_id: result.history_entry_id,
                close_composer: result.close_composer,
                open_results: result.open_results,
            })
        }
        Err(e) => Some(publish_error_response(e, "publishing the roll request")),
    }
}

pub(super) async fn handle_announce(
    state: &WsState,
    connection_id: Uuid,
    groups: Vec<RollGroup>,
) -> Option<ServerMessage> {
    let (info, user_id) = match require_joined(state, connection_id).await {
        Ok(joined) => joined,
        Err(e) => return Some(e),
    };
    if let Err(e) = require_gm(&info) {
        return Some(e);
    }

    match state.app.use_cases.publish.announce(&user_id, groups).await {
        Ok(result) => Some(ServerMessage::Announced {
            history_entry_id: result.history_entry_id,
            close_composer: result.close_composer,
        }),
        Err(e) => Some(publish_error_response(e, "announcing the rolls")),
    }
}

pub(super) async fn handle_update_style(
    state: &WsState,
    connection_id: Uuid,
    style: StyleSettings,
) -> Option<ServerMessage> {
    let (info, user_id) = match require_joined(state, connection_id).await {
        Ok(joined) => joined,
        Err(e) => return Some(e),
    };
    if let Err(e) = require_gm(&info) {
        return Some(e);
    }

    match state
        .app
        .use_cases
        .publish
        .publish_style(&user_id, style)
        .await
    {
        Ok(()) => None,
        Err(e) => Some(publish_error_response(e, "updating the style")),
    }
}

/// Precondition failures become warnings; everything else is an error.
fn publish_error_response(error: PublishError, context: &str) -> ServerMessage {
    match &error {
        PublishError::EmptyContent => warning_response("EMPTY_CONTENT", &error.to_string()),
        PublishError::NoRecipients(NoRecipients::NobodyChosen) => {
            warning_response("NO_RECIPIENTS", &error.to_string())
        }
        PublishError::NoRecipients(NoRecipients::NobodyReachable) => {
            warning_response("NOBODY_REACHABLE", &error.to_string())
        }
        PublishError::InvalidContent(_) => {
            warning_response("INVALID_CONTENT", &error.to_string())
        }
        PublishError::Broadcast(_) => {
            error_response("DELIVERY_FAILED", &sanitize_error(&error, context))
        }
        PublishError::History(_) | PublishError::Settings(_) => {
            error_response("INTERNAL", &sanitize_error(&error, context))
        }
    }
}
