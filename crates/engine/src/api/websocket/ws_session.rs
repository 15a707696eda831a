use super::*;

use rollreq_shared::ParticipantRole;

pub(super) async fn handle_join(
    state: &WsState,
    connection_id: Uuid,
    user_id: ParticipantId,
    name: String,
    role: ParticipantRole,
) -> Option<ServerMessage> {
    if user_id.as_str().trim().is_empty() {
        return Some(error_response("INVALID_ID", "User id must not be empty"));
    }

    match state
        .connections
        .join(connection_id, user_id.clone(), name, role)
        .await
    {
        Ok(()) => Some(ServerMessage::Joined { user_id, role }),
        Err(e) => Some(error_response("NOT_CONNECTED", &e.to_string())),
    }
}
