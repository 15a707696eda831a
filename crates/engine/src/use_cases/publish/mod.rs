//! Publishing roll requests.
//!
//! A publish either broadcasts a tracked `roll-request` to the chosen
//! players or posts the rolls as an announcement. In both cases a history
//! entry is recorded, and the history append and the outward delivery
//! succeed or fail together.

use std::sync::Arc;

use uuid::Uuid;

use rollreq_domain::{
    ensure_unique_item_ids, is_request_empty, render_announcement, DomainError, HistoryEntry,
    HistoryEntryId, LabelLookups, ParticipantId, RollGroup, RollRequest,
};
use rollreq_shared::{Announcement, SocketMessage, StyleSettings};

use crate::infrastructure::ports::{
    AnnouncementSink, BroadcastError, ClockPort, ParticipantDirectory, RollBroadcaster,
};
use crate::stores::{HistoryError, HistoryStore, StagedAppend};
use crate::use_cases::settings::{SettingsError, SettingsOps};

/// Why a request has nobody to go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRecipients {
    /// The GM deselected every player.
    NobodyChosen,
    /// None of the intended players is connected.
    NobodyReachable,
}

impl std::fmt::Display for NoRecipients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NoRecipients::NobodyChosen => "Select at least one player to send the request to",
            NoRecipients::NobodyReachable => "No players are connected to receive the request",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Add at least one roll before sending the request")]
    EmptyContent,
    #[error("{0}")]
    NoRecipients(NoRecipients),
    #[error("{0}")]
    InvalidContent(#[from] DomainError),
    #[error("History error: {0}")]
    History(#[from] HistoryError),
    #[error("Broadcast failed: {0}")]
    Broadcast(#[from] BroadcastError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Outcome of a tracked publish.
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub request: RollRequest,
    pub history_entry_id: HistoryEntryId,
    /// `gmDialog.autoClose`
    pub close_composer: bool,
    /// `showResultsDialog`
    pub open_results: bool,
}

#[derive(Debug, Clone)]
pub struct AnnounceResult {
    pub announcement: Announcement,
    pub history_entry_id: HistoryEntryId,
    pub close_composer: bool,
}

pub struct Publisher {
    broadcaster: Arc<dyn RollBroadcaster>,
    announcements: Arc<dyn AnnouncementSink>,
    directory: Arc<dyn ParticipantDirectory>,
    history: Arc<HistoryStore>,
    settings: Arc<SettingsOps>,
    clock: Arc<dyn ClockPort>,
    lookups: LabelLookups,
}

impl Publisher {
    pub fn new(
        broadcaster: Arc<dyn RollBroadcaster>,
        announcements: Arc<dyn AnnouncementSink>,
        directory: Arc<dyn ParticipantDirectory>,
        history: Arc<HistoryStore>,
        settings: Arc<SettingsOps>,
        clock: Arc<dyn ClockPort>,
        lookups: LabelLookups,
    ) -> Self {
        Self {
            broadcaster,
            announcements,
            directory,
            history,
            settings,
            clock,
            lookups,
        }
    }

    /// Broadcast a tracked roll request.
    ///
    /// `recipients: None` sends to every connected player. Chosen players
    /// who are not connected are left out.
    pub async fn publish(
        &self,
        sender: &ParticipantId,
        groups: Vec<RollGroup>,
        recipients: Option<Vec<ParticipantId>>,
    ) -> Result<PublishResult, PublishError> {
        if is_request_empty(&groups) {
            return Err(PublishError::EmptyContent);
        }
        ensure_unique_item_ids(&groups)?;
        let recipients = self.resolve_recipients(recipients).await?;

        let request = RollRequest::new(groups, recipients);
        let entry = HistoryEntry::new(&request.groups, self.clock.now()).for_request(request.id);
        let history_entry_id = entry.id;

        let staged = self.history.stage(entry).await?;
        let message = SocketMessage::RollRequest {
            id: request.id,
            groups: request.groups.clone(),
            users: request.recipients.clone(),
        };
        if let Err(e) = self.broadcaster.emit(sender, message).await {
            rollback(staged).await;
            return Err(e.into());
        }
        staged.commit();

        tracing::info!(
            request_id = %request.id,
            recipients = request.recipients.len(),
            items = request.item_count(),
            "Roll request published"
        );

        Ok(PublishResult {
            history_entry_id,
            close_composer: self.settings.close_composer_after_publish().await,
            open_results: self.settings.open_results_after_publish().await,
            request,
        })
    }

    /// Post the rolls as an announcement. Nothing is tracked.
    pub async fn announce(
        &self,
        sender: &ParticipantId,
        groups: Vec<RollGroup>,
    ) -> Result<AnnounceResult, PublishError> {
        if is_request_empty(&groups) {
            return Err(PublishError::EmptyContent);
        }

        let announcement = Announcement {
            id: Uuid::new_v4(),
            author_id: sender.clone(),
            content: render_announcement(&groups, &self.lookups),
            groups,
        };
        let entry = HistoryEntry::new(&announcement.groups, self.clock.now());
        let history_entry_id = entry.id;

        let staged = self.history.stage(entry).await?;
        if let Err(e) = self.announcements.create(announcement.clone()).await {
            rollback(staged).await;
            return Err(e.into());
        }
        staged.commit();

        tracing::info!(announcement_id = %announcement.id, "Rolls announced");

        Ok(AnnounceResult {
            announcement,
            history_entry_id,
            close_composer: self.settings.close_composer_after_publish().await,
        })
    }

    /// Save the world style and push it to every client.
    pub async fn publish_style(
        &self,
        sender: &ParticipantId,
        style: StyleSettings,
    ) -> Result<(), PublishError> {
        self.settings.update_style(&style).await?;
        self.broadcaster
            .emit(sender, SocketMessage::StyleUpdate { data: style })
            .await?;
        tracing::debug!(sender = %sender, "Style update published");
        Ok(())
    }

    async fn resolve_recipients(
        &self,
        recipients: Option<Vec<ParticipantId>>,
    ) -> Result<Vec<ParticipantId>, PublishError> {
        if recipients.as_ref().is_some_and(Vec::is_empty) {
            return Err(PublishError::NoRecipients(NoRecipients::NobodyChosen));
        }

        let active = self.directory.active_players().await;
        let reachable: Vec<ParticipantId> = match recipients {
            Some(chosen) => {
                let offline = chosen.iter().filter(|p| !active.contains(p)).count();
                if offline > 0 {
                    tracing::debug!(offline, "Leaving out players who are not connected");
                }
                chosen.into_iter().filter(|p| active.contains(p)).collect()
            }
            None => active,
        };

        if reachable.is_empty() {
            return Err(PublishError::NoRecipients(NoRecipients::NobodyReachable));
        }
        Ok(reachable)
    }
}

async fn rollback(staged: StagedAppend<'_>) {
    if let Err(e) = staged.rollback().await {
        tracing::error!(error = %e, "Failed to roll back history after delivery failure");
    }
}
