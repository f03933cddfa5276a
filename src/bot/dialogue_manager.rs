//! Dialogue Manager module: drives the bet slip conversation
//!
//! The manager owns the I/O around [`crate::dialogue::transition`]: it runs
//! the extraction request for screenshots, reads the user's state from the
//! pending bet store, applies the resulting effects and performs the channel
//! post. It knows nothing about Telegram; the message handler translates
//! updates into [`InboundEvent`]s and sends the returned notices.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::dialogue::{transition, ConversationState, Effect, Event, Notice, Outcome, Phase, TransitionContext};
use crate::extraction::SlipExtractor;
use crate::extraction_errors::ExtractionError;
use crate::pending_store::{PendingBetStore, PhotoRef, UserId};

use super::publisher::ChannelPublisher;

/// Events delivered by the chat transport
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A screenshot, already normalized to PNG
    PhotoReceived {
        user_id: UserId,
        photo: PhotoRef,
        image_png: Vec<u8>,
    },
    /// A screenshot refused before extraction (too large, undecodable)
    PhotoRejected {
        user_id: UserId,
        photo: PhotoRef,
        error: ExtractionError,
    },
    /// A screenshot whose bytes could not be downloaded
    PhotoDownloadFailed {
        user_id: UserId,
    },
    TextReceived {
        user_id: UserId,
        text: String,
    },
    CancelCommand {
        user_id: UserId,
    },
    StartCommand {
        user_id: UserId,
    },
    HelpCommand {
        user_id: UserId,
    },
}

impl InboundEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            InboundEvent::PhotoReceived { user_id, .. }
            | InboundEvent::PhotoRejected { user_id, .. }
            | InboundEvent::PhotoDownloadFailed { user_id }
            | InboundEvent::TextReceived { user_id, .. }
            | InboundEvent::CancelCommand { user_id }
            | InboundEvent::StartCommand { user_id }
            | InboundEvent::HelpCommand { user_id } => *user_id,
        }
    }
}

/// Coordinates extraction, the pending bet store and the channel publisher
pub struct DialogueManager {
    store: Arc<PendingBetStore>,
    extractor: Arc<dyn SlipExtractor>,
    publisher: Arc<dyn ChannelPublisher>,
    channel: Option<String>,
}

impl DialogueManager {
    pub fn new(
        store: Arc<PendingBetStore>,
        extractor: Arc<dyn SlipExtractor>,
        publisher: Arc<dyn ChannelPublisher>,
        channel: Option<String>,
    ) -> Self {
        Self {
            store,
            extractor,
            publisher,
            channel,
        }
    }

    pub fn store(&self) -> &Arc<PendingBetStore> {
        &self.store
    }

    /// Handle one inbound event and return the replies for the user
    ///
    /// Every event yields at least one notice.
    pub async fn handle(&self, event: InboundEvent) -> Vec<Notice> {
        let user_id = event.user_id();

        match event {
            InboundEvent::PhotoReceived { photo, image_png, .. } => {
                debug!(user_id = %user_id, image_bytes = image_png.len(), "Screenshot received");
                // No store lock is held while the service works
                let result = self.extractor.extract(&image_png).await;
                self.step(user_id, Event::Extracted { photo, result }).await
            }
            InboundEvent::PhotoRejected { photo, error, .. } => {
                self.step(
                    user_id,
                    Event::Extracted {
                        photo,
                        result: Err(error),
                    },
                )
                .await
            }
            InboundEvent::PhotoDownloadFailed { .. } => self.step(user_id, Event::DownloadFailed).await,
            InboundEvent::TextReceived { text, .. } => self.step(user_id, Event::Text(&text)).await,
            InboundEvent::CancelCommand { .. } => self.step(user_id, Event::Cancel).await,
            InboundEvent::StartCommand { .. } => self.step(user_id, Event::Start).await,
            InboundEvent::HelpCommand { .. } => self.step(user_id, Event::Help).await,
        }
    }

    async fn step(&self, user_id: UserId, event: Event<'_>) -> Vec<Notice> {
        let state = ConversationState::from_pending(self.store.get(user_id));
        let ctx = TransitionContext {
            user_id,
            channel: self.channel.as_deref(),
            now: Utc::now(),
        };

        let outcome = transition(&state, event, &ctx);
        match outcome.phase {
            // The publish arm reports how a posting flow really ended
            Phase::Terminal(Outcome::Posted) => debug!(user_id = %user_id, "Stake accepted, publishing"),
            Phase::Terminal(result) => info!(user_id = %user_id, outcome = ?result, "Conversation finished"),
            phase => debug!(user_id = %user_id, phase = ?phase, "Conversation step"),
        }

        let mut notices = Vec::new();
        for effect in outcome.effects {
            self.apply(user_id, effect, &mut notices).await;
        }
        notices
    }

    async fn apply(&self, user_id: UserId, effect: Effect, notices: &mut Vec<Notice>) {
        match effect {
            Effect::SavePending(pending) => {
                info!(
                    user_id = %user_id,
                    sport = %pending.slip.sport,
                    legs = pending.slip.leg_count(),
                    "Stored pending bet"
                );
                self.store.insert(pending);
            }
            Effect::ClearPending => {
                if self.store.remove(user_id).is_some() {
                    debug!(user_id = %user_id, "Cleared pending bet");
                }
            }
            Effect::Publish {
                channel,
                photo,
                caption,
            } => {
                // Claiming the entry first makes the post happen at most once
                let Some(claimed) = self.store.remove(user_id) else {
                    warn!(user_id = %user_id, outcome = ?Outcome::Expired, "Pending bet vanished before posting");
                    notices.push(Notice::Expired);
                    return;
                };
                if claimed.photo != photo {
                    // The stake was typed for a slip that has since been replaced
                    warn!(
                        user_id = %user_id,
                        outcome = ?Outcome::Expired,
                        "Pending bet replaced before posting, keeping the newer one"
                    );
                    self.store.insert(claimed);
                    notices.push(Notice::Expired);
                    return;
                }

                match self.publisher.publish_photo(&channel, &claimed.photo, &caption).await {
                    Ok(()) => {
                        info!(user_id = %user_id, channel = %channel, outcome = ?Outcome::Posted, "Conversation finished");
                        notices.push(Notice::Posted);
                    }
                    Err(e) => {
                        error!(
                            user_id = %user_id,
                            channel = %channel,
                            error = %e,
                            "Conversation finished without posting, publish failed"
                        );
                        notices.push(Notice::PublishFailed(e.to_string()));
                    }
                }
            }
            Effect::Reply(notice) => notices.push(notice),
        }
    }
}
