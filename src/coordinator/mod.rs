//! Edit-sync state machine.
//!
//! Pure: every transition returns the effects to apply (indicator changes,
//! location updates) instead of touching the page itself.
//!
//! Saves carry no correlation id. An acknowledgement is applied to whatever
//! state the client is in when it arrives, so a late acknowledgement for an
//! older edit can still rename the visible location.

use crate::config::SavedIndicator;
use crate::error::SyncError;
use crate::indicators::Indicator;
use crate::models::{AckMessage, DocumentIdentity, EditPayload, SaveAck};
use crate::slug::slugify;
use crate::transport::TransportEvent;
use crate::util::normalize_line_breaks;
use leptos::logging::{log, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// A save went out and no acknowledgement has arrived since. Further
    /// saves are not blocked.
    PendingAck,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Show(Indicator),
    Hide(Indicator),
    Flash {
        indicator: Indicator,
        duration_ms: i32,
    },
    /// Point the address bar and title at an acknowledged name.
    Reconcile {
        name: String,
        domain: String,
    },
}

/// How an acknowledgement was read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AckOutcome {
    /// Stored under the slug the client proposed.
    Saved { name: String },
    /// Slug was taken; the server kept the document under its id.
    SlugCollisionResolved { name: String },
    Rejected,
    Ignored,
}

pub fn interpret(ack: &SaveAck) -> AckOutcome {
    match ack.message {
        AckMessage::UniqueSlug if ack.success => AckOutcome::Saved {
            name: ack.slug.clone(),
        },
        AckMessage::UniqueSlug => AckOutcome::SlugCollisionResolved {
            name: ack.id.clone(),
        },
        AckMessage::NotSaving => AckOutcome::Rejected,
        AckMessage::Other => AckOutcome::Ignored,
    }
}

/// A save ready to go out, plus what to show for it right away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub payload: EditPayload,
    pub effects: Vec<Effect>,
}

#[derive(Clone, Debug)]
pub struct CoordinatorOptions {
    pub saved_indicator: SavedIndicator,
    pub indicator_ms: i32,
    pub connected_flash_ms: i32,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            saved_indicator: SavedIndicator::OnAck,
            indicator_ms: 1000,
            connected_flash_ms: 1000,
        }
    }
}

pub struct SyncCoordinator {
    identity: DocumentIdentity,
    options: CoordinatorOptions,
    state: SyncState,
    last_acknowledged: Option<String>,
    commits: u64,
}

impl SyncCoordinator {
    pub fn new(identity: DocumentIdentity, options: CoordinatorOptions) -> Self {
        Self {
            identity,
            options,
            state: SyncState::Idle,
            last_acknowledged: None,
            commits: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn identity(&self) -> &DocumentIdentity {
        &self.identity
    }

    /// Last name the server acknowledged, never a local candidate.
    pub fn last_acknowledged(&self) -> Option<&str> {
        self.last_acknowledged.as_deref()
    }

    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Build the save for the buffer as it is right now.
    pub fn on_edit(&mut self, buffer: &str) -> Commit {
        let data = normalize_line_breaks(buffer);
        let slug = slugify(&data);
        let payload = EditPayload::new(&self.identity, slug, data);

        self.state = SyncState::PendingAck;
        self.commits += 1;

        let effects = match self.options.saved_indicator {
            SavedIndicator::OnSend => vec![self.flash(Indicator::Saved)],
            SavedIndicator::OnAck => vec![],
        };

        Commit { payload, effects }
    }

    /// Raw inbound frame. Frames that do not parse are logged and dropped.
    pub fn on_message(&mut self, raw: &str) -> Vec<Effect> {
        match SaveAck::from_json(raw) {
            Ok(ack) => self.on_ack(&ack),
            Err(e) => {
                warn!("[sync] dropping malformed message: {e}");
                vec![]
            }
        }
    }

    pub fn on_ack(&mut self, ack: &SaveAck) -> Vec<Effect> {
        let outcome = interpret(ack);
        let name = match outcome {
            AckOutcome::Saved { name } => name,
            AckOutcome::SlugCollisionResolved { name } => {
                log!("[sync] slug {:?} is taken, keeping {:?}", ack.slug, name);
                name
            }
            AckOutcome::Rejected => {
                self.state = SyncState::Idle;
                log!("[sync] {}", SyncError::save_rejected());
                return vec![self.flash(Indicator::NotSaved)];
            }
            AckOutcome::Ignored => return vec![],
        };

        self.state = SyncState::Idle;

        let mut effects = Vec::with_capacity(2);
        if !name.is_empty() {
            self.last_acknowledged = Some(name.clone());
            effects.push(Effect::Reconcile {
                name,
                domain: self.identity.domain.clone(),
            });
        }
        if self.options.saved_indicator == SavedIndicator::OnAck {
            effects.push(self.flash(Indicator::Saved));
        }
        effects
    }

    pub fn on_transport_event(&mut self, event: &TransportEvent) -> Vec<Effect> {
        match event {
            TransportEvent::Opened => vec![
                Effect::Hide(Indicator::Disconnected),
                Effect::Flash {
                    indicator: Indicator::Connected,
                    duration_ms: self.options.connected_flash_ms,
                },
            ],
            TransportEvent::Message(raw) => self.on_message(raw),
            TransportEvent::Closed { was_open } => {
                // Whatever was in flight is gone with the socket.
                self.state = SyncState::Idle;
                if *was_open {
                    vec![Effect::Show(Indicator::Disconnected)]
                } else {
                    vec![]
                }
            }
        }
    }

    fn flash(&self, indicator: Indicator) -> Effect {
        Effect::Flash {
            indicator,
            duration_ms: self.options.indicator_ms,
        }
    }
}
