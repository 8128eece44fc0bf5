//! State change notifications from the vault service.
//!
//! The service pushes its state outward after each successful transition;
//! how the application propagates it (UI store, IPC, logs) is up to the
//! [`StateBroadcaster`] implementation.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::identity::Identity;

/// A single state change, as carried by [`ChannelBroadcaster`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum StateEvent {
    IdentitiesChanged(Vec<Identity>),
    SelectedIdentityChanged(Option<Identity>),
    UnlockedChanged(bool),
}

/// Receiver of vault state changes.
#[async_trait]
pub trait StateBroadcaster: Send + Sync {
    /// The stored identity list changed.
    async fn identities_changed(&self, identities: Vec<Identity>);

    /// The current identity changed.
    async fn selected_identity_changed(&self, identity: Option<Identity>);

    /// The vault was unlocked or locked.
    async fn unlocked_changed(&self, unlocked: bool);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBroadcaster;

#[async_trait]
impl StateBroadcaster for NoopBroadcaster {
    async fn identities_changed(&self, _identities: Vec<Identity>) {}

    async fn selected_identity_changed(&self, _identity: Option<Identity>) {}

    async fn unlocked_changed(&self, _unlocked: bool) {}
}

/// Fans notifications out over a tokio broadcast channel.
///
/// Events sent while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<StateEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: StateEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("state event dropped: no subscribers");
        }
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl StateBroadcaster for ChannelBroadcaster {
    async fn identities_changed(&self, identities: Vec<Identity>) {
        self.send(StateEvent::IdentitiesChanged(identities));
    }

    async fn selected_identity_changed(&self, identity: Option<Identity>) {
        self.send(StateEvent::SelectedIdentityChanged(identity));
    }

    async fn unlocked_changed(&self, unlocked: bool) {
        self.send(StateEvent::UnlockedChanged(unlocked));
    }
}
