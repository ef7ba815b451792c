//! Session notifications
//!
//! The client has no UI. When a session ends for good it tells the
//! application through a [`SessionExpiredNotifier`], and the application
//! decides how to send the user back to the login screen.

use super::classifier::AccountState;
use tokio::sync::broadcast;

/// Receives session lifecycle signals
pub trait SessionExpiredNotifier: Send + Sync {
    /// A refresh episode failed; the user must sign in again
    fn session_expired(&self);

    /// The credential was dropped because of the account's state
    fn credential_cleared(&self, _state: AccountState) {}
}

impl<F> SessionExpiredNotifier for F
where
    F: Fn() + Send + Sync,
{
    fn session_expired(&self) {
        self();
    }
}

/// Notifier that ignores every signal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl SessionExpiredNotifier for NoopNotifier {
    fn session_expired(&self) {}
}

/// Session event published by [`BroadcastNotifier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Refresh failed, credential cleared
    Expired,
    /// Credential cleared because of the account's state
    CredentialCleared(AccountState),
}

/// Fans session events out to any number of subscribers
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastNotifier {
    /// Create a notifier buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

impl SessionExpiredNotifier for BroadcastNotifier {
    fn session_expired(&self) {
        self.publish(SessionEvent::Expired);
    }

    fn credential_cleared(&self, state: AccountState) {
        self.publish(SessionEvent::CredentialCleared(state));
    }
}
