//! Single-flight refresh coordination
//!
//! A refresh episode starts with the first eligible 401 and ends when its one
//! refresh call settles. Every request that hits a 401 during the episode is
//! parked here as a [`PendingRequest`]; the episode drains the queue in the
//! order the 401s arrived.
//!
//! ```text
//!            401 (leader)                 refresh settled
//!   Idle ─────────────────▶ Refreshing ─────────────────────▶ Idle
//!                            │    ▲         (queue drained)
//!                            └────┘
//!                         401 (follower, queued)
//! ```
//!
//! The leader/follower decision and the enqueue happen under one lock, so
//! two callers can never both become leader.

use super::request::RequestDescriptor;
use super::transport::Response;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// A request waiting for the current episode to settle
#[derive(Debug)]
pub struct PendingRequest {
    /// The request to replay
    pub(crate) descriptor: RequestDescriptor,
    responder: oneshot::Sender<Result<Response>>,
}

impl PendingRequest {
    /// Create a pending request and the receiver its caller awaits
    pub(crate) fn new(
        descriptor: RequestDescriptor,
    ) -> (Self, oneshot::Receiver<Result<Response>>) {
        let (responder, receiver) = oneshot::channel();
        (
            Self {
                descriptor,
                responder,
            },
            receiver,
        )
    }

    /// Deliver the outcome to the waiting caller
    pub(crate) fn settle(self, outcome: Result<Response>) {
        // The caller may have given up; nothing to do then.
        let _ = self.responder.send(outcome);
    }
}

/// Role a caller takes when joining the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Opened the episode and must drive the refresh
    Leader,
    /// Queued behind an episode already in flight
    Follower,
}

#[derive(Debug)]
enum RefreshState {
    Idle,
    Refreshing(VecDeque<PendingRequest>),
}

/// Owns the refresh state machine for one client
#[derive(Debug)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Create an idle coordinator
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Queue a request, opening an episode if none is in flight
    pub(crate) fn enqueue(&self, pending: PendingRequest) -> Role {
        let mut state = self.state.lock();
        match &mut *state {
            RefreshState::Idle => {
                *state = RefreshState::Refreshing(VecDeque::from([pending]));
                Role::Leader
            }
            RefreshState::Refreshing(queue) => {
                queue.push_back(pending);
                Role::Follower
            }
        }
    }

    /// Close the episode, returning the queue in arrival order
    pub(crate) fn settle(&self) -> Vec<PendingRequest> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Idle => Vec::new(),
            RefreshState::Refreshing(queue) => queue.into(),
        }
    }

    /// Whether an episode is in flight
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing(_))
    }

    /// Number of requests parked in the current episode (leader included)
    pub fn pending_len(&self) -> usize {
        match &*self.state.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing(queue) => queue.len(),
        }
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod refresh_tests {
    use super::*;
    use crate::Error;

    fn pending(url: &str) -> (PendingRequest, oneshot::Receiver<Result<Response>>) {
        PendingRequest::new(RequestDescriptor::get(url))
    }

    #[test]
    fn test_first_caller_leads() {
        let coordinator = RefreshCoordinator::new();
        assert!(!coordinator.is_refreshing());

        let (a, _rx_a) = pending("/a");
        let (b, _rx_b) = pending("/b");
        let (c, _rx_c) = pending("/c");

        assert_eq!(coordinator.enqueue(a), Role::Leader);
        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.enqueue(b), Role::Follower);
        assert_eq!(coordinator.enqueue(c), Role::Follower);
        assert_eq!(coordinator.pending_len(), 3);
    }

    #[test]
    fn test_settle_drains_in_arrival_order() {
        let coordinator = RefreshCoordinator::new();
        for url in ["/a", "/b", "/c"] {
            let (p, _rx) = pending(url);
            coordinator.enqueue(p);
        }

        let drained: Vec<String> = coordinator
            .settle()
            .into_iter()
            .map(|p| p.descriptor.url)
            .collect();

        assert_eq!(drained, vec!["/a", "/b", "/c"]);
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.pending_len(), 0);
    }

    #[test]
    fn test_new_episode_after_settle() {
        let coordinator = RefreshCoordinator::new();
        let (a, _rx_a) = pending("/a");
        coordinator.enqueue(a);
        coordinator.settle();

        let (b, _rx_b) = pending("/b");
        assert_eq!(coordinator.enqueue(b), Role::Leader);
    }

    #[test]
    fn test_settle_when_idle_is_empty() {
        let coordinator = RefreshCoordinator::new();
        assert!(coordinator.settle().is_empty());
    }

    #[tokio::test]
    async fn test_pending_request_delivers_outcome() {
        let (p, rx) = pending("/a");
        p.settle(Err(Error::refresh_failed("nope")));

        let outcome = rx.await.unwrap();
        assert!(matches!(outcome, Err(Error::RefreshFailed { .. })));
    }

    #[test]
    fn test_pending_request_settle_after_receiver_dropped() {
        let (p, rx) = pending("/a");
        drop(rx);
        p.settle(Err(Error::refresh_failed("nobody listening")));
    }
}
