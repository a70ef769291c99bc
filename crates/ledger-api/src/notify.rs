//! The notification-engine boundary: a default-no-op listener trait plus a
//! small broadcast bus, giving the five lifecycle hooks a concrete shape so
//! that fatal state-error escalation has somewhere to go.

use async_trait::async_trait;
use std::sync::Arc;

/// A reason an inconsistent-state signature notification was raised.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IssReport {
    pub round: u64,
    pub reason: String,
}

/// Listens for lifecycle events the core or its host platform raise.
/// Every hook defaults to a no-op so implementors only override what they
/// care about.
#[async_trait]
pub trait NotificationListener: Send + Sync {
    async fn state_write_to_disk_complete(&self, _round: u64) {}
    async fn reconnect_complete(&self, _round: u64) {}
    async fn new_signed_state(&self, _round: u64) {}
    async fn platform_status_change(&self, _status: &str) {}
    async fn iss(&self, _report: &IssReport) {}
}

/// Fans a notification out to every registered listener, in registration
/// order — deterministic, like everything else the round executor touches.
#[derive(Default)]
pub struct NotificationBus {
    listeners: Vec<Arc<dyn NotificationListener>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn NotificationListener>) {
        self.listeners.push(listener);
    }

    pub async fn notify_iss(&self, report: IssReport) {
        for listener in &self.listeners {
            listener.iss(&report).await;
        }
    }

    pub async fn notify_state_write_to_disk_complete(&self, round: u64) {
        for listener in &self.listeners {
            listener.state_write_to_disk_complete(round).await;
        }
    }

    pub async fn notify_reconnect_complete(&self, round: u64) {
        for listener in &self.listeners {
            listener.reconnect_complete(round).await;
        }
    }

    pub async fn notify_new_signed_state(&self, round: u64) {
        for listener in &self.listeners {
            listener.new_signed_state(round).await;
        }
    }

    pub async fn notify_platform_status_change(&self, status: &str) {
        for listener in &self.listeners {
            listener.platform_status_change(status).await;
        }
    }
}
