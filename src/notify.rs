//! Notification hand-off
//!
//! Delivery is the platform's job; the core only says what to show.

/// Fire-and-forget notification sink
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str, id: u32);
}

/// Notification id used when the session is invalidated by the backend
pub const SESSION_EXPIRED_ID: u32 = 1;

/// Writes notifications to the log; used when no platform sink is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, body: &str, id: u32) {
        tracing::info!(id, title, body, "Notification");
    }
}
