// User-facing notifications; presentation is up to the implementor

use tracing::{info, warn};

pub trait Notifier: Send + Sync + 'static {
    fn success(&self, title: &str, detail: &str);

    fn error(&self, message: &str);
}

// Emits notifications as tracing events, for headless callers
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, title: &str, detail: &str) {
        info!(target: "listing_booking::notify", title, detail, "Success notification");
    }

    fn error(&self, message: &str) {
        warn!(target: "listing_booking::notify", error = message, "Error notification");
    }
}
