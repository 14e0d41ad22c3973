//! Helpers shared by unit tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::Value;

use std::time::Duration;

use crate::session::{Navigator, SessionGuard};

/// Builds an unsigned JWT carrying `payload`.
pub fn make_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// Waits until `guard` has no redirect pending, panicking after five seconds.
pub async fn wait_for_redirect(guard: &SessionGuard) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while guard.redirect_pending() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("redirect did not fire in time");
}

/// Navigator that remembers where it was sent.
#[derive(Default)]
pub struct RecordingNavigator {
    pub route: Mutex<String>,
    pub visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(route: &str) -> Self {
        Self {
            route: Mutex::new(route.to_string()),
            visits: Mutex::new(Vec::new()),
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_route(&self) -> String {
        self.route.lock().clone()
    }

    fn navigate(&self, route: &str) {
        *self.route.lock() = route.to_string();
        self.visits.lock().push(route.to_string());
    }
}
