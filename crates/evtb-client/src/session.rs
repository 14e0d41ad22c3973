//! Forced sign-out on rejected credentials.
//!
//! When a protected call comes back 401 the stored credential is dropped
//! and the front end is sent to the login route after a short grace
//! period. Only one redirect is pending at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::token::TokenManager;

/// Login route the front end is sent to.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Grace period before the redirect fires.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Front-end routing seam.
pub trait Navigator: Send + Sync {
    /// Route currently displayed.
    fn current_route(&self) -> String;

    /// Moves the front end to `route`.
    fn navigate(&self, route: &str);
}

/// Navigator for headless use. Never on any route, navigation does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_route(&self) -> String {
        String::new()
    }

    fn navigate(&self, route: &str) {
        tracing::debug!(route, "Navigation requested without a front end");
    }
}

/// Clears the session and schedules the login redirect on 401.
#[derive(Clone)]
pub struct SessionGuard {
    tokens: Arc<TokenManager>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    delay: Duration,
    redirect_pending: Arc<AtomicBool>,
}

impl SessionGuard {
    /// Creates a guard with the default login route and delay.
    pub fn new(tokens: Arc<TokenManager>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            tokens,
            navigator,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            delay: DEFAULT_REDIRECT_DELAY,
            redirect_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Uses a different login route.
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Uses a different grace period.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns whether a redirect is scheduled but has not fired yet.
    #[must_use]
    pub fn redirect_pending(&self) -> bool {
        self.redirect_pending.load(Ordering::SeqCst)
    }

    /// Handles a 401 from a protected endpoint.
    ///
    /// Always clears the stored credential. Returns `true` if this call
    /// scheduled the redirect. Must be called from within a tokio runtime.
    pub fn handle_unauthorized(&self) -> bool {
        self.tokens.clear_auth();

        if self.navigator.current_route() == self.login_route {
            tracing::debug!("Already on the login route, not redirecting");
            return false;
        }

        if self.redirect_pending.swap(true, Ordering::SeqCst) {
            tracing::debug!("Login redirect already pending");
            return false;
        }

        tracing::info!(
            route = %self.login_route,
            delay_ms = self.delay.as_millis(),
            "Session expired, scheduling login redirect"
        );

        let navigator = Arc::clone(&self.navigator);
        let route = self.login_route.clone();
        let delay = self.delay;
        let pending = Arc::clone(&self.redirect_pending);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(&route);
            pending.store(false, Ordering::SeqCst);
        });

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StoredCredential;
    use crate::storage::MemoryStore;
    use crate::test_support::RecordingNavigator;
    use crate::token::AuthState;

    fn signed_in() -> Arc<TokenManager> {
        let tokens = Arc::new(TokenManager::new(Arc::new(MemoryStore::new())));
        tokens.set_credential(&StoredCredential::new("abc")).unwrap();
        tokens
    }

    #[tokio::test(start_paused = true)]
    async fn test_redirect_scheduled_once() {
        let tokens = signed_in();
        let navigator = Arc::new(RecordingNavigator::default());
        *navigator.route.lock() = "/products".to_string();
        let guard = SessionGuard::new(tokens.clone(), navigator.clone());

        assert!(guard.handle_unauthorized());
        assert!(!guard.handle_unauthorized());
        assert!(!guard.handle_unauthorized());
        assert!(guard.redirect_pending());
        assert_eq!(tokens.get_token(), None);
        assert_eq!(tokens.auth_state(), AuthState::Unauthenticated);
        assert!(navigator.visits.lock().is_empty());

        tokio::time::sleep(DEFAULT_REDIRECT_DELAY + Duration::from_millis(10)).await;

        assert_eq!(*navigator.visits.lock(), vec!["/login".to_string()]);
        assert!(!guard.redirect_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_redirect_from_login_route() {
        let tokens = signed_in();
        let navigator = Arc::new(RecordingNavigator::default());
        *navigator.route.lock() = "/login".to_string();
        let guard = SessionGuard::new(tokens.clone(), navigator.clone());

        assert!(!guard.handle_unauthorized());
        assert_eq!(tokens.get_token(), None);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(navigator.visits.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_redirect_after_previous_fired() {
        let tokens = signed_in();
        let navigator = Arc::new(RecordingNavigator::default());
        let guard = SessionGuard::new(tokens, navigator.clone())
            .with_login_route("/dang-nhap")
            .with_delay(Duration::from_millis(100));

        assert!(guard.handle_unauthorized());
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Now on the login route: further 401s do not bounce.
        assert!(!guard.handle_unauthorized());

        *navigator.route.lock() = "/orders".to_string();
        assert!(guard.handle_unauthorized());
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(navigator.visits.lock().len(), 2);
    }
}
