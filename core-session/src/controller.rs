//! Session Controller
//!
//! Owns the session lifecycle: completing redirect sign-ins exactly once,
//! reacting to provider lifecycle events, and starting sign-in/sign-out.
//! All provider failures are converted into state transitions and log
//! lines; nothing here propagates raw provider errors to the UI.

use crate::context::SessionContext;
use crate::error::{Result, SessionError};
use crate::types::{AuthProgress, SessionState};
use async_trait::async_trait;
use bridge_traits::identity::{
    Identity, IdentityProvider, LifecycleEvent, LifecycleObserver, SubscriptionId,
};
use bridge_traits::navigation::Navigator;
use core_runtime::config::{DashboardConfig, RoutePaths};
use core_runtime::events::{CoreEvent, SessionEvent};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// User-presentable reason recorded when a sign-in flow fails. Provider
/// internals stay in the logs.
const SIGN_IN_FAILED_MESSAGE: &str = "Sign-in could not be completed. Please try again.";

/// Outcome of [`SessionController::complete_pending_redirect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectCompletion {
    /// The URL carried no provider response; nothing was done
    NoCallback,
    /// A redirect response was processed and the session is authenticated
    Completed,
    /// A redirect response was processed but sign-in failed
    Failed,
}

/// Coordinates the authentication session.
///
/// Construct once per application, then:
/// 1. [`bind_lifecycle_events`](Self::bind_lifecycle_events)
/// 2. [`complete_pending_redirect`](Self::complete_pending_redirect) on startup
/// 3. [`sign_in`](Self::sign_in) / [`sign_out`](Self::sign_out) on user action
/// 4. [`teardown`](Self::teardown) on shutdown
pub struct SessionController {
    provider: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    context: Arc<SessionContext>,
    routes: RoutePaths,
    sign_in_scopes: Vec<String>,
    /// Cached outcome; makes redirect completion exactly-once.
    redirect_outcome: Mutex<Option<RedirectCompletion>>,
    subscription: StdMutex<Option<SubscriptionId>>,
}

impl SessionController {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        context: Arc<SessionContext>,
        config: &DashboardConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            navigator,
            context,
            routes: config.routes.clone(),
            sign_in_scopes: config.sign_in_scopes.clone(),
            redirect_outcome: Mutex::new(None),
            subscription: StdMutex::new(None),
        })
    }

    /// Registers this controller for provider lifecycle events.
    ///
    /// Idempotent: a second call is refused so handlers never accumulate.
    /// Pair with [`teardown`](Self::teardown).
    pub fn bind_lifecycle_events(self: &Arc<Self>) {
        let mut subscription = match self.subscription.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if subscription.is_some() {
            warn!("Lifecycle events already bound, refusing duplicate registration");
            return;
        }

        let observer = Arc::new(LifecycleBridge {
            controller: Arc::downgrade(self),
        });
        *subscription = Some(self.provider.add_observer(observer));
        debug!("Lifecycle events bound");
    }

    /// Deregisters the lifecycle observer. Idempotent.
    pub fn teardown(&self) {
        let id = match self.subscription.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(id) = id {
            self.provider.remove_observer(id);
            debug!("Lifecycle events unbound");
        }
    }

    /// Completes a pending redirect sign-in, exactly once per process.
    ///
    /// - Without callback markers in the URL this is a no-op: no provider
    ///   call is made.
    /// - The outcome is cached; any later call returns it without touching
    ///   the provider again.
    /// - Failures degrade: the session lands in `Failed` and the user is
    ///   taken to the sign-in page. Nothing is thrown.
    #[instrument(skip(self))]
    pub async fn complete_pending_redirect(&self) -> RedirectCompletion {
        let mut outcome = self.redirect_outcome.lock().await;
        if let Some(cached) = *outcome {
            debug!(?cached, "Redirect already completed, returning cached outcome");
            return cached;
        }

        let location = self.navigator.current_location();
        if !location.carries_auth_callback() {
            debug!(path = %location.path, "No auth callback in URL");
            *outcome = Some(RedirectCompletion::NoCallback);
            return RedirectCompletion::NoCallback;
        }

        self.context
            .set_state(SessionState::InProgress(AuthProgress::RedirectPending))
            .await;
        self.emit(SessionEvent::SigningIn {
            flow: "redirect".to_string(),
        });

        let result = match self.provider.complete_redirect().await {
            Ok(Some(identity)) => {
                info!(subject = %identity.subject, "Redirect sign-in completed");
                self.context
                    .set_state(SessionState::Authenticated(identity.clone()))
                    .await;
                self.emit(SessionEvent::SignedIn {
                    subject: identity.subject,
                    username: identity.username,
                });
                self.navigate_after_sign_in().await;
                RedirectCompletion::Completed
            }
            Ok(None) => {
                // Markers in the URL but the provider had nothing pending
                // (stale bookmark, reused link). Treat as an ordinary load.
                debug!("Provider reported no pending redirect");
                self.context.set_state(SessionState::Unauthenticated).await;
                RedirectCompletion::NoCallback
            }
            Err(e) => {
                warn!(error = %e, "Redirect completion failed");
                self.handle_redirect_failure(&location.path).await
            }
        };

        *outcome = Some(result);
        result
    }

    async fn handle_redirect_failure(&self, current_path: &str) -> RedirectCompletion {
        // A duplicate callback can fail even though the account is signed
        // in; keep the session in that case.
        if let Some(identity) = self.provider.active_identity() {
            debug!(subject = %identity.subject, "Account still active after redirect failure");
            self.context
                .set_state(SessionState::Authenticated(identity))
                .await;
            return RedirectCompletion::Completed;
        }

        self.context
            .set_state(SessionState::Failed(SIGN_IN_FAILED_MESSAGE.to_string()))
            .await;
        self.emit(SessionEvent::AuthError {
            message: SIGN_IN_FAILED_MESSAGE.to_string(),
            recoverable: true,
        });

        if current_path != self.routes.sign_in {
            self.navigator.navigate(&self.routes.sign_in, true);
        }

        RedirectCompletion::Failed
    }

    /// Starts a redirect sign-in.
    ///
    /// `intent` is the destination to restore once sign-in completes; it is
    /// persisted before the redirect leaves the application.
    ///
    /// # Errors
    ///
    /// `SessionError::SignInInProgress` when a redirect is already pending,
    /// `SessionError::Provider` when the provider refuses to start the flow.
    #[instrument(skip(self))]
    pub async fn sign_in(&self, intent: Option<&str>) -> Result<()> {
        if matches!(
            self.context.state().await,
            SessionState::InProgress(AuthProgress::RedirectPending)
        ) {
            return Err(SessionError::SignInInProgress);
        }

        if let Some(path) = intent {
            // Losing the intent costs a navigation, not the sign-in.
            if let Err(e) = self.context.save_intent(path).await {
                warn!(error = %e, "Could not persist navigation intent");
            }
        }

        self.context
            .set_state(SessionState::InProgress(AuthProgress::RedirectPending))
            .await;
        self.emit(SessionEvent::SigningIn {
            flow: "redirect".to_string(),
        });

        if let Err(e) = self.provider.begin_sign_in(&self.sign_in_scopes).await {
            warn!(error = %e, "Provider refused to start sign-in");
            self.context.set_state(SessionState::Unauthenticated).await;
            self.emit(SessionEvent::AuthError {
                message: SIGN_IN_FAILED_MESSAGE.to_string(),
                recoverable: true,
            });
            return Err(SessionError::Provider(e.to_string()));
        }

        Ok(())
    }

    /// Signs the active account out.
    ///
    /// Cached tokens are dropped before delegating to the provider;
    /// navigation to the sign-in page happens on the provider's
    /// `SignOutCompleted` event.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        if let Err(e) = self.context.tokens().clear().await {
            warn!(error = %e, "Failed to clear token cache during sign-out");
        }
        // A pending intent belongs to the session being ended.
        self.context.take_intent().await;

        self.provider
            .sign_out(&self.routes.sign_in)
            .await
            .map_err(|e| SessionError::Provider(e.to_string()))?;

        self.context.set_state(SessionState::Unauthenticated).await;
        Ok(())
    }

    async fn handle_lifecycle_event(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::SignInCompleted { identity } => {
                self.on_sign_in_completed(identity).await;
            }
            LifecycleEvent::SignInFailed { reason } => {
                warn!(reason = %reason, "Provider reported sign-in failure");
                self.context
                    .set_state(SessionState::Failed(SIGN_IN_FAILED_MESSAGE.to_string()))
                    .await;
                self.emit(SessionEvent::AuthError {
                    message: SIGN_IN_FAILED_MESSAGE.to_string(),
                    recoverable: true,
                });
            }
            LifecycleEvent::SignOutCompleted => {
                info!("Provider reported sign-out");
                if let Err(e) = self.context.tokens().clear().await {
                    warn!(error = %e, "Failed to clear token cache on sign-out event");
                }
                self.context.take_intent().await;
                self.context.set_state(SessionState::Unauthenticated).await;
                self.emit(SessionEvent::SignedOut);
                // Sign-out always lands on the sign-in page.
                self.navigator.navigate(&self.routes.sign_in, true);
            }
        }
    }

    async fn on_sign_in_completed(&self, identity: Identity) {
        let already_authenticated = matches!(
            self.context.state().await,
            SessionState::Authenticated(ref current) if current.subject == identity.subject
        );

        if !already_authenticated {
            info!(subject = %identity.subject, "Sign-in completed via lifecycle event");
            self.context
                .set_state(SessionState::Authenticated(identity.clone()))
                .await;
            self.emit(SessionEvent::SignedIn {
                subject: identity.subject,
                username: identity.username,
            });
        }

        self.navigate_after_sign_in().await;
    }

    /// Post-sign-in navigation.
    ///
    /// Only fires from the sign-in page or the root. From any other path
    /// the user is already somewhere deliberate; navigating would fight
    /// them and, with a pushy provider, loop.
    async fn navigate_after_sign_in(&self) {
        // Consume the intent unconditionally: a sign-in that suppresses
        // navigation must not leave it behind for a later session.
        let intent = self.context.take_intent().await;

        let location = self.navigator.current_location();
        if location.path != self.routes.sign_in && location.path != self.routes.root {
            debug!(path = %location.path, "Not navigating after sign-in");
            return;
        }

        let destination = intent.unwrap_or_else(|| self.routes.default_landing.clone());
        info!(destination = %destination, "Navigating after sign-in");
        self.navigator.navigate(&destination, true);
    }

    fn emit(&self, event: SessionEvent) {
        self.context.events().emit(CoreEvent::Session(event)).ok();
    }
}

/// Adapter forwarding provider lifecycle events to the controller.
///
/// Holds a `Weak` so the observer registration inside the provider never
/// keeps the controller alive.
struct LifecycleBridge {
    controller: Weak<SessionController>,
}

#[async_trait]
impl LifecycleObserver for LifecycleBridge {
    async fn on_lifecycle_event(&self, event: LifecycleEvent) {
        if let Some(controller) = self.controller.upgrade() {
            controller.handle_lifecycle_event(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::identity::RawToken;
    use bridge_traits::navigation::BrowserLocation;
    use bridge_traits::storage::SessionStore;
    use core_runtime::events::EventBus;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ------------------------------------------------------------------
    // Mocks
    // ------------------------------------------------------------------

    #[derive(Clone, Default)]
    struct MockSessionStore {
        items: Arc<tokio::sync::Mutex<HashMap<String, Vec<u8>>>>,
    }

    #[async_trait]
    impl SessionStore for MockSessionStore {
        async fn set_item(&self, key: &str, value: &[u8]) -> bridge_traits::error::Result<()> {
            self.items
                .lock()
                .await
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_item(&self, key: &str) -> bridge_traits::error::Result<Option<Vec<u8>>> {
            Ok(self.items.lock().await.get(key).cloned())
        }

        async fn remove_item(&self, key: &str) -> bridge_traits::error::Result<()> {
            self.items.lock().await.remove(key);
            Ok(())
        }

        async fn keys(&self) -> bridge_traits::error::Result<Vec<String>> {
            Ok(self.items.lock().await.keys().cloned().collect())
        }

        async fn clear(&self) -> bridge_traits::error::Result<()> {
            self.items.lock().await.clear();
            Ok(())
        }
    }

    struct MockNavigator {
        location: StdMutex<BrowserLocation>,
        navigations: StdMutex<Vec<(String, bool)>>,
    }

    impl MockNavigator {
        fn at(location: BrowserLocation) -> Arc<Self> {
            Arc::new(Self {
                location: StdMutex::new(location),
                navigations: StdMutex::new(Vec::new()),
            })
        }

        fn navigations(&self) -> Vec<(String, bool)> {
            self.navigations.lock().unwrap().clone()
        }
    }

    impl Navigator for MockNavigator {
        fn current_location(&self) -> BrowserLocation {
            self.location.lock().unwrap().clone()
        }

        fn navigate(&self, path: &str, replace: bool) {
            self.navigations
                .lock()
                .unwrap()
                .push((path.to_string(), replace));
            *self.location.lock().unwrap() = BrowserLocation::new(path);
        }
    }

    #[derive(Clone)]
    enum RedirectBehavior {
        Success(Identity),
        Nothing,
        Failure,
    }

    struct MockProvider {
        redirect: StdMutex<RedirectBehavior>,
        active: StdMutex<Option<Identity>>,
        redirect_calls: AtomicUsize,
        begin_calls: AtomicUsize,
        observers: StdMutex<HashMap<SubscriptionId, Arc<dyn LifecycleObserver>>>,
    }

    impl MockProvider {
        fn new(redirect: RedirectBehavior) -> Arc<Self> {
            Arc::new(Self {
                redirect: StdMutex::new(redirect),
                active: StdMutex::new(None),
                redirect_calls: AtomicUsize::new(0),
                begin_calls: AtomicUsize::new(0),
                observers: StdMutex::new(HashMap::new()),
            })
        }

        async fn fire(&self, event: LifecycleEvent) {
            let observers: Vec<_> = self.observers.lock().unwrap().values().cloned().collect();
            for observer in observers {
                observer.on_lifecycle_event(event.clone()).await;
            }
        }

        fn observer_count(&self) -> usize {
            self.observers.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl IdentityProvider for MockProvider {
        async fn begin_sign_in(&self, _scopes: &[String]) -> bridge_traits::error::Result<()> {
            self.begin_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn complete_redirect(&self) -> bridge_traits::error::Result<Option<Identity>> {
            self.redirect_calls.fetch_add(1, Ordering::SeqCst);
            match self.redirect.lock().unwrap().clone() {
                RedirectBehavior::Success(identity) => {
                    *self.active.lock().unwrap() = Some(identity.clone());
                    Ok(Some(identity))
                }
                RedirectBehavior::Nothing => Ok(None),
                RedirectBehavior::Failure => Err(BridgeError::OperationFailed(
                    "interaction_required".to_string(),
                )),
            }
        }

        fn active_identity(&self) -> Option<Identity> {
            self.active.lock().unwrap().clone()
        }

        async fn acquire_token_silent(
            &self,
            _scopes: &[String],
            _identity: &Identity,
        ) -> bridge_traits::error::Result<RawToken> {
            Err(BridgeError::NotAvailable("not used here".to_string()))
        }

        async fn acquire_token_interactive(
            &self,
            _scopes: &[String],
        ) -> bridge_traits::error::Result<RawToken> {
            Err(BridgeError::NotAvailable("not used here".to_string()))
        }

        async fn sign_out(&self, _post_sign_out_path: &str) -> bridge_traits::error::Result<()> {
            *self.active.lock().unwrap() = None;
            Ok(())
        }

        fn add_observer(&self, observer: Arc<dyn LifecycleObserver>) -> SubscriptionId {
            let id = SubscriptionId::new();
            self.observers.lock().unwrap().insert(id, observer);
            id
        }

        fn remove_observer(&self, id: SubscriptionId) {
            self.observers.lock().unwrap().remove(&id);
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn identity() -> Identity {
        Identity {
            subject: "subject-1".to_string(),
            display_name: "Test Operator".to_string(),
            username: "operator@example.com".to_string(),
            roles: vec!["Operator".to_string()],
        }
    }

    fn config() -> DashboardConfig {
        DashboardConfig::builder()
            .client_id("client-123")
            .tenant_id("tenant-456")
            .redirect_uri("https://dashboard.example.com/login")
            .api_base_url("https://api.example.com")
            .stream_url("wss://api.example.com/ws/live")
            .build()
            .unwrap()
    }

    fn callback_location(path: &str) -> BrowserLocation {
        BrowserLocation::new(path).with_query("code=abc&state=xyz")
    }

    struct Harness {
        controller: Arc<SessionController>,
        provider: Arc<MockProvider>,
        navigator: Arc<MockNavigator>,
        context: Arc<SessionContext>,
    }

    fn harness(redirect: RedirectBehavior, location: BrowserLocation) -> Harness {
        let provider = MockProvider::new(redirect);
        let navigator = MockNavigator::at(location);
        let context = Arc::new(SessionContext::new(
            Arc::new(MockSessionStore::default()),
            EventBus::new(32),
        ));
        let controller = SessionController::new(
            provider.clone(),
            navigator.clone(),
            context.clone(),
            &config(),
        );
        Harness {
            controller,
            provider,
            navigator,
            context,
        }
    }

    // ------------------------------------------------------------------
    // Redirect completion
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_duplicate_completion_hits_provider_once() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            callback_location("/login"),
        );

        let first = h.controller.complete_pending_redirect().await;
        let second = h.controller.complete_pending_redirect().await;

        assert_eq!(first, RedirectCompletion::Completed);
        assert_eq!(second, RedirectCompletion::Completed);
        assert_eq!(h.provider.redirect_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_callback_markers_is_a_noop() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/dashboard"),
        );

        let outcome = h.controller.complete_pending_redirect().await;

        assert_eq!(outcome, RedirectCompletion::NoCallback);
        assert_eq!(h.provider.redirect_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.context.state().await, SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_completion_restores_intent_from_sign_in_page() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            callback_location("/login"),
        );
        h.context.save_intent("/sensors/42").await.unwrap();

        h.controller.complete_pending_redirect().await;

        assert_eq!(
            h.navigator.navigations(),
            vec![("/sensors/42".to_string(), true)]
        );
        // The intent must have been consumed
        assert_eq!(h.context.take_intent().await, None);
    }

    #[tokio::test]
    async fn test_completion_without_intent_lands_on_default() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            callback_location("/"),
        );

        h.controller.complete_pending_redirect().await;

        assert_eq!(
            h.navigator.navigations(),
            vec![("/dashboard".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_completion_from_deep_path_does_not_navigate() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            callback_location("/sensors"),
        );

        h.controller.complete_pending_redirect().await;

        assert!(h.context.state().await.is_authenticated());
        assert!(h.navigator.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_failed_completion_degrades_to_sign_in_page() {
        let h = harness(RedirectBehavior::Failure, callback_location("/dashboard"));

        let outcome = h.controller.complete_pending_redirect().await;

        assert_eq!(outcome, RedirectCompletion::Failed);
        assert!(matches!(h.context.state().await, SessionState::Failed(_)));
        assert_eq!(h.navigator.navigations(), vec![("/login".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_failed_completion_on_sign_in_page_stays_put() {
        let h = harness(RedirectBehavior::Failure, callback_location("/login"));

        h.controller.complete_pending_redirect().await;

        assert!(h.navigator.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_stale_markers_with_nothing_pending() {
        let h = harness(RedirectBehavior::Nothing, callback_location("/login"));

        let outcome = h.controller.complete_pending_redirect().await;

        assert_eq!(outcome, RedirectCompletion::NoCallback);
        assert_eq!(h.context.state().await, SessionState::Unauthenticated);
    }

    // ------------------------------------------------------------------
    // sign_in / sign_out
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_sign_in_persists_intent_and_starts_flow() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/login"),
        );

        h.controller.sign_in(Some("/sensors")).await.unwrap();

        assert_eq!(h.provider.begin_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.context.state().await,
            SessionState::InProgress(AuthProgress::RedirectPending)
        );
        assert_eq!(h.context.take_intent().await.as_deref(), Some("/sensors"));
    }

    #[tokio::test]
    async fn test_overlapping_sign_in_is_refused() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/login"),
        );

        h.controller.sign_in(None).await.unwrap();
        let second = h.controller.sign_in(None).await;

        assert!(matches!(second, Err(SessionError::SignInInProgress)));
        assert_eq!(h.provider.begin_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            callback_location("/login"),
        );
        h.controller.complete_pending_redirect().await;

        h.controller.sign_out().await.unwrap();

        assert_eq!(h.context.state().await, SessionState::Unauthenticated);
        assert!(h.provider.active_identity().is_none());
    }

    // ------------------------------------------------------------------
    // Lifecycle events
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_sign_in_event_navigates_only_from_entry_pages() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/sensors"),
        );
        h.controller.bind_lifecycle_events();

        h.provider
            .fire(LifecycleEvent::SignInCompleted {
                identity: identity(),
            })
            .await;

        // Deep path: authenticated but never navigated away
        assert!(h.context.state().await.is_authenticated());
        assert!(h.navigator.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_event_from_sign_in_page_navigates() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/login"),
        );
        h.controller.bind_lifecycle_events();

        h.provider
            .fire(LifecycleEvent::SignInCompleted {
                identity: identity(),
            })
            .await;

        assert_eq!(
            h.navigator.navigations(),
            vec![("/dashboard".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_repeated_sign_in_events_navigate_at_most_once() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/login"),
        );
        h.controller.bind_lifecycle_events();

        for _ in 0..3 {
            h.provider
                .fire(LifecycleEvent::SignInCompleted {
                    identity: identity(),
                })
                .await;
        }

        // First event navigates to /dashboard; after that the current path
        // is no longer an entry page, so nothing else fires.
        assert_eq!(
            h.navigator.navigations(),
            vec![("/dashboard".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_sign_out_event_always_navigates_to_sign_in() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/sensors"),
        );
        h.controller.bind_lifecycle_events();

        h.provider.fire(LifecycleEvent::SignOutCompleted).await;

        assert_eq!(h.context.state().await, SessionState::Unauthenticated);
        assert_eq!(h.navigator.navigations(), vec![("/login".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_sign_in_failure_event_records_generic_reason() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/login"),
        );
        h.controller.bind_lifecycle_events();

        h.provider
            .fire(LifecycleEvent::SignInFailed {
                reason: "AADSTS50058: silent sign-in failed".to_string(),
            })
            .await;

        match h.context.state().await {
            SessionState::Failed(message) => {
                assert!(!message.contains("AADSTS"));
            }
            other => panic!("expected failed state, got {:?}", other),
        }
        assert!(h.navigator.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_intent_is_consumed_even_when_navigation_is_suppressed() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            callback_location("/sensors"),
        );
        h.context.save_intent("/alerts").await.unwrap();

        h.controller.complete_pending_redirect().await;

        // Deep path: no navigation, but the intent must be gone
        assert!(h.navigator.navigations().is_empty());
        assert_eq!(h.context.take_intent().await, None);
    }

    #[tokio::test]
    async fn test_sign_out_discards_stored_intent() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/login"),
        );
        h.context.save_intent("/alerts").await.unwrap();

        h.controller.sign_out().await.unwrap();

        assert_eq!(h.context.take_intent().await, None);
    }

    #[tokio::test]
    async fn test_next_sign_in_ignores_a_previous_sessions_intent() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/alerts"),
        );
        h.controller.bind_lifecycle_events();
        h.context
            .save_intent("/alerts/previous-user-path")
            .await
            .unwrap();

        // First session authenticates on a deep path: no navigation
        h.provider
            .fire(LifecycleEvent::SignInCompleted {
                identity: identity(),
            })
            .await;
        assert!(h.navigator.navigations().is_empty());

        // Session ends; the provider lands the user on the sign-in page
        h.controller.sign_out().await.unwrap();
        h.provider.fire(LifecycleEvent::SignOutCompleted).await;

        // A fresh sign-in goes to the default landing, never the old path
        h.provider
            .fire(LifecycleEvent::SignInCompleted {
                identity: identity(),
            })
            .await;
        assert_eq!(
            h.navigator.navigations().last(),
            Some(&("/dashboard".to_string(), true))
        );
    }

    #[tokio::test]
    async fn test_duplicate_binding_refused_and_teardown_unbinds() {
        let h = harness(
            RedirectBehavior::Success(identity()),
            BrowserLocation::new("/login"),
        );

        h.controller.bind_lifecycle_events();
        h.controller.bind_lifecycle_events();
        assert_eq!(h.provider.observer_count(), 1);

        h.controller.teardown();
        assert_eq!(h.provider.observer_count(), 0);

        // Events after teardown must not touch the session
        h.provider
            .fire(LifecycleEvent::SignInCompleted {
                identity: identity(),
            })
            .await;
        assert_eq!(h.context.state().await, SessionState::Unauthenticated);
    }
}
