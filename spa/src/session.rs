//! Client-side session lifecycle: login, logout, and the reconciliation of
//! persisted credentials against the server on every fresh page load.
//!
//! The controller is the single owner of "am I logged in". Storage, HTTP and
//! navigation sit behind traits so the state machine runs the same way in the
//! browser and under tests.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use shared::SessionUser;

/// Fixed keys of the persisted session record.
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Chat,
    Login,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("credentials rejected by the server")]
    Rejected,
}

/// Durable key-value storage for the session record (localStorage in the
/// browser). Values are opaque strings; the `user` value is JSON.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// The two server calls the session lifecycle needs.
#[async_trait(?Send)]
pub trait AuthApi {
    async fn fetch_me(&self, token: &str) -> Result<SessionUser, ApiError>;
    async fn notify_logout(&self, token: &str) -> Result<(), ApiError>;
}

pub trait Navigator {
    fn navigate(&self, route: Route);
}

impl<T: SessionStore + ?Sized> SessionStore for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

#[async_trait(?Send)]
impl<T: AuthApi + ?Sized> AuthApi for Rc<T> {
    async fn fetch_me(&self, token: &str) -> Result<SessionUser, ApiError> {
        (**self).fetch_me(token).await
    }
    async fn notify_logout(&self, token: &str) -> Result<(), ApiError> {
        (**self).notify_logout(token).await
    }
}

impl<T: Navigator + ?Sized> Navigator for Rc<T> {
    fn navigate(&self, route: Route) {
        (**self).navigate(route)
    }
}

/// Read-only snapshot of the session.
///
/// `token` and `user` are set and cleared together; the only moment one can
/// be observed without full server confirmation is the optimistic window
/// while `is_loading` is still true.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<SessionUser>,
    pub is_loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            token: None,
            user: None,
            // Loading until the first reconciliation pass settles.
            is_loading: true,
        }
    }
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Reconciling,
    Settled,
}

struct State {
    session: Session,
    phase: Phase,
    // Bumped on every explicit auth transition. An async step that captured
    // an older epoch must drop its result: the user acted in the meantime.
    epoch: u64,
}

pub struct SessionController<S, A, N> {
    state: RefCell<State>,
    store: S,
    api: A,
    navigator: N,
    observer: RefCell<Option<Box<dyn Fn(Session)>>>,
}

impl<S, A, N> SessionController<S, A, N>
where
    S: SessionStore,
    A: AuthApi,
    N: Navigator,
{
    pub fn new(store: S, api: A, navigator: N) -> Self {
        Self {
            state: RefCell::new(State {
                session: Session::default(),
                phase: Phase::Uninitialized,
                epoch: 0,
            }),
            store,
            api,
            navigator,
            observer: RefCell::new(None),
        }
    }

    /// Register the single observer that receives every committed snapshot.
    /// The observer always runs before any navigation triggered by the same
    /// transition, so route guards never see a stale session.
    pub fn set_observer(&self, observer: impl Fn(Session) + 'static) {
        *self.observer.borrow_mut() = Some(Box::new(observer));
    }

    /// Non-blocking read of the current snapshot.
    pub fn current(&self) -> Session {
        self.state.borrow().session.clone()
    }

    fn publish(&self) {
        let snapshot = self.current();
        if let Some(observer) = self.observer.borrow().as_ref() {
            observer(snapshot);
        }
    }

    /// One-time startup pass: restore the persisted record optimistically,
    /// then confirm it with the server before trusting it for good.
    pub async fn reconcile(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.phase != Phase::Uninitialized {
                log::warn!("Session reconciliation requested more than once, ignoring");
                return;
            }
            state.phase = Phase::Reconciling;
        }

        let stored_token = self.store.get(TOKEN_KEY);
        let stored_user = self
            .store
            .get(USER_KEY)
            .and_then(|raw| serde_json::from_str::<SessionUser>(&raw).ok());

        let (token, user) = match (stored_token, stored_user) {
            (Some(token), Some(user)) => (token, user),
            _ => {
                // Nothing restorable; a half-written record is dropped too.
                self.store.remove(TOKEN_KEY);
                self.store.remove(USER_KEY);
                {
                    let mut state = self.state.borrow_mut();
                    state.session.is_loading = false;
                    state.phase = Phase::Settled;
                }
                self.publish();
                return;
            }
        };

        let epoch = {
            let mut state = self.state.borrow_mut();
            state.session.token = Some(token.clone());
            state.session.user = Some(user);
            state.epoch
        };
        self.publish();

        match self.api.fetch_me(&token).await {
            Ok(server_user) => {
                {
                    let mut state = self.state.borrow_mut();
                    if state.epoch != epoch {
                        log::info!("Session changed during verification, dropping stale result");
                        return;
                    }
                    // The server-confirmed identity replaces the optimistic one.
                    state.session.user = Some(server_user);
                    state.session.is_loading = false;
                    state.phase = Phase::Settled;
                }
                self.publish();
            }
            Err(error) => {
                log::warn!("Session verification failed, cleaning session. Error={error}");
                {
                    let mut state = self.state.borrow_mut();
                    if state.epoch != epoch {
                        return;
                    }
                    state.session.is_loading = false;
                    state.phase = Phase::Settled;
                }
                self.logout().await;
            }
        }
    }

    /// Adopt a freshly issued token and identity, then move to the dashboard.
    ///
    /// The in-memory commit and the observer notification both happen before
    /// the navigation fires, and the navigation is skipped entirely if the
    /// pair is no longer intact.
    pub fn login(&self, token: String, user: SessionUser) {
        self.store.set(TOKEN_KEY, &token);
        self.store.set(
            USER_KEY,
            &serde_json::to_string(&user).expect("Serialize should not fail"),
        );
        {
            let mut state = self.state.borrow_mut();
            state.epoch += 1;
            state.session.token = Some(token);
            state.session.user = Some(user);
            state.session.is_loading = false;
            state.phase = Phase::Settled;
        }
        self.publish();
        if self.current().is_authenticated() {
            self.navigator.navigate(Route::Dashboard);
        }
    }

    /// Tear the session down locally no matter what the server says, then
    /// move to the login surface. Safe to call repeatedly.
    pub async fn logout(&self) {
        // Explicit user intent: invalidate any verification still in flight.
        let token = {
            let mut state = self.state.borrow_mut();
            state.epoch += 1;
            state.session.token.clone()
        };

        if let Some(token) = token {
            if let Err(error) = self.api.notify_logout(&token).await {
                log::warn!("Logout notification failed, continuing local cleanup. Error={error}");
            }
        }

        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
        {
            let mut state = self.state.borrow_mut();
            state.session.token = None;
            state.session.user = None;
            state.session.is_loading = false;
            state.phase = Phase::Settled;
        }
        self.publish();
        self.navigator.navigate(Route::Login);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use futures::channel::oneshot;
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use uuid::Uuid;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        data: RefCell<BTreeMap<String, String>>,
    }

    impl SessionStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.data.borrow().get(key).cloned()
        }
        fn set(&self, key: &str, value: &str) {
            self.data.borrow_mut().insert(key.to_owned(), value.to_owned());
        }
        fn remove(&self, key: &str) {
            self.data.borrow_mut().remove(key);
        }
    }

    enum MeReply {
        Now(Result<SessionUser, ApiError>),
        Wait(oneshot::Receiver<Result<SessionUser, ApiError>>),
    }

    #[derive(Default)]
    struct FakeAuthApi {
        me_replies: RefCell<VecDeque<MeReply>>,
        logout_replies: RefCell<VecDeque<Result<(), ApiError>>>,
        me_calls: Cell<usize>,
        logout_calls: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl AuthApi for FakeAuthApi {
        async fn fetch_me(&self, _token: &str) -> Result<SessionUser, ApiError> {
            self.me_calls.set(self.me_calls.get() + 1);
            match self
                .me_replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected fetch_me call")
            {
                MeReply::Now(reply) => reply,
                MeReply::Wait(rx) => rx.await.expect("verify reply dropped"),
            }
        }

        async fn notify_logout(&self, _token: &str) -> Result<(), ApiError> {
            self.logout_calls.set(self.logout_calls.get() + 1);
            self.logout_replies.borrow_mut().pop_front().unwrap_or(Ok(()))
        }
    }

    /// Records each navigation together with whether the latest published
    /// snapshot was authenticated at the moment the navigation fired.
    struct FakeNavigator {
        fired: RefCell<Vec<(Route, bool)>>,
        published: Rc<RefCell<Session>>,
    }

    impl Navigator for FakeNavigator {
        fn navigate(&self, route: Route) {
            let authenticated = self.published.borrow().is_authenticated();
            self.fired.borrow_mut().push((route, authenticated));
        }
    }

    struct Harness {
        controller: SessionController<Rc<MemoryStore>, Rc<FakeAuthApi>, Rc<FakeNavigator>>,
        store: Rc<MemoryStore>,
        api: Rc<FakeAuthApi>,
        navigator: Rc<FakeNavigator>,
    }

    fn harness() -> Harness {
        let published = Rc::new(RefCell::new(Session::default()));
        let store = Rc::new(MemoryStore::default());
        let api = Rc::new(FakeAuthApi::default());
        let navigator = Rc::new(FakeNavigator {
            fired: RefCell::new(Vec::new()),
            published: published.clone(),
        });
        let controller = SessionController::new(store.clone(), api.clone(), navigator.clone());
        controller.set_observer(move |snapshot| *published.borrow_mut() = snapshot);
        Harness {
            controller,
            store,
            api,
            navigator,
        }
    }

    fn alice() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            username: "alice".to_owned(),
        }
    }

    fn persist(store: &MemoryStore, token: &str, user: &SessionUser) {
        store.set(TOKEN_KEY, token);
        store.set(USER_KEY, &serde_json::to_string(user).unwrap());
    }

    fn assert_pairing(session: &Session) {
        assert_eq!(
            session.token.is_some(),
            session.user.is_some(),
            "token and user must be set or cleared together"
        );
    }

    #[test]
    fn login_persists_and_commits_both_fields() {
        let h = harness();
        let user = alice();

        h.controller.login("T".to_owned(), user.clone());

        let session = h.controller.current();
        assert_pairing(&session);
        assert!(session.is_authenticated());
        assert_eq!(session.user, Some(user.clone()));
        assert_eq!(h.store.get(TOKEN_KEY), Some("T".to_owned()));
        assert_eq!(
            h.store.get(USER_KEY),
            Some(serde_json::to_string(&user).unwrap())
        );
    }

    #[test]
    fn login_navigation_fires_once_and_after_the_state_settles() {
        let h = harness();

        h.controller.login("T".to_owned(), alice());

        let fired = h.navigator.fired.borrow();
        assert_eq!(fired.len(), 1, "login must navigate exactly once");
        let (route, authenticated_when_fired) = fired[0];
        assert_eq!(route, Route::Dashboard);
        assert!(
            authenticated_when_fired,
            "navigation fired before the session was observable as authenticated"
        );
    }

    #[test]
    fn reconcile_without_a_record_settles_unauthenticated() {
        let h = harness();

        block_on(h.controller.reconcile());

        let session = h.controller.current();
        assert!(!session.is_loading);
        assert!(!session.is_authenticated());
        assert_eq!(h.api.me_calls.get(), 0);
        assert!(h.navigator.fired.borrow().is_empty());
    }

    #[test]
    fn reconcile_drops_a_half_written_record() {
        let h = harness();
        h.store.set(TOKEN_KEY, "T");

        block_on(h.controller.reconcile());

        assert_eq!(h.store.get(TOKEN_KEY), None);
        assert!(!h.controller.current().is_authenticated());
        assert_eq!(h.api.me_calls.get(), 0);
    }

    #[test]
    fn reconcile_confirms_a_valid_record() {
        let h = harness();
        let user = alice();
        persist(&h.store, "T", &user);
        // The server is authoritative for the identity, not the cache.
        let server_user = SessionUser {
            id: user.id,
            username: "alice-renamed".to_owned(),
        };
        h.api
            .me_replies
            .borrow_mut()
            .push_back(MeReply::Now(Ok(server_user.clone())));

        block_on(h.controller.reconcile());

        let session = h.controller.current();
        assert_pairing(&session);
        assert!(!session.is_loading);
        assert!(session.is_authenticated());
        assert_eq!(session.user, Some(server_user));
        assert!(h.navigator.fired.borrow().is_empty());
    }

    #[test]
    fn reconcile_rejection_erases_the_record_and_logs_out() {
        let h = harness();
        persist(&h.store, "T", &alice());
        h.api
            .me_replies
            .borrow_mut()
            .push_back(MeReply::Now(Err(ApiError::Rejected)));

        block_on(h.controller.reconcile());

        let session = h.controller.current();
        assert_pairing(&session);
        assert!(!session.is_loading);
        assert!(!session.is_authenticated());
        assert_eq!(h.store.get(TOKEN_KEY), None);
        assert_eq!(h.store.get(USER_KEY), None);
        assert_eq!(
            h.navigator.fired.borrow().last(),
            Some(&(Route::Login, false))
        );
    }

    #[test]
    fn reconcile_transport_failure_behaves_like_rejection() {
        let h = harness();
        persist(&h.store, "T", &alice());
        h.api
            .me_replies
            .borrow_mut()
            .push_back(MeReply::Now(Err(ApiError::Transport(
                "connection refused".to_owned(),
            ))));

        block_on(h.controller.reconcile());

        assert!(!h.controller.current().is_authenticated());
        assert_eq!(h.store.get(TOKEN_KEY), None);
    }

    #[test]
    fn reconcile_runs_only_once() {
        let h = harness();
        persist(&h.store, "T", &alice());
        h.api
            .me_replies
            .borrow_mut()
            .push_back(MeReply::Now(Ok(alice())));

        block_on(h.controller.reconcile());
        block_on(h.controller.reconcile());

        assert_eq!(h.api.me_calls.get(), 1);
    }

    #[test]
    fn logout_cleans_up_even_when_the_notification_fails() {
        let h = harness();
        h.controller.login("T".to_owned(), alice());
        h.api
            .logout_replies
            .borrow_mut()
            .push_back(Err(ApiError::Transport("connection reset".to_owned())));

        block_on(h.controller.logout());

        let session = h.controller.current();
        assert_pairing(&session);
        assert!(!session.is_authenticated());
        assert_eq!(h.store.get(TOKEN_KEY), None);
        assert_eq!(h.store.get(USER_KEY), None);
        assert_eq!(
            h.navigator.fired.borrow().last(),
            Some(&(Route::Login, false))
        );
    }

    #[test]
    fn logout_twice_reaches_the_same_terminal_state() {
        let h = harness();
        h.controller.login("T".to_owned(), alice());

        block_on(h.controller.logout());
        let first = h.controller.current();
        block_on(h.controller.logout());
        let second = h.controller.current();

        assert_eq!(first, second);
        assert!(!second.is_authenticated());
        // The second call has no token left to announce.
        assert_eq!(h.api.logout_calls.get(), 1);
    }

    #[test]
    fn logout_wins_over_a_concurrent_verification_success() {
        let h = harness();
        let user = alice();
        persist(&h.store, "T", &user);
        let (tx, rx) = oneshot::channel();
        h.api.me_replies.borrow_mut().push_back(MeReply::Wait(rx));

        let controller = Rc::new(h.controller);
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        {
            let controller = controller.clone();
            spawner
                .spawn_local(async move { controller.reconcile().await })
                .unwrap();
        }
        pool.run_until_stalled();
        // Optimistic restore is visible while verification hangs.
        assert!(controller.current().is_authenticated());

        {
            let controller = controller.clone();
            spawner
                .spawn_local(async move { controller.logout().await })
                .unwrap();
        }
        pool.run_until_stalled();
        assert!(!controller.current().is_authenticated());

        // The late verification success must not resurrect the session.
        tx.send(Ok(user)).ok();
        pool.run_until_stalled();

        let session = controller.current();
        assert_pairing(&session);
        assert!(!session.is_authenticated());
        assert_eq!(h.store.get(TOKEN_KEY), None);
        assert_eq!(h.store.get(USER_KEY), None);
    }
}
