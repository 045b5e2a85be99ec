use std::rc::Rc;

use shared::SessionUser;
use yew::platform::spawn_local;
use yew::prelude::*;
use yew_hooks::prelude::*;

use crate::api::auth_api::{self, HttpAuthApi};
use crate::components::composite::login_form::{LoginForm, LoginFormData};
use crate::components::composite::navigation_bar::NavigationBar;
use crate::pages::chat::ChatPage;
use crate::pages::dashboard::DashboardPage;
use crate::session::{Navigator, Route, Session, SessionController};
use crate::storage::LocalStorageStore;

/// Routes by flipping the rendered view; the session controller stays
/// ignorant of Yew.
pub struct CallbackNavigator {
    on_navigate: Callback<Route>,
}

impl Navigator for CallbackNavigator {
    fn navigate(&self, route: Route) {
        self.on_navigate.emit(route);
    }
}

pub type SharedSessionController =
    Rc<SessionController<LocalStorageStore, HttpAuthApi, CallbackNavigator>>;

#[derive(Clone)]
pub struct SessionCtx {
    pub session: Session,
    pub controller: SharedSessionController,
}

impl PartialEq for SessionCtx {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session && Rc::ptr_eq(&self.controller, &other.controller)
    }
}

/// Session access for components below the provider. Calling this anywhere
/// else is an integration bug, not a runtime condition, so it panics.
#[hook]
pub fn use_session() -> SessionCtx {
    use_context::<SessionCtx>().expect("use_session must be called under the session provider")
}

#[function_component(App)]
pub fn app() -> Html {
    let session = use_state(Session::default);
    let route = use_state(|| Route::Dashboard);
    let login_error = use_state(|| None::<AttrValue>);

    let controller: SharedSessionController = {
        let route = route.clone();
        use_memo((), move |_| {
            SessionController::new(
                LocalStorageStore,
                HttpAuthApi,
                CallbackNavigator {
                    on_navigate: Callback::from(move |r| route.set(r)),
                },
            )
        })
    };

    let is_first = use_is_first_mount();
    if is_first {
        {
            let session = session.clone();
            controller.set_observer(move |snapshot| session.set(snapshot));
        }
        let controller = controller.clone();
        spawn_local(async move {
            controller.reconcile().await;
        });
    }

    let on_login = {
        let controller = controller.clone();
        let login_error = login_error.clone();
        Callback::from(move |event: LoginFormData| {
            let controller = controller.clone();
            let login_error = login_error.clone();
            spawn_local(async move {
                match auth_api::sign_in(&event.username, &event.password).await {
                    Ok(response) => {
                        log::info!(
                            "User login successful, username: {username}, user_id: {user_id}",
                            username = &response.username,
                            user_id = &response.user_id
                        );
                        login_error.set(None);
                        controller.login(
                            response.access_token,
                            SessionUser {
                                id: response.user_id,
                                username: response.username,
                            },
                        );
                    }
                    Err(error) => {
                        log::warn!("Login failed, error: {error}");
                        login_error.set(Some(AttrValue::from("Sign in failed, check your credentials.")));
                    }
                }
            });
        })
    };

    let on_logout = {
        let controller = controller.clone();
        Callback::from(move |_| {
            let controller = controller.clone();
            spawn_local(async move {
                controller.logout().await;
            });
        })
    };

    let on_page_change = {
        let route = route.clone();
        Callback::from(move |event: Route| route.set(event))
    };

    let ctx = SessionCtx {
        session: (*session).clone(),
        controller: controller.clone(),
    };

    let content = if session.is_loading {
        html! {
            <main class="container mt-5 text-center">
                <div class="spinner-border" role="status"></div>
                <p class="text-muted mt-3">{"Restoring session..."}</p>
            </main>
        }
    } else if !session.is_authenticated() {
        html! {
            <main>
                <LoginForm on_login={on_login} error={(*login_error).clone()} />
            </main>
        }
    } else {
        let username = session
            .user
            .as_ref()
            .expect("if the session is authenticated, user is some")
            .username
            .clone();
        let page = match *route {
            Route::Chat => html! { <ChatPage /> },
            // Authenticated users never land on the login surface.
            Route::Dashboard | Route::Login => html! { <DashboardPage /> },
        };
        html! {
            <>
                <NavigationBar username={username}
                    active_route={*route}
                    on_page_change={on_page_change}
                    on_logout={on_logout} />
                <div class="container mt-4">
                    {page}
                </div>
            </>
        }
    };

    html! {
        <ContextProvider<SessionCtx> context={ctx}>
            {content}
        </ContextProvider<SessionCtx>>
    }
}
