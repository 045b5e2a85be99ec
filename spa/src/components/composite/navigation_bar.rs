use yew::prelude::*;

use crate::session::Route;

#[derive(PartialEq, Properties)]
pub struct Props {
    pub username: String,
    pub active_route: Route,
    pub on_page_change: Callback<Route>,
    pub on_logout: Callback<()>,
}

#[function_component(NavigationBar)]
pub fn navigation_bar(props: &Props) -> Html {
    let on_dashboard_click = {
        let on_page_change = props.on_page_change.clone();
        Callback::from(move |_| {
            on_page_change.emit(Route::Dashboard);
        })
    };

    let on_chat_click = {
        let on_page_change = props.on_page_change.clone();
        Callback::from(move |_| {
            on_page_change.emit(Route::Chat);
        })
    };

    let on_logout_click = {
        let on_logout = props.on_logout.clone();
        Callback::from(move |_| {
            on_logout.emit(());
        })
    };

    let dashboard_classes = if props.active_route == Route::Dashboard {
        classes!("nav-link", "active")
    } else {
        classes!("nav-link")
    };
    let chat_classes = if props.active_route == Route::Chat {
        classes!("nav-link", "active")
    } else {
        classes!("nav-link")
    };

    html! {
        <nav class="navbar navbar-expand-lg bg-body-tertiary">
            <div class="container-fluid">
                <a class="navbar-brand" href="#">{"Threat Hub"}</a>
                <div class="collapse navbar-collapse">
                    <ul class="navbar-nav me-auto mb-2 mb-lg-0">
                        <li class="nav-item">
                            <a onclick={on_dashboard_click} class={dashboard_classes}>{"Dashboard"}</a>
                        </li>
                        <li class="nav-item">
                            <a onclick={on_chat_click} class={chat_classes}>{"Chat Assistant"}</a>
                        </li>
                    </ul>
                    <span class="navbar-text me-3">{&props.username}</span>
                    <button onclick={on_logout_click} class="btn btn-sm btn-outline-secondary">
                        {"Logout"}
                    </button>
                </div>
            </div>
        </nav>
    }
}
