use shared::{DashboardStats, Threat, TrendPoint};
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::dashboard_api;
use crate::app::use_session;
use crate::components::composite::kpi_card::KpiCard;
use crate::components::composite::threats_table::ThreatsTable;

#[derive(Clone, PartialEq, Default, Debug)]
struct DashboardState {
    stats: Option<DashboardStats>,
    threats: Vec<Threat>,
    trends: Vec<TrendPoint>,
    error_message: Option<String>,
    loaded: bool,
}

const LOAD_ERROR: &str = "Failed to load dashboard data. Please try again later.";

#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let ctx = use_session();
    let state = use_state(DashboardState::default);

    {
        let state = state.clone();
        let token = ctx
            .session
            .token
            .clone()
            .expect("dashboard renders only for an authenticated session");
        use_effect_with((), move |_| {
            spawn_local(async move {
                let mut next = DashboardState {
                    loaded: true,
                    ..Default::default()
                };
                match dashboard_api::get_stats(&token).await {
                    Ok(stats) => next.stats = Some(stats),
                    Err(error) => {
                        log::warn!("Fail to fetch dashboard stats, error: {error}");
                        next.error_message = Some(LOAD_ERROR.to_owned());
                    }
                }
                match dashboard_api::get_recent_threats(&token).await {
                    Ok(response) => next.threats = response.threats,
                    Err(error) => {
                        log::warn!("Fail to fetch recent threats, error: {error}");
                        next.error_message = Some(LOAD_ERROR.to_owned());
                    }
                }
                match dashboard_api::get_threat_trends(&token).await {
                    Ok(response) => next.trends = response.points,
                    Err(error) => {
                        log::warn!("Fail to fetch threat trends, error: {error}");
                        next.error_message = Some(LOAD_ERROR.to_owned());
                    }
                }
                state.set(next);
            });
            || ()
        });
    }

    if !state.loaded {
        return html! {
            <div class="text-center mt-5">
                <div class="spinner-border" role="status"></div>
                <p class="text-muted mt-3">{"Loading dashboard data..."}</p>
            </div>
        };
    }

    if let Some(error) = &state.error_message {
        return html! {
            <div class="alert alert-danger mt-4" role="alert">{ error }</div>
        };
    }

    let kpi_row = match &state.stats {
        Some(stats) => html! {
            <div class="row row-cols-1 row-cols-md-2 row-cols-lg-4 g-3">
                <KpiCard title="Total IOCs"
                    value={stats.total_iocs.value.to_string()}
                    change={stats.total_iocs.change.clone()} />
                <KpiCard title="New Feed Entries"
                    value={stats.new_feed_entries.value.to_string()}
                    change={stats.new_feed_entries.change.clone()} />
                <KpiCard title="Critical CVEs"
                    value={stats.critical_cves.value.to_string()}
                    change={stats.critical_cves.change.clone()} />
                <KpiCard title="Phishing Domains"
                    value={stats.phishing_domains.value.to_string()}
                    change={stats.phishing_domains.change.clone()} />
            </div>
        },
        None => html! {},
    };

    html! {
        <>
            <div class="mb-4">
                <h1>{"Dashboard"}</h1>
                <p class="text-muted">{"Overview of your cyber threat intelligence"}</p>
            </div>
            { kpi_row }
            <div class="row g-3 mt-1">
                <div class="col-lg-7">
                    <div class="card">
                        <div class="card-body">
                            <h5 class="card-title">{"Recent Threats"}</h5>
                            <ThreatsTable threats={state.threats.clone()} />
                        </div>
                    </div>
                </div>
                <div class="col-lg-5">
                    <div class="card">
                        <div class="card-body">
                            <h5 class="card-title">{"Threat Trends (7 Days)"}</h5>
                            <table class="table table-sm">
                                <tbody>
                                    { for state.trends.iter().map(|point| html! {
                                        <tr key={point.day.clone()}>
                                            <td class="text-muted">{ &point.day }</td>
                                            <td>{ point.threats }</td>
                                        </tr>
                                    }) }
                                </tbody>
                            </table>
                        </div>
                    </div>
                </div>
            </div>
        </>
    }
}
