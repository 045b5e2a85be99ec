use shared::{Severity, Threat};
use yew::prelude::*;

#[derive(PartialEq, Properties)]
pub struct Props {
    pub threats: Vec<Threat>,
}

fn severity_badge(severity: Severity) -> Html {
    let class = match severity {
        Severity::Critical => "badge text-bg-danger",
        Severity::High => "badge text-bg-warning",
        Severity::Medium => "badge text-bg-info",
        Severity::Low => "badge text-bg-secondary",
    };
    html! { <span class={class}>{ severity.to_string() }</span> }
}

#[function_component(ThreatsTable)]
pub fn threats_table(props: &Props) -> Html {
    if props.threats.is_empty() {
        return html! {
            <p class="text-muted">{"No indicators observed yet."}</p>
        };
    }

    html! {
        <table class="table table-hover align-middle">
            <thead>
                <tr>
                    <th scope="col">{"IOC"}</th>
                    <th scope="col">{"Type"}</th>
                    <th scope="col">{"Severity"}</th>
                    <th scope="col">{"Source"}</th>
                    <th scope="col">{"Observed"}</th>
                </tr>
            </thead>
            <tbody>
                { for props.threats.iter().map(|threat| html! {
                    <tr key={threat.threat_id.to_string()}>
                        <td class="font-monospace">{ &threat.ioc }</td>
                        <td>{ threat.kind.to_string() }</td>
                        <td>{ severity_badge(threat.severity) }</td>
                        <td>{ &threat.source }</td>
                        <td>{ threat.observed_at.format("%Y-%m-%d %H:%M UTC").to_string() }</td>
                    </tr>
                }) }
            </tbody>
        </table>
    }
}
