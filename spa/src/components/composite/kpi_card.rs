use yew::prelude::*;

#[derive(PartialEq, Properties)]
pub struct Props {
    pub title: AttrValue,
    pub value: AttrValue,
    pub change: AttrValue,
}

#[function_component(KpiCard)]
pub fn kpi_card(props: &Props) -> Html {
    html! {
        <div class="col">
            <div class="card h-100">
                <div class="card-body">
                    <h6 class="card-subtitle text-muted">{ &props.title }</h6>
                    <h3 class="card-title mt-2">{ &props.value }</h3>
                    <small class="text-muted">{ &props.change }</small>
                </div>
            </div>
        </div>
    }
}
