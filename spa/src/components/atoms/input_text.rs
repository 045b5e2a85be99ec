use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum InputType {
    Text,
    Password,
}

impl InputType {
    fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Password => "password",
        }
    }
}

#[derive(PartialEq, Properties)]
pub struct Props {
    pub id: AttrValue,
    pub name: AttrValue,
    pub placeholder: AttrValue,
    #[prop_or_default]
    pub class: Classes,
    pub input_type: InputType,
    pub on_change: Callback<String>,
}

#[function_component(InputText)]
pub fn input_text(props: &Props) -> Html {
    let on_input = {
        let on_change = props.on_change.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            on_change.emit(input.value());
        })
    };

    html! {
        <input
            id={props.id.clone()}
            name={props.name.clone()}
            type={props.input_type.as_str()}
            placeholder={props.placeholder.clone()}
            class={props.class.clone()}
            oninput={on_input} />
    }
}
