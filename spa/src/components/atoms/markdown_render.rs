use pulldown_cmark::{Parser, html};
use yew::prelude::*;

#[derive(PartialEq, Properties)]
pub struct Props {
    pub markdown: AttrValue,
}

/// Renders assistant answers, which come back as markdown.
#[function_component(MarkdownRender)]
pub fn markdown_render(props: &Props) -> Html {
    let parser = Parser::new(&props.markdown);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html! {
        <div class="markdown-body">
            { Html::from_html_unchecked(AttrValue::from(html_output)) }
        </div>
    }
}
