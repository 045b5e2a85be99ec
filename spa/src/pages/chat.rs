use shared::{ChatRequest, ChatSender, ChatTurn};
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::chat_api;
use crate::app::use_session;
use crate::components::atoms::markdown_render::MarkdownRender;

const WELCOME: &str = "Hello! I'm your cyber threat intelligence assistant. \
    I can help you analyze threats, search IOCs and provide insights about \
    your security data. What would you like to know?";

const APOLOGY: &str = "I apologize, but I encountered an error processing \
    your request. Please make sure the AI backend is configured correctly \
    and try again.";

const QUICK_QUERIES: [&str; 3] = [
    "What are the top phishing domains detected recently?",
    "Show me critical CVEs from the last few days",
    "Analyze recent malware trends in the threat feeds",
];

#[function_component(ChatPage)]
pub fn chat_page() -> Html {
    let ctx = use_session();
    let messages = use_state(|| {
        vec![ChatTurn {
            sender: ChatSender::Assistant,
            content: WELCOME.to_owned(),
        }]
    });
    let input = use_state(String::new);
    let busy = use_state(|| false);

    let on_send = {
        let messages = messages.clone();
        let input = input.clone();
        let busy = busy.clone();
        let token = ctx
            .session
            .token
            .clone()
            .expect("chat renders only for an authenticated session");
        Callback::from(move |_: ()| {
            if *busy {
                return;
            }
            let text = (*input).clone();
            if text.trim().is_empty() {
                return;
            }

            // The history sent for context is the conversation before this
            // message.
            let history: Vec<ChatTurn> = (*messages).clone();
            let mut next = (*messages).clone();
            next.push(ChatTurn {
                sender: ChatSender::User,
                content: text.clone(),
            });
            messages.set(next.clone());
            input.set(String::new());
            busy.set(true);

            let messages = messages.clone();
            let busy = busy.clone();
            let token = token.clone();
            spawn_local(async move {
                let request = ChatRequest {
                    message: text,
                    history,
                };
                match chat_api::send_message(&token, &request).await {
                    Ok(response) => {
                        next.push(ChatTurn {
                            sender: ChatSender::Assistant,
                            content: response.response,
                        });
                    }
                    Err(error) => {
                        log::warn!("Chat query failed, error: {error}");
                        next.push(ChatTurn {
                            sender: ChatSender::Assistant,
                            content: APOLOGY.to_owned(),
                        });
                    }
                }
                messages.set(next);
                busy.set(false);
            });
        })
    };

    let on_input = {
        let input = input.clone();
        Callback::from(move |event: InputEvent| {
            let element: web_sys::HtmlInputElement = event.target_unchecked_into();
            input.set(element.value());
        })
    };

    let on_keydown = {
        let on_send = on_send.clone();
        Callback::from(move |event: KeyboardEvent| {
            if event.key() == "Enter" {
                on_send.emit(());
            }
        })
    };

    let on_send_click = {
        let on_send = on_send.clone();
        Callback::from(move |_: MouseEvent| on_send.emit(()))
    };

    html! {
        <>
            <div class="mb-4">
                <h1>{"Chat Assistant"}</h1>
                <p class="text-muted">{"AI-powered threat intelligence analysis and querying"}</p>
            </div>
            <div class="card">
                <div class="card-body" style="min-height: 24rem;">
                    { for messages.iter().enumerate().map(|(index, turn)| {
                        let row_class = match turn.sender {
                            ChatSender::User => "d-flex justify-content-end mb-3",
                            ChatSender::Assistant => "d-flex justify-content-start mb-3",
                        };
                        let bubble_class = match turn.sender {
                            ChatSender::User => "p-3 rounded bg-primary text-white",
                            ChatSender::Assistant => "p-3 rounded bg-body-tertiary",
                        };
                        html! {
                            <div key={index} class={row_class}>
                                <div class={bubble_class} style="max-width: 70%;">
                                    {
                                        match turn.sender {
                                            ChatSender::Assistant => html! {
                                                <MarkdownRender markdown={turn.content.clone()} />
                                            },
                                            ChatSender::User => html! { { &turn.content } },
                                        }
                                    }
                                </div>
                            </div>
                        }
                    }) }
                    if *busy {
                        <div class="d-flex justify-content-start mb-3">
                            <div class="p-3 rounded bg-body-tertiary">
                                <span class="spinner-border spinner-border-sm me-2" role="status"></span>
                                {"Analyzing threat data..."}
                            </div>
                        </div>
                    }
                </div>
                <div class="card-footer">
                    <div class="mb-2">
                        <small class="text-muted">{"Quick queries:"}</small>
                        <div class="d-flex flex-wrap gap-2 mt-1">
                            { for QUICK_QUERIES.iter().map(|query| {
                                let input = input.clone();
                                let onclick = Callback::from(move |_: MouseEvent| {
                                    input.set((*query).to_owned());
                                });
                                html! {
                                    <span class="badge text-bg-light border" role="button" {onclick}>
                                        { *query }
                                    </span>
                                }
                            }) }
                        </div>
                    </div>
                    <div class="input-group">
                        <input class="form-control"
                            placeholder="Ask about threats, IOCs, CVEs..."
                            value={(*input).clone()}
                            oninput={on_input}
                            onkeydown={on_keydown}
                            disabled={*busy} />
                        <button class="btn btn-primary"
                            onclick={on_send_click}
                            disabled={*busy || input.trim().is_empty()}>
                            {"Send"}
                        </button>
                    </div>
                </div>
            </div>
        </>
    }
}
