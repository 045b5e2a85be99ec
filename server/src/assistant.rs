use anyhow::bail;
use ollama_rs::{Ollama, generation::completion::request::GenerationRequest};
use shared::{ChatSender, ChatTurn, Threat};
use url::Url;

const SYSTEM_PROMPT: &str = r#"You are a cyber threat intelligence assistant. Follow these instructions when responding:
  - The user is a security analyst, no need to simplify, be as detailed as possible and make sure your response is correct.
  - Ground your answers in the indicator data provided below; say so when the data does not cover the question.
  - Be highly organized and succinct.
  - Mistakes erode trust, so be accurate and thorough.
"#;

fn render_context(threats: &[Threat]) -> String {
    if threats.is_empty() {
        return "No indicators are currently loaded.".to_owned();
    }
    let lines: Vec<String> = threats
        .iter()
        .map(|t| {
            format!(
                "- {ioc} (kind: {kind}, severity: {severity}, source: {source}, observed: {observed})",
                ioc = t.ioc,
                kind = t.kind,
                severity = t.severity,
                source = t.source,
                observed = t.observed_at.to_rfc3339(),
            )
        })
        .collect();
    lines.join("\n")
}

fn render_conversation(history: &[ChatTurn], message: &str) -> String {
    let mut prompt = String::new();
    for turn in history {
        let speaker = match turn.sender {
            ChatSender::User => "Analyst",
            ChatSender::Assistant => "Assistant",
        };
        prompt.push_str(&format!("{speaker}: {content}\n", content = turn.content));
    }
    prompt.push_str(&format!("Analyst: {message}\nAssistant:"));
    prompt
}

/// Proxy one conversational turn to the model, with the latest indicators
/// inlined as grounding context.
pub async fn respond(
    ollama_url: &Url,
    ollama_model: &str,
    threats: &[Threat],
    history: &[ChatTurn],
    message: &str,
) -> anyhow::Result<String> {
    let system = format!(
        "{SYSTEM_PROMPT}\nRecent indicators of compromise:\n{context}",
        context = render_context(threats)
    );

    let ollama = Ollama::from_url(ollama_url.to_owned());
    let request = GenerationRequest::new(
        ollama_model.to_owned(),
        render_conversation(history, message),
    )
    .system(system);
    let response = ollama.generate(request).await?;
    if response.response.trim().is_empty() {
        bail!("Ollama returned an empty response for message: {message}")
    }
    Ok(response.response)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use shared::{IndicatorKind, Severity};
    use uuid::Uuid;

    use super::*;

    fn threat(ioc: &str) -> Threat {
        Threat {
            threat_id: Uuid::new_v4(),
            ioc: ioc.to_owned(),
            kind: IndicatorKind::Domain,
            severity: Severity::High,
            source: "unit-feed".to_owned(),
            observed_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn context_lists_every_indicator() {
        let threats = vec![threat("evil.example.com"), threat("bad.example.net")];
        let context = render_context(&threats);
        assert!(context.contains("evil.example.com"));
        assert!(context.contains("bad.example.net"));
        assert!(context.contains("severity: high"));
    }

    #[test]
    fn empty_context_has_placeholder() {
        assert_eq!(render_context(&[]), "No indicators are currently loaded.");
    }

    #[test]
    fn conversation_ends_with_current_message() {
        let history = vec![
            ChatTurn {
                sender: ChatSender::User,
                content: "Any phishing domains today?".to_owned(),
            },
            ChatTurn {
                sender: ChatSender::Assistant,
                content: "Two new domains were observed.".to_owned(),
            },
        ];
        let prompt = render_conversation(&history, "List them.");
        assert!(prompt.starts_with("Analyst: Any phishing domains today?\n"));
        assert!(prompt.contains("Assistant: Two new domains were observed.\n"));
        assert!(prompt.ends_with("Analyst: List them.\nAssistant:"));
    }
}
