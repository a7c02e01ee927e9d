//! AI assistant chat: validate the request, pick a role-specific system
//! prompt, trim the history and forward one call to the LLM client.
//!
//! Stateless. Conversations are not stored and failures are not retried.

use std::str::FromStr;

use serde::Deserialize;

use crate::gemini::{ChatTurn, LlmClient, LlmError, TurnRole};
use crate::models::UserRole;

pub const MAX_MESSAGE_CHARS: usize = 4000;
/// Most recent history turns forwarded upstream.
pub const MAX_HISTORY_TURNS: usize = 20;

// ═══════════════════════════════════════════
// Request types
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    #[serde(default)]
    pub user_role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message is required")]
    EmptyMessage,

    #[error("Message must be at most {} characters", MAX_MESSAGE_CHARS)]
    MessageTooLong,

    #[error("AI assistant is not configured")]
    NotConfigured,

    #[error("Failed to get a response from the AI assistant")]
    Upstream(#[source] LlmError),
}

// ═══════════════════════════════════════════
// Prompt assembly
// ═══════════════════════════════════════════

/// Lenient role parsing: unknown or missing roles fall back to patient.
pub fn parse_role(raw: Option<&str>) -> UserRole {
    raw.map(|r| r.trim().to_lowercase().replace('-', "_"))
        .and_then(|r| UserRole::from_str(&r).ok())
        .unwrap_or_default()
}

pub fn system_prompt(role: UserRole) -> &'static str {
    match role {
        UserRole::Patient => {
            "You are the Ekitsa assistant, helping patients on a healthcare marketplace \
             that connects them with diagnostic labs and doctors. Help them choose lab tests, \
             compare labs, understand test preparation such as fasting, book tests or doctor \
             appointments, and find general health information. You do not give medical \
             advice or diagnoses: for symptoms or results, encourage the patient to consult \
             a qualified doctor, and in an emergency to contact local emergency services."
        }
        UserRole::Doctor => {
            "You are the Ekitsa assistant for doctors. Use a concise, clinical-reference tone. \
             Help with managing appointments, reviewing patient health records shared on \
             Ekitsa, interpreting common lab test panels and reference ranges, and ordering \
             tests through partner labs. Flag uncertainty clearly and defer to the doctor's \
             clinical judgement."
        }
        UserRole::LabOwner => {
            "You are the Ekitsa assistant for diagnostic lab owners. Help them complete lab \
             onboarding (lab details, location, services, tests, review), manage their test \
             catalogue and pricing, handle bookings and home sample collection, and read \
             their dashboard of bookings and revenue."
        }
        UserRole::Admin => {
            "You are the Ekitsa assistant for platform administrators. Help with platform \
             operations: reviewing and approving lab registrations, moderating doctors and \
             blog content, and interpreting platform analytics such as bookings, revenue and \
             top labs."
        }
    }
}

/// Upstream contents: the last `MAX_HISTORY_TURNS` usable history turns
/// followed by the new message. `assistant` maps to `model`; blank and
/// unknown-role turns are dropped, as are leading model turns.
pub fn build_contents(history: &[HistoryTurn], message: &str) -> Vec<ChatTurn> {
    let turns: Vec<ChatTurn> = history
        .iter()
        .filter(|t| !t.content.trim().is_empty())
        .filter_map(|t| match t.role.trim().to_lowercase().as_str() {
            "user" => Some(ChatTurn::user(t.content.trim())),
            "assistant" | "model" => Some(ChatTurn::model(t.content.trim())),
            _ => None,
        })
        .collect();

    let start = turns.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut contents: Vec<ChatTurn> = turns[start..]
        .iter()
        .skip_while(|t| t.role != TurnRole::User)
        .cloned()
        .collect();
    contents.push(ChatTurn::user(message));
    contents
}

fn validate_message(message: Option<&str>) -> Result<&str, ChatError> {
    let message = message.map(str::trim).unwrap_or_default();
    if message.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::MessageTooLong);
    }
    Ok(message)
}

// ═══════════════════════════════════════════
// Entry point
// ═══════════════════════════════════════════

pub async fn reply(llm: Option<&dyn LlmClient>, request: &ChatRequest) -> Result<String, ChatError> {
    let message = validate_message(request.message.as_deref())?;
    let llm = llm.ok_or(ChatError::NotConfigured)?;

    let role = parse_role(request.user_role.as_deref());
    let contents = build_contents(&request.history, message);
    tracing::debug!(role = %role, turns = contents.len(), "Forwarding chat message");

    llm.generate(system_prompt(role), &contents).await.map_err(|e| {
        tracing::error!(error = %e, "AI assistant request failed");
        ChatError::Upstream(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::MockLlmClient;

    fn turn(role: &str, content: &str) -> HistoryTurn {
        HistoryTurn {
            role: role.into(),
            content: content.into(),
        }
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    #[test]
    fn role_parsing_falls_back_to_patient() {
        assert_eq!(parse_role(Some("doctor")), UserRole::Doctor);
        assert_eq!(parse_role(Some(" Lab-Owner ")), UserRole::LabOwner);
        assert_eq!(parse_role(Some("superuser")), UserRole::Patient);
        assert_eq!(parse_role(None), UserRole::Patient);
    }

    #[test]
    fn prompts_differ_per_role() {
        assert!(system_prompt(UserRole::Patient).contains("medical"));
        assert!(system_prompt(UserRole::LabOwner).contains("onboarding"));
        assert_ne!(system_prompt(UserRole::Doctor), system_prompt(UserRole::Admin));
    }

    #[test]
    fn history_mapped_and_filtered() {
        let history = vec![
            turn("assistant", "Welcome to Ekitsa"),
            turn("user", "Which labs do CBC?"),
            turn("assistant", "Apollo and Vijaya."),
            turn("user", "   "),
            turn("system", "ignore me"),
        ];
        let contents = build_contents(&history, "Prices?");
        assert_eq!(
            contents,
            vec![
                ChatTurn::user("Which labs do CBC?"),
                ChatTurn::model("Apollo and Vijaya."),
                ChatTurn::user("Prices?"),
            ]
        );
    }

    #[test]
    fn history_trimmed_to_most_recent_turns() {
        let history: Vec<HistoryTurn> = (0..30)
            .map(|i| turn(if i % 2 == 0 { "user" } else { "assistant" }, &format!("turn {i}")))
            .collect();
        let contents = build_contents(&history, "latest");
        assert_eq!(contents.len(), MAX_HISTORY_TURNS + 1);
        assert_eq!(contents[0], ChatTurn::user("turn 10"));
        assert_eq!(contents[MAX_HISTORY_TURNS - 1].role, TurnRole::Model);
        assert_eq!(contents.last(), Some(&ChatTurn::user("latest")));
    }

    #[tokio::test]
    async fn blank_or_long_message_rejected() {
        let mock = MockLlmClient::new("unused");
        assert!(matches!(
            reply(Some(&mock), &request("  ")).await,
            Err(ChatError::EmptyMessage)
        ));
        assert!(matches!(
            reply(Some(&mock), &ChatRequest::default()).await,
            Err(ChatError::EmptyMessage)
        ));
        assert!(matches!(
            reply(Some(&mock), &request(&"x".repeat(MAX_MESSAGE_CHARS + 1))).await,
            Err(ChatError::MessageTooLong)
        ));
        assert!(mock.last_request().is_none());
    }

    #[tokio::test]
    async fn unconfigured_client_reported() {
        let err = reply(None, &request("hello")).await.unwrap_err();
        assert!(matches!(err, ChatError::NotConfigured));
        assert_eq!(err.to_string(), "AI assistant is not configured");
    }

    #[tokio::test]
    async fn reply_uses_role_prompt() {
        let mock = MockLlmClient::new("Book a lipid profile after 10 hours of fasting.");
        let mut req = request(" Do I need to fast? ");
        req.user_role = Some("lab_owner".into());
        let text = reply(Some(&mock), &req).await.unwrap();
        assert_eq!(text, "Book a lipid profile after 10 hours of fasting.");

        let (system, turns) = mock.last_request().unwrap();
        assert_eq!(system, system_prompt(UserRole::LabOwner));
        assert_eq!(turns, vec![ChatTurn::user("Do I need to fast?")]);
    }

    #[tokio::test]
    async fn upstream_failure_has_generic_message() {
        let mock = MockLlmClient::failing();
        let err = reply(Some(&mock), &request("hello")).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get a response from the AI assistant");
    }
}
