use crate::{
    config::GeneratorSettings,
    generation::types::{ChatMessage, GenerationRequest},
};

pub const SYSTEM_PROMPT: &str =
    "You are an expert in writing professional product requirement documents.";

const PRD_SECTIONS: [&str; 8] = [
    "Product Goal",
    "Stakeholders",
    "Features and Functionalities",
    "User Stories",
    "Technical Requirements",
    "Constraints",
    "Milestones",
    "Acceptance Criteria",
];

/// Embeds the PRD template/context and the meeting transcript into the
/// instruction sent as the user message.
pub fn build_prompt(context: &str, transcript: &str) -> String {
    let sections = PRD_SECTIONS
        .iter()
        .map(|section| format!("- {section}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a product manager assistant. Your task is to generate a Product Requirements Document (PRD).

Use the following PRD schema/context as a base:

--- Start of Context ---
{context}
--- End of Context ---

Based on the following meeting transcript:

--- Start of Transcript ---
{transcript}
--- End of Transcript ---

Generate a comprehensive PRD based on the context and discussed items in the transcript. Include sections like:
{sections}

Structure the output in clean Markdown.
"
    )
}

pub fn build_request(prompt: String, settings: &GeneratorSettings) -> GenerationRequest {
    GenerationRequest {
        model: settings.model.clone(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::Role;

    #[test]
    fn prompt_wraps_both_blocks_in_order() {
        let prompt = build_prompt("TEMPLATE BODY", "MEETING NOTES");

        let context_start = prompt.find("--- Start of Context ---").unwrap();
        let context = prompt.find("TEMPLATE BODY").unwrap();
        let context_end = prompt.find("--- End of Context ---").unwrap();
        let transcript_start = prompt.find("--- Start of Transcript ---").unwrap();
        let transcript = prompt.find("MEETING NOTES").unwrap();
        let transcript_end = prompt.find("--- End of Transcript ---").unwrap();

        assert!(context_start < context && context < context_end);
        assert!(context_end < transcript_start);
        assert!(transcript_start < transcript && transcript < transcript_end);
        assert!(prompt.contains("- Acceptance Criteria"));
        assert!(prompt.contains("clean Markdown"));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_prompt("a", "b"), build_prompt("a", "b"));
    }

    #[test]
    fn request_carries_system_then_user_message() {
        let settings = GeneratorSettings::default();
        let request = build_request("hello".to_string(), &settings);

        assert_eq!(request.model, settings.model);
        assert_eq!(request.temperature, settings.temperature);
        assert_eq!(request.max_tokens, settings.max_tokens);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.messages[1].content, "hello");
    }
}
