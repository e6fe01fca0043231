//! Prompt formatting and reply extraction around a text-completion model

use crate::protocol::{ChatMessage, ChatRole};

const ASSISTANT_CUE: &str = "Assistant: ";

/// One `Role: content` line per message, ending with an open assistant turn.
/// Roles without a prefix are skipped.
pub fn format_chat_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for msg in messages {
        let label = match msg.role {
            ChatRole::System => "System: ",
            ChatRole::User => "User: ",
            ChatRole::Assistant => ASSISTANT_CUE,
            ChatRole::Other => continue,
        };
        prompt.push_str(label);
        prompt.push_str(&msg.content);
        prompt.push('\n');
    }
    prompt.push_str(ASSISTANT_CUE);
    prompt
}

/// Keep only the final assistant turn of a full completion, cut before any
/// hallucinated user turn.
pub fn extract_reply(full_text: &str) -> String {
    let last_turn = full_text
        .rsplit(ASSISTANT_CUE)
        .next()
        .unwrap_or(full_text)
        .trim();

    match last_turn.split_once("User:") {
        Some((reply, _)) => reply.trim().to_string(),
        None => last_turn.to_string(),
    }
}
