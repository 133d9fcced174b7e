//! Prompt text assembly.
//!
//! ```rust
//! use kchat::PromptAssembler;
//! use kmemory::ConversationTurn;
//!
//! let prompt = PromptAssembler::build(
//!     "You are a helpful bot.",
//!     Some("2025-04-01 09:00"),
//!     "",
//!     &[ConversationTurn::user("hi"), ConversationTurn::model("hello")],
//!     "what now?",
//! );
//!
//! assert!(prompt.starts_with("You are a helpful bot.\nNow is 2025-04-01 09:00\n"));
//! assert!(prompt.contains("Conversation history:\nuser: hi\nassistant: hello\n\n"));
//! assert!(prompt.ends_with("User message:\nwhat now?"));
//! ```

use kmemory::{ConversationTurn, TurnRole};
use kprovider::ToolDefinition;

const TOOL_RULES_HEADING: &str = "Function calling rules:";
const TOOL_RULES_PREAMBLE: &str = "You can use the functions below. When a request matches one, reply with a function call instead of answering directly.";

/// Pure: no I/O, history is passed in already fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn build(
        system_prompt: &str,
        timestamp: Option<&str>,
        tool_instructions: &str,
        history: &[ConversationTurn],
        message: &str,
    ) -> String {
        let mut prompt = String::new();
        push_line_block(&mut prompt, system_prompt);

        if let Some(timestamp) = timestamp.filter(|value| !value.trim().is_empty()) {
            prompt.push_str(&format!("Now is {timestamp}\n"));
        }

        push_line_block(&mut prompt, tool_instructions);
        prompt.push('\n');

        if !history.is_empty() {
            prompt.push_str("Conversation history:\n");
            for turn in history {
                prompt.push_str(&format!("{}: {}\n", history_label(turn.role), turn.content));
            }
            prompt.push('\n');
        }

        prompt.push_str("User message:\n");
        prompt.push_str(message);
        prompt
    }
}

/// One `- name: description` line per declaration under a fixed heading.
/// Empty when no tools are registered.
pub fn render_tool_instructions(definitions: &[ToolDefinition]) -> String {
    if definitions.is_empty() {
        return String::new();
    }

    let mut instructions = format!("{TOOL_RULES_HEADING}\n{TOOL_RULES_PREAMBLE}\n");
    for definition in definitions {
        instructions.push_str(&format!("- {}: {}\n", definition.name, definition.description));
    }

    instructions
}

fn history_label(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Model => "assistant",
    }
}

fn push_line_block(prompt: &mut String, block: &str) {
    if block.is_empty() {
        return;
    }

    prompt.push_str(block);
    if !block.ends_with('\n') {
        prompt.push('\n');
    }
}
