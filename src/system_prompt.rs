//! Character prompt construction
//!
//! Every provider call is framed by the same character sheet: who is
//! speaking, who else is present, the persona, the length limit and the
//! operator's behavioural instructions.

use crate::character::Character;
use crate::transcript::Message;
use std::fmt::Write;

/// Build the system prompt for `character` speaking among `participants`.
pub fn build_character_prompt(
    character: &Character,
    participants: &[&str],
    max_response_length: u32,
    custom_instructions: &str,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "- You are the character \"{}\". Continue the conversation naturally, speaking only as this character.",
        character.name
    );
    let _ = writeln!(
        prompt,
        "- The participants in this conversation are: {}.",
        participants.join(", ")
    );
    let _ = writeln!(prompt, "- Your character sheet: {}", character.persona.trim());
    prompt.push_str(
        "  Your role: respond naturally to the previous remark with the flow of the conversation in mind, and keep the conversation moving smoothly.\n",
    );
    let _ = writeln!(
        prompt,
        "- Keep each reply within {max_response_length} characters."
    );

    let instructions = custom_instructions.trim();
    if !instructions.is_empty() {
        prompt.push_str(instructions);
        prompt.push('\n');
    }

    prompt
}

/// Render the history one line per message as `label: content`.
pub fn render_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|msg| format!("{}: {}", msg.label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The single-prompt form used by backends that receive no chat history:
/// the character sheet followed by the conversation so far.
pub fn build_transcript_prompt(system_prompt: &str, history: &[Message]) -> String {
    format!(
        "{system_prompt}- The conversation so far:\n{}\n",
        render_history(history)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mira() -> Character {
        Character::new("Mira", "A lighthouse keeper who speaks in short sentences.\n")
    }

    #[test]
    fn test_prompt_embeds_character_and_participants() {
        let prompt = build_character_prompt(&mira(), &["Mira", "Tobias"], 300, "Be kind.");

        assert!(prompt.contains("\"Mira\""));
        assert!(prompt.contains("Mira, Tobias"));
        assert!(prompt.contains("lighthouse keeper who speaks in short sentences."));
        assert!(prompt.contains("within 300 characters"));
        assert!(prompt.ends_with("Be kind.\n"));
    }

    #[test]
    fn test_prompt_without_instructions() {
        let prompt = build_character_prompt(&mira(), &["Mira"], 50, "  ");
        assert!(prompt.ends_with("within 50 characters.\n"));
    }

    #[test]
    fn test_empty_persona_still_builds() {
        let ghost = Character::new("Ghost", "");
        let prompt = build_character_prompt(&ghost, &["Ghost"], 100, "");
        assert!(prompt.contains("Your character sheet: \n"));
    }

    #[test]
    fn test_transcript_prompt_labels_lines() {
        let history = vec![
            Message::system("Talk about storms"),
            Message::reply("Mira", "The glass is falling."),
        ];
        let prompt = build_transcript_prompt("SHEET\n", &history);
        assert_eq!(
            prompt,
            "SHEET\n- The conversation so far:\nsystem: Talk about storms\nMira: The glass is falling.\n"
        );
    }
}
