//! Deterministic offline replies.
//!
//! Used when every remote transport for an operation has failed. The text is
//! built only from the operation's inputs, so the same inputs always produce
//! the same reply, and it always starts with [`SYNTHETIC_MARKER`].

use super::game_session::Difficulty;
use crate::content::topic::Topic;
use crate::util::truncate_str;

/// Prefix identifying a locally generated reply.
pub const SYNTHETIC_MARKER: &str = "[offline practice mode]";

/// Longest user text echoed back verbatim.
const MAX_ECHO_BYTES: usize = 280;

/// Whether `text` was produced by this module.
pub fn is_synthetic_text(text: &str) -> bool {
    text.starts_with(SYNTHETIC_MARKER)
}

/// Opening message for a session that could not reach any provider.
pub fn synthetic_greeting(topic: &Topic, difficulty: Difficulty) -> String {
    let description = if topic.description.trim().is_empty() {
        String::new()
    } else {
        format!(" {}", topic.description.trim())
    };
    format!(
        "{} Welcome to {}! We'll work through it at the {} level.{} \
         The tutor service is unreachable right now, so let's warm up: \
         tell me what you already know about {}, or ask your first question.",
        SYNTHETIC_MARKER, topic.name, difficulty, description, topic.name
    )
}

/// Reply to `user_text` when no provider answered.
pub fn synthetic_reply(topic: &Topic, difficulty: Difficulty, user_text: &str) -> String {
    let trimmed = user_text.trim();
    let echoed = truncate_str(trimmed, MAX_ECHO_BYTES);
    let ellipsis = if echoed.len() < trimmed.len() { "..." } else { "" };
    let prompt = if echoed.is_empty() {
        "You shared an attachment.".to_string()
    } else {
        format!("You asked: \"{}{}\".", echoed, ellipsis)
    };
    format!(
        "{} {} I can't reach the tutor service at the moment, so here is a practice \
         exercise instead: explain in your own words how this relates to {}. {}",
        SYNTHETIC_MARKER,
        prompt,
        topic.name,
        difficulty_hint(difficulty)
    )
}

fn difficulty_hint(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Start with a simple everyday example.",
        Difficulty::Intermediate => "Try to name the key steps or components involved.",
        Difficulty::Hard => "Consider edge cases, limitations and trade-offs.",
    }
}
