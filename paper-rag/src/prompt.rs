//! Grounded prompt construction.
//!
//! [`compose`] turns the ranked chunks, the selected titles and the question
//! into a system/user message pair. It performs no I/O.

use crate::document::{ChatMessage, RankedResult};

/// Characters of each ranked chunk quoted in the system message.
pub const EXCERPT_CHARS: usize = 500;

/// Return at most the first `max_chars` characters of `text`.
///
/// Cuts on a character boundary, never inside a multi-byte code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the system and user messages for one question.
///
/// The system message lists one numbered excerpt per ranked result, in rank
/// order, followed by the titles of every selected document. The user message
/// carries the question verbatim.
pub fn compose(
    ranked: &[RankedResult],
    titles: &[String],
    query: &str,
) -> (ChatMessage, ChatMessage) {
    let mut system = String::from(
        "Act as an academic whose expertise is reading and summarizing scientific papers. \
         You are given a question, a series of text excerpts and the titles of the papers \
         they come from, ordered by their cosine similarity to the question. Use the \
         excerpts to return a very detailed answer in the language of the question.",
    );

    if ranked.is_empty() {
        system.push_str(" No excerpts are available.");
    } else {
        system.push_str(" The excerpts are as follows:");
        for (i, result) in ranked.iter().enumerate() {
            system.push_str(&format!(
                " {}. {}.",
                i + 1,
                truncate_chars(&result.chunk.text, EXCERPT_CHARS)
            ));
        }
    }

    match titles {
        [] => {}
        [title] => system.push_str(&format!(" The title of the paper is: {title}")),
        _ => system.push_str(&format!(" The titles of the papers are: {}", titles.join("; "))),
    }

    let user = format!(
        "Given the question: \"{query}\". Return a detailed answer based on the papers:"
    );

    (ChatMessage::system(system), ChatMessage::user(user))
}
