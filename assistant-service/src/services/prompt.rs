//! Prompt framing for the interview assistant.

/// Answer returned when the question is empty after trimming.
pub const NO_QUESTION_ANSWER: &str = "No question provided.";

const PERSONA: &str = "You are an interview assistant helping a candidate during a live \
interview. Answer the question below concisely and professionally, in a few clear sentences \
that could be spoken aloud. Do not repeat the question.";

/// Wrap a trimmed, non-empty question in the assistant template.
pub fn build_prompt(question: &str) -> String {
    format!("{}\n\nQuestion: {}\n\nAnswer:", PERSONA, question)
}
