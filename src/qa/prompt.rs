//! Prompt construction for report QA.
//!
//! The reply format asked for here is a contract shared with the parser:
//! one `ANSWER:` section followed by a `FOLLOWUPS:` marker line and three
//! numbered questions. Keep the two modules in sync.

/// Label the model is told to put in front of its answer.
pub const ANSWER_LABEL: &str = "ANSWER:";

/// Marker line the model is told to put before the follow-up questions.
pub const FOLLOWUPS_LABEL: &str = "FOLLOWUPS:";

pub fn system_prompt() -> String {
    "You are a helpful assistant that answers questions about an employee's task report."
        .to_string()
}

/// Builds the single QA prompt. Pure and deterministic; the report text is
/// embedded in full, never truncated or summarized, and the question is
/// included verbatim. An empty report still yields a valid prompt, and the
/// instructions tell the model to say when information is unavailable.
pub fn build_prompt(report_text: &str, question: &str) -> String {
    format!(
        "Task Report:\n{report_text}\n\n\
        Manager's Question: {question}\n\n\
        Answer the question directly and professionally based only on the information \
        in the report. If the information isn't available in the report, say so clearly.\n\n\
        Then suggest exactly 3 follow-up questions the manager might want to ask next. \
        Make them specific and relevant to the report content, and keep each one \
        concise (under 10 words if possible).\n\n\
        Reply in exactly this format:\n\
        {ANSWER_LABEL} <your answer>\n\
        {FOLLOWUPS_LABEL}\n\
        1. <first follow-up question>\n\
        2. <second follow-up question>\n\
        3. <third follow-up question>"
    )
}
