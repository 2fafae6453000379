//! Parsing of the model's free-text reply into a structured result.
//!
//! Counterpart of the format requested in `prompt.rs`. Models drift from
//! the requested format in small ways, so everything short of a missing
//! answer section is normalized rather than rejected.

use serde::{Deserialize, Serialize};

use super::prompt::ANSWER_LABEL;
use crate::error::AppError;

/// Questions used to pad the follow-up list when the model returns fewer
/// than three usable ones. Generic on purpose; callers always receive
/// exactly three items.
pub const FOLLOWUP_PLACEHOLDERS: [&str; 3] = [
    "What were the main challenges?",
    "What's planned for next week?",
    "Is the timeline on track?",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResult {
    pub answer: String,
    /// Always exactly three items.
    pub follow_up_questions: Vec<String>,
}

/// Splits a raw model reply into an answer and exactly three follow-up
/// questions.
///
/// The answer section is everything before the `FOLLOWUPS:` marker line,
/// with a leading `ANSWER:` label stripped. When the marker is missing the
/// answer can still be located through the label; when neither is present
/// the reply is unusable and `MalformedResponse` is returned. Follow-up
/// lines tolerate `1.`, `1)`, `-` and similar list prefixes, extra
/// whitespace, and trailing blank lines; fewer than three questions are
/// padded with placeholders and extras beyond three are dropped.
pub fn parse_reply(raw: &str) -> Result<QaResult, AppError> {
    let mut answer_lines: Vec<&str> = Vec::new();
    let mut followup_lines: Vec<&str> = Vec::new();
    let mut seen_marker = false;

    for line in raw.lines() {
        if !seen_marker && is_followups_marker(line) {
            seen_marker = true;
            continue;
        }
        if seen_marker {
            followup_lines.push(line);
        } else {
            answer_lines.push(line);
        }
    }

    let answer_section = answer_lines.join("\n");
    let answer_section = answer_section.trim();

    let answer = match strip_answer_label(answer_section) {
        Some(labeled) => labeled.trim().to_string(),
        None if seen_marker => answer_section.to_string(),
        None => {
            return Err(AppError::MalformedResponse(
                "no answer section located in model reply".to_string(),
            ));
        }
    };

    let mut follow_up_questions: Vec<String> = followup_lines
        .iter()
        .map(|line| strip_list_prefix(line))
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .take(3)
        .collect();

    while follow_up_questions.len() < 3 {
        follow_up_questions.push(FOLLOWUP_PLACEHOLDERS[follow_up_questions.len()].to_string());
    }

    Ok(QaResult {
        answer,
        follow_up_questions,
    })
}

/// A marker line is `FOLLOWUPS` alone (tolerating hyphens, spacing, case,
/// a trailing colon, and the "questions" suffix). Matching the whole line
/// keeps answer prose that merely mentions following up from splitting
/// the reply.
fn is_followups_marker(line: &str) -> bool {
    let compact: String = line
        .trim()
        .trim_end_matches(':')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();

    matches!(
        compact.as_str(),
        "FOLLOWUP" | "FOLLOWUPS" | "FOLLOWUPQUESTIONS" | "SUGGESTEDFOLLOWUPS" | "SUGGESTIONS"
    )
}

/// Strips a leading `ANSWER:` label, case-insensitively and tolerating
/// space before the colon. Returns `None` when the label (with its colon)
/// is not there, so "Answers vary." is not mistaken for a label.
fn strip_answer_label(text: &str) -> Option<&str> {
    let label = ANSWER_LABEL.trim_end_matches(':');
    let head = text.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    text[label.len()..].trim_start().strip_prefix(':')
}

/// Drops a leading list marker ("1.", "2)", "-", "*", "3:") from a
/// follow-up line. Mirrors the upload-side tolerance: if no letter shows
/// up within the first few characters the line is kept as-is.
fn strip_list_prefix(line: &str) -> &str {
    let trimmed = line.trim();
    for (i, c) in trimmed.char_indices() {
        if c.is_alphabetic() {
            return trimmed[i..].trim();
        }
        if i > 5 {
            break;
        }
    }
    trimmed
}
