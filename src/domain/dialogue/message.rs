//! Student-facing text produced by generation and refinement prompts.
//!
//! Generation output is conventionally a primary message followed by a
//! short follow-up question, separated by a blank line.

use serde::{Deserialize, Serialize};

const QUESTION_LABELS: [&str; 2] = ["Question:", "QUESTION:"];

/// A generated message split into its two logical fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub message: String,
    pub question: Option<String>,
}

impl GeneratedMessage {
    pub fn new(message: impl Into<String>, question: Option<String>) -> Self {
        Self {
            message: message.into(),
            question,
        }
    }

    /// Splits raw model text into message and trailing question.
    ///
    /// The last paragraph is taken as the question when it ends in `?` and
    /// at least one other paragraph precedes it. CRLF line endings are
    /// treated as LF.
    pub fn parse(text: &str) -> Self {
        let text = text.replace("\r\n", "\n");
        let paragraphs: Vec<&str> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        match paragraphs.split_last() {
            Some((last, rest)) if !rest.is_empty() && last.ends_with('?') => Self {
                message: rest.join("\n\n"),
                question: Some(strip_label(last).to_string()),
            },
            _ => Self {
                message: paragraphs.join("\n\n"),
                question: None,
            },
        }
    }

    /// Text shown to the student: message, blank line, question.
    pub fn display(&self) -> String {
        match &self.question {
            Some(question) => format!("{}\n\n{}", self.message, question),
            None => self.message.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty() && self.question.is_none()
    }
}

fn strip_label(paragraph: &str) -> &str {
    QUESTION_LABELS
        .iter()
        .find_map(|label| paragraph.strip_prefix(label))
        .map(str::trim_start)
        .unwrap_or(paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_trailing_question() {
        let parsed = GeneratedMessage::parse(
            "Imagine a doctor who lies to spare a patient.\n\nIs the doctor wrong?",
        );
        assert_eq!(parsed.message, "Imagine a doctor who lies to spare a patient.");
        assert_eq!(parsed.question.as_deref(), Some("Is the doctor wrong?"));
    }

    #[test]
    fn crlf_output_splits_like_lf() {
        let parsed = GeneratedMessage::parse(
            "Imagine a doctor who lies.\r\nShe means well.\r\n\r\nIs the doctor wrong?\r\n",
        );
        assert_eq!(parsed.message, "Imagine a doctor who lies.\nShe means well.");
        assert_eq!(parsed.question.as_deref(), Some("Is the doctor wrong?"));
    }

    #[test]
    fn single_paragraph_has_no_question() {
        let parsed = GeneratedMessage::parse("Welcome. What do you think?");
        assert_eq!(parsed.message, "Welcome. What do you think?");
        assert!(parsed.question.is_none());
    }

    #[test]
    fn last_paragraph_without_question_mark_stays_in_message() {
        let parsed = GeneratedMessage::parse("First part.\n\nSecond part.");
        assert_eq!(parsed.message, "First part.\n\nSecond part.");
        assert!(parsed.question.is_none());
    }

    #[test]
    fn strips_question_label() {
        let parsed = GeneratedMessage::parse("Summary text.\n\nQuestion: Does this capture it?");
        assert_eq!(parsed.question.as_deref(), Some("Does this capture it?"));
    }

    #[test]
    fn display_joins_with_blank_line() {
        let message = GeneratedMessage::new("Case.", Some("Why?".to_string()));
        assert_eq!(message.display(), "Case.\n\nWhy?");
        assert_eq!(GeneratedMessage::parse(&message.display()), message);
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(GeneratedMessage::parse("\n\n  \n\n").is_empty());
    }
}
