//! Stage 1 - eliciting the student's initial stance.

use super::{clarify_note, preamble};
use crate::domain::dialogue::state::TopicContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StanceOpeningInput {
    pub topic: TopicContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StanceClassifierInput {
    pub topic: TopicContext,
    pub student_message: String,
    pub clarifying: bool,
}

pub(super) fn opening(input: &StanceOpeningInput) -> (String, String) {
    let instructions = format!(
        "{}\n\nThis is the start of the dialogue. Briefly introduce the question in an \
         engaging, neutral way without suggesting an answer.",
        preamble(&input.topic)
    );
    let task = "Open the discussion and ask the student where they stand and why.".to_string();
    (instructions, task)
}

pub(super) fn classifier(input: &StanceClassifierInput) -> (String, String) {
    let instructions = format!(
        "{}\n\nYou are classifying whether the student has stated an initial stance.\n\
         - TR_V1_ESTABLISHED: the student took a clear position and gave at least one \
         reason. Extract both.\n\
         - TR_CLARIFY: the position or the reason is missing or ambiguous. Provide a \
         clarifying_question that asks for exactly what is missing.{}",
        preamble(&input.topic),
        clarify_note(input.clarifying)
    );
    let task = format!(
        "Classify the student's latest message:\n\"\"\"\n{}\n\"\"\"",
        input.student_message
    );
    (instructions, task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_mentions_both_intents() {
        let (instructions, task) = classifier(&StanceClassifierInput {
            topic: TopicContext::new("Free will").unwrap(),
            student_message: "Depends.".to_string(),
            clarifying: true,
        });
        assert!(instructions.contains("TR_V1_ESTABLISHED"));
        assert!(instructions.contains("TR_CLARIFY"));
        assert!(instructions.contains("previous turn asked the student to clarify"));
        assert!(task.contains("Depends."));
    }
}
