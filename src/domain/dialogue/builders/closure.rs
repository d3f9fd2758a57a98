//! Stage 4 - synthesis and confirmation.

use super::preamble;
use crate::domain::dialogue::state::TopicContext;
use crate::domain::dialogue::versions::{PrincipleVersion, StanceVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureSummaryInput {
    pub topic: TopicContext,
    pub stances: Vec<StanceVersion>,
    pub principles: Vec<PrincipleVersion>,
    pub loop_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureClassifierInput {
    pub topic: TopicContext,
    pub draft_summary: String,
    pub student_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureRefinementInput {
    pub topic: TopicContext,
    pub draft_summary: String,
    pub correction: String,
}

pub(super) fn summary(input: &ClosureSummaryInput) -> (String, String) {
    let stances = input
        .stances
        .iter()
        .map(|s| format!("- v{}: {} (because {})", s.version, s.position, s.reason))
        .collect::<Vec<_>>()
        .join("\n");
    let principles = input
        .principles
        .iter()
        .map(|p| format!("- v{} [{}]: {}", p.version, p.classification.as_str(), p.statement))
        .collect::<Vec<_>>()
        .join("\n");

    let instructions = format!(
        "{}\n\nThe discussion is closing after {} challenge rounds.\n\nStance history:\n{}\n\n\
         Principle history:\n{}\n\nSynthesize how the student's thinking evolved, in the \
         second person, in one or two short paragraphs.",
        preamble(&input.topic),
        input.loop_count,
        stances,
        principles
    );
    let task = "Write the summary, then ask the student whether it accurately captures \
                their reasoning."
        .to_string();
    (instructions, task)
}

pub(super) fn classifier(input: &ClosureClassifierInput) -> (String, String) {
    let instructions = format!(
        "{}\n\nDraft summary shown to the student:\n{}\n\n\
         Classify the student's reaction:\n\
         - TR_CONFIRM_END: the student accepts the summary. Optionally add a one-sentence \
         closing_remark.\n\
         - TR_CLARIFY: the student wants something changed; describe it in correction.",
        preamble(&input.topic),
        input.draft_summary
    );
    let task = format!(
        "Classify the student's latest message:\n\"\"\"\n{}\n\"\"\"",
        input.student_message
    );
    (instructions, task)
}

pub(super) fn refinement(input: &ClosureRefinementInput) -> (String, String) {
    let instructions = format!(
        "{}\n\nCurrent draft summary:\n{}\n\nRequested correction: {}\n\nRevise the summary \
         to incorporate the correction. Keep everything else the student did not dispute.",
        preamble(&input.topic),
        input.draft_summary,
        input.correction
    );
    let task = "Write the revised summary, then ask the student to confirm it.".to_string();
    (instructions, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::versions::PrincipleClassification;

    #[test]
    fn summary_lists_both_histories() {
        let (instructions, _) = summary(&ClosureSummaryInput {
            topic: TopicContext::new("Lying").unwrap(),
            stances: vec![StanceVersion {
                version: 1,
                position: "P".to_string(),
                reason: "R".to_string(),
            }],
            principles: vec![PrincipleVersion {
                version: 1,
                statement: "S".to_string(),
                classification: PrincipleClassification::Moderate,
            }],
            loop_count: 2,
        });
        assert!(instructions.contains("- v1: P (because R)"));
        assert!(instructions.contains("- v1 [MODERATE]: S"));
        assert!(instructions.contains("after 2 challenge rounds"));
    }
}
