//! Stage 3 - articulating a general principle.

use super::{clarify_note, preamble};
use crate::domain::dialogue::state::TopicContext;
use crate::domain::dialogue::versions::{PrincipleVersion, StanceVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipleFocus {
    /// Invite the student to state the principle behind their judgements.
    Articulate,
    /// Work through a moral tension without introducing a new case.
    ResolveTension(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipleInvitationInput {
    pub topic: TopicContext,
    pub stance: StanceVersion,
    pub principle: Option<PrincipleVersion>,
    pub focus: PrincipleFocus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipleClassifierInput {
    pub topic: TopicContext,
    pub stance: StanceVersion,
    pub principle: Option<PrincipleVersion>,
    pub loop_count: u32,
    pub student_message: String,
    pub clarifying: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipleRefinementInput {
    pub topic: TopicContext,
    pub principle: PrincipleVersion,
    /// The student's latest words about the principle.
    pub request: String,
}

fn principle_line(principle: Option<&PrincipleVersion>) -> String {
    match principle {
        Some(p) => format!(
            "Latest principle (v{}, {}): {}",
            p.version,
            p.classification.as_str(),
            p.statement
        ),
        None => "No principle stated yet.".to_string(),
    }
}

pub(super) fn invitation(input: &PrincipleInvitationInput) -> (String, String) {
    let focus = match &input.focus {
        PrincipleFocus::Articulate => {
            "The student has worked through several cases. Invite them to state the general \
             principle that explains their judgements across those cases."
                .to_string()
        }
        PrincipleFocus::ResolveTension(tension) => format!(
            "Help the student confront this tension in their reasoning without introducing \
             a new case: {}",
            tension
        ),
    };
    let instructions = format!(
        "{}\n\nStudent's stance: {} because {}\n{}\n\n{}",
        preamble(&input.topic),
        input.stance.position,
        input.stance.reason,
        principle_line(input.principle.as_ref()),
        focus
    );
    let task = "Write your next turn for the student.".to_string();
    (instructions, task)
}

pub(super) fn classifier(input: &PrincipleClassifierInput) -> (String, String) {
    let instructions = format!(
        "{}\n\nStudent's stance: {} because {}\n{}\nCompleted challenge rounds: {}.\n\n\
         Classify the student's attempt at a general principle:\n\
         - TR_CLARIFY: no recognizable principle; give a clarifying_question.\n\
         - TR_COMPLETE: a principle that admits reasonable exceptions or qualifications. \
         Extract the statement; classification MODERATE.\n\
         - TR_NEXT_CASE: a sweeping principle with no exceptions that should be tested \
         against a counter-case. Extract the statement; classification EXTREME.\n\
         - TR_SCAFFOLD: the student is wrestling with a moral tension they have not yet \
         resolved; describe it in tension.{}",
        preamble(&input.topic),
        input.stance.position,
        input.stance.reason,
        principle_line(input.principle.as_ref()),
        input.loop_count,
        clarify_note(input.clarifying)
    );
    let task = format!(
        "Classify the student's latest message:\n\"\"\"\n{}\n\"\"\"",
        input.student_message
    );
    (instructions, task)
}

pub(super) fn refinement(input: &PrincipleRefinementInput) -> (String, String) {
    let instructions = format!(
        "{}\n\n{}\nStudent's latest remarks: {}\n\nRestate the principle in a sharper, \
         more precise form that stays faithful to the student's words. Do not decide \
         whether it is acceptable.",
        preamble(&input.topic),
        principle_line(Some(&input.principle)),
        input.request
    );
    let task = "Give the refined principle, then ask the student to elaborate on where it \
                might not hold or to confirm it captures their view."
        .to_string();
    (instructions, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::versions::PrincipleClassification;

    #[test]
    fn principle_line_reports_classification() {
        let principle = PrincipleVersion {
            version: 3,
            statement: "Minimize harm".to_string(),
            classification: PrincipleClassification::Moderate,
        };
        assert_eq!(
            principle_line(Some(&principle)),
            "Latest principle (v3, MODERATE): Minimize harm"
        );
        assert_eq!(principle_line(None), "No principle stated yet.");
    }

    #[test]
    fn tension_focus_is_rendered() {
        let (instructions, _) = invitation(&PrincipleInvitationInput {
            topic: TopicContext::new("Lying").unwrap(),
            stance: StanceVersion {
                version: 1,
                position: "P".to_string(),
                reason: "R".to_string(),
            },
            principle: None,
            focus: PrincipleFocus::ResolveTension("loyalty vs honesty".to_string()),
        });
        assert!(instructions.contains("loyalty vs honesty"));
    }
}
