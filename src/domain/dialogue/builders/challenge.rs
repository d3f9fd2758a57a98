//! Stage 2 - pressure-testing the stance with concrete cases.

use super::{clarify_note, preamble};
use crate::domain::dialogue::state::TopicContext;
use crate::domain::dialogue::versions::{PrincipleVersion, StanceVersion};

/// What the next challenge case should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeFocus {
    /// A fresh case that strains the current stance.
    NewCase,
    /// Respond to a shift in the student's stance within the current case.
    AddressShift,
    /// A case that tests the limits of an extreme principle.
    PressureTestPrinciple(PrincipleVersion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeCaseInput {
    pub topic: TopicContext,
    pub stance: StanceVersion,
    pub previous_case: Option<String>,
    pub loop_count: u32,
    pub max_loops: u32,
    pub focus: ChallengeFocus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeClassifierInput {
    pub topic: TopicContext,
    pub stance: StanceVersion,
    pub current_case: Option<String>,
    pub loop_count: u32,
    pub max_loops: u32,
    pub student_message: String,
    pub clarifying: bool,
}

fn stance_line(stance: &StanceVersion) -> String {
    format!(
        "Student's current stance (v{}): {} because {}",
        stance.version, stance.position, stance.reason
    )
}

pub(super) fn case(input: &ChallengeCaseInput) -> (String, String) {
    let focus = match &input.focus {
        ChallengeFocus::NewCase => {
            "Present a new, concrete scenario in which the student's stance leads to an \
             uncomfortable or surprising conclusion."
                .to_string()
        }
        ChallengeFocus::AddressShift => {
            "The student has just qualified or defended their stance. Acknowledge the \
             move without judgement and adapt the current scenario so it tests the stance \
             as it now stands."
                .to_string()
        }
        ChallengeFocus::PressureTestPrinciple(principle) => format!(
            "The student proposed the principle \"{}\", which admits no exceptions. Present \
             a concrete scenario where applying it strictly produces a troubling result.",
            principle.statement
        ),
    };
    let previous = match (&input.focus, input.previous_case.as_deref()) {
        (_, None) => String::new(),
        (ChallengeFocus::AddressShift, Some(case)) => format!("\n\nCurrent case: {}", case),
        (_, Some(case)) => format!("\n\nPrevious case (do not repeat it): {}", case),
    };

    let instructions = format!(
        "{}\n\n{}\nChallenge round {} of {}.{}\n\n{}",
        preamble(&input.topic),
        stance_line(&input.stance),
        (input.loop_count + 1).min(input.max_loops),
        input.max_loops,
        previous,
        focus
    );
    let task = "Write the challenge case and ask how the student's stance applies to it.".to_string();
    (instructions, task)
}

pub(super) fn classifier(input: &ChallengeClassifierInput) -> (String, String) {
    let case = input
        .current_case
        .as_deref()
        .unwrap_or("(no case recorded)");
    let instructions = format!(
        "{}\n\n{}\nCase under discussion: {}\nCompleted rounds: {} of {}.\n\n\
         Classify the student's response to the case:\n\
         - TR_CLARIFY: the response is off-topic or too ambiguous to evaluate; give a \
         clarifying_question.\n\
         - TR_SCAFFOLD: the student changed or qualified their stance but the case is not \
         yet resolved; put the revised position and reason in the fields if it changed.\n\
         - TR_CASE_COMPLETED: the student has reasoned the case through. Set \
         request_principle to true if they are ready to state a general principle.{}",
        preamble(&input.topic),
        stance_line(&input.stance),
        case,
        input.loop_count,
        input.max_loops,
        clarify_note(input.clarifying)
    );
    let task = format!(
        "Classify the student's latest message:\n\"\"\"\n{}\n\"\"\"",
        input.student_message
    );
    (instructions, task)
}
