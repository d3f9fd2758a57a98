//! Stage builders - pure functions from (turns, typed input) to a `Prompt`.
//!
//! `StageBuilder` is a closed enum: one variant per stage and purpose, each
//! carrying exactly the inputs its prompt needs. The transition table picks
//! the variant; nothing here reads or writes `DialogueState`.

mod challenge;
mod closure;
mod principle;
mod stance;

pub use challenge::{ChallengeCaseInput, ChallengeClassifierInput, ChallengeFocus};
pub use closure::{ClosureClassifierInput, ClosureRefinementInput, ClosureSummaryInput};
pub use principle::{
    PrincipleClassifierInput, PrincipleFocus, PrincipleInvitationInput, PrincipleRefinementInput,
};
pub use stance::{StanceClassifierInput, StanceOpeningInput};

use super::prompt::{BuilderKind, Prompt, PromptPurpose};
use super::schema::DecisionSchema;
use super::stage::Stage;
use super::state::{TopicContext, Turn};

/// Most recent turns included as prompt context.
pub const MAX_CONTEXT_TURNS: usize = 40;

const GENERATION_FORMAT: &str = "Write your reply as plain prose for the student. \
     End with a blank line followed by exactly one short follow-up question.";

const CLASSIFICATION_FORMAT: &str = "Do not address the student. Respond only with a JSON object \
     matching the provided schema. Choose the intent strictly from the schema's enum.";

/// Every builder the orchestrator can invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageBuilder {
    StanceOpening(StanceOpeningInput),
    StanceClassifier(StanceClassifierInput),
    ChallengeCase(ChallengeCaseInput),
    ChallengeClassifier(ChallengeClassifierInput),
    PrincipleInvitation(PrincipleInvitationInput),
    PrincipleClassifier(PrincipleClassifierInput),
    PrincipleRefinement(PrincipleRefinementInput),
    ClosureSummary(ClosureSummaryInput),
    ClosureClassifier(ClosureClassifierInput),
    ClosureRefinement(ClosureRefinementInput),
}

impl StageBuilder {
    pub fn stage(&self) -> Stage {
        match self {
            StageBuilder::StanceOpening(_) | StageBuilder::StanceClassifier(_) => {
                Stage::AskingStance
            }
            StageBuilder::ChallengeCase(_) | StageBuilder::ChallengeClassifier(_) => {
                Stage::CaseChallenge
            }
            StageBuilder::PrincipleInvitation(_)
            | StageBuilder::PrincipleClassifier(_)
            | StageBuilder::PrincipleRefinement(_) => Stage::PrincipleReasoning,
            StageBuilder::ClosureSummary(_)
            | StageBuilder::ClosureClassifier(_)
            | StageBuilder::ClosureRefinement(_) => Stage::Closure,
        }
    }

    pub fn kind(&self) -> BuilderKind {
        match self {
            StageBuilder::StanceOpening(_)
            | StageBuilder::ChallengeCase(_)
            | StageBuilder::PrincipleInvitation(_)
            | StageBuilder::ClosureSummary(_) => BuilderKind::Generation,
            StageBuilder::StanceClassifier(_)
            | StageBuilder::ChallengeClassifier(_)
            | StageBuilder::PrincipleClassifier(_)
            | StageBuilder::ClosureClassifier(_) => BuilderKind::Classification,
            StageBuilder::PrincipleRefinement(_) | StageBuilder::ClosureRefinement(_) => {
                BuilderKind::Refinement
            }
        }
    }

    pub fn purpose(&self) -> PromptPurpose {
        PromptPurpose {
            stage: self.stage(),
            kind: self.kind(),
        }
    }

    /// Assembles the prompt for the given conversation turns.
    pub fn build(&self, turns: &[Turn]) -> Prompt {
        let (instructions, task) = match self {
            StageBuilder::StanceOpening(input) => stance::opening(input),
            StageBuilder::StanceClassifier(input) => stance::classifier(input),
            StageBuilder::ChallengeCase(input) => challenge::case(input),
            StageBuilder::ChallengeClassifier(input) => challenge::classifier(input),
            StageBuilder::PrincipleInvitation(input) => principle::invitation(input),
            StageBuilder::PrincipleClassifier(input) => principle::classifier(input),
            StageBuilder::PrincipleRefinement(input) => principle::refinement(input),
            StageBuilder::ClosureSummary(input) => closure::summary(input),
            StageBuilder::ClosureClassifier(input) => closure::classifier(input),
            StageBuilder::ClosureRefinement(input) => closure::refinement(input),
        };

        let kind = self.kind();
        let format = match kind {
            BuilderKind::Classification => CLASSIFICATION_FORMAT,
            BuilderKind::Generation | BuilderKind::Refinement => GENERATION_FORMAT,
        };
        let schema = match kind {
            BuilderKind::Classification => DecisionSchema::for_stage(self.stage()),
            BuilderKind::Generation | BuilderKind::Refinement => None,
        };

        Prompt {
            purpose: self.purpose(),
            instructions: format!("{}\n\n{}", instructions, format),
            turns: recent_turns(turns).to_vec(),
            task,
            schema,
        }
    }
}

fn recent_turns(turns: &[Turn]) -> &[Turn] {
    let start = turns.len().saturating_sub(MAX_CONTEXT_TURNS);
    &turns[start..]
}

/// Shared opening of every system prompt.
fn preamble(topic: &TopicContext) -> String {
    let mut text = format!(
        "You are a Socratic tutor guiding a student through a critical-thinking exercise \
         on the topic: \"{}\". Never lecture or give your own verdict; ask, press, and \
         let the student reason.",
        topic.topic
    );
    if let Some(background) = &topic.background {
        text.push_str("\n\nBackground material:\n");
        text.push_str(background);
    }
    text
}

fn clarify_note(clarifying: bool) -> &'static str {
    if clarifying {
        "\n\nYour previous turn asked the student to clarify. Their latest message should \
         resolve that request; only choose TR_CLARIFY again if it is still ambiguous."
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::versions::StanceVersion;

    fn topic() -> TopicContext {
        TopicContext::new("Is lying ever justified?").unwrap()
    }

    fn stance() -> StanceVersion {
        StanceVersion {
            version: 1,
            position: "Lying is sometimes fine".to_string(),
            reason: "It can prevent harm".to_string(),
        }
    }

    #[test]
    fn generation_prompts_carry_no_schema() {
        let builder = StageBuilder::StanceOpening(StanceOpeningInput { topic: topic() });
        let prompt = builder.build(&[]);

        assert_eq!(builder.kind(), BuilderKind::Generation);
        assert!(prompt.schema.is_none());
        assert!(prompt.instructions.contains("Is lying ever justified?"));
        assert!(prompt.instructions.contains("follow-up question"));
    }

    #[test]
    fn classifier_prompts_carry_stage_schema() {
        let builder = StageBuilder::ChallengeClassifier(ChallengeClassifierInput {
            topic: topic(),
            stance: stance(),
            current_case: Some("A doctor hides a diagnosis.".to_string()),
            loop_count: 1,
            max_loops: 3,
            student_message: "I'd still lie.".to_string(),
            clarifying: false,
        });
        let prompt = builder.build(&[Turn::student("I'd still lie.")]);

        assert_eq!(prompt.schema.unwrap().stage, Stage::CaseChallenge);
        assert_eq!(prompt.purpose.to_string(), "case_challenge.classification");
        assert!(prompt.task.contains("I'd still lie."));
    }

    #[test]
    fn refinement_kind_is_reported() {
        let builder = StageBuilder::ClosureRefinement(ClosureRefinementInput {
            topic: topic(),
            draft_summary: "You argued X.".to_string(),
            correction: "I argued Y.".to_string(),
        });
        assert_eq!(builder.kind(), BuilderKind::Refinement);
        assert_eq!(builder.stage(), Stage::Closure);
        assert!(builder.build(&[]).schema.is_none());
    }

    #[test]
    fn context_is_capped_to_recent_turns() {
        let turns: Vec<Turn> = (0..MAX_CONTEXT_TURNS + 5)
            .map(|i| Turn::student(format!("turn {i}")))
            .collect();
        let prompt =
            StageBuilder::StanceOpening(StanceOpeningInput { topic: topic() }).build(&turns);

        assert_eq!(prompt.turns.len(), MAX_CONTEXT_TURNS);
        assert_eq!(prompt.turns[0].content, "turn 5");
    }

    #[test]
    fn building_is_referentially_transparent() {
        let builder = StageBuilder::StanceOpening(StanceOpeningInput { topic: topic() });
        let turns = vec![Turn::tutor("Hello")];
        assert_eq!(builder.build(&turns), builder.build(&turns));
    }

    #[test]
    fn background_is_included_when_present() {
        let topic = topic().with_background("Excerpt from Kant's essay.");
        let prompt = StageBuilder::StanceOpening(StanceOpeningInput { topic }).build(&[]);
        assert!(prompt.instructions.contains("Excerpt from Kant's essay."));
    }
}
