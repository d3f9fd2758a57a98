//! Transition table.
//!
//! Maps (state, decision) to the next state and the follow-up the
//! orchestrator must produce. Everything here is synchronous and pure:
//! the same inputs always yield the same transition.

use thiserror::Error;

use crate::domain::foundation::StateMachine;

use super::builders::{
    ChallengeCaseInput, ChallengeClassifierInput, ChallengeFocus, ClosureClassifierInput,
    ClosureRefinementInput, ClosureSummaryInput, PrincipleClassifierInput, PrincipleFocus,
    PrincipleInvitationInput, PrincipleRefinementInput, StageBuilder, StanceClassifierInput,
    StanceOpeningInput,
};
use super::decision::{ChallengeDecision, ClosureDecision, Decision, PrincipleDecision, StanceDecision};
use super::message::GeneratedMessage;
use super::rules::DialogueRules;
use super::stage::{Stage, StagePosition, SubState};
use super::state::{DialogueState, TopicContext};
use super::versions::{PrincipleClassification, PrincipleVersion, StanceVersion};

/// Closing line used when the classifier supplies none.
pub const DEFAULT_CLOSING_REMARK: &str =
    "Thank you for thinking this through so carefully. This discussion is now complete.";

/// A state the transition table cannot act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("a {decision} decision cannot be applied at {position}")]
    StageMismatch {
        position: StagePosition,
        decision: Stage,
    },

    #[error("{position} does not accept student input")]
    NotAcceptingInput { position: StagePosition },

    #[error("{position} requires a recorded stance")]
    MissingStance { position: StagePosition },

    #[error("a transition from {position} to {to} would leave the stage order")]
    IllegalStageChange { position: StagePosition, to: Stage },
}

/// What the tutor says after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Reply with this text; no further executor call.
    Reply(String),
    /// Run this builder and reply with its output.
    Generate(StageBuilder),
}

/// Next state plus the follow-up that completes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: DialogueState,
    pub follow_up: FollowUp,
}

impl Transition {
    fn reply(state: DialogueState, text: impl Into<String>) -> Self {
        Self {
            state,
            follow_up: FollowUp::Reply(text.into()),
        }
    }

    fn generate(state: DialogueState, builder: StageBuilder) -> Self {
        Self {
            state,
            follow_up: FollowUp::Generate(builder),
        }
    }

    /// Records the tutor's reply and returns the final state.
    ///
    /// Generated challenge cases and closure drafts are kept so later
    /// classifier prompts can refer to them.
    pub fn finish(self, reply: &GeneratedMessage) -> DialogueState {
        let mut state = self.state;
        if let FollowUp::Generate(builder) = &self.follow_up {
            match builder {
                StageBuilder::ChallengeCase(_) => {
                    state.current_case = Some(reply.message.clone());
                }
                StageBuilder::ClosureSummary(_) | StageBuilder::ClosureRefinement(_) => {
                    state.draft_summary = Some(reply.message.clone());
                }
                _ => {}
            }
        }
        state.add_tutor_turn(reply.display());
        state
    }
}

/// Builder for the opening message of a new conversation.
pub fn opening(topic: &TopicContext) -> StageBuilder {
    StageBuilder::StanceOpening(StanceOpeningInput {
        topic: topic.clone(),
    })
}

/// State after the opening message has been generated.
pub fn started(state: &DialogueState, topic: &TopicContext, opening: &GeneratedMessage) -> DialogueState {
    let mut next = state.clone();
    next.topic = topic.topic.clone();
    next.position = StagePosition::AskingStance(SubState::Main);
    next.add_tutor_turn(opening.display());
    next
}

/// Classifier to run on the student's latest message at the current position.
pub fn classifier(
    state: &DialogueState,
    topic: &TopicContext,
    student_message: &str,
    rules: &DialogueRules,
) -> Result<StageBuilder, TransitionError> {
    let clarifying = state.position.is_clarifying();
    let student_message = student_message.to_string();

    let builder = match state.stage() {
        Stage::AskingStance => StageBuilder::StanceClassifier(StanceClassifierInput {
            topic: topic.clone(),
            student_message,
            clarifying,
        }),
        Stage::CaseChallenge => StageBuilder::ChallengeClassifier(ChallengeClassifierInput {
            topic: topic.clone(),
            stance: require_stance(state)?,
            current_case: state.current_case.clone(),
            loop_count: state.loop_count,
            max_loops: rules.max_loops,
            student_message,
            clarifying,
        }),
        Stage::PrincipleReasoning => StageBuilder::PrincipleClassifier(PrincipleClassifierInput {
            topic: topic.clone(),
            stance: require_stance(state)?,
            principle: state.current_principle().cloned(),
            loop_count: state.loop_count,
            student_message,
            clarifying,
        }),
        Stage::Closure => StageBuilder::ClosureClassifier(ClosureClassifierInput {
            topic: topic.clone(),
            draft_summary: state.draft_summary.clone().unwrap_or_default(),
            student_message,
        }),
        Stage::AwaitingStart | Stage::Ended => {
            return Err(TransitionError::NotAcceptingInput {
                position: state.position,
            })
        }
    };
    Ok(builder)
}

/// Applies a classifier decision to a state that already holds the
/// student's latest turn.
pub fn apply(
    state: DialogueState,
    decision: &Decision,
    topic: &TopicContext,
    student_message: &str,
    rules: &DialogueRules,
) -> Result<Transition, TransitionError> {
    if decision.stage() != state.stage() {
        return Err(TransitionError::StageMismatch {
            position: state.position,
            decision: decision.stage(),
        });
    }

    let position = state.position;
    let transition = match decision {
        Decision::Stance(d) => apply_stance(state, d, topic, rules),
        Decision::Challenge(d) => apply_challenge(state, d, topic, rules)?,
        Decision::Principle(d) => apply_principle(state, d, topic, student_message, rules)?,
        Decision::Closure(d) => apply_closure(state, d, topic),
    };
    check_stage_order(position, transition.state.stage())?;
    Ok(transition)
}

/// Rejects any move the stage machine does not allow.
fn check_stage_order(position: StagePosition, to: Stage) -> Result<(), TransitionError> {
    position
        .stage()
        .transition_to(to)
        .map(|_| ())
        .map_err(|_| TransitionError::IllegalStageChange { position, to })
}

fn apply_stance(
    mut state: DialogueState,
    decision: &StanceDecision,
    topic: &TopicContext,
    rules: &DialogueRules,
) -> Transition {
    match decision {
        StanceDecision::Clarify {
            clarifying_question,
        } => {
            state.position = state.position.clarifying();
            Transition::reply(state, clarifying_question.clone())
        }
        StanceDecision::Established { position, reason } => {
            let stance = state
                .stance_history
                .append(position.clone(), reason.clone())
                .clone();
            state.position = StagePosition::CaseChallenge(SubState::Main);
            let builder = challenge_case(&state, topic, rules, stance, ChallengeFocus::NewCase);
            Transition::generate(state, builder)
        }
    }
}

fn apply_challenge(
    mut state: DialogueState,
    decision: &ChallengeDecision,
    topic: &TopicContext,
    rules: &DialogueRules,
) -> Result<Transition, TransitionError> {
    match decision {
        ChallengeDecision::Clarify {
            clarifying_question,
        } => {
            state.position = state.position.clarifying();
            Ok(Transition::reply(state, clarifying_question.clone()))
        }
        ChallengeDecision::Scaffold { position, reason } => {
            let current = require_stance(&state)?;
            let new_position = non_blank(position).unwrap_or(current.position.as_str());
            let new_reason = non_blank(reason).unwrap_or(current.reason.as_str());
            if new_position != current.position || new_reason != current.reason {
                state
                    .stance_history
                    .append(new_position.to_string(), new_reason.to_string());
            }
            let stance = require_stance(&state)?;
            state.position = StagePosition::CaseChallenge(SubState::Main);
            let builder = challenge_case(&state, topic, rules, stance, ChallengeFocus::AddressShift);
            Ok(Transition::generate(state, builder))
        }
        ChallengeDecision::CaseCompleted { request_principle } => {
            let stance = require_stance(&state)?;
            state.loop_count = rules.next_loop(state.loop_count);
            if !state.principle_history.is_empty() {
                state.principle_tested = true;
            }
            if rules.loops_exhausted(state.loop_count) || *request_principle {
                state.position = StagePosition::PrincipleReasoning(SubState::Main);
                let builder = principle_invitation(&state, topic, stance, PrincipleFocus::Articulate);
                Ok(Transition::generate(state, builder))
            } else {
                state.position = StagePosition::CaseChallenge(SubState::Main);
                let builder = challenge_case(&state, topic, rules, stance, ChallengeFocus::NewCase);
                Ok(Transition::generate(state, builder))
            }
        }
    }
}

fn apply_principle(
    mut state: DialogueState,
    decision: &PrincipleDecision,
    topic: &TopicContext,
    student_message: &str,
    rules: &DialogueRules,
) -> Result<Transition, TransitionError> {
    let stance = require_stance(&state)?;
    match decision {
        PrincipleDecision::Clarify {
            clarifying_question,
        } => {
            state.position = state.position.clarifying();
            Ok(Transition::reply(state, clarifying_question.clone()))
        }
        PrincipleDecision::Complete {
            statement,
            classification,
        } => {
            let untested_extreme = *classification == PrincipleClassification::Extreme
                && !state.principle_tested
                && !rules.loops_exhausted(state.loop_count);
            let principle = record_principle(&mut state, statement, *classification);
            if untested_extreme {
                state.position = StagePosition::CaseChallenge(SubState::Main);
                let builder = challenge_case(
                    &state,
                    topic,
                    rules,
                    stance,
                    ChallengeFocus::PressureTestPrinciple(principle),
                );
                Ok(Transition::generate(state, builder))
            } else if rules.closure_allowed(state.loop_count) {
                state.discussion_satisfied = true;
                state.position = StagePosition::Closure(SubState::Main);
                let builder = StageBuilder::ClosureSummary(ClosureSummaryInput {
                    topic: topic.clone(),
                    stances: state.stance_history.as_slice().to_vec(),
                    principles: state.principle_history.as_slice().to_vec(),
                    loop_count: state.loop_count,
                });
                Ok(Transition::generate(state, builder))
            } else {
                state.loop_count = rules.next_loop(state.loop_count);
                state.position = StagePosition::PrincipleReasoning(SubState::Main);
                let builder = StageBuilder::PrincipleRefinement(PrincipleRefinementInput {
                    topic: topic.clone(),
                    principle,
                    request: student_message.to_string(),
                });
                Ok(Transition::generate(state, builder))
            }
        }
        PrincipleDecision::NextCase {
            statement,
            classification,
        } => {
            let principle = record_principle(&mut state, statement, *classification);
            if rules.loops_exhausted(state.loop_count) {
                state.position = StagePosition::PrincipleReasoning(SubState::Main);
                let tension = exhausted_tension(&principle);
                let builder =
                    principle_invitation(&state, topic, stance, PrincipleFocus::ResolveTension(tension));
                Ok(Transition::generate(state, builder))
            } else {
                state.position = StagePosition::CaseChallenge(SubState::Main);
                let builder = challenge_case(
                    &state,
                    topic,
                    rules,
                    stance,
                    ChallengeFocus::PressureTestPrinciple(principle),
                );
                Ok(Transition::generate(state, builder))
            }
        }
        PrincipleDecision::Scaffold { tension } => {
            state.position = StagePosition::PrincipleReasoning(SubState::Main);
            let builder = principle_invitation(
                &state,
                topic,
                stance,
                PrincipleFocus::ResolveTension(tension.clone()),
            );
            Ok(Transition::generate(state, builder))
        }
    }
}

fn apply_closure(mut state: DialogueState, decision: &ClosureDecision, topic: &TopicContext) -> Transition {
    match decision {
        ClosureDecision::Clarify { correction } => {
            state.position = state.position.clarifying();
            let builder = StageBuilder::ClosureRefinement(ClosureRefinementInput {
                topic: topic.clone(),
                draft_summary: state.draft_summary.clone().unwrap_or_default(),
                correction: correction.clone(),
            });
            Transition::generate(state, builder)
        }
        ClosureDecision::ConfirmEnd { closing_remark } => {
            let summary = state
                .draft_summary
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| fallback_summary(&state));
            state.summary = Some(summary);
            state.position = StagePosition::Ended;
            let remark = non_blank(closing_remark)
                .unwrap_or(DEFAULT_CLOSING_REMARK)
                .to_string();
            Transition::reply(state, remark)
        }
    }
}

fn challenge_case(
    state: &DialogueState,
    topic: &TopicContext,
    rules: &DialogueRules,
    stance: StanceVersion,
    focus: ChallengeFocus,
) -> StageBuilder {
    StageBuilder::ChallengeCase(ChallengeCaseInput {
        topic: topic.clone(),
        stance,
        previous_case: state.current_case.clone(),
        loop_count: state.loop_count,
        max_loops: rules.max_loops,
        focus,
    })
}

fn principle_invitation(
    state: &DialogueState,
    topic: &TopicContext,
    stance: StanceVersion,
    focus: PrincipleFocus,
) -> StageBuilder {
    StageBuilder::PrincipleInvitation(PrincipleInvitationInput {
        topic: topic.clone(),
        stance,
        principle: state.current_principle().cloned(),
        focus,
    })
}

fn require_stance(state: &DialogueState) -> Result<StanceVersion, TransitionError> {
    state
        .current_stance()
        .cloned()
        .ok_or(TransitionError::MissingStance {
            position: state.position,
        })
}

/// Appends a principle version; it awaits a completed case before it counts as tested.
fn record_principle(
    state: &mut DialogueState,
    statement: &str,
    classification: PrincipleClassification,
) -> PrincipleVersion {
    state.principle_tested = false;
    state
        .principle_history
        .append(statement.to_string(), classification)
        .clone()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn exhausted_tension(principle: &PrincipleVersion) -> String {
    format!(
        "The principle \"{}\" admits no exceptions, yet the cases already discussed \
         suggest the student's own judgements do not always follow it.",
        principle.statement
    )
}

fn fallback_summary(state: &DialogueState) -> String {
    let mut parts = Vec::new();
    if let Some(stance) = state.current_stance() {
        parts.push(format!("Final stance: {} because {}.", stance.position, stance.reason));
    }
    if let Some(principle) = state.current_principle() {
        parts.push(format!("Guiding principle: {}.", principle.statement));
    }
    if parts.is_empty() {
        return format!("Discussion of \"{}\" concluded.", state.topic);
    }
    parts.join(" ")
}
