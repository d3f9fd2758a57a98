//! SocraticOrchestrator - drives one conversation turn at a time.
//!
//! Each call takes the caller's state by reference and returns a new
//! state on success. The orchestrator holds no per-conversation data and
//! never touches storage.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{DialogueConfig, ValidationError};
use crate::domain::dialogue::{
    transition, ConversationSummary, Decision, DialogueRules, DialogueState, FollowUp,
    GeneratedMessage, Stage, StageBuilder, StagePosition, TopicContext,
};
use crate::ports::{ExecutionOutput, ExecutorError, PromptExecutor};

use super::errors::DialogueError;

/// Outcome of a successful turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub state: DialogueState,
    /// Tutor reply as shown to the student.
    pub reply: GeneratedMessage,
}

/// Coordinates builders, the prompt executor and the transition table.
pub struct SocraticOrchestrator<E: ?Sized + PromptExecutor> {
    executor: Arc<E>,
    rules: DialogueRules,
}

impl<E: ?Sized + PromptExecutor> Clone for SocraticOrchestrator<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            rules: self.rules,
        }
    }
}

impl<E: ?Sized + PromptExecutor> SocraticOrchestrator<E> {
    pub fn new(executor: Arc<E>, config: &DialogueConfig) -> Result<Self, ValidationError> {
        Ok(Self::with_rules(executor, config.rules()?))
    }

    pub fn with_rules(executor: Arc<E>, rules: DialogueRules) -> Self {
        Self { executor, rules }
    }

    pub fn rules(&self) -> &DialogueRules {
        &self.rules
    }

    /// Generates the opening message for a conversation awaiting start.
    pub async fn start_conversation(
        &self,
        state: &DialogueState,
        topic: &TopicContext,
    ) -> Result<TurnOutcome, DialogueError> {
        if state.stage() != Stage::AwaitingStart {
            return Err(DialogueError::precondition(
                state.position,
                "start a conversation",
            ));
        }

        let opening = self
            .generate(state.position, &transition::opening(topic), state)
            .await?;
        let next = transition::started(state, topic, &opening);

        info!(topic = %topic.topic, "Conversation started");
        Ok(TurnOutcome {
            state: next,
            reply: opening,
        })
    }

    /// Classifies the student's message and advances the dialogue.
    ///
    /// At most two executor calls: one classification and one follow-up.
    pub async fn process_student_input(
        &self,
        state: &DialogueState,
        student_message: &str,
        topic: &TopicContext,
    ) -> Result<TurnOutcome, DialogueError> {
        let position = state.position;
        match position {
            StagePosition::AwaitingStart => {
                return Err(DialogueError::precondition(position, "respond before the conversation starts"))
            }
            StagePosition::Ended => {
                return Err(DialogueError::precondition(position, "respond after the conversation ended"))
            }
            _ => {}
        }
        let student_message = student_message.trim();
        if student_message.is_empty() {
            return Err(DialogueError::precondition(position, "process a blank message"));
        }

        let mut working = state.clone();
        working.add_student_turn(student_message);

        let classifier = transition::classifier(&working, topic, student_message, &self.rules)
            .map_err(DialogueError::from_transition)?;
        let decision = self.classify(position, &classifier, &working).await?;
        debug!(
            stage = %position.stage(),
            intent = %decision.intent(),
            "Student input classified"
        );

        let step = transition::apply(working, &decision, topic, student_message, &self.rules)
            .map_err(DialogueError::from_transition)?;

        let reply = match &step.follow_up {
            FollowUp::Reply(text) => GeneratedMessage::parse(text),
            FollowUp::Generate(builder) => self.generate(position, builder, &step.state).await?,
        };
        let next = step.finish(&reply);

        info!(
            from = %position,
            to = %next.position,
            loop_count = next.loop_count,
            "Dialogue advanced"
        );
        Ok(TurnOutcome { state: next, reply })
    }

    /// True once the student has confirmed the closing summary.
    pub fn is_ended(&self, state: &DialogueState) -> bool {
        state.is_ended()
    }

    /// Read-only projection for client display.
    pub fn extract_conversation_summary(&self, state: &DialogueState) -> ConversationSummary {
        ConversationSummary::from(state)
    }

    async fn generate(
        &self,
        position: StagePosition,
        builder: &StageBuilder,
        context: &DialogueState,
    ) -> Result<GeneratedMessage, DialogueError> {
        let prompt = builder.build(&context.conversation_history);
        let output = self
            .executor
            .execute(&prompt)
            .await
            .map_err(|e| self.failed(position, e))?;

        match output {
            ExecutionOutput::Text(text) => Ok(GeneratedMessage::parse(&text)),
            ExecutionOutput::Structured(value) => Err(DialogueError::from_executor(
                position,
                ExecutorError::UnexpectedOutput(format!(
                    "{} returned structured output: {}",
                    prompt.purpose, value
                )),
            )),
        }
    }

    async fn classify(
        &self,
        position: StagePosition,
        builder: &StageBuilder,
        context: &DialogueState,
    ) -> Result<Decision, DialogueError> {
        let prompt = builder.build(&context.conversation_history);
        let output = self
            .executor
            .execute(&prompt)
            .await
            .map_err(|e| self.failed(position, e))?;

        let value = match output {
            ExecutionOutput::Structured(value) => value,
            ExecutionOutput::Text(text) => {
                return Err(DialogueError::DecisionParse {
                    position,
                    raw: text,
                    reason: "classifier returned free text".to_string(),
                })
            }
        };

        Decision::parse(builder.stage(), &value)
            .map_err(|e| DialogueError::from_decision(position, value.to_string(), e))
    }

    fn failed(&self, position: StagePosition, err: ExecutorError) -> DialogueError {
        warn!(position = %position, error = %err, "Executor call failed");
        DialogueError::from_executor(position, err)
    }
}
