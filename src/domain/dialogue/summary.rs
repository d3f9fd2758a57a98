//! Read-only projection of a dialogue for client display.

use serde::Serialize;

use super::stage::{Stage, SubState};
use super::state::DialogueState;
use super::versions::{PrincipleVersion, StanceVersion};

/// What a client may see of a conversation; never the raw turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub topic: String,
    pub stage: Stage,
    pub sub_state: Option<SubState>,
    pub latest_stance: Option<StanceVersion>,
    pub latest_principle: Option<PrincipleVersion>,
    pub loop_count: u32,
    pub discussion_satisfied: bool,
    pub summary: Option<String>,
    pub stance_revisions: usize,
    pub principle_revisions: usize,
}

impl From<&DialogueState> for ConversationSummary {
    fn from(state: &DialogueState) -> Self {
        Self {
            topic: state.topic.clone(),
            stage: state.stage(),
            sub_state: state.sub_state(),
            latest_stance: state.current_stance().cloned(),
            latest_principle: state.current_principle().cloned(),
            loop_count: state.loop_count,
            discussion_satisfied: state.discussion_satisfied,
            summary: state.summary.clone(),
            stance_revisions: state.stance_history.len(),
            principle_revisions: state.principle_history.len(),
        }
    }
}
