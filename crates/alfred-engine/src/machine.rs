use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

pub const TRIGGER_DISPATCH: &str = "dispatch";
pub const TRIGGER_AI_APPROVE: &str = "ai_approve";
pub const TRIGGER_HUMAN_APPROVE: &str = "human_approve";
pub const TRIGGER_REQUEST_REVISION: &str = "request_revision";

/// Trigger that submits the artifact of a work state.
pub fn submit_trigger(work_state: &str) -> String {
    format!("submit_{work_state}")
}

/// Review state entered after a submission, awaiting the AI reviewer.
pub fn ai_review_state(work_state: &str) -> String {
    format!("{work_state}_awaiting_ai_review")
}

/// Review state entered after AI approval, awaiting the human gate.
pub fn human_review_state(work_state: &str) -> String {
    format!("{work_state}_awaiting_human_review")
}

/// Which reviewer a review state is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKind {
    Ai,
    Human,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Ai => "ai",
            ReviewKind::Human => "human",
        }
    }
}

/// Split a review state into its base work state and review kind.
///
/// Review state names are always derived; no other naming is legal, so
/// a suffix match is a complete classification.
pub fn parse_review_state(state: &str) -> Option<(&str, ReviewKind)> {
    if let Some(base) = state.strip_suffix("_awaiting_ai_review") {
        Some((base, ReviewKind::Ai))
    } else if let Some(base) = state.strip_suffix("_awaiting_human_review") {
        Some((base, ReviewKind::Human))
    } else {
        None
    }
}

/// A built state/transition graph for one workflow tool.
///
/// The machine holds no per-task state: it is constructed once from a
/// tool definition and evaluated against caller-supplied state strings.
/// Ordered collections keep construction deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    initial_state: String,
    terminal_state: String,
    dispatch_state: Option<String>,
    states: BTreeSet<String>,
    transitions: BTreeMap<(String, String), String>,
}

impl StateMachine {
    /// Expand an ordered list of work states into the full graph.
    ///
    /// Each work state `W` gains a review cycle: `submit_W` moves into
    /// AI review, `ai_approve` into human review, `human_approve` into
    /// the next work state (or the terminal state after the last one),
    /// and `request_revision` returns to `W` from either review state
    /// or from `W` itself (self-loop for iterative refinement). An
    /// optional dispatch state precedes the first work state with a
    /// single `dispatch` trigger.
    pub fn build(
        work_states: &[String],
        dispatch_state: Option<&str>,
        terminal_state: &str,
    ) -> Result<Self> {
        if work_states.is_empty() {
            return Err(Error::Definition(
                "a workflow needs at least one work state".to_string(),
            ));
        }

        let mut states = BTreeSet::new();
        let mut transitions = BTreeMap::new();
        let mut edge = |from: &str, trigger: &str, to: &str| {
            transitions.insert((from.to_owned(), trigger.to_owned()), to.to_owned());
        };

        if let Some(dispatch) = dispatch_state {
            states.insert(dispatch.to_string());
            edge(dispatch, TRIGGER_DISPATCH, &work_states[0]);
        }

        for (index, work) in work_states.iter().enumerate() {
            let ai_review = ai_review_state(work);
            let human_review = human_review_state(work);
            let next = work_states
                .get(index + 1)
                .map(String::as_str)
                .unwrap_or(terminal_state);

            states.insert(work.clone());
            states.insert(ai_review.clone());
            states.insert(human_review.clone());

            edge(work, &submit_trigger(work), &ai_review);
            edge(work, TRIGGER_REQUEST_REVISION, work);
            edge(&ai_review, TRIGGER_AI_APPROVE, &human_review);
            edge(&ai_review, TRIGGER_REQUEST_REVISION, work);
            edge(&human_review, TRIGGER_HUMAN_APPROVE, next);
            edge(&human_review, TRIGGER_REQUEST_REVISION, work);
        }

        states.insert(terminal_state.to_string());

        let initial_state = dispatch_state.unwrap_or(&work_states[0]).to_string();
        Ok(Self {
            initial_state,
            terminal_state: terminal_state.to_string(),
            dispatch_state: dispatch_state.map(str::to_string),
            states,
            transitions,
        })
    }

    /// Follow the edge for `(state, trigger)`, returning the new state.
    pub fn fire(&self, state: &str, trigger: &str) -> Result<String> {
        self.transitions
            .get(&(state.to_string(), trigger.to_string()))
            .cloned()
            .ok_or_else(|| Error::InvalidTransition {
                state: state.to_string(),
                trigger: trigger.to_string(),
                valid_triggers: self.valid_triggers(state),
            })
    }

    /// Triggers with an outgoing edge from `state`, in stable order.
    pub fn valid_triggers(&self, state: &str) -> Vec<String> {
        self.transitions
            .keys()
            .filter(|(from, _)| from == state)
            .map(|(_, trigger)| trigger.clone())
            .collect()
    }

    pub fn is_terminal(&self, state: &str) -> bool {
        state == self.terminal_state
    }

    pub fn contains(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn terminal_state(&self) -> &str {
        &self.terminal_state
    }

    pub fn dispatch_state(&self) -> Option<&str> {
        self.dispatch_state.as_deref()
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }

    /// Every `(state, trigger) -> state` edge, in stable order.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.transitions
            .iter()
            .map(|((from, trigger), to)| (from.as_str(), trigger.as_str(), to.as_str()))
    }
}
