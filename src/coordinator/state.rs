//! Per-run state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SynthesisError;

/// Stage of one `orchestrate` call.
///
/// Runs move strictly forward:
/// `IDLE -> DISPATCHING -> AWAITING_WORKERS -> SYNTHESIZING -> SUMMARIZING -> COMPLETE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    #[default]
    Idle,
    Dispatching,
    AwaitingWorkers,
    Synthesizing,
    Summarizing,
    Complete,
}

impl RunState {
    /// The only state this one may move to.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Dispatching),
            Self::Dispatching => Some(Self::AwaitingWorkers),
            Self::AwaitingWorkers => Some(Self::Synthesizing),
            Self::Synthesizing => Some(Self::Summarizing),
            Self::Summarizing => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::Complete
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Dispatching => "DISPATCHING",
            Self::AwaitingWorkers => "AWAITING_WORKERS",
            Self::Synthesizing => "SYNTHESIZING",
            Self::Summarizing => "SUMMARIZING",
            Self::Complete => "COMPLETE",
        };
        f.write_str(s)
    }
}

/// Tracks the state of a single run and rejects out-of-order transitions.
#[derive(Debug, Default)]
pub(crate) struct RunTracker {
    state: RunState,
}

impl RunTracker {
    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn advance(&mut self, to: RunState) -> Result<(), SynthesisError> {
        if self.state.next() != Some(to) {
            return Err(SynthesisError::IllegalTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!(from = %self.state, to = %to, "run state transition");
        self.state = to;
        Ok(())
    }
}
