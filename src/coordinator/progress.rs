//! Blended progress across all workers of a run.
//!
//! Bands: dispatch 0-10%, workers 10-75% (each worker's local 0-100 mapped
//! onto its 1/N share), synthesis 75-90%, summary 90-100%. Published as
//! PROGRESS_UPDATE from [`COORDINATOR_ID`], never decreasing, and stamped
//! with the run id so concurrent runs on one bus stay apart.

use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::bus::{COORDINATOR_ID, EventBus, MessagePayload, OrchestrationMessage};

pub const DISPATCH_START: u8 = 0;
pub const WORKERS_START: u8 = 10;
pub const SYNTHESIS_START: u8 = 75;
pub const SUMMARY_START: u8 = 90;
pub const COMPLETE: u8 = 100;

#[derive(Debug)]
struct State {
    workers: Vec<u8>,
    published: Option<u8>,
}

/// Overall progress for one run.
#[derive(Debug)]
pub struct OverallProgress {
    bus: EventBus,
    run_id: Option<Uuid>,
    state: Mutex<State>,
}

impl OverallProgress {
    pub fn new(bus: EventBus, worker_count: usize) -> Self {
        Self {
            bus,
            run_id: None,
            state: Mutex::new(State {
                workers: vec![0; worker_count],
                published: None,
            }),
        }
    }

    pub fn for_run(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Highest value published so far.
    pub fn current(&self) -> u8 {
        self.state().published.unwrap_or(0)
    }

    /// Record worker `index`'s local progress and publish the blended value
    /// if it moved.
    pub fn record(&self, index: usize, local: u8) {
        let blended = {
            let mut state = self.state();
            let Some(slot) = state.workers.get_mut(index) else {
                return;
            };
            *slot = (*slot).max(local.min(100));
            let sum: u32 = state.workers.iter().map(|&p| u32::from(p)).sum();
            let n = state.workers.len() as u32;
            let span = u32::from(SYNTHESIS_START - WORKERS_START);
            WORKERS_START + (span * sum / (100 * n)) as u8
        };
        self.advance(blended, "workers running");
    }

    /// Publish `value` if it is higher than anything published before.
    pub fn advance(&self, value: u8, message: &str) {
        let value = value.min(COMPLETE);
        {
            let mut state = self.state();
            if state.published.is_some_and(|p| p >= value) {
                return;
            }
            state.published = Some(value);
        }
        // Lock released before publishing so subscribers may report back.
        self.bus.publish(
            OrchestrationMessage::new(
                COORDINATOR_ID,
                self.bus.next_correlation_id(COORDINATOR_ID),
                MessagePayload::ProgressUpdate {
                    progress: value,
                    message: message.to_string(),
                },
            )
            .in_run(self.run_id),
        );
    }
}
