//! Execution pipeline — runs an event's actions against the current
//! participants with per-pair failure isolation.
//!
//! Every (action, participant) cell runs regardless of other cells failing:
//! one misconfigured action must never block unrelated effects in the same
//! event. Failures are collected as data in the report and logged with
//! event/action/participant context.

use std::fmt;
use std::sync::Arc;

use brawl_core::{BrawlError, Participant};

use crate::action::{ActionContext, EventAction};
use crate::resolver::Resolver;

/// Which phase of the three-phase contract failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    PreProcess,
    Call,
    PostProcess,
}

impl fmt::Display for ActionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPhase::PreProcess => write!(f, "pre-process"),
            ActionPhase::Call => write!(f, "call"),
            ActionPhase::PostProcess => write!(f, "post-process"),
        }
    }
}

/// One failed (action, participant) pair.
#[derive(Debug)]
pub struct ActionFailure {
    pub action: String,
    pub participant: String,
    pub phase: ActionPhase,
    pub error: BrawlError,
}

/// Outcome of one event fire.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub event: String,
    /// (action, participant) pairs attempted.
    pub pairs: usize,
    pub failures: Vec<ActionFailure>,
    /// True when the fire was skipped because no participants were present.
    pub skipped: bool,
}

impl ExecutionReport {
    pub fn all_succeeded(&self) -> bool {
        !self.skipped && self.failures.is_empty()
    }
}

/// Run `actions` in declared order against `participants` in roster order.
pub fn execute(
    event_id: &str,
    actions: &[Arc<dyn EventAction>],
    participants: &[Arc<dyn Participant>],
    ctx: &ActionContext<'_>,
) -> ExecutionReport {
    let mut report = ExecutionReport {
        event: event_id.to_string(),
        ..Default::default()
    };

    if participants.is_empty() {
        report.skipped = true;
        return report;
    }

    for action in actions {
        for participant in participants {
            report.pairs += 1;
            if let Err((phase, error)) = run_pair(action.as_ref(), participant.as_ref(), ctx) {
                tracing::warn!(
                    "⚠️ Event `{event_id}`: action `{}` failed at {phase} for participant `{}`: {error}",
                    action.kind(),
                    participant.id(),
                );
                report.failures.push(ActionFailure {
                    action: action.kind().to_string(),
                    participant: participant.id().to_string(),
                    phase,
                    error,
                });
            }
        }
    }

    report
}

/// Run the three phases for one pair. A failed phase skips the remaining
/// phases for this pair only.
fn run_pair(
    action: &dyn EventAction,
    participant: &dyn Participant,
    ctx: &ActionContext<'_>,
) -> Result<(), (ActionPhase, BrawlError)> {
    action
        .pre_process(ctx, participant)
        .map_err(|e| (ActionPhase::PreProcess, e))?;

    let resolver = Resolver::new(ctx.arena, participant);
    action
        .call(participant, &resolver)
        .map_err(|e| (ActionPhase::Call, e))?;

    action
        .post_process(ctx, participant)
        .map_err(|e| (ActionPhase::PostProcess, e))
}
