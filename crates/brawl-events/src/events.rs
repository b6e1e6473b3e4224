//! Event catalog data model — what gets registered into the scheduler and
//! the per-event execution bookkeeping it maintains.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::action::EventAction;

/// A one-shot event: fires exactly once, `trigger_offset` after phase start.
#[derive(Debug, Clone)]
pub struct TimedEvent {
    /// Offset from phase start at which the event fires.
    pub trigger_offset: Duration,
    /// Phase reference point the offset counts from.
    pub trigger_from: String,
    /// Actions to execute, in declared order.
    pub actions: Vec<Arc<dyn EventAction>>,
}

impl TimedEvent {
    pub fn new(trigger_offset: Duration, actions: Vec<Arc<dyn EventAction>>) -> Self {
        Self {
            trigger_offset,
            trigger_from: "ingame-start".into(),
            actions,
        }
    }
}

/// A repeating event: first fire `start_delay` after phase start, then every
/// `interval`, while the competition is in one of `active_phases`.
#[derive(Clone)]
pub struct PeriodicEvent {
    pub interval: Duration,
    pub start_delay: Duration,
    pub active_phases: Vec<String>,
    pub actions: Vec<Arc<dyn EventAction>>,
}

impl PeriodicEvent {
    pub fn new(interval: Duration, start_delay: Duration, actions: Vec<Arc<dyn EventAction>>) -> Self {
        Self {
            interval,
            start_delay,
            active_phases: vec!["ingame".into()],
            actions,
        }
    }
}

/// Which catalog an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Timed,
    Periodic,
}

/// Per-event mutable bookkeeping, created when the event is armed and
/// updated by the scheduler on each fire. External callers only ever see
/// clones.
#[derive(Debug, Clone)]
pub struct EventExecutionInfo {
    pub kind: EventKind,
    /// The configured offset (timed) or interval (periodic).
    pub nominal_time: Duration,
    /// Absolute time of the first scheduled fire.
    pub scheduled_at: DateTime<Utc>,
    pub executed: bool,
    pub last_execution: Option<DateTime<Utc>>,
    pub execution_count: u32,
    /// Periodic only.
    pub interval: Option<Duration>,
    /// Periodic only.
    pub start_delay: Option<Duration>,
}

impl EventExecutionInfo {
    pub(crate) fn timed(trigger_offset: Duration, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Timed,
            nominal_time: trigger_offset,
            scheduled_at,
            executed: false,
            last_execution: None,
            execution_count: 0,
            interval: None,
            start_delay: None,
        }
    }

    pub(crate) fn periodic(event: &PeriodicEvent, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Periodic,
            nominal_time: event.interval,
            scheduled_at,
            executed: false,
            last_execution: None,
            execution_count: 0,
            interval: Some(event.interval),
            start_delay: Some(event.start_delay),
        }
    }

    pub(crate) fn record_execution(&mut self, now: DateTime<Utc>) {
        self.executed = true;
        self.last_execution = Some(now);
        self.execution_count += 1;
    }

    /// When the event fires next: `last_execution + interval` for a periodic
    /// event that has fired at least once, else the first scheduled time.
    pub fn next_execution_time(&self) -> DateTime<Utc> {
        if self.kind == EventKind::Periodic
            && let (Some(last), Some(interval)) = (self.last_execution, self.interval)
        {
            // Saturate instead of collapsing an oversized interval to "now".
            return TimeDelta::from_std(interval)
                .ok()
                .and_then(|delta| last.checked_add_signed(delta))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
        self.scheduled_at
    }
}
