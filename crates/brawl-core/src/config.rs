//! Arena event configuration.
//!
//! Maps the `[timed-events.*]` / `[periodic-events.*]` toml tables onto the
//! raw config model. Descriptor strings in `events` lists are opaque here;
//! the loader in `brawl-events` resolves them through the action registry.
//!
//! Section ids are kept in a `BTreeMap`, so events register in lexical id
//! order. That order is the catalog order: it drives pipeline iteration and
//! the tie-break of `next_due_timed_event`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::duration::EventDuration;
use crate::error::{BrawlError, Result};

/// Root arena configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArenaConfig {
    /// Arena display name.
    pub name: String,
    /// Phase the competition starts in.
    #[serde(default = "default_initial_phase", rename = "initial-phase")]
    pub initial_phase: String,
    /// One-shot events, fired once per phase cycle.
    #[serde(default, rename = "timed-events")]
    pub timed_events: BTreeMap<String, TimedEventConfig>,
    /// Repeating events.
    #[serde(default, rename = "periodic-events")]
    pub periodic_events: BTreeMap<String, PeriodicEventConfig>,
}

fn default_initial_phase() -> String {
    "waiting".into()
}

/// A `[timed-events.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimedEventConfig {
    /// Offset from phase start at which the event fires.
    #[serde(rename = "trigger-time")]
    pub trigger_time: EventDuration,
    /// Phase reference point the offset counts from.
    #[serde(default = "default_trigger_from", rename = "trigger-from")]
    pub trigger_from: String,
    /// Action descriptors to execute, in order.
    pub events: Vec<String>,
}

fn default_trigger_from() -> String {
    "ingame-start".into()
}

/// A `[periodic-events.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeriodicEventConfig {
    /// Repeat interval. Must be greater than zero.
    pub interval: EventDuration,
    /// Delay before the first fire.
    #[serde(default, rename = "start-delay")]
    pub start_delay: EventDuration,
    /// Phases during which fires are allowed.
    #[serde(default = "default_active_phases", rename = "active-phases")]
    pub active_phases: Vec<String>,
    /// Action descriptors to execute, in order.
    pub events: Vec<String>,
}

fn default_active_phases() -> Vec<String> {
    vec!["ingame".into()]
}

impl ArenaConfig {
    /// Load an arena config from a toml file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BrawlError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse an arena config from a toml string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BrawlError::Config(format!("failed to parse config: {e}")))
    }
}
