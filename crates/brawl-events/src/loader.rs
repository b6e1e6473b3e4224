//! Config-to-catalog loader — resolves descriptor strings through the
//! action registry and builds scheduler events out of config sections.
//!
//! All failures here are config errors: they surface synchronously at load
//! time, wrapped with the section id they came from, and never reach fire
//! time.

use std::collections::HashMap;
use std::sync::Arc;

use brawl_core::{ArenaConfig, BrawlError, PeriodicEventConfig, Result, TimedEventConfig};

use crate::action::EventAction;
use crate::descriptor::{self, BraceStyle};
use crate::engine::EventScheduler;
use crate::events::{PeriodicEvent, TimedEvent};
use crate::registry::ActionRegistry;

/// Descriptor dialect used by event config: `root;key={value};...`
const BRACES: BraceStyle = BraceStyle::Curly;
const SEPARATOR: char = ';';

/// Resolve one descriptor string into an action instance.
pub fn build_action(registry: &ActionRegistry, descriptor: &str) -> Result<Arc<dyn EventAction>> {
    let mut buffer = descriptor::parse_named(descriptor, BRACES, SEPARATOR)?;

    let root = buffer.pop().ok_or_else(|| BrawlError::MalformedDescriptor {
        descriptor: descriptor.to_string(),
        reason: "descriptor has no arguments".into(),
    })?;
    if root.key != "root" {
        return Err(BrawlError::MalformedDescriptor {
            descriptor: descriptor.to_string(),
            reason: format!("expected a leading action kind, got `{}={}`", root.key, root.value),
        });
    }

    let factory = registry
        .get(&root.value)
        .ok_or_else(|| BrawlError::UnknownActionKind {
            provided: root.value.clone(),
            valid: registry.names().join(", "),
        })?;

    let mut params = HashMap::new();
    for arg in buffer {
        params.insert(arg.key, arg.value);
    }
    factory(params)
}

/// Resolve a whole descriptor list, requiring at least one entry.
fn build_actions(registry: &ActionRegistry, descriptors: &[String]) -> Result<Vec<Arc<dyn EventAction>>> {
    if descriptors.is_empty() {
        return Err(BrawlError::InvalidEventDefinition {
            reason: "required `events` list is empty".into(),
        });
    }
    descriptors
        .iter()
        .map(|d| build_action(registry, d))
        .collect()
}

/// Build a timed event from its config section.
pub fn build_timed_event(registry: &ActionRegistry, config: &TimedEventConfig) -> Result<TimedEvent> {
    Ok(TimedEvent {
        trigger_offset: config.trigger_time.as_duration(),
        trigger_from: config.trigger_from.clone(),
        actions: build_actions(registry, &config.events)?,
    })
}

/// Build a periodic event from its config section.
pub fn build_periodic_event(
    registry: &ActionRegistry,
    config: &PeriodicEventConfig,
) -> Result<PeriodicEvent> {
    Ok(PeriodicEvent {
        interval: config.interval.as_duration(),
        start_delay: config.start_delay.as_duration(),
        active_phases: config.active_phases.clone(),
        actions: build_actions(registry, &config.events)?,
    })
}

/// Register every event section of an arena config into a scheduler.
/// Failures carry the offending section id.
pub fn register_events(
    config: &ArenaConfig,
    registry: &ActionRegistry,
    scheduler: &EventScheduler,
) -> Result<()> {
    for (id, section) in &config.timed_events {
        let event = build_timed_event(registry, section).map_err(|e| e.in_section(id.clone()))?;
        scheduler.register_timed_event(id.clone(), event);
    }
    for (id, section) in &config.periodic_events {
        let event = build_periodic_event(registry, section).map_err(|e| e.in_section(id.clone()))?;
        scheduler
            .register_periodic_event(id.clone(), event)
            .map_err(|e| e.in_section(id.clone()))?;
    }
    Ok(())
}
