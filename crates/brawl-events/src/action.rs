//! Action instances — a validated parameter bag plus the three-phase
//! execution contract.
//!
//! Required keys are checked once at construction; optional keys resolve at
//! call time with `get_or`, so a malformed optional value is a per-call
//! failure rather than a config-load failure.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use brawl_core::duration::parse_duration;
use brawl_core::{BrawlError, Participant, Result, Roster};

use crate::engine::EventScheduler;
use crate::resolver::Resolver;

/// Validated, immutable parameter bag of one action instance.
#[derive(Debug, Clone)]
pub struct ActionParams {
    kind: String,
    params: HashMap<String, String>,
}

impl ActionParams {
    /// Build a parameter bag, failing if any required key is absent.
    pub fn new(
        kind: impl Into<String>,
        params: HashMap<String, String>,
        required: &[&str],
    ) -> Result<Self> {
        let kind = kind.into();
        for key in required {
            if !params.contains_key(*key) {
                return Err(BrawlError::MissingRequiredParameter {
                    kind,
                    key: (*key).to_string(),
                });
            }
        }
        Ok(Self { kind, params })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Fetch a required key. Only call for keys validated at construction.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| BrawlError::MissingRequiredParameter {
                kind: self.kind.clone(),
                key: key.to_string(),
            })
    }

    /// Fetch an optional key, falling back to a default.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.params.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Parse an optional key into `T`, failing the current call on a
    /// malformed value.
    pub fn get_parsed<T: FromStr>(&self, key: &str, default: &str) -> Result<T> {
        let raw = self.get_or(key, default);
        raw.parse().map_err(|_| {
            BrawlError::ActionExecution(format!(
                "action `{}`: parameter `{key}` has unparsable value `{raw}`",
                self.kind
            ))
        })
    }

    /// Parse an optional key as a duration string.
    pub fn get_duration(&self, key: &str, default: &str) -> Result<Duration> {
        let raw = self.get_or(key, default);
        parse_duration(raw).map_err(|e| {
            BrawlError::ActionExecution(format!(
                "action `{}`: parameter `{key}`: {e}",
                self.kind
            ))
        })
    }
}

/// Context handed to the pre/post phases of an action.
///
/// Carries the arena identity and a handle to the scheduler that fired the
/// action, so lifecycle actions can start/stop event cycles without any
/// global state.
pub struct ActionContext<'a> {
    pub arena: &'a str,
    pub scheduler: &'a EventScheduler,
    pub roster: &'a dyn Roster,
}

/// The three-phase execution contract, applied once per participant.
///
/// Phases run in order: `pre_process`, `call`, `post_process`. Any phase
/// may fail; the pipeline records the failure and moves on to the next
/// participant. Actions with no per-participant effect implement `call` as
/// a no-op and do their work in `post_process`.
pub trait EventAction: Send + Sync + std::fmt::Debug {
    /// The registry name of this action kind.
    fn kind(&self) -> &str;

    /// Side-effect hook before the primary effect.
    fn pre_process(&self, _ctx: &ActionContext<'_>, _participant: &dyn Participant) -> Result<()> {
        Ok(())
    }

    /// The action's primary effect against one participant. The resolver
    /// substitutes templated text against that participant.
    fn call(&self, participant: &dyn Participant, resolver: &Resolver<'_>) -> Result<()>;

    /// Cleanup/finalization hook after the primary effect.
    fn post_process(&self, _ctx: &ActionContext<'_>, _participant: &dyn Participant) -> Result<()> {
        Ok(())
    }
}
