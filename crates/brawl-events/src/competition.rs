//! Live competition glue — explicit ownership of a scheduler, a roster, and
//! the current phase.
//!
//! The competition owns its scheduler as a plain field: created on
//! competition start, torn down by `stop_timed_events`. The scheduler reads
//! the roster through the shared state, so joins/leaves are visible at the
//! very next fire.

use std::sync::{Arc, Mutex};

use brawl_core::{ArenaConfig, Participant, Result, Roster};

use crate::engine::EventScheduler;
use crate::loader;
use crate::registry::ActionRegistry;

/// Roster and phase state shared between the competition and its scheduler.
struct CompetitionShared {
    participants: Mutex<Vec<Arc<dyn Participant>>>,
    phase: Mutex<String>,
}

impl Roster for CompetitionShared {
    fn current_participants(&self) -> Vec<Arc<dyn Participant>> {
        self.participants
            .lock()
            .expect("roster lock poisoned")
            .clone()
    }

    fn phase(&self) -> String {
        self.phase.lock().expect("phase lock poisoned").clone()
    }
}

/// One running competition in an arena.
pub struct LiveCompetition {
    arena: String,
    shared: Arc<CompetitionShared>,
    scheduler: EventScheduler,
}

impl LiveCompetition {
    /// Create a competition with empty event catalogs.
    pub fn new(arena: impl Into<String>, initial_phase: impl Into<String>) -> Self {
        let arena = arena.into();
        let shared = Arc::new(CompetitionShared {
            participants: Mutex::new(Vec::new()),
            phase: Mutex::new(initial_phase.into()),
        });
        let roster: Arc<dyn Roster> = shared.clone();
        let scheduler = EventScheduler::new(arena.clone(), roster);
        Self {
            arena,
            shared,
            scheduler,
        }
    }

    /// Create a competition and register every event section of `config`.
    pub fn from_config(config: &ArenaConfig, registry: &ActionRegistry) -> Result<Self> {
        let competition = Self::new(config.name.clone(), config.initial_phase.clone());
        loader::register_events(config, registry, &competition.scheduler)?;
        Ok(competition)
    }

    pub fn arena(&self) -> &str {
        &self.arena
    }

    /// The competition's scheduler. Cloning the handle is cheap.
    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    pub fn phase(&self) -> String {
        self.shared.phase()
    }

    /// Move the competition into a new phase. Does not start or stop event
    /// cycles by itself; lifecycle actions or the host do that explicitly.
    pub fn set_phase(&self, phase: impl Into<String>) {
        let phase = phase.into();
        tracing::info!("🏁 [{}] Phase -> {phase}", self.arena);
        *self.shared.phase.lock().expect("phase lock poisoned") = phase;
    }

    pub fn add_participant(&self, participant: Arc<dyn Participant>) {
        tracing::info!("👤 [{}] {} joined", self.arena, participant.name());
        self.shared
            .participants
            .lock()
            .expect("roster lock poisoned")
            .push(participant);
    }

    pub fn remove_participant(&self, id: &str) -> bool {
        let mut roster = self
            .shared
            .participants
            .lock()
            .expect("roster lock poisoned");
        let before = roster.len();
        roster.retain(|p| p.id() != id);
        before != roster.len()
    }

    pub fn participant_count(&self) -> usize {
        self.shared
            .participants
            .lock()
            .expect("roster lock poisoned")
            .len()
    }

    /// Lifecycle hook: arm all registered events against this competition.
    pub fn start_timed_events(&self) {
        self.scheduler.start();
    }

    /// Lifecycle hook: cancel all live handles and reset bookkeeping.
    pub fn stop_timed_events(&self) {
        self.scheduler.stop();
    }
}

impl Drop for LiveCompetition {
    fn drop(&mut self) {
        // Explicit teardown: no timer may outlive its competition.
        self.scheduler.stop();
    }
}
