//! # Brawl Events
//!
//! Timed event scheduling and the action descriptor language.
//!
//! ## Architecture
//! ```text
//! config section ("broadcast;message={Hello};delay=5s")
//!   └── descriptor::parse_named → ArgumentBuffer
//!         └── ActionRegistry::get(root) → factory → Arc<dyn EventAction>
//!               └── registered into EventScheduler catalogs
//!                     └── start() arms tokio timers per event
//!                           └── fire → pipeline::execute
//!                                 (actions × current participants,
//!                                  per-pair failures collected, never fatal)
//! ```
//!
//! The scheduler is a cloneable handle over a single-mutex state machine:
//! queries from any thread, fires from tokio timer tasks, catalogs kept
//! across `stop()`/`start()` cycles.

pub mod action;
pub mod competition;
pub mod descriptor;
pub mod engine;
pub mod events;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod types;

pub use action::{ActionContext, ActionParams, EventAction};
pub use competition::LiveCompetition;
pub use descriptor::{Argument, ArgumentBuffer, BraceStyle};
pub use engine::{EventScheduler, PhasePolicy};
pub use events::{EventExecutionInfo, EventKind, PeriodicEvent, TimedEvent};
pub use pipeline::{ActionFailure, ActionPhase, ExecutionReport};
pub use registry::ActionRegistry;
pub use resolver::Resolver;
