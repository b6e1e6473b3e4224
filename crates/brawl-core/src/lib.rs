//! # Brawl Core
//!
//! Shared foundation for the Brawl event system: the arena configuration
//! model, humane duration parsing, the error taxonomy, and the
//! participant/roster abstractions every other crate builds on.

pub mod config;
pub mod duration;
pub mod error;
pub mod participant;

pub use config::{ArenaConfig, PeriodicEventConfig, TimedEventConfig};
pub use duration::EventDuration;
pub use error::{BrawlError, Result};
pub use participant::{
    LogParticipant, Participant, ParticipantEffect, RecordingParticipant, Roster, TitleTimes,
};
