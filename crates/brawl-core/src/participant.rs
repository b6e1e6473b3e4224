//! Participants and rosters — the entities event actions act on.
//!
//! The scheduler never owns the roster; it reads it fresh from a [`Roster`]
//! at every fire, so joins and leaves between fires are reflected
//! automatically. Concrete game effects stay behind [`ParticipantEffect`]:
//! this crate delivers data, the host decides what a title or a status
//! effect actually does.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An entity eligible to receive action effects during a fire.
pub trait Participant: Send + Sync {
    /// Stable identifier, used in logs and failure reports.
    fn id(&self) -> &str;

    /// Display name, used by placeholder resolution.
    fn name(&self) -> &str;

    /// Deliver one effect to this participant.
    fn deliver(&self, effect: ParticipantEffect);
}

/// Supplies the current participant set and competition phase.
pub trait Roster: Send + Sync {
    /// The participants present right now, in catalog order.
    fn current_participants(&self) -> Vec<Arc<dyn Participant>>;

    /// The competition phase the roster is currently in (e.g. `"ingame"`).
    fn phase(&self) -> String;
}

/// Fade-in / stay / fade-out timing of a title display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleTimes {
    pub fade_in: Duration,
    pub stay: Duration,
    pub fade_out: Duration,
}

/// A concrete effect delivered to a participant.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantEffect {
    /// A chat/broadcast message, already placeholder-resolved.
    Message(String),
    /// An on-screen title with optional subtitle.
    Title {
        title: String,
        subtitle: String,
        times: TitleTimes,
    },
    /// A named status effect (the host maps the name onto its own catalog).
    StatusEffect {
        effect: String,
        duration: Duration,
        amplifier: u8,
        ambient: bool,
        particles: bool,
    },
}

impl fmt::Display for ParticipantEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantEffect::Message(text) => write!(f, "message: {text}"),
            ParticipantEffect::Title {
                title, subtitle, ..
            } => {
                if subtitle.is_empty() {
                    write!(f, "title: {title}")
                } else {
                    write!(f, "title: {title} / {subtitle}")
                }
            }
            ParticipantEffect::StatusEffect {
                effect,
                duration,
                amplifier,
                ..
            } => write!(f, "effect: {effect} x{amplifier} for {duration:?}"),
        }
    }
}

/// Participant that logs every delivered effect. Used by the CLI.
pub struct LogParticipant {
    id: String,
    name: String,
}

impl LogParticipant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Participant for LogParticipant {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, effect: ParticipantEffect) {
        tracing::info!("💬 [{}] {}", self.name, effect);
    }
}

/// Participant that records delivered effects in memory, for tests and
/// embedders that want to inspect what an event did.
pub struct RecordingParticipant {
    id: String,
    name: String,
    received: Mutex<Vec<ParticipantEffect>>,
}

impl RecordingParticipant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything delivered so far.
    pub fn received(&self) -> Vec<ParticipantEffect> {
        self.received.lock().expect("effects lock poisoned").clone()
    }
}

impl Participant for RecordingParticipant {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, effect: ParticipantEffect) {
        self.received
            .lock()
            .expect("effects lock poisoned")
            .push(effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_participant_keeps_order() {
        let p = RecordingParticipant::new("p1", "Alice");
        p.deliver(ParticipantEffect::Message("first".into()));
        p.deliver(ParticipantEffect::Message("second".into()));
        let got = p.received();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], ParticipantEffect::Message("first".into()));
    }

    #[test]
    fn test_effect_display() {
        let e = ParticipantEffect::Title {
            title: "Go!".into(),
            subtitle: String::new(),
            times: TitleTimes {
                fade_in: Duration::from_millis(500),
                stay: Duration::from_secs(3),
                fade_out: Duration::from_secs(1),
            },
        };
        assert_eq!(e.to_string(), "title: Go!");
    }
}
