//! Placeholder resolution — substitutes `%player%`-style tokens in action
//! text against the participant currently being acted on.

use brawl_core::Participant;

/// Resolves templated text for one (arena, participant) pair.
pub struct Resolver<'a> {
    arena: &'a str,
    participant: &'a dyn Participant,
}

impl<'a> Resolver<'a> {
    pub fn new(arena: &'a str, participant: &'a dyn Participant) -> Self {
        Self { arena, participant }
    }

    /// Replace all known placeholders in `text`.
    pub fn resolve(&self, text: &str) -> String {
        text.replace("%player%", self.participant.name())
            .replace("%player-id%", self.participant.id())
            .replace("%arena%", self.arena)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_core::RecordingParticipant;

    #[test]
    fn test_substitutes_placeholders() {
        let p = RecordingParticipant::new("p1", "Alice");
        let resolver = Resolver::new("Deathmatch", &p);
        assert_eq!(
            resolver.resolve("%player% (%player-id%) joined %arena%"),
            "Alice (p1) joined Deathmatch"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        let p = RecordingParticipant::new("p1", "Alice");
        let resolver = Resolver::new("Deathmatch", &p);
        assert_eq!(resolver.resolve("no tokens here"), "no tokens here");
    }
}
