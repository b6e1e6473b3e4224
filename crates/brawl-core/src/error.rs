//! Error taxonomy for the Brawl event system.
//!
//! Config-time errors (descriptor, registry, construction, event definition)
//! carry enough context that an operator can fix the offending section
//! without reading source. Runtime action failures are a separate variant
//! that the execution pipeline collects instead of propagating.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BrawlError>;

/// All the ways Brawl can fail.
#[derive(Debug, Error)]
pub enum BrawlError {
    /// A descriptor string could not be tokenized.
    #[error("malformed descriptor `{descriptor}`: {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },

    /// The descriptor's root named an action kind the registry does not know.
    #[error("unknown action kind `{provided}` (valid kinds: {valid})")]
    UnknownActionKind { provided: String, valid: String },

    /// An action was constructed without one of its required parameters.
    #[error("action `{kind}` is missing required parameter `{key}`")]
    MissingRequiredParameter { kind: String, key: String },

    /// An event definition is structurally valid but semantically wrong
    /// (zero interval, empty action list, ...).
    #[error("invalid event definition: {reason}")]
    InvalidEventDefinition { reason: String },

    /// A duration string could not be parsed.
    #[error("invalid duration `{input}`: {reason}")]
    InvalidDuration { input: String, reason: String },

    /// A phase of the three-phase action contract failed at fire time.
    /// Never propagated past the execution pipeline.
    #[error("action execution failed: {0}")]
    ActionExecution(String),

    /// Wraps any of the above with the config section it came from.
    #[error("in event section `{name}`: {source}")]
    Section {
        name: String,
        #[source]
        source: Box<BrawlError>,
    },

    /// Configuration file could not be read or deserialized.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BrawlError {
    /// Attach the config section an error came from.
    pub fn in_section(self, name: impl Into<String>) -> Self {
        BrawlError::Section {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Unwrap section context, if any, to reach the underlying error.
    pub fn root_cause(&self) -> &BrawlError {
        match self {
            BrawlError::Section { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_context_in_message() {
        let err = BrawlError::InvalidEventDefinition {
            reason: "interval must be greater than zero".into(),
        }
        .in_section("sudden-death");
        let msg = err.to_string();
        assert!(msg.contains("sudden-death"));
        assert!(msg.contains("interval must be greater than zero"));
    }

    #[test]
    fn test_root_cause_unwraps_nesting() {
        let err = BrawlError::UnknownActionKind {
            provided: "teleportx".into(),
            valid: "broadcast, title".into(),
        }
        .in_section("opening");
        assert!(matches!(
            err.root_cause(),
            BrawlError::UnknownActionKind { .. }
        ));
    }
}
