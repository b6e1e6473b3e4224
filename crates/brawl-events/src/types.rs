//! Built-in action kinds.
//!
//! Every kind here delivers neutral [`ParticipantEffect`] data or drives the
//! scheduler lifecycle; nothing in this module knows what a title or a
//! status effect concretely does on the host side.

use std::collections::HashMap;
use std::sync::Arc;

use brawl_core::{Participant, ParticipantEffect, Result, TitleTimes};

use crate::action::{ActionContext, ActionParams, EventAction};
use crate::registry::ActionRegistry;
use crate::resolver::Resolver;

/// Install the built-in catalog into a registry.
pub fn register_builtins(reg: &mut ActionRegistry) {
    reg.register(
        "broadcast",
        Box::new(|params| BroadcastAction::create("broadcast", params)),
    );
    reg.register(
        "send-message",
        Box::new(|params| BroadcastAction::create("send-message", params)),
    );
    reg.register("title", Box::new(TitleAction::create));
    reg.register("apply-effect", Box::new(ApplyEffectAction::create));
    reg.register(
        "start-timed-events",
        Box::new(|params| LifecycleAction::create(LifecycleOp::Start, "start-timed-events", params)),
    );
    reg.register(
        "stop-timed-events",
        Box::new(|params| LifecycleAction::create(LifecycleOp::Stop, "stop-timed-events", params)),
    );
    // Periodic lifecycle is folded into the timed hooks; these two exist so
    // configs referencing them keep loading.
    reg.register(
        "start-periodic-events",
        Box::new(|params| LifecycleAction::create(LifecycleOp::Folded, "start-periodic-events", params)),
    );
    reg.register(
        "stop-periodic-events",
        Box::new(|params| LifecycleAction::create(LifecycleOp::Folded, "stop-periodic-events", params)),
    );
}

/// Sends a resolved message to each participant. Backs both `broadcast`
/// and `send-message`.
#[derive(Debug)]
pub struct BroadcastAction {
    params: ActionParams,
}

impl BroadcastAction {
    const MESSAGE_KEY: &'static str = "message";

    pub fn create(kind: &str, params: HashMap<String, String>) -> Result<Arc<dyn EventAction>> {
        let params = ActionParams::new(kind, params, &[Self::MESSAGE_KEY])?;
        Ok(Arc::new(Self { params }))
    }
}

impl EventAction for BroadcastAction {
    fn kind(&self) -> &str {
        self.params.kind()
    }

    fn call(&self, participant: &dyn Participant, resolver: &Resolver<'_>) -> Result<()> {
        let message = resolver.resolve(self.params.get(Self::MESSAGE_KEY)?);
        participant.deliver(ParticipantEffect::Message(message));
        Ok(())
    }
}

/// Shows a title/subtitle with configurable fade timing.
#[derive(Debug)]
pub struct TitleAction {
    params: ActionParams,
}

impl TitleAction {
    const TITLE_KEY: &'static str = "title";
    const SUBTITLE_KEY: &'static str = "subtitle";
    const FADE_IN_KEY: &'static str = "fade-in";
    const STAY_KEY: &'static str = "stay";
    const FADE_OUT_KEY: &'static str = "fade-out";

    pub fn create(params: HashMap<String, String>) -> Result<Arc<dyn EventAction>> {
        let params = ActionParams::new("title", params, &[Self::TITLE_KEY])?;
        Ok(Arc::new(Self { params }))
    }
}

impl EventAction for TitleAction {
    fn kind(&self) -> &str {
        self.params.kind()
    }

    fn call(&self, participant: &dyn Participant, resolver: &Resolver<'_>) -> Result<()> {
        let title = resolver.resolve(self.params.get(Self::TITLE_KEY)?);
        let subtitle = resolver.resolve(self.params.get_or(Self::SUBTITLE_KEY, ""));

        let times = TitleTimes {
            fade_in: self.params.get_duration(Self::FADE_IN_KEY, "0.5s")?,
            stay: self.params.get_duration(Self::STAY_KEY, "3s")?,
            fade_out: self.params.get_duration(Self::FADE_OUT_KEY, "1s")?,
        };

        participant.deliver(ParticipantEffect::Title {
            title,
            subtitle,
            times,
        });
        Ok(())
    }
}

/// Applies a named status effect to each participant.
#[derive(Debug)]
pub struct ApplyEffectAction {
    params: ActionParams,
}

impl ApplyEffectAction {
    const EFFECT_KEY: &'static str = "effect";
    const DURATION_KEY: &'static str = "duration";
    const AMPLIFIER_KEY: &'static str = "amplifier";
    const AMBIENT_KEY: &'static str = "ambient";
    const PARTICLES_KEY: &'static str = "particles";

    pub fn create(params: HashMap<String, String>) -> Result<Arc<dyn EventAction>> {
        let params = ActionParams::new(
            "apply-effect",
            params,
            &[Self::EFFECT_KEY, Self::DURATION_KEY],
        )?;
        Ok(Arc::new(Self { params }))
    }
}

impl EventAction for ApplyEffectAction {
    fn kind(&self) -> &str {
        self.params.kind()
    }

    fn call(&self, participant: &dyn Participant, _resolver: &Resolver<'_>) -> Result<()> {
        let effect = self.params.get(Self::EFFECT_KEY)?.to_string();
        // Required to be present, but its format is still a per-call concern.
        let duration = self.params.get_duration(Self::DURATION_KEY, "1s")?;

        participant.deliver(ParticipantEffect::StatusEffect {
            effect,
            duration,
            amplifier: self.params.get_parsed(Self::AMPLIFIER_KEY, "0")?,
            ambient: self.params.get_parsed(Self::AMBIENT_KEY, "true")?,
            particles: self.params.get_parsed(Self::PARTICLES_KEY, "true")?,
        });
        Ok(())
    }
}

/// What a lifecycle hook does when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleOp {
    /// Arm the scheduler (timed and periodic catalogs together).
    Start,
    /// Cancel every live handle and reset bookkeeping.
    Stop,
    /// No-op: periodic lifecycle is folded into the timed hooks.
    Folded,
}

/// Scheduler lifecycle hook. Per-participant `call` is a no-op; the work
/// happens once, in `post_process`.
#[derive(Debug)]
pub struct LifecycleAction {
    op: LifecycleOp,
    params: ActionParams,
}

impl LifecycleAction {
    fn create(
        op: LifecycleOp,
        kind: &str,
        params: HashMap<String, String>,
    ) -> Result<Arc<dyn EventAction>> {
        let params = ActionParams::new(kind, params, &[])?;
        Ok(Arc::new(Self { op, params }))
    }
}

impl EventAction for LifecycleAction {
    fn kind(&self) -> &str {
        self.params.kind()
    }

    fn call(&self, _participant: &dyn Participant, _resolver: &Resolver<'_>) -> Result<()> {
        Ok(())
    }

    fn post_process(&self, ctx: &ActionContext<'_>, _participant: &dyn Participant) -> Result<()> {
        match self.op {
            LifecycleOp::Start => ctx.scheduler.start(),
            LifecycleOp::Stop => ctx.scheduler.stop(),
            LifecycleOp::Folded => {
                tracing::debug!(
                    "{} is folded into the timed event lifecycle, nothing to do",
                    self.kind()
                );
            }
        }
        Ok(())
    }
}
