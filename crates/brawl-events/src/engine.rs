//! Timed event scheduler — the state machine that arms, fires, and tracks
//! registered events for one running competition.
//!
//! One scheduler per competition. Catalogs (registered events) survive
//! `stop()`/`start()` cycles; bookkeeping and the phase start timestamp do
//! not. All mutable state sits behind a single mutex: fire callbacks arrive
//! on tokio timer tasks while queries come from anywhere.
//!
//! Every armed callback carries the epoch it was armed under. `start()` and
//! `stop()` bump the epoch after aborting handles, so a callback that was
//! already queued can never execute its body once the cycle it belongs to
//! is over. A fire that is mid-batch when `stop()` lands finishes its batch
//! (the batch runs outside the lock) but is never rescheduled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;

use brawl_core::{BrawlError, Participant, Result, Roster};

use crate::action::{ActionContext, EventAction};
use crate::events::{EventExecutionInfo, PeriodicEvent, TimedEvent};
use crate::pipeline;

/// Whether periodic fires outside an event's `active-phases` are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhasePolicy {
    /// Suppress out-of-phase fires (no bookkeeping, handle stays armed).
    #[default]
    Enforce,
    /// Fire regardless of the current phase.
    Ignore,
}

/// Cloneable handle to one competition's event scheduler.
#[derive(Clone)]
pub struct EventScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    arena: String,
    roster: Arc<dyn Roster>,
    state: Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
    /// Registration order is catalog order; it drives iteration and the
    /// `next_due_timed_event` tie-break.
    timed: Vec<(String, TimedEvent)>,
    periodic: Vec<(String, PeriodicEvent)>,
    phase_start: Option<DateTime<Utc>>,
    exec_info: HashMap<String, EventExecutionInfo>,
    handles: Vec<JoinHandle<()>>,
    epoch: u64,
    phase_policy: PhasePolicy,
}

impl EventScheduler {
    /// Create an idle scheduler reading participants from `roster`.
    pub fn new(arena: impl Into<String>, roster: Arc<dyn Roster>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                arena: arena.into(),
                roster,
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Change how `active-phases` is enforced for periodic fires.
    pub fn set_phase_policy(&self, policy: PhasePolicy) {
        self.inner.lock().phase_policy = policy;
    }

    /// Register a one-shot event. Overwrites an existing entry with the
    /// same id in place.
    pub fn register_timed_event(&self, id: impl Into<String>, event: TimedEvent) {
        let id = id.into();
        let mut st = self.inner.lock();
        tracing::info!(
            "📅 [{}] Registered timed event `{id}` (+{:?}, {} actions)",
            self.inner.arena,
            event.trigger_offset,
            event.actions.len()
        );
        match st.timed.iter().position(|(eid, _)| *eid == id) {
            Some(i) => st.timed[i].1 = event,
            None => st.timed.push((id, event)),
        }
    }

    /// Register a repeating event. Rejects a zero interval, which would
    /// fire infinitely fast.
    pub fn register_periodic_event(&self, id: impl Into<String>, event: PeriodicEvent) -> Result<()> {
        let id = id.into();
        if event.interval.is_zero() {
            return Err(BrawlError::InvalidEventDefinition {
                reason: format!("periodic event `{id}` has a zero interval"),
            });
        }
        let mut st = self.inner.lock();
        tracing::info!(
            "🔁 [{}] Registered periodic event `{id}` (every {:?}, {} actions)",
            self.inner.arena,
            event.interval,
            event.actions.len()
        );
        match st.periodic.iter().position(|(eid, _)| *eid == id) {
            Some(i) => st.periodic[i].1 = event,
            None => st.periodic.push((id, event)),
        }
        Ok(())
    }

    /// Arm every registered event. Re-entrant: calling `start()` while
    /// running replaces all live handles, so earlier cycles never leak.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut guard = self.inner.lock();
        let st = &mut *guard;

        for handle in st.handles.drain(..) {
            handle.abort();
        }
        st.epoch += 1;
        let epoch = st.epoch;

        let now = Utc::now();
        st.phase_start = Some(now);
        st.exec_info.clear();

        tracing::info!(
            "⏰ [{}] Event cycle started ({} timed, {} periodic)",
            self.inner.arena,
            st.timed.len(),
            st.periodic.len()
        );

        // Bookkeeping exists for every event before any handle is armed, so
        // observers see "armed but not yet fired" as soon as start returns.
        for (id, event) in &st.timed {
            st.exec_info.insert(
                id.clone(),
                EventExecutionInfo::timed(event.trigger_offset, deadline(now, event.trigger_offset)),
            );
        }
        for (id, event) in &st.periodic {
            st.exec_info.insert(
                id.clone(),
                EventExecutionInfo::periodic(event, deadline(now, event.start_delay)),
            );
        }

        for (id, event) in &st.timed {
            let inner = Arc::clone(&self.inner);
            let id = id.clone();
            let offset = event.trigger_offset;
            st.handles.push(tokio::spawn(async move {
                tokio::time::sleep(offset).await;
                inner.fire_timed(&id, epoch);
            }));
        }
        for (id, event) in &st.periodic {
            let inner = Arc::clone(&self.inner);
            let id = id.clone();
            let (delay, interval) = (event.start_delay, event.interval);
            st.handles.push(tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval_at(tokio::time::Instant::now() + delay, interval);
                loop {
                    ticker.tick().await;
                    inner.fire_periodic(&id, epoch);
                }
            }));
        }
    }

    /// Cancel every live handle and reset bookkeeping. Registered catalogs
    /// are retained. Safe to call when already idle.
    pub fn stop(&self) {
        let mut st = self.inner.lock();
        for handle in st.handles.drain(..) {
            handle.abort();
        }
        st.epoch += 1;
        st.phase_start = None;
        st.exec_info.clear();
        tracing::info!("🛑 [{}] Event cycle stopped", self.inner.arena);
    }

    /// Whether a phase cycle is currently armed.
    pub fn is_running(&self) -> bool {
        self.inner.lock().phase_start.is_some()
    }

    /// Time elapsed since `start()`, or zero when idle.
    pub fn time_since_phase_start(&self) -> Duration {
        match self.inner.lock().phase_start {
            Some(start) => (Utc::now() - start).to_std().unwrap_or_default(),
            None => Duration::ZERO,
        }
    }

    /// Whether the given event has fired at least once this cycle.
    pub fn is_executed(&self, id: &str) -> bool {
        self.inner
            .lock()
            .exec_info
            .get(id)
            .is_some_and(|info| info.executed)
    }

    /// Bookkeeping snapshot for one event, if armed.
    pub fn execution_info(&self, id: &str) -> Option<EventExecutionInfo> {
        self.inner.lock().exec_info.get(id).cloned()
    }

    /// Bookkeeping snapshots for every armed event, timed catalog first,
    /// each in registration order.
    pub fn all_execution_info(&self) -> Vec<(String, EventExecutionInfo)> {
        let st = self.inner.lock();
        st.timed
            .iter()
            .map(|(id, _)| id)
            .chain(st.periodic.iter().map(|(id, _)| id))
            .filter_map(|id| st.exec_info.get(id).map(|info| (id.clone(), info.clone())))
            .collect()
    }

    /// The not-yet-executed timed event closest to its deadline. Ties break
    /// by registration order. `None` when idle or everything has fired.
    pub fn next_due_timed_event(&self) -> Option<String> {
        let st = self.inner.lock();
        st.phase_start?;
        let now = Utc::now();

        let mut best: Option<(&str, TimeDelta)> = None;
        for (id, _) in &st.timed {
            let Some(info) = st.exec_info.get(id) else {
                continue;
            };
            if info.executed {
                continue;
            }
            let remaining = info.scheduled_at - now;
            // Strict comparison keeps the earliest-registered on a tie.
            if best.is_none_or(|(_, b)| remaining < b) {
                best = Some((id, remaining));
            }
        }
        best.map(|(id, _)| id.to_string())
    }

    /// Ids of periodic events that have completed at least one fire.
    pub fn active_periodic_events(&self) -> Vec<String> {
        let st = self.inner.lock();
        st.periodic
            .iter()
            .map(|(id, _)| id)
            .filter(|id| st.exec_info.get(*id).is_some_and(|info| info.executed))
            .cloned()
            .collect()
    }

    /// Registered timed event ids, in registration order.
    pub fn timed_event_ids(&self) -> Vec<String> {
        self.inner.lock().timed.iter().map(|(id, _)| id.clone()).collect()
    }

    /// Registered periodic event ids, in registration order.
    pub fn periodic_event_ids(&self) -> Vec<String> {
        self.inner.lock().periodic.iter().map(|(id, _)| id.clone()).collect()
    }
}

impl SchedulerInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, SchedulerState> {
        self.state.lock().expect("scheduler state lock poisoned")
    }

    /// One-shot fire. An empty roster means the opportunity is simply lost:
    /// the event is not marked executed and never retried.
    fn fire_timed(self: &Arc<Self>, id: &str, epoch: u64) {
        let actions = {
            let st = self.lock();
            if st.epoch != epoch || st.phase_start.is_none() {
                return;
            }
            match st.timed.iter().find(|(eid, _)| eid == id) {
                Some((_, event)) => event.actions.clone(),
                None => return,
            }
        };

        // Roster impls may query the scheduler from these callbacks, so the
        // state lock must not be held across them.
        let participants = self.roster.current_participants();
        if participants.is_empty() {
            tracing::debug!("⏭️ [{}] Timed event `{id}` due with no participants, dropped", self.arena);
            return;
        }

        if !self.record_fire(id, epoch) {
            return;
        }
        tracing::debug!("🔔 [{}] Firing timed event `{id}`", self.arena);
        self.run_batch(id, &actions, &participants);
    }

    /// Repeating fire. Empty roster and out-of-phase fires skip bookkeeping
    /// entirely; the ticker stays armed either way.
    fn fire_periodic(self: &Arc<Self>, id: &str, epoch: u64) {
        let (actions, active_phases, policy) = {
            let st = self.lock();
            if st.epoch != epoch || st.phase_start.is_none() {
                return;
            }
            match st.periodic.iter().find(|(eid, _)| eid == id) {
                Some((_, event)) => (
                    event.actions.clone(),
                    event.active_phases.clone(),
                    st.phase_policy,
                ),
                None => return,
            }
        };

        // As in fire_timed: roster callbacks run without the state lock.
        if policy == PhasePolicy::Enforce {
            let phase = self.roster.phase();
            if !active_phases.iter().any(|p| *p == phase) {
                tracing::debug!(
                    "⏭️ [{}] Periodic event `{id}` suppressed in phase `{phase}`",
                    self.arena
                );
                return;
            }
        }

        let participants = self.roster.current_participants();
        if participants.is_empty() {
            tracing::debug!("⏭️ [{}] Periodic event `{id}` due with no participants, skipped", self.arena);
            return;
        }

        if !self.record_fire(id, epoch) {
            return;
        }
        tracing::debug!("🔔 [{}] Firing periodic event `{id}`", self.arena);
        self.run_batch(id, &actions, &participants);
    }

    /// Second critical section of a fire: re-check the epoch fence (a
    /// `stop()` may have landed while the roster was consulted) and record
    /// the execution. Returns false when the fire must not proceed.
    fn record_fire(&self, id: &str, epoch: u64) -> bool {
        let mut st = self.lock();
        if st.epoch != epoch || st.phase_start.is_none() {
            return false;
        }
        if let Some(info) = st.exec_info.get_mut(id) {
            info.record_execution(Utc::now());
        }
        true
    }

    /// Execute one batch outside the state lock, so a long batch never
    /// blocks queries and lifecycle actions can re-enter the scheduler.
    fn run_batch(
        self: &Arc<Self>,
        id: &str,
        actions: &[Arc<dyn EventAction>],
        participants: &[Arc<dyn Participant>],
    ) {
        let scheduler = EventScheduler {
            inner: Arc::clone(self),
        };
        let ctx = ActionContext {
            arena: &self.arena,
            scheduler: &scheduler,
            roster: self.roster.as_ref(),
        };
        let report = pipeline::execute(id, actions, participants, &ctx);
        if !report.failures.is_empty() {
            tracing::warn!(
                "⚠️ [{}] Event `{id}`: {}/{} action runs failed",
                self.arena,
                report.failures.len(),
                report.pairs
            );
        }
    }
}

/// First-fire deadline, saturating at the far end of the calendar: an
/// offset too large for chrono must never report an earlier deadline than
/// the timer honors.
fn deadline(now: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(offset)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::EventAction;
    use crate::resolver::Resolver;
    use brawl_core::RecordingParticipant;

    /// Roster whose membership and phase tests can change mid-cycle.
    struct TestRoster {
        participants: Mutex<Vec<Arc<dyn Participant>>>,
        phase: Mutex<String>,
    }

    impl TestRoster {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                participants: Mutex::new(Vec::new()),
                phase: Mutex::new("ingame".into()),
            })
        }

        fn with_one() -> (Arc<Self>, Arc<RecordingParticipant>) {
            let roster = Self::new();
            let p = Arc::new(RecordingParticipant::new("p1", "Alice"));
            roster.participants.lock().unwrap().push(p.clone());
            (roster, p)
        }

        fn set_phase(&self, phase: &str) {
            *self.phase.lock().unwrap() = phase.into();
        }

        fn clear(&self) {
            self.participants.lock().unwrap().clear();
        }

        fn add(&self, p: Arc<dyn Participant>) {
            self.participants.lock().unwrap().push(p);
        }
    }

    impl Roster for TestRoster {
        fn current_participants(&self) -> Vec<Arc<dyn Participant>> {
            self.participants.lock().unwrap().clone()
        }

        fn phase(&self) -> String {
            self.phase.lock().unwrap().clone()
        }
    }

    /// Action that logs each three-phase invocation.
    #[derive(Debug)]
    struct TraceAction {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl TraceAction {
        fn pair(log: &Arc<Mutex<Vec<String>>>) -> Vec<Arc<dyn EventAction>> {
            vec![Arc::new(Self { log: Arc::clone(log) })]
        }
    }

    impl EventAction for TraceAction {
        fn kind(&self) -> &str {
            "trace"
        }

        fn pre_process(&self, _ctx: &ActionContext<'_>, p: &dyn Participant) -> Result<()> {
            self.log.lock().unwrap().push(format!("pre:{}", p.id()));
            Ok(())
        }

        fn call(&self, p: &dyn Participant, _resolver: &Resolver<'_>) -> Result<()> {
            self.log.lock().unwrap().push(format!("call:{}", p.id()));
            Ok(())
        }

        fn post_process(&self, _ctx: &ActionContext<'_>, p: &dyn Participant) -> Result<()> {
            self.log.lock().unwrap().push(format!("post:{}", p.id()));
            Ok(())
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    async fn run_for(d: Duration) {
        tokio::time::sleep(d + Duration::from_millis(20)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_event_fires_exactly_once() {
        let (roster, p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("opening", TimedEvent::new(secs(2), TraceAction::pair(&log)));

        scheduler.start();
        assert!(!scheduler.is_executed("opening"));
        assert_eq!(scheduler.execution_info("opening").unwrap().execution_count, 0);

        run_for(secs(2)).await;
        assert!(scheduler.is_executed("opening"));
        let info = scheduler.execution_info("opening").unwrap();
        assert_eq!(info.execution_count, 1);
        assert!(info.last_execution.is_some());

        // Never fires again within the same cycle.
        run_for(secs(10)).await;
        assert_eq!(scheduler.execution_info("opening").unwrap().execution_count, 1);
        assert_eq!(
            log.lock().unwrap().clone(),
            vec!["pre:p1", "call:p1", "post:p1"]
        );
        let _ = p;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_event_with_empty_roster_is_lost() {
        let roster = TestRoster::new();
        let scheduler = EventScheduler::new("arena", roster.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("opening", TimedEvent::new(secs(1), TraceAction::pair(&log)));

        scheduler.start();
        run_for(secs(2)).await;
        assert!(!scheduler.is_executed("opening"));

        // Joining later does not resurrect a one-shot that already missed.
        roster.add(Arc::new(RecordingParticipant::new("p1", "Alice")));
        run_for(secs(5)).await;
        assert!(!scheduler.is_executed("opening"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_execution_count() {
        let (roster, _p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut event = PeriodicEvent::new(secs(2), secs(1), TraceAction::pair(&log));
        event.active_phases = vec!["ingame".into()];
        scheduler.register_periodic_event("heartbeat", event).unwrap();

        scheduler.start();
        // Window of 10s, delay 1s, interval 2s: fires at 1,3,5,7,9.
        run_for(secs(10)).await;
        let info = scheduler.execution_info("heartbeat").unwrap();
        assert_eq!(info.execution_count, 5);
        assert_eq!(scheduler.active_periodic_events(), vec!["heartbeat"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_skips_empty_roster_but_stays_armed() {
        let roster = TestRoster::new();
        let scheduler = EventScheduler::new("arena", roster.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler
            .register_periodic_event("heartbeat", PeriodicEvent::new(secs(2), Duration::ZERO, TraceAction::pair(&log)))
            .unwrap();

        scheduler.start();
        run_for(secs(6)).await;
        assert_eq!(scheduler.execution_info("heartbeat").unwrap().execution_count, 0);
        assert!(scheduler.active_periodic_events().is_empty());

        // Roster fills in; the still-armed ticker picks it up.
        roster.add(Arc::new(RecordingParticipant::new("p1", "Alice")));
        run_for(secs(4)).await;
        assert!(scheduler.execution_info("heartbeat").unwrap().execution_count >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets_bookkeeping_keeps_catalogs() {
        let (roster, _p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("opening", TimedEvent::new(secs(1), TraceAction::pair(&log)));

        scheduler.start();
        run_for(secs(2)).await;
        assert!(scheduler.is_executed("opening"));

        scheduler.stop();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.time_since_phase_start(), Duration::ZERO);
        assert!(!scheduler.is_executed("opening"));
        assert!(scheduler.execution_info("opening").is_none());
        assert_eq!(scheduler.timed_event_ids(), vec!["opening"]);

        // A fresh cycle rearms the retained catalog from scratch.
        scheduler.start();
        assert_eq!(scheduler.execution_info("opening").unwrap().execution_count, 0);
        run_for(secs(2)).await;
        assert_eq!(scheduler.execution_info("opening").unwrap().execution_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_pending_fires() {
        let (roster, _p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("late", TimedEvent::new(secs(5), TraceAction::pair(&log)));

        scheduler.start();
        run_for(secs(1)).await;
        scheduler.stop();
        run_for(secs(10)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentrant_start_replaces_handles() {
        let (roster, _p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("opening", TimedEvent::new(secs(2), TraceAction::pair(&log)));

        scheduler.start();
        run_for(secs(1)).await;
        scheduler.start(); // re-arm mid-cycle
        run_for(secs(3)).await;

        // Only the second cycle's handle fired; the first was replaced.
        assert_eq!(scheduler.execution_info("opening").unwrap().execution_count, 1);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_rejected() {
        let (roster, _p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let err = scheduler
            .register_periodic_event("bad", PeriodicEvent::new(Duration::ZERO, Duration::ZERO, Vec::new()))
            .unwrap_err();
        assert!(matches!(err, BrawlError::InvalidEventDefinition { .. }));
        assert!(scheduler.periodic_event_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_due_ordering_and_tie_break() {
        let (roster, _p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("slow", TimedEvent::new(secs(5), TraceAction::pair(&log)));
        scheduler.register_timed_event("fast", TimedEvent::new(secs(2), TraceAction::pair(&log)));
        scheduler.register_timed_event("fast-too", TimedEvent::new(secs(2), TraceAction::pair(&log)));

        assert_eq!(scheduler.next_due_timed_event(), None); // idle

        scheduler.start();
        // `fast` and `fast-too` tie; registration order wins.
        assert_eq!(scheduler.next_due_timed_event().as_deref(), Some("fast"));

        run_for(secs(2)).await;
        assert_eq!(scheduler.next_due_timed_event().as_deref(), Some("slow"));

        run_for(secs(3)).await;
        assert_eq!(scheduler.next_due_timed_event(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_policy_enforced() {
        let (roster, _p) = TestRoster::with_one();
        roster.set_phase("waiting");
        let scheduler = EventScheduler::new("arena", roster.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut event = PeriodicEvent::new(secs(2), Duration::ZERO, TraceAction::pair(&log));
        event.active_phases = vec!["ingame".into()];
        scheduler.register_periodic_event("heartbeat", event).unwrap();

        scheduler.start();
        run_for(secs(6)).await;
        assert_eq!(scheduler.execution_info("heartbeat").unwrap().execution_count, 0);

        roster.set_phase("ingame");
        run_for(secs(4)).await;
        assert!(scheduler.execution_info("heartbeat").unwrap().execution_count >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_policy_ignore_fires_anywhere() {
        let (roster, _p) = TestRoster::with_one();
        roster.set_phase("waiting");
        let scheduler = EventScheduler::new("arena", roster);
        scheduler.set_phase_policy(PhasePolicy::Ignore);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut event = PeriodicEvent::new(secs(2), Duration::ZERO, TraceAction::pair(&log));
        event.active_phases = vec!["ingame".into()];
        scheduler.register_periodic_event("heartbeat", event).unwrap();

        scheduler.start();
        run_for(secs(4)).await;
        assert!(scheduler.execution_info("heartbeat").unwrap().execution_count >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_roster_read_fresh_at_each_fire() {
        let roster = TestRoster::new();
        let alice = Arc::new(RecordingParticipant::new("p1", "Alice"));
        let bob = Arc::new(RecordingParticipant::new("p2", "Bob"));
        roster.add(alice.clone());

        let scheduler = EventScheduler::new("arena", roster.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler
            .register_periodic_event("heartbeat", PeriodicEvent::new(secs(2), Duration::ZERO, TraceAction::pair(&log)))
            .unwrap();

        scheduler.start();
        run_for(secs(1)).await;
        roster.clear();
        roster.add(bob.clone());
        run_for(secs(2)).await;

        let entries = log.lock().unwrap().clone();
        assert!(entries.contains(&"call:p1".to_string()));
        assert!(entries.contains(&"call:p2".to_string()));
    }

    /// Roster whose callbacks query the scheduler they feed, the way an
    /// embedder's live roster might.
    struct ReentrantRoster {
        scheduler: Mutex<Option<EventScheduler>>,
        participant: Arc<dyn Participant>,
    }

    impl Roster for ReentrantRoster {
        fn current_participants(&self) -> Vec<Arc<dyn Participant>> {
            if let Some(s) = self.scheduler.lock().unwrap().as_ref() {
                let _ = s.is_executed("opening");
                let _ = s.next_due_timed_event();
            }
            vec![self.participant.clone()]
        }

        fn phase(&self) -> String {
            if let Some(s) = self.scheduler.lock().unwrap().as_ref() {
                let _ = s.is_running();
            }
            "ingame".into()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_roster_may_query_scheduler_during_fire() {
        let alice = Arc::new(RecordingParticipant::new("p1", "Alice"));
        let roster = Arc::new(ReentrantRoster {
            scheduler: Mutex::new(None),
            participant: alice.clone(),
        });
        let scheduler = EventScheduler::new("arena", roster.clone());
        *roster.scheduler.lock().unwrap() = Some(scheduler.clone());

        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("opening", TimedEvent::new(secs(1), TraceAction::pair(&log)));
        scheduler
            .register_periodic_event("heartbeat", PeriodicEvent::new(secs(2), Duration::ZERO, TraceAction::pair(&log)))
            .unwrap();

        scheduler.start();
        run_for(secs(2)).await;
        assert!(scheduler.is_executed("opening"));
        assert!(scheduler.execution_info("heartbeat").unwrap().execution_count >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_offset_reports_far_future_deadline() {
        let (roster, _p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("soon", TimedEvent::new(secs(2), TraceAction::pair(&log)));
        scheduler.register_timed_event("heat-death", TimedEvent::new(Duration::MAX, TraceAction::pair(&log)));

        scheduler.start();
        let info = scheduler.execution_info("heat-death").unwrap();
        // The reported deadline must never sort before real deadlines.
        assert!(info.scheduled_at > Utc::now() + TimeDelta::days(365_000));
        assert_eq!(scheduler.next_due_timed_event().as_deref(), Some("soon"));

        run_for(secs(2)).await;
        assert!(scheduler.is_executed("soon"));
        assert!(!scheduler.is_executed("heat-death"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_action_stops_scheduler_mid_cycle() {
        let (roster, _p) = TestRoster::with_one();
        let scheduler = EventScheduler::new("arena", roster);
        let registry = crate::registry::ActionRegistry::with_defaults();
        let stopper = registry.get("stop-timed-events").unwrap()(HashMap::new()).unwrap();
        scheduler.register_timed_event("shutdown", TimedEvent::new(secs(1), vec![stopper]));
        let log = Arc::new(Mutex::new(Vec::new()));
        scheduler.register_timed_event("never", TimedEvent::new(secs(5), TraceAction::pair(&log)));

        scheduler.start();
        run_for(secs(2)).await;
        assert!(!scheduler.is_running());
        run_for(secs(10)).await;
        assert!(log.lock().unwrap().is_empty());
    }
}
