//! The resuscitation context: one session, its clock, and its protocol.
//!
//! [`Resuscitation`] is the single owner of everything a running
//! resuscitation mutates. Every rescuer action goes through it in the same
//! order: the event is appended to the record first, then the protocol
//! machine sees it, then a [`Snapshot`] is returned for the presentation
//! layer to render. Nothing is published implicitly.
//!
//! Event timestamps are virtual: `started_at + elapsed(now)`. A fast-forward
//! therefore shows up in the record and the protocol's time checks, and
//! the record stays in timestamp order.

use jiff::{SignedDuration, Timestamp};

use crate::clock::TimeModel;
use crate::model::{Event, EventKind, PatientOutcome, Rhythm, Session, SessionMode};
use crate::protocol::{
    AttentionFlags, Guidance, GuidanceTiming, Phase, ProtocolStateMachine, Transition,
};

/// Every time threshold a resuscitation runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub guidance: GuidanceTiming,

    /// A running CPR counter completes the cycle when it reaches this.
    pub cpr_cycle_secs: u32,

    /// Time after ROSC before the outcome prompt is raised.
    pub outcome_prompt_secs: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            guidance: GuidanceTiming::default(),
            cpr_cycle_secs: 120,
            outcome_prompt_secs: 1200,
        }
    }
}

/// What the presentation layer needs after any call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub active: bool,
    pub transition: Transition,
    pub phase: Phase,
    pub cycle: u32,
    pub guidance: Option<Guidance>,
    pub attention: AttentionFlags,

    /// ROSC has lasted long enough that an outcome should be recorded.
    pub outcome_due: bool,

    pub elapsed: SignedDuration,
    pub cpr_secs: u32,
    pub rosc_secs: u32,
    pub since_rhythm_check_secs: u32,
}

/// An owned resuscitation context. Idle until [`start`](Self::start).
#[derive(Debug, Clone, Default)]
pub struct Resuscitation {
    thresholds: Thresholds,
    session: Option<Session>,
    clock: TimeModel,
    protocol: ProtocolStateMachine,
}

impl Resuscitation {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            session: None,
            clock: TimeModel::default(),
            protocol: ProtocolStateMachine::new(thresholds.guidance),
        }
    }

    /// Starts a fresh session. Any session in progress is discarded along
    /// with its clock and protocol state.
    pub fn start(&mut self, mode: SessionMode, now: Timestamp) -> Snapshot {
        if let Some(previous) = &self.session {
            log::warn!(
                "discarding unfinished session {} ({} events)",
                previous.id,
                previous.events.len()
            );
        }
        let session = Session::new(mode, now);
        log::info!("session {} started ({mode})", session.id);

        self.session = Some(session);
        self.clock.start(now);
        self.protocol = ProtocolStateMachine::new(self.thresholds.guidance);
        self.protocol.start(now);
        self.snapshot(now, Transition::Applied)
    }

    /// Closes the session and hands it back for persistence.
    ///
    /// Returns `None` when nothing was recorded; an empty session is not
    /// worth keeping.
    pub fn end(&mut self, now: Timestamp) -> Option<Session> {
        let ended_at = self.virtual_now(now);
        let mut session = self.session.take()?;
        session.ended_at = Some(ended_at.unwrap_or(now));

        self.clock = TimeModel::default();
        self.protocol = ProtocolStateMachine::new(self.thresholds.guidance);

        log::info!(
            "session {} ended with {} events",
            session.id,
            session.events.len()
        );
        (!session.events.is_empty()).then_some(session)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    // ── Rescuer actions ──

    /// A rhythm check. Running compressions stop first, and how long they
    /// ran goes into the record ahead of the rhythm.
    pub fn record_rhythm(&mut self, rhythm: Rhythm, now: Timestamp) -> Snapshot {
        self.stop_compressions(now);
        let Some(at) = self.record(
            EventKind::RhythmChecked {
                rhythm: rhythm.clone(),
            },
            now,
        ) else {
            return self.snapshot(now, Transition::Ignored);
        };

        match rhythm {
            Rhythm::Rosc => {
                self.clock.rosc.start();
                self.record(EventKind::RoscStarted, now);
            }
            Rhythm::PulselessVtVf | Rhythm::PeaAsystole => {
                self.clock.rosc.reset();
                self.clock.since_rhythm_check.start();
            }
            Rhythm::Other(_) => {}
        }

        let transition = self.protocol.record_rhythm(&rhythm, at);
        self.snapshot(now, transition)
    }

    pub fn record_shock(&mut self, joules: u32, now: Timestamp) -> Snapshot {
        let Some(at) = self.record(EventKind::ShockDelivered { joules }, now) else {
            return self.snapshot(now, Transition::Ignored);
        };
        let transition = self.protocol.record_shock_delivered(at);
        self.snapshot(now, transition)
    }

    /// Compressions started. When the protocol is waiting for CPR, a cycle
    /// begins here and the CPR counter restarts from zero; compressions
    /// already running before that are closed out in the record.
    pub fn record_cpr_started(&mut self, now: Timestamp) -> Snapshot {
        if self.is_active() && self.protocol.awaiting_cpr() {
            self.stop_compressions(now);
        }
        let Some(at) = self.record(EventKind::CprStarted, now) else {
            return self.snapshot(now, Transition::Ignored);
        };
        if !self.clock.cpr.is_running() {
            self.clock.cpr.start();
        }
        let transition = self.protocol.record_cpr_started(at);
        self.snapshot(now, transition)
    }

    /// Completes the current CPR cycle by hand. `duration_secs` is `None`
    /// when the rescuer gave no usable duration.
    pub fn complete_cpr_cycle(&mut self, duration_secs: Option<u32>, now: Timestamp) -> Snapshot {
        let transition = self.finish_cycle(duration_secs, now);
        self.snapshot(now, transition)
    }

    pub fn record_adrenaline(&mut self, now: Timestamp) -> Snapshot {
        let at = self.virtual_now(now);
        let Some(log) = self.session.as_ref().map(|s| &s.events) else {
            return self.snapshot(now, Transition::Ignored);
        };
        let dose = ordinal(log.adrenaline_doses());
        let since_last_secs = log
            .last_adrenaline()
            .zip(at)
            .map(|(previous, at)| at.duration_since(previous.timestamp).as_secs());

        let Some(at) = self.record(
            EventKind::AdrenalineGiven {
                dose,
                since_last_secs,
            },
            now,
        ) else {
            return self.snapshot(now, Transition::Ignored);
        };
        let transition = self.protocol.record_adrenaline(at);
        self.snapshot(now, transition)
    }

    pub fn record_amiodarone(&mut self, now: Timestamp) -> Snapshot {
        let Some(dose) = self
            .session
            .as_ref()
            .map(|s| ordinal(s.events.amiodarone_doses()))
        else {
            return self.snapshot(now, Transition::Ignored);
        };
        let Some(at) = self.record(EventKind::AmiodaroneGiven { dose }, now) else {
            return self.snapshot(now, Transition::Ignored);
        };
        let transition = self.protocol.record_amiodarone(at);
        self.snapshot(now, transition)
    }

    /// Any other drug. Recorded only; the protocol does not schedule it.
    pub fn record_medication(&mut self, name: impl Into<String>, now: Timestamp) -> Snapshot {
        self.record(EventKind::MedicationGiven { name: name.into() }, now);
        self.snapshot(now, Transition::Ignored)
    }

    pub fn record_other(&mut self, text: impl Into<String>, now: Timestamp) -> Snapshot {
        self.record(EventKind::Other { text: text.into() }, now);
        self.snapshot(now, Transition::Ignored)
    }

    /// A warning worth keeping in the record.
    pub fn record_alert(&mut self, text: impl Into<String>, now: Timestamp) -> Snapshot {
        self.record(EventKind::Alert { text: text.into() }, now);
        self.snapshot(now, Transition::Ignored)
    }

    /// Records the final outcome. Stops the ROSC counter.
    pub fn record_outcome(&mut self, outcome: PatientOutcome, now: Timestamp) -> Snapshot {
        if self
            .record(EventKind::OutcomeRecorded { outcome }, now)
            .is_none()
        {
            return self.snapshot(now, Transition::Ignored);
        }
        if let Some(session) = self.session.as_mut() {
            session.outcome = outcome;
        }
        self.clock.rosc.stop();
        self.snapshot(now, Transition::Applied)
    }

    pub fn dismiss_guidance(&mut self, now: Timestamp) -> Snapshot {
        let transition = match self.virtual_now(now) {
            Some(at) => self.protocol.dismiss_guidance(at),
            None => Transition::Ignored,
        };
        self.snapshot(now, transition)
    }

    // ── Time ──

    /// Jumps the session clock forward. Sub-timers keep their readings.
    pub fn fast_forward(&mut self, seconds: i64, now: Timestamp) -> Snapshot {
        if !self.is_active() {
            return self.snapshot(now, Transition::Ignored);
        }
        self.clock.fast_forward(seconds, now);
        log::info!(
            "fast-forwarded {seconds}s, elapsed now {}s",
            self.clock.elapsed_secs(now)
        );
        self.snapshot(now, Transition::Applied)
    }

    /// The once-per-second heartbeat. Advances the sub-timers, completes a
    /// CPR cycle that has run its course, and re-evaluates timed guidance.
    pub fn tick(&mut self, now: Timestamp) -> Snapshot {
        let Some(at) = self.virtual_now(now) else {
            return self.snapshot(now, Transition::Ignored);
        };
        self.clock.tick();

        let mut transition = Transition::Ignored;
        // Only a cycle the protocol is running can run its course.
        let cpr = self.clock.cpr;
        if cpr.is_running()
            && cpr.seconds() >= self.thresholds.cpr_cycle_secs
            && self.protocol.cycle_running()
        {
            log::debug!("CPR cycle ran {}s, completing", cpr.seconds());
            transition = self.finish_cycle(Some(cpr.seconds()), now);
        }

        let elapsed = self.clock.elapsed(now);
        if self.protocol.tick(at, elapsed).is_applied() {
            transition = Transition::Applied;
        }
        self.snapshot(now, transition)
    }

    /// The current view without changing anything.
    pub fn snapshot(&self, now: Timestamp, transition: Transition) -> Snapshot {
        let outcome_due = self.clock.rosc.is_running()
            && self.clock.rosc.seconds() >= self.thresholds.outcome_prompt_secs
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.outcome == PatientOutcome::NotRecorded);

        let state = self.protocol.state();
        Snapshot {
            active: self.is_active(),
            transition,
            phase: state.phase,
            cycle: state.cycle,
            guidance: state.guidance,
            attention: self.protocol.attention(),
            outcome_due,
            elapsed: self.clock.elapsed(now),
            cpr_secs: self.clock.cpr.seconds(),
            rosc_secs: self.clock.rosc.seconds(),
            since_rhythm_check_secs: self.clock.since_rhythm_check.seconds(),
        }
    }

    // ── Internals ──

    fn finish_cycle(&mut self, duration_secs: Option<u32>, now: Timestamp) -> Transition {
        let Some(cycle) = self
            .session
            .as_ref()
            .map(|s| ordinal(s.events.completed_cycles()))
        else {
            return Transition::Ignored;
        };
        let Some(at) = self.record(
            EventKind::CprCycleCompleted {
                cycle,
                duration_secs,
            },
            now,
        ) else {
            return Transition::Ignored;
        };
        self.clock.cpr.reset();
        self.protocol.record_cpr_cycle_completed(at)
    }

    /// Stops a running CPR counter, recording how long it ran.
    fn stop_compressions(&mut self, now: Timestamp) {
        let cpr = self.clock.cpr;
        if cpr.is_running() && cpr.seconds() > 0 {
            self.record(
                EventKind::CprStopped {
                    duration_secs: cpr.seconds(),
                },
                now,
            );
        }
        self.clock.cpr.reset();
    }

    fn virtual_now(&self, now: Timestamp) -> Option<Timestamp> {
        let session = self.session.as_ref()?;
        let elapsed = self.clock.elapsed(now);
        Some(session.started_at.checked_add(elapsed).unwrap_or(now))
    }

    /// Appends to the record at virtual time. `None` when idle.
    fn record(&mut self, kind: EventKind, now: Timestamp) -> Option<Timestamp> {
        let Some(at) = self.virtual_now(now) else {
            log::debug!("no active session, dropping {kind:?}");
            return None;
        };
        let session = self.session.as_mut()?;
        session.events.append(Event::new(kind, at));
        Some(at)
    }
}

/// The next 1-based ordinal after `count` existing entries.
fn ordinal(count: usize) -> u32 {
    u32::try_from(count).map_or(u32::MAX, |n| n.saturating_add(1))
}
