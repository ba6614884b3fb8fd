//! The resuscitation protocol state machine.
//!
//! Rescuer actions and a once-per-second tick drive the machine. After every
//! call the caller reads [`ProtocolStateMachine::guidance`] and
//! [`ProtocolStateMachine::attention`]; nothing is pushed.
//!
//! An action that arrives in a phase that does not expect it is ignored: the
//! state is left exactly as it was and [`Transition::Ignored`] is returned.
//! The caller's event record is unaffected either way.

mod attention;
mod guidance;
mod medication;
mod state;

use jiff::{SignedDuration, Timestamp};

use crate::model::Rhythm;

pub use attention::{AttentionFlags, attention_flags};
pub use guidance::{Cue, Guidance, Priority};
pub use medication::{AmiodaroneDose, Medication, medication_due};
pub use state::{CycleStep, MAX_CPR_CYCLES, Phase, ProtocolState, RhythmPathway};

/// Whether an action moved the machine.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

impl Transition {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Time thresholds for time-driven guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidanceTiming {
    /// Minimum time since the last adrenaline dose before a reminder.
    pub adrenaline_interval: SignedDuration,

    /// Minimum time since a dismissal before another reminder.
    pub cooldown: SignedDuration,

    /// "Check rhythm" is surfaced at every multiple of this while CPR runs.
    pub rhythm_check_interval: SignedDuration,
}

impl Default for GuidanceTiming {
    fn default() -> Self {
        Self {
            adrenaline_interval: SignedDuration::from_secs(180),
            cooldown: SignedDuration::from_secs(60),
            rhythm_check_interval: SignedDuration::from_secs(120),
        }
    }
}

/// Holds the protocol state and applies transitions to it.
#[derive(Debug, Clone, Default)]
pub struct ProtocolStateMachine {
    state: ProtocolState,
    timing: GuidanceTiming,
    /// Rhythm-check intervals already passed on the session clock.
    rhythm_check_slot: i64,
}

impl ProtocolStateMachine {
    pub fn new(timing: GuidanceTiming) -> Self {
        Self {
            state: ProtocolState::default(),
            timing,
            rhythm_check_slot: 0,
        }
    }

    /// Resets to rhythm selection and asks for the initial rhythm.
    ///
    /// The adrenaline clock starts here, so the first reminder can come
    /// one interval into the session.
    pub fn start(&mut self, now: Timestamp) {
        self.state = ProtocolState {
            last_adrenaline_at: Some(now),
            ..ProtocolState::default()
        };
        self.rhythm_check_slot = 0;
        self.show(Cue::SelectRhythm, Phase::RhythmSelection, Priority::Critical, now);
        log::info!("protocol started, awaiting rhythm selection");
    }

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    pub fn guidance(&self) -> Option<&Guidance> {
        self.state.guidance.as_ref()
    }

    pub fn attention(&self) -> AttentionFlags {
        attention_flags(&self.state)
    }

    pub fn timing(&self) -> GuidanceTiming {
        self.timing
    }

    /// Whether a CPR start would begin compressions for the protocol.
    pub fn awaiting_cpr(&self) -> bool {
        match self.state.phase {
            Phase::PostShock => true,
            Phase::CprCycleManagement => self.state.cycle_step == Some(CycleStep::WaitingForCpr),
            _ => false,
        }
    }

    /// Whether a CPR cycle is under way and can be completed.
    pub fn cycle_running(&self) -> bool {
        match self.state.phase {
            Phase::CprInProgress => true,
            Phase::CprCycleManagement => matches!(
                self.state.cycle_step,
                Some(CycleStep::CprActive | CycleStep::WaitingForMedication)
            ),
            _ => false,
        }
    }

    // ── Rescuer actions ──

    /// A rhythm check. Selects the pathway and restarts the algorithm branch.
    pub fn record_rhythm(&mut self, rhythm: &Rhythm, now: Timestamp) -> Transition {
        match rhythm {
            Rhythm::PulselessVtVf => {
                self.state.pathway = RhythmPathway::Shockable;
                self.state.cycle_step = None;
                self.enter(Phase::ShockableRhythm);
                self.show(
                    Cue::PrepareDefibrillation,
                    Phase::ShockableRhythm,
                    Priority::Critical,
                    now,
                );
            }
            Rhythm::PeaAsystole => {
                self.state.pathway = RhythmPathway::NonShockable;
                self.state.cycle = self.state.cycle.max(1);
                self.state.cycle_step = Some(CycleStep::WaitingForCpr);
                self.enter(Phase::CprCycleManagement);
                self.show(
                    Cue::StartCprCycle {
                        cycle: self.state.cycle,
                    },
                    Phase::CprCycleManagement,
                    Priority::Critical,
                    now,
                );
            }
            Rhythm::Rosc => {
                self.state.pathway = RhythmPathway::Rosc;
                self.state.cycle_step = None;
                self.enter(Phase::Reevaluation);
                self.show(
                    Cue::PostResuscitationCare,
                    Phase::Reevaluation,
                    Priority::High,
                    now,
                );
            }
            Rhythm::Other(label) => {
                log::debug!("rhythm '{label}' does not select a pathway");
                return Transition::Ignored;
            }
        }
        Transition::Applied
    }

    /// A defibrillation shock.
    pub fn record_shock_delivered(&mut self, now: Timestamp) -> Transition {
        match (self.state.phase, self.state.cycle_step) {
            (Phase::ShockableRhythm, _) => {
                self.state.cycle = self.state.cycle.max(1);
                self.state.cycle_step = Some(CycleStep::WaitingForCpr);
                self.enter(Phase::PostShock);
            }
            (Phase::CprCycleManagement, Some(CycleStep::WaitingForShock)) => {
                self.state.cycle_step = Some(CycleStep::WaitingForCpr);
            }
            _ => return self.ignored("shock"),
        }
        self.show(Cue::ResumeCpr, self.state.phase, Priority::Critical, now);
        Transition::Applied
    }

    /// Compressions started.
    ///
    /// If the current cycle calls for a drug, the cycle waits for it.
    pub fn record_cpr_started(&mut self, now: Timestamp) -> Transition {
        let in_progress_cue = match (self.state.phase, self.state.cycle_step) {
            (Phase::PostShock, _) => {
                self.enter(Phase::CprInProgress);
                Cue::CprInProgress
            }
            (Phase::CprCycleManagement, Some(CycleStep::WaitingForCpr)) => Cue::CycleInProgress {
                cycle: self.state.cycle,
            },
            _ => return self.ignored("CPR start"),
        };
        self.state.cycle_step = Some(CycleStep::CprActive);

        let cycle = self.state.cycle;
        match medication_due(self.state.pathway, cycle) {
            Some(medication) => {
                self.state.cycle_step = Some(CycleStep::WaitingForMedication);
                self.show(
                    Cue::GiveMedication { cycle, medication },
                    self.state.phase,
                    Priority::High,
                    now,
                );
            }
            None => self.show(in_progress_cue, self.state.phase, Priority::Medium, now),
        }
        Transition::Applied
    }

    /// A CPR cycle finished. Moves to the next cycle, or to reassessment
    /// once the cycle cap is passed.
    pub fn record_cpr_cycle_completed(&mut self, now: Timestamp) -> Transition {
        if !self.cycle_running() {
            return self.ignored("cycle completion");
        }

        let next = self.state.cycle + 1;
        if next > MAX_CPR_CYCLES {
            self.state.cycle = MAX_CPR_CYCLES;
            self.state.cycle_step = None;
            self.enter(Phase::Reevaluation);
            self.show(
                Cue::ReassessPatient,
                Phase::Reevaluation,
                Priority::Critical,
                now,
            );
            return Transition::Applied;
        }

        self.state.cycle = next;
        self.enter(Phase::CprCycleManagement);
        // Only the shockable pathway ever waits for a shock.
        if self.state.pathway == RhythmPathway::Shockable {
            self.state.cycle_step = Some(CycleStep::WaitingForShock);
            self.show(
                Cue::DeliverShock { cycle: next },
                Phase::CprCycleManagement,
                Priority::Critical,
                now,
            );
        } else {
            self.state.cycle_step = Some(CycleStep::WaitingForCpr);
            self.show(
                Cue::StartCprCycle { cycle: next },
                Phase::CprCycleManagement,
                Priority::High,
                now,
            );
        }
        Transition::Applied
    }

    /// A dose of adrenaline. Always restarts the adrenaline clock.
    pub fn record_adrenaline(&mut self, now: Timestamp) -> Transition {
        self.state.last_adrenaline_at = Some(now);
        if !self.complete_medication_step(now)
            && self.state.guidance.is_some_and(|g| g.cue == Cue::AdrenalineDue)
        {
            self.dismiss(now);
        }
        Transition::Applied
    }

    /// A dose of amiodarone.
    pub fn record_amiodarone(&mut self, now: Timestamp) -> Transition {
        if self.complete_medication_step(now) {
            Transition::Applied
        } else {
            self.ignored("amiodarone")
        }
    }

    /// The rescuer dismissed the current guidance.
    pub fn dismiss_guidance(&mut self, now: Timestamp) -> Transition {
        if self.state.guidance.is_none() {
            return Transition::Ignored;
        }
        self.dismiss(now);
        Transition::Applied
    }

    // ── Time ──

    /// Once-per-second re-evaluation of time-driven guidance.
    ///
    /// `elapsed` is the session stopwatch reading at `now`. A fast-forward
    /// that jumps past a rhythm-check boundary still raises the check on the
    /// next tick.
    pub fn tick(&mut self, now: Timestamp, elapsed: SignedDuration) -> Transition {
        let mut transition = Transition::Ignored;

        let check_due = self.advance_rhythm_check_slot(elapsed);
        if check_due && self.state.phase == Phase::CprInProgress {
            self.show(Cue::CheckRhythm, Phase::Reevaluation, Priority::High, now);
            transition = Transition::Applied;
        }

        if self.adrenaline_reminder_due(now) {
            self.show(Cue::AdrenalineDue, self.state.phase, Priority::High, now);
            transition = Transition::Applied;
        }

        transition
    }

    /// Moves to the interval `elapsed` falls in. True when a boundary was
    /// crossed since the last tick.
    fn advance_rhythm_check_slot(&mut self, elapsed: SignedDuration) -> bool {
        let interval = self.timing.rhythm_check_interval.as_secs();
        if interval <= 0 {
            return false;
        }
        let slot = elapsed.as_secs().max(0) / interval;
        if slot <= self.rhythm_check_slot {
            return false;
        }
        self.rhythm_check_slot = slot;
        true
    }

    fn adrenaline_reminder_due(&self, now: Timestamp) -> bool {
        if !self.state.medication_may_be_due() || self.state.guidance.is_some() {
            return false;
        }
        let Some(last_dose) = self.state.last_adrenaline_at else {
            return false;
        };
        if now.duration_since(last_dose) < self.timing.adrenaline_interval {
            return false;
        }
        let cooled_down = self
            .state
            .last_dismissal_at
            .is_none_or(|at| now.duration_since(at) >= self.timing.cooldown);
        if !cooled_down {
            log::debug!("adrenaline reminder held back by dismissal cooldown");
        }
        cooled_down
    }

    // ── Internals ──

    fn complete_medication_step(&mut self, now: Timestamp) -> bool {
        if self.state.cycle_step != Some(CycleStep::WaitingForMedication) {
            return false;
        }
        self.state.cycle_step = Some(CycleStep::CprActive);
        self.dismiss(now);
        true
    }

    fn enter(&mut self, phase: Phase) {
        if self.state.phase != phase {
            log::info!("protocol phase {:?} -> {phase:?}", self.state.phase);
            self.state.phase = phase;
        }
    }

    fn show(&mut self, cue: Cue, phase: Phase, priority: Priority, now: Timestamp) {
        log::debug!("guidance [{}] {cue}", priority.as_str());
        self.state.guidance = Some(Guidance {
            cue,
            phase,
            priority,
            issued_at: now,
        });
    }

    fn dismiss(&mut self, now: Timestamp) {
        if self.state.guidance.take().is_some() {
            self.state.last_dismissal_at = Some(now);
        }
    }

    fn ignored(&self, action: &str) -> Transition {
        log::debug!(
            "{action} ignored in phase {:?} (cycle step {:?})",
            self.state.phase,
            self.state.cycle_step
        );
        Transition::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_second(1_700_000_000 + secs).unwrap()
    }

    fn secs(n: i64) -> SignedDuration {
        SignedDuration::from_secs(n)
    }

    fn started() -> ProtocolStateMachine {
        let mut machine = ProtocolStateMachine::default();
        machine.start(at(0));
        machine
    }

    fn cue(machine: &ProtocolStateMachine) -> Option<Cue> {
        machine.guidance().map(|g| g.cue)
    }

    /// Runs the shockable pathway through its first cycle.
    fn shockable_in_cycle_two() -> ProtocolStateMachine {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(1));
        let _ = m.record_shock_delivered(at(2));
        let _ = m.record_cpr_started(at(3));
        let _ = m.record_cpr_cycle_completed(at(123));
        m
    }

    #[test]
    fn starts_in_rhythm_selection() {
        let m = started();
        assert_eq!(m.state().phase, Phase::RhythmSelection);
        assert_eq!(m.state().pathway, RhythmPathway::Unset);
        assert_eq!(cue(&m), Some(Cue::SelectRhythm));
        assert_eq!(m.guidance().unwrap().priority, Priority::Critical);
        assert!(m.attention().rhythm);
    }

    #[test]
    fn shockable_rhythm_prepares_defibrillation() {
        let mut m = started();
        assert!(m.record_rhythm(&Rhythm::PulselessVtVf, at(1)).is_applied());

        assert_eq!(m.state().phase, Phase::ShockableRhythm);
        assert_eq!(m.state().pathway, RhythmPathway::Shockable);
        assert_eq!(cue(&m), Some(Cue::PrepareDefibrillation));
        assert!(m.attention().shock);
        assert!(!m.attention().rhythm);
    }

    #[test]
    fn non_shockable_rhythm_starts_cycle_one() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(1));

        let state = m.state();
        assert_eq!(state.phase, Phase::CprCycleManagement);
        assert_eq!(state.cycle, 1);
        assert_eq!(state.cycle_step, Some(CycleStep::WaitingForCpr));
        assert_eq!(cue(&m), Some(Cue::StartCprCycle { cycle: 1 }));
        assert!(m.attention().cpr);
        assert!(!m.attention().shock);
    }

    #[test]
    fn rosc_moves_to_post_resuscitation_care() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::Rosc, at(1));

        assert_eq!(m.state().phase, Phase::Reevaluation);
        assert_eq!(m.state().pathway, RhythmPathway::Rosc);
        assert_eq!(m.guidance().unwrap().priority, Priority::High);
        assert!(m.attention().rosc);
    }

    #[test]
    fn unknown_rhythm_is_ignored() {
        let mut m = started();
        let before = m.state().clone();
        let t = m.record_rhythm(&Rhythm::Other("Sinus".into()), at(1));

        assert_eq!(t, Transition::Ignored);
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn shock_during_rhythm_selection_changes_nothing() {
        let mut m = started();
        let before = m.state().clone();

        assert_eq!(m.record_shock_delivered(at(5)), Transition::Ignored);
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn out_of_sequence_actions_are_idempotent() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(1));
        let before = m.state().clone();

        assert_eq!(m.record_shock_delivered(at(2)), Transition::Ignored);
        assert_eq!(m.record_cpr_cycle_completed(at(3)), Transition::Ignored);
        assert_eq!(m.record_amiodarone(at(4)), Transition::Ignored);
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn first_shock_then_cpr() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(1));
        let _ = m.record_shock_delivered(at(2));

        assert_eq!(m.state().phase, Phase::PostShock);
        assert_eq!(m.state().cycle, 1);
        assert_eq!(m.state().cycle_step, Some(CycleStep::WaitingForCpr));
        assert_eq!(cue(&m), Some(Cue::ResumeCpr));
        assert!(m.attention().cpr);

        let _ = m.record_cpr_started(at(3));
        assert_eq!(m.state().phase, Phase::CprInProgress);
        assert_eq!(m.state().cycle_step, Some(CycleStep::CprActive));
        assert_eq!(cue(&m), Some(Cue::CprInProgress));
        assert!(!m.attention().cpr);
    }

    #[test]
    fn shockable_first_cycle_leads_to_shock_in_cycle_two() {
        let m = shockable_in_cycle_two();

        assert_eq!(m.state().cycle, 2);
        assert_eq!(m.state().phase, Phase::CprCycleManagement);
        assert_eq!(m.state().cycle_step, Some(CycleStep::WaitingForShock));
        assert!(m.attention().shock);
        assert_eq!(cue(&m), Some(Cue::DeliverShock { cycle: 2 }));
    }

    #[test]
    fn cycle_two_shock_then_cpr_waits_for_adrenaline() {
        let mut m = shockable_in_cycle_two();
        let _ = m.record_shock_delivered(at(130));
        assert_eq!(m.state().cycle_step, Some(CycleStep::WaitingForCpr));

        let _ = m.record_cpr_started(at(131));
        assert_eq!(m.state().cycle_step, Some(CycleStep::WaitingForMedication));
        assert!(m.attention().adrenaline);
        assert!(!m.attention().amiodarone);

        let _ = m.record_adrenaline(at(140));
        assert_eq!(m.state().cycle_step, Some(CycleStep::CprActive));
        assert!(m.guidance().is_none());
        assert_eq!(m.state().last_dismissal_at, Some(at(140)));
        assert!(!m.attention().adrenaline);
    }

    #[test]
    fn cycle_three_calls_for_amiodarone() {
        let mut m = shockable_in_cycle_two();
        let _ = m.record_shock_delivered(at(130));
        let _ = m.record_cpr_started(at(131));
        let _ = m.record_adrenaline(at(140));
        let _ = m.record_cpr_cycle_completed(at(251));
        let _ = m.record_shock_delivered(at(255));
        let _ = m.record_cpr_started(at(256));

        assert_eq!(m.state().cycle, 3);
        assert!(m.attention().amiodarone);
        assert_eq!(
            cue(&m),
            Some(Cue::GiveMedication {
                cycle: 3,
                medication: Medication::Amiodarone(AmiodaroneDose::First)
            })
        );

        assert!(m.record_amiodarone(at(260)).is_applied());
        assert_eq!(m.state().cycle_step, Some(CycleStep::CprActive));
    }

    #[test]
    fn non_shockable_cpr_waits_for_adrenaline() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(1));
        let _ = m.record_cpr_started(at(2));

        assert_eq!(m.state().cycle_step, Some(CycleStep::WaitingForMedication));
        let flags = m.attention();
        assert!(flags.adrenaline);
        assert!(!flags.shock);
    }

    #[test]
    fn non_shockable_pathway_never_asks_for_a_shock() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(0));

        let mut t = 1;
        while m.state().phase == Phase::CprCycleManagement {
            assert!(!m.attention().shock, "cycle {}", m.state().cycle);
            let _ = m.record_cpr_started(at(t));
            assert!(!m.attention().shock);
            let _ = m.record_adrenaline(at(t + 1));
            let _ = m.record_cpr_cycle_completed(at(t + 120));
            t += 121;
        }
        assert_eq!(m.state().phase, Phase::Reevaluation);
    }

    #[test]
    fn cycle_index_is_capped_and_forces_reassessment() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(0));

        let mut seen = Vec::new();
        for i in 0..15 {
            let t = i * 130;
            let _ = m.record_cpr_started(at(t + 1));
            let _ = m.record_adrenaline(at(t + 2));
            let _ = m.record_cpr_cycle_completed(at(t + 121));
            seen.push(m.state().cycle);
        }

        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|&c| c <= MAX_CPR_CYCLES));
        assert_eq!(m.state().phase, Phase::Reevaluation);
        assert_eq!(m.state().cycle_step, None);
        assert_eq!(cue(&m), Some(Cue::ReassessPatient));
    }

    #[test]
    fn new_rhythm_after_reassessment_keeps_cycle_index() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(0));
        for i in 0..10 {
            let t = i * 130;
            let _ = m.record_cpr_started(at(t + 1));
            let _ = m.record_adrenaline(at(t + 2));
            let _ = m.record_cpr_cycle_completed(at(t + 121));
        }
        assert_eq!(m.state().phase, Phase::Reevaluation);

        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(2000));
        assert_eq!(m.state().phase, Phase::CprCycleManagement);
        assert_eq!(m.state().cycle, MAX_CPR_CYCLES);
    }

    #[test]
    fn pathway_switch_changes_medication_schedule() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(0));
        let _ = m.record_cpr_started(at(1));
        let _ = m.record_adrenaline(at(2));
        let _ = m.record_cpr_cycle_completed(at(121));
        assert_eq!(m.state().cycle, 2);

        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(122));
        let _ = m.record_shock_delivered(at(123));
        let _ = m.record_cpr_started(at(124));

        // Cycle 2 on the shockable pathway calls for adrenaline.
        assert_eq!(m.state().phase, Phase::CprInProgress);
        assert!(m.attention().adrenaline);
    }

    #[test]
    fn tick_surfaces_rhythm_check_every_interval_during_cpr() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(1));
        let _ = m.record_shock_delivered(at(2));
        let _ = m.record_cpr_started(at(3));

        assert_eq!(m.tick(at(119), secs(119)), Transition::Ignored);
        assert_eq!(cue(&m), Some(Cue::CprInProgress));

        assert!(m.tick(at(120), secs(120)).is_applied());
        assert_eq!(cue(&m), Some(Cue::CheckRhythm));
        assert_eq!(m.guidance().unwrap().phase, Phase::Reevaluation);
    }

    #[test]
    fn rhythm_check_fires_once_per_interval() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(1));
        let _ = m.record_shock_delivered(at(2));
        let _ = m.record_cpr_started(at(3));

        assert!(m.tick(at(120), secs(120)).is_applied());
        let _ = m.dismiss_guidance(at(120));
        assert_eq!(m.tick(at(121), secs(121)), Transition::Ignored);
        assert!(m.guidance().is_none());
    }

    #[test]
    fn rhythm_check_survives_a_jump_past_the_boundary() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(1));
        let _ = m.record_shock_delivered(at(2));
        let _ = m.record_cpr_started(at(3));
        let _ = m.tick(at(100), secs(100));
        assert_eq!(cue(&m), Some(Cue::CprInProgress));

        // The clock was fast-forwarded from 101 s to 131 s between ticks.
        assert!(m.tick(at(131), secs(131)).is_applied());
        assert_eq!(cue(&m), Some(Cue::CheckRhythm));
    }

    #[test]
    fn rhythm_check_boundaries_outside_cpr_are_not_replayed() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(1));
        let _ = m.tick(at(130), secs(130));
        let _ = m.record_shock_delivered(at(131));
        let _ = m.record_cpr_started(at(132));

        assert_eq!(m.tick(at(133), secs(133)), Transition::Ignored);
        assert_eq!(cue(&m), Some(Cue::CprInProgress));
    }

    #[test]
    fn cycle_predicates_follow_the_cycle_step() {
        let mut m = started();
        assert!(!m.awaiting_cpr());
        assert!(!m.cycle_running());

        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(1));
        assert!(!m.awaiting_cpr());
        let _ = m.record_shock_delivered(at(2));
        assert!(m.awaiting_cpr());
        let _ = m.record_cpr_started(at(3));
        assert!(!m.awaiting_cpr());
        assert!(m.cycle_running());
    }

    #[test]
    fn adrenaline_reminder_after_interval_with_no_active_guidance() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(0));
        let _ = m.record_cpr_started(at(1));
        let _ = m.record_adrenaline(at(10));
        assert!(m.guidance().is_none());

        let _ = m.tick(at(189), secs(189));
        assert!(m.guidance().is_none());

        let _ = m.tick(at(190), secs(190));
        assert_eq!(cue(&m), Some(Cue::AdrenalineDue));
    }

    #[test]
    fn adrenaline_reminder_waits_for_active_guidance() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(0));
        let _ = m.record_cpr_started(at(2));
        let waiting = cue(&m);
        assert!(matches!(waiting, Some(Cue::GiveMedication { cycle: 1, .. })));

        let _ = m.tick(at(200), secs(200));
        assert_eq!(cue(&m), waiting);
    }

    #[test]
    fn adrenaline_reminder_respects_dismissal_cooldown() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(0));
        let _ = m.record_cpr_started(at(2));
        let _ = m.dismiss_guidance(at(170));

        let _ = m.tick(at(200), secs(200));
        assert!(m.guidance().is_none());

        let _ = m.tick(at(229), secs(229));
        assert!(m.guidance().is_none());

        let _ = m.tick(at(230), secs(230));
        assert_eq!(cue(&m), Some(Cue::AdrenalineDue));
    }

    #[test]
    fn adrenaline_dismisses_its_own_reminder() {
        let mut m = started();
        let _ = m.record_rhythm(&Rhythm::PeaAsystole, at(0));
        let _ = m.record_cpr_started(at(1));
        let _ = m.record_adrenaline(at(2));
        let _ = m.tick(at(190), secs(190));
        assert_eq!(cue(&m), Some(Cue::AdrenalineDue));

        let _ = m.record_adrenaline(at(195));
        assert!(m.guidance().is_none());
        assert_eq!(m.state().last_adrenaline_at, Some(at(195)));
    }

    #[test]
    fn no_reminders_before_a_treatable_rhythm() {
        let mut m = started();
        let _ = m.dismiss_guidance(at(1));
        let _ = m.tick(at(500), secs(500));
        assert!(m.guidance().is_none());

        let _ = m.record_rhythm(&Rhythm::Rosc, at(501));
        let _ = m.dismiss_guidance(at(502));
        let _ = m.tick(at(1000), secs(1000));
        assert!(m.guidance().is_none());
    }

    #[test]
    fn dismissing_nothing_is_ignored() {
        let mut m = started();
        assert!(m.dismiss_guidance(at(1)).is_applied());
        assert_eq!(m.dismiss_guidance(at(2)), Transition::Ignored);
        assert_eq!(m.state().last_dismissal_at, Some(at(1)));
    }

    #[test]
    fn custom_timing_is_honoured() {
        let mut m = ProtocolStateMachine::new(GuidanceTiming {
            adrenaline_interval: secs(240),
            cooldown: secs(30),
            rhythm_check_interval: secs(90),
        });
        m.start(at(0));
        let _ = m.record_rhythm(&Rhythm::PulselessVtVf, at(0));
        let _ = m.record_shock_delivered(at(1));
        let _ = m.record_cpr_started(at(2));

        let _ = m.tick(at(90), secs(90));
        assert_eq!(cue(&m), Some(Cue::CheckRhythm));
        let _ = m.dismiss_guidance(at(91));
        let _ = m.tick(at(180), secs(180));
        assert_eq!(cue(&m), Some(Cue::CheckRhythm));

        let _ = m.dismiss_guidance(at(200));
        let _ = m.tick(at(239), secs(239));
        assert!(m.guidance().is_none());
        let _ = m.tick(at(241), secs(241));
        assert_eq!(cue(&m), Some(Cue::AdrenalineDue));
    }
}
