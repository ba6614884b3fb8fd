//! Protocol state: where the rescuer is in the algorithm.

use jiff::Timestamp;

use super::guidance::Guidance;

/// Highest CPR cycle the algorithm manages before forcing a reassessment.
pub const MAX_CPR_CYCLES: u32 = 10;

/// Top-level algorithm phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first rhythm to be chosen.
    #[default]
    RhythmSelection,

    /// pVT/VF chosen; the first shock is due.
    ShockableRhythm,

    /// First shock delivered; CPR is due.
    PostShock,

    /// CPR running after the first shock, before cycle management takes over.
    CprInProgress,

    /// Numbered CPR cycles with per-cycle shock and medication steps.
    CprCycleManagement,

    /// ROSC, or the cycle cap was reached; waiting for a new rhythm.
    Reevaluation,
}

/// Which algorithm branch the last rhythm check selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RhythmPathway {
    #[default]
    Unset,
    Shockable,
    NonShockable,
    Rosc,
}

/// Step within the current CPR cycle.
///
/// Steps advance in a fixed order:
///
/// ```text
/// WaitingForShock → WaitingForCpr → (WaitingForMedication →) CprActive
/// ```
///
/// The non-shockable pathway never enters `WaitingForShock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStep {
    WaitingForShock,
    WaitingForCpr,
    WaitingForMedication,
    CprActive,
}

/// Everything the state machine knows. Plain data; the transitions live on
/// [`ProtocolStateMachine`](super::ProtocolStateMachine).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolState {
    pub phase: Phase,
    pub pathway: RhythmPathway,

    /// Current CPR cycle, 0 until the first cycle begins. Never decreases
    /// within a session and never exceeds [`MAX_CPR_CYCLES`].
    pub cycle: u32,

    /// `None` outside cycle tracking (rhythm selection, awaiting the first
    /// shock, reevaluation).
    pub cycle_step: Option<CycleStep>,

    /// The single active guidance message, if any.
    pub guidance: Option<Guidance>,

    pub last_adrenaline_at: Option<Timestamp>,
    pub last_dismissal_at: Option<Timestamp>,
}

impl ProtocolState {
    /// Whether medication reminders apply: a treatable rhythm with CPR under way.
    pub fn medication_may_be_due(&self) -> bool {
        matches!(
            self.pathway,
            RhythmPathway::Shockable | RhythmPathway::NonShockable
        ) && matches!(self.phase, Phase::CprInProgress | Phase::CprCycleManagement)
    }
}
