//! Which controls should be emphasized right now.
//!
//! A pure projection of [`ProtocolState`]; blink cadence belongs to the
//! presentation layer.

use super::medication::{Medication, medication_due};
use super::state::{CycleStep, Phase, ProtocolState};

/// One flag per control group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttentionFlags {
    pub rhythm: bool,
    pub shock: bool,
    pub cpr: bool,
    pub adrenaline: bool,
    pub amiodarone: bool,
    pub rosc: bool,
}

impl AttentionFlags {
    /// Names of the raised flags, in control order.
    pub fn raised(&self) -> Vec<&'static str> {
        [
            (self.rhythm, "rhythm"),
            (self.shock, "shock"),
            (self.cpr, "cpr"),
            (self.adrenaline, "adrenaline"),
            (self.amiodarone, "amiodarone"),
            (self.rosc, "rosc"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// Derives the attention flags from protocol state.
pub fn attention_flags(state: &ProtocolState) -> AttentionFlags {
    let step = state.cycle_step;
    let awaiting_medication = (step == Some(CycleStep::WaitingForMedication))
        .then(|| medication_due(state.pathway, state.cycle))
        .flatten();

    AttentionFlags {
        rhythm: state.phase == Phase::RhythmSelection,
        shock: state.phase == Phase::ShockableRhythm || step == Some(CycleStep::WaitingForShock),
        cpr: step == Some(CycleStep::WaitingForCpr),
        adrenaline: awaiting_medication == Some(Medication::Adrenaline),
        amiodarone: matches!(awaiting_medication, Some(Medication::Amiodarone(_))),
        rosc: state.phase != Phase::RhythmSelection,
    }
}
