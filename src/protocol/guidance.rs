//! Guidance messages surfaced to the rescuer.

use std::fmt;

use jiff::Timestamp;

use super::medication::Medication;
use super::state::Phase;

/// How urgently a message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// What prompted a guidance message. The text is derived from the cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    SelectRhythm,
    PrepareDefibrillation,
    StartCprCycle { cycle: u32 },
    PostResuscitationCare,
    ResumeCpr,
    CprInProgress,
    DeliverShock { cycle: u32 },
    GiveMedication { cycle: u32, medication: Medication },
    CycleInProgress { cycle: u32 },
    CheckRhythm,
    AdrenalineDue,
    ReassessPatient,
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectRhythm => f.write_str("Select initial rhythm: pVT/VF or PEA/AS"),
            Self::PrepareDefibrillation => {
                f.write_str("pVT/VF detected - Prepare for immediate defibrillation")
            }
            Self::StartCprCycle { cycle } => write!(f, "Start CPR cycle {cycle}"),
            Self::PostResuscitationCare => f.write_str(
                "ROSC achieved - Monitor patient and provide post-resuscitation care",
            ),
            Self::ResumeCpr => f.write_str("Shock delivered - Resume CPR immediately"),
            Self::CprInProgress => f.write_str(
                "CPR in progress - Consider medications and prepare for rhythm check",
            ),
            Self::DeliverShock { cycle } => {
                write!(f, "Cycle {cycle}: charge defibrillator and deliver shock")
            }
            Self::GiveMedication { cycle, medication } => {
                write!(f, "Cycle {cycle}: give {medication}")
            }
            Self::CycleInProgress { cycle } => write!(f, "CPR cycle {cycle} in progress"),
            Self::CheckRhythm => f.write_str("Check rhythm after 2 minutes of CPR"),
            Self::AdrenalineDue => {
                f.write_str("Consider administering Adrenaline (3-5 min intervals)")
            }
            Self::ReassessPatient => {
                f.write_str("Ten CPR cycles completed - Reassess patient")
            }
        }
    }
}

/// One guidance message: what to do, the phase it belongs to, and how urgent it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guidance {
    pub cue: Cue,
    pub phase: Phase,
    pub priority: Priority,
    pub issued_at: Timestamp,
}

impl Guidance {
    pub fn message(&self) -> String {
        self.cue.to_string()
    }
}
