//! Event types: immutable records of clinical actions.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PatientOutcome, Rhythm};

/// A single, immutable record of something the rescuer did or saw.
///
/// A live session only appends; reviewing a saved session may add or
/// remove events, never edit one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,

    /// What happened.
    pub kind: EventKind,

    /// When it happened, on the session's (possibly fast-forwarded) clock.
    pub timestamp: Timestamp,
}

impl Event {
    /// Creates a new event with a fresh id.
    pub fn new(kind: EventKind, timestamp: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp,
        }
    }
}

/// What happened. Exhaustively matched; there are no string-keyed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventKind {
    /// A rhythm check and what it showed.
    RhythmChecked { rhythm: Rhythm },

    /// A defibrillation shock.
    ShockDelivered { joules: u32 },

    /// Chest compressions started.
    CprStarted,

    /// Compressions stopped outside a completed cycle, e.g. for a rhythm
    /// check. Not counted as a cycle.
    CprStopped { duration_secs: u32 },

    /// A CPR cycle finished.
    CprCycleCompleted {
        /// Ordinal of the cycle that finished.
        cycle: u32,

        /// How long the cycle ran, when known.
        duration_secs: Option<u32>,
    },

    /// Any medication other than adrenaline and amiodarone.
    MedicationGiven { name: String },

    /// A dose of adrenaline (1 mg IV).
    AdrenalineGiven {
        /// Dose ordinal within the session, starting at 1.
        dose: u32,

        /// Seconds since the previous dose; absent for the first.
        since_last_secs: Option<i64>,
    },

    /// A dose of amiodarone. Dose 1 is 300 mg, later doses 150 mg.
    AmiodaroneGiven { dose: u32 },

    /// Return of spontaneous circulation; the ROSC clock starts here.
    RoscStarted,

    /// The final patient outcome.
    OutcomeRecorded { outcome: PatientOutcome },

    /// A warning or reminder worth keeping in the record.
    Alert { text: String },

    /// A free-form event (intubation, IV access, ...).
    Other { text: String },
}

impl EventKind {
    /// Whether this event is any kind of drug administration.
    pub fn is_medication(&self) -> bool {
        matches!(
            self,
            Self::MedicationGiven { .. } | Self::AdrenalineGiven { .. } | Self::AmiodaroneGiven { .. }
        )
    }
}
