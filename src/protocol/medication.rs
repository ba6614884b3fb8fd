//! Which drug, if any, a CPR cycle calls for.

use std::fmt;

use super::state::RhythmPathway;

/// A drug the algorithm schedules by cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medication {
    Adrenaline,
    Amiodarone(AmiodaroneDose),
}

/// Amiodarone is given at most twice, at different strengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmiodaroneDose {
    /// 300 mg IV.
    First,
    /// 150 mg IV.
    Second,
}

impl AmiodaroneDose {
    /// The dose for a given ordinal, counting from 1.
    pub fn for_ordinal(ordinal: u32) -> Self {
        if ordinal <= 1 {
            Self::First
        } else {
            Self::Second
        }
    }

    pub fn dosage(self) -> &'static str {
        match self {
            Self::First => "300 mg IV",
            Self::Second => "150 mg IV",
        }
    }
}

impl Medication {
    pub fn name(self) -> &'static str {
        match self {
            Self::Adrenaline => "Adrenaline",
            Self::Amiodarone(_) => "Amiodarone",
        }
    }

    pub fn dosage(self) -> &'static str {
        match self {
            Self::Adrenaline => "1 mg IV",
            Self::Amiodarone(dose) => dose.dosage(),
        }
    }
}

impl fmt::Display for Medication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.dosage())
    }
}

/// The medication due in `cycle` on `pathway`.
///
/// | pathway       | cycles          | drug                   |
/// |---------------|-----------------|------------------------|
/// | shockable     | 2, 4, 6, 8, 10  | adrenaline             |
/// | shockable     | 3               | amiodarone 300 mg      |
/// | shockable     | 5               | amiodarone 150 mg      |
/// | non-shockable | 1, 3, 5, 7, 9   | adrenaline             |
///
/// Every other combination calls for nothing.
pub fn medication_due(pathway: RhythmPathway, cycle: u32) -> Option<Medication> {
    match (pathway, cycle) {
        (RhythmPathway::Shockable, 2 | 4 | 6 | 8 | 10) => Some(Medication::Adrenaline),
        (RhythmPathway::Shockable, 3) => Some(Medication::Amiodarone(AmiodaroneDose::First)),
        (RhythmPathway::Shockable, 5) => Some(Medication::Amiodarone(AmiodaroneDose::Second)),
        (RhythmPathway::NonShockable, 1 | 3 | 5 | 7 | 9) => Some(Medication::Adrenaline),
        _ => None,
    }
}
