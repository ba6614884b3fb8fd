//! Rhythm classifications observed at a rhythm check.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the rescuer saw at a rhythm check.
///
/// Unknown labels are kept verbatim so the clinical record stays accurate,
/// but they never move the protocol.
///
/// Serialized as its label, so a stored record reads `"pVT/VF"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rhythm {
    /// Pulseless ventricular tachycardia or ventricular fibrillation.
    PulselessVtVf,

    /// Pulseless electrical activity or asystole.
    PeaAsystole,

    /// Return of spontaneous circulation.
    Rosc,

    /// Anything else the rescuer entered.
    Other(String),
}

impl Rhythm {
    /// Parses a rhythm label as shown on the rhythm buttons.
    ///
    /// Matching ignores ASCII case and surrounding whitespace, and accepts
    /// the dash-separated spellings used on the command line.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "pvt/vf" | "pvt-vf" | "vf" | "pvt" => Self::PulselessVtVf,
            "pea/as" | "pea-as" | "pea" | "asystole" => Self::PeaAsystole,
            "rosc" => Self::Rosc,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// The label shown to the rescuer and written to the record.
    pub fn label(&self) -> &str {
        match self {
            Self::PulselessVtVf => "pVT/VF",
            Self::PeaAsystole => "PEA/AS",
            Self::Rosc => "ROSC",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Rhythm {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<Rhythm> for String {
    fn from(rhythm: Rhythm) -> Self {
        match rhythm {
            Rhythm::Other(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Rhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
