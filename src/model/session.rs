//! Session types: one resuscitation from start to end.

use std::fmt;
use std::str::FromStr;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_log::EventLog;

/// One resuscitation attempt and its clinical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub mode: SessionMode,
    pub started_at: Timestamp,

    /// Set when the resuscitation ends; `None` while it is active.
    pub ended_at: Option<Timestamp>,

    pub events: EventLog,
    pub outcome: PatientOutcome,
}

impl Session {
    /// Creates an active session with an empty record.
    pub fn new(mode: SessionMode, started_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            started_at,
            ended_at: None,
            events: EventLog::new(),
            outcome: PatientOutcome::NotRecorded,
        }
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Wall time between start and end, or `None` while active.
    pub fn duration(&self) -> Option<SignedDuration> {
        self.ended_at.map(|end| end.duration_since(self.started_at))
    }
}

/// Whether the session is a drill or a real patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    #[default]
    Training,
    Clinical,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Clinical => "clinical",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(Self::Training),
            "clinical" => Ok(Self::Clinical),
            other => Err(format!("unknown session mode: {other}")),
        }
    }
}

/// The final patient outcome of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatientOutcome {
    /// No outcome has been recorded yet.
    #[default]
    #[serde(rename = "none")]
    NotRecorded,
    Alive,
    Death,
}

impl PatientOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotRecorded => "none",
            Self::Alive => "alive",
            Self::Death => "death",
        }
    }
}

impl fmt::Display for PatientOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::NotRecorded),
            "alive" => Ok(Self::Alive),
            "death" | "dead" => Ok(Self::Death),
            other => Err(format!("unknown patient outcome: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_active() {
        let session = Session::new(SessionMode::Clinical, Timestamp::UNIX_EPOCH);
        assert!(session.is_active());
        assert!(session.events.is_empty());
        assert_eq!(session.outcome, PatientOutcome::NotRecorded);
        assert_eq!(session.duration(), None);
    }

    #[test]
    fn duration_once_ended() {
        let mut session = Session::new(SessionMode::Training, Timestamp::UNIX_EPOCH);
        session.ended_at = Some(Timestamp::from_second(480).unwrap());
        assert_eq!(session.duration(), Some(SignedDuration::from_secs(480)));
    }

    #[test]
    fn mode_round_trips_through_str() {
        for mode in [SessionMode::Training, SessionMode::Clinical] {
            assert_eq!(mode.as_str().parse::<SessionMode>().unwrap(), mode);
        }
        assert!("drill".parse::<SessionMode>().is_err());
    }

    #[test]
    fn outcome_parses_from_str() {
        assert_eq!("alive".parse::<PatientOutcome>().unwrap(), PatientOutcome::Alive);
        assert_eq!("dead".parse::<PatientOutcome>().unwrap(), PatientOutcome::Death);
        assert_eq!("none".parse::<PatientOutcome>().unwrap(), PatientOutcome::NotRecorded);
        assert!("unknown".parse::<PatientOutcome>().is_err());
    }

    #[test]
    fn outcome_not_recorded_serializes_as_none() {
        let json = serde_json::to_string(&PatientOutcome::NotRecorded).unwrap();
        assert_eq!(json, "\"none\"");
    }
}
