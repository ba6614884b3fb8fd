//! Human-readable rendering and forgiving parsing of rescuer input.
//!
//! Parsing never fails hard. A duration that cannot be read is unknown
//! (`None`); an energy that cannot be read falls back to the default.

use crate::model::{EventKind, PatientOutcome};
use crate::protocol::AmiodaroneDose;

/// Formats whole seconds as `MM:SS`. Negative input reads as zero; minutes
/// are not wrapped into hours.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Parses `MM:SS` or a bare number of seconds.
pub fn parse_duration(text: &str) -> Option<u32> {
    let text = text.trim();
    let parsed = parse_clock(text);
    if parsed.is_none() {
        log::warn!("unreadable duration '{text}', recording it as unknown");
    }
    parsed
}

fn parse_clock(text: &str) -> Option<u32> {
    let Some((minutes, seconds)) = text.split_once(':') else {
        return text.parse().ok();
    };
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok().filter(|s| *s < 60)?;
    minutes.checked_mul(60)?.checked_add(seconds)
}

/// Parses a shock energy such as `200`, `150J` or `360 j`.
///
/// Empty input means "use the default"; anything unreadable or zero falls
/// back to it with a warning.
pub fn parse_joules(text: &str, default: u32) -> u32 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return default;
    }
    let digits = trimmed
        .strip_suffix(['J', 'j'])
        .unwrap_or(trimmed)
        .trim_end();
    match digits.parse::<u32>() {
        Ok(joules) if joules > 0 => joules,
        _ => {
            log::warn!("unreadable energy '{trimmed}', using {default}J");
            default
        }
    }
}

/// `1st`, `2nd`, `3rd`, `4th`, ..., `11th`, `12th`, `13th`, `21st`.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// One-line description of an event for timelines and exports.
pub fn describe(kind: &EventKind) -> String {
    match kind {
        EventKind::RhythmChecked { rhythm } => format!("Checked rhythm - {rhythm}"),
        EventKind::ShockDelivered { joules } => format!("Shock {joules}J"),
        EventKind::CprStarted => "Start CPR".to_string(),
        EventKind::CprStopped { duration_secs } => {
            format!("CPR (Duration: {})", format_duration(i64::from(*duration_secs)))
        }
        EventKind::CprCycleCompleted {
            cycle,
            duration_secs,
        } => match duration_secs {
            Some(secs) => format!(
                "CPR cycle {cycle} completed ({})",
                format_duration(i64::from(*secs))
            ),
            None => format!("CPR cycle {cycle} completed (duration unknown)"),
        },
        EventKind::MedicationGiven { name } => format!("Medication: {name}"),
        EventKind::AdrenalineGiven {
            dose,
            since_last_secs,
        } => match since_last_secs {
            Some(secs) => format!(
                "Adrenaline {} ({} from last dose)",
                ordinal(*dose),
                format_duration(*secs)
            ),
            None => format!("Adrenaline {}", ordinal(*dose)),
        },
        EventKind::AmiodaroneGiven { dose } => format!(
            "Amiodarone {} dose ({})",
            ordinal(*dose),
            AmiodaroneDose::for_ordinal(*dose).dosage()
        ),
        EventKind::RoscStarted => "Start ROSC".to_string(),
        EventKind::OutcomeRecorded { outcome } => match outcome {
            PatientOutcome::NotRecorded => "Patient outcome: not recorded".to_string(),
            other => format!("Patient outcome: {}", other.as_str().to_uppercase()),
        },
        EventKind::Alert { text } => format!("Alert: {text}"),
        EventKind::Other { text } => text.clone(),
    }
}
