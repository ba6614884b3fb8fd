//! Output formatting for CLI display.

use crate::format::{describe, format_duration};
use crate::model::{PatientOutcome, Session};
use crate::resuscitation::Snapshot;

/// First eight characters of a session id.
pub(super) fn short_id(session: &Session) -> String {
    session.id.to_string()[..8].to_string()
}

/// Guidance, highlighted controls, and timers after an action or tick.
pub(super) fn format_snapshot(snap: &Snapshot) -> String {
    let mut lines = Vec::new();
    let clock = format_duration(snap.elapsed.as_secs());

    match &snap.guidance {
        Some(g) => lines.push(format!(
            "[{clock}] ({}) {}",
            g.priority.as_str(),
            g.message()
        )),
        None => lines.push(format!("[{clock}] no active guidance")),
    }

    if snap.outcome_due {
        lines.push("  ROSC sustained: record the patient outcome".to_string());
    }

    let raised = snap.attention.raised();
    if !raised.is_empty() {
        lines.push(format!("  next: {}", raised.join(", ")));
    }

    lines.push(format!("  {}", format_timers(snap)));
    lines.join("\n")
}

fn format_timers(snap: &Snapshot) -> String {
    let mut parts = Vec::new();
    if snap.cycle > 0 {
        parts.push(format!("cycle {}", snap.cycle));
    }
    if snap.cpr_secs > 0 {
        parts.push(format!("CPR {}", format_duration(i64::from(snap.cpr_secs))));
    }
    if snap.rosc_secs > 0 {
        parts.push(format!("ROSC {}", format_duration(i64::from(snap.rosc_secs))));
    }
    if snap.since_rhythm_check_secs > 0 {
        parts.push(format!(
            "since rhythm check {}",
            format_duration(i64::from(snap.since_rhythm_check_secs))
        ));
    }
    if parts.is_empty() {
        return format!("phase {:?}", snap.phase);
    }
    parts.join(" | ")
}

/// One line per session for `sessions list`.
pub(super) fn format_session_line(session: &Session) -> String {
    let outcome = match session.outcome {
        PatientOutcome::NotRecorded => "-",
        other => other.as_str(),
    };
    let duration = session
        .duration()
        .map_or_else(|| "--:--".to_string(), |d| format_duration(d.as_secs()));
    format!(
        "{}  {}  [{}] [{outcome}]  {duration}  {} events",
        short_id(session),
        session.started_at.strftime("%Y-%m-%d %H:%M"),
        session.mode,
        session.events.len()
    )
}

/// Every event, numbered from 1 and offset from the session start.
pub(super) fn format_timeline(session: &Session) -> Vec<String> {
    session
        .events
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let offset = e.timestamp.duration_since(session.started_at).as_secs();
            format!(
                "{:>2}. +{}  {}",
                i + 1,
                format_duration(offset),
                describe(&e.kind)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::{SignedDuration, Timestamp};

    use crate::model::{Event, EventKind, Rhythm, SessionMode};
    use crate::protocol::{AttentionFlags, Cue, Guidance, Phase, Priority, Transition};

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_second(1_700_000_000 + secs).unwrap()
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            active: true,
            transition: Transition::Applied,
            phase: Phase::CprCycleManagement,
            cycle: 2,
            guidance: Some(Guidance {
                cue: Cue::DeliverShock { cycle: 2 },
                phase: Phase::CprCycleManagement,
                priority: Priority::Critical,
                issued_at: at(125),
            }),
            attention: AttentionFlags {
                shock: true,
                rosc: true,
                ..AttentionFlags::default()
            },
            outcome_due: false,
            elapsed: SignedDuration::from_secs(125),
            cpr_secs: 0,
            rosc_secs: 0,
            since_rhythm_check_secs: 125,
        }
    }

    #[test]
    fn snapshot_shows_guidance_and_highlights() {
        let text = format_snapshot(&sample_snapshot());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "[02:05] (critical) Cycle 2: charge defibrillator and deliver shock"
        );
        assert_eq!(lines[1], "  next: shock, rosc");
        assert_eq!(lines[2], "  cycle 2 | since rhythm check 02:05");
    }

    #[test]
    fn snapshot_without_guidance() {
        let mut snap = sample_snapshot();
        snap.guidance = None;
        snap.outcome_due = true;
        let text = format_snapshot(&snap);

        assert!(text.starts_with("[02:05] no active guidance"));
        assert!(text.contains("record the patient outcome"));
    }

    #[test]
    fn timeline_is_relative_to_start() {
        let mut session = Session::new(SessionMode::Training, at(0));
        session.events.append(Event::new(
            EventKind::RhythmChecked {
                rhythm: Rhythm::PeaAsystole,
            },
            at(4),
        ));
        session.events.append(Event::new(
            EventKind::AdrenalineGiven {
                dose: 1,
                since_last_secs: None,
            },
            at(75),
        ));

        assert_eq!(
            format_timeline(&session),
            [
                " 1. +00:04  Checked rhythm - PEA/AS",
                " 2. +01:15  Adrenaline 1st"
            ]
        );
    }

    #[test]
    fn session_line_shows_mode_outcome_and_duration() {
        let mut session = Session::new(SessionMode::Clinical, at(0));
        session.outcome = PatientOutcome::Alive;
        session.ended_at = Some(at(610));
        let line = format_session_line(&session);

        assert!(line.starts_with(&short_id(&session)));
        assert!(line.contains("[clinical] [alive]"));
        assert!(line.contains("10:10"));
        assert!(line.ends_with("0 events"));
    }
}
