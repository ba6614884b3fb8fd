//! The interactive resuscitation console behind `resus run`.
//!
//! One line of input is one rescuer action. The context is shared with the
//! ticker thread through a mutex, so actions and ticks are applied strictly
//! one at a time.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use parking_lot::Mutex;

use crate::config::Config;
use crate::format::{parse_duration, parse_joules};
use crate::model::{PatientOutcome, Rhythm, SessionMode};
use crate::protocol::Transition;
use crate::resuscitation::{Resuscitation, Snapshot};
use crate::storage::Storage;
use crate::ticker::Ticker;

use super::format::{format_snapshot, short_id};

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Rhythm(Rhythm),
    Shock(u32),
    Cpr,
    Cycle(CycleLength),
    Adrenaline,
    Amiodarone,
    Medication(String),
    Other(String),
    Alert(String),
    Outcome(PatientOutcome),
    Dismiss,
    FastForward(i64),
    Status,
    Help,
    End,
}

/// How long a manually completed cycle ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleLength {
    /// Take it from the running CPR counter.
    Counter,
    /// Given by the rescuer; `None` if it could not be read.
    Given(Option<u32>),
}

pub(super) fn cmd_run(config: &Config, storage: &Storage, mode: SessionMode) -> Result<(), String> {
    let shared = Arc::new(Mutex::new(Resuscitation::new(config.thresholds())));
    let snap = shared.lock().start(mode, Timestamp::now());
    println!("Session started ({mode}). Type `help` for commands.");
    println!("{}", format_snapshot(&snap));

    let ticker = spawn_ticker(&shared).map_err(|e| format!("failed to start clock: {e}"))?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|e| format!("failed to read input: {e}"))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let action = match parse_action(line, config.default_energy_joules) {
            Ok(action) => action,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match action {
            Action::End => break,
            Action::Help => println!("{}", super::CONSOLE_HELP),
            action => {
                let snap = apply(&mut shared.lock(), &action, Timestamp::now());
                println!("{}", format_snapshot(&snap));
            }
        }
    }

    ticker.stop();
    let finished = shared.lock().end(Timestamp::now());
    match finished {
        Some(session) => {
            storage
                .save_session(&session)
                .map_err(|e| format!("failed to save session: {e}"))?;
            println!(
                "Session {} saved ({} events)",
                short_id(&session),
                session.events.len()
            );
        }
        None => println!("Nothing recorded; session discarded"),
    }
    Ok(())
}

/// Ticks the shared context once per second and prints whenever the tick
/// moved the protocol or raised the outcome prompt.
fn spawn_ticker(shared: &Arc<Mutex<Resuscitation>>) -> io::Result<Ticker> {
    let ctx = Arc::clone(shared);
    let mut outcome_prompted = false;
    Ticker::spawn(Duration::from_secs(1), move || {
        let snap = ctx.lock().tick(Timestamp::now());
        let prompt = snap.outcome_due && !outcome_prompted;
        outcome_prompted = snap.outcome_due;
        if snap.transition.is_applied() || prompt {
            println!("{}", format_snapshot(&snap));
        }
    })
}

fn apply(ctx: &mut Resuscitation, action: &Action, now: Timestamp) -> Snapshot {
    match action {
        Action::Rhythm(rhythm) => ctx.record_rhythm(rhythm.clone(), now),
        Action::Shock(joules) => ctx.record_shock(*joules, now),
        Action::Cpr => ctx.record_cpr_started(now),
        Action::Cycle(length) => {
            let duration = match *length {
                CycleLength::Given(secs) => secs,
                CycleLength::Counter => {
                    let running = ctx.snapshot(now, Transition::Ignored).cpr_secs;
                    (running > 0).then_some(running)
                }
            };
            ctx.complete_cpr_cycle(duration, now)
        }
        Action::Adrenaline => ctx.record_adrenaline(now),
        Action::Amiodarone => ctx.record_amiodarone(now),
        Action::Medication(name) => ctx.record_medication(name.as_str(), now),
        Action::Other(text) => ctx.record_other(text.as_str(), now),
        Action::Alert(text) => ctx.record_alert(text.as_str(), now),
        Action::Outcome(outcome) => ctx.record_outcome(*outcome, now),
        Action::Dismiss => ctx.dismiss_guidance(now),
        Action::FastForward(secs) => ctx.fast_forward(*secs, now),
        Action::Status | Action::Help | Action::End => ctx.snapshot(now, Transition::Ignored),
    }
}

fn parse_action(line: &str, default_joules: u32) -> Result<Action, String> {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(c, r)| (c, r.trim()));

    let action = match command.to_ascii_lowercase().as_str() {
        "rhythm" | "r" => {
            if rest.is_empty() {
                return Err("usage: rhythm pvt-vf | pea-as | rosc".to_string());
            }
            Action::Rhythm(Rhythm::parse(rest))
        }
        "shock" | "s" => Action::Shock(parse_joules(rest, default_joules)),
        "cpr" | "c" => Action::Cpr,
        "cycle" => {
            if rest.is_empty() {
                Action::Cycle(CycleLength::Counter)
            } else {
                Action::Cycle(CycleLength::Given(parse_duration(rest)))
            }
        }
        "adrenaline" | "adr" | "epi" => Action::Adrenaline,
        "amiodarone" | "amio" => Action::Amiodarone,
        "med" => {
            if rest.is_empty() {
                return Err("usage: med <name>".to_string());
            }
            Action::Medication(rest.to_string())
        }
        "event" => {
            if rest.is_empty() {
                return Err("usage: event <text>".to_string());
            }
            Action::Other(rest.to_string())
        }
        "alert" => {
            if rest.is_empty() {
                return Err("usage: alert <text>".to_string());
            }
            Action::Alert(rest.to_string())
        }
        "outcome" => match rest.parse::<PatientOutcome>() {
            Ok(PatientOutcome::NotRecorded) | Err(_) => {
                return Err("usage: outcome alive | death".to_string());
            }
            Ok(outcome) => Action::Outcome(outcome),
        },
        "dismiss" | "d" => Action::Dismiss,
        "ff" => {
            let secs = parse_duration(rest)
                .filter(|s| *s > 0)
                .ok_or("usage: ff <secs | MM:SS>")?;
            Action::FastForward(i64::from(secs))
        }
        "status" => Action::Status,
        "help" | "?" => Action::Help,
        "end" | "quit" | "exit" => Action::End,
        other => return Err(format!("unknown command '{other}' (try `help`)")),
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::Phase;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_second(1_700_000_000 + secs).unwrap()
    }

    #[test]
    fn parses_rhythms() {
        assert_eq!(
            parse_action("rhythm pvt-vf", 200).unwrap(),
            Action::Rhythm(Rhythm::PulselessVtVf)
        );
        assert_eq!(
            parse_action("rhythm PEA/AS", 200).unwrap(),
            Action::Rhythm(Rhythm::PeaAsystole)
        );
        assert!(parse_action("rhythm", 200).is_err());
    }

    #[test]
    fn shock_energy_falls_back_to_default() {
        assert_eq!(parse_action("shock", 200).unwrap(), Action::Shock(200));
        assert_eq!(parse_action("shock 360J", 200).unwrap(), Action::Shock(360));
        assert_eq!(parse_action("shock max", 150).unwrap(), Action::Shock(150));
    }

    #[test]
    fn cycle_duration_is_optional_and_forgiving() {
        assert_eq!(
            parse_action("cycle", 200).unwrap(),
            Action::Cycle(CycleLength::Counter)
        );
        assert_eq!(
            parse_action("cycle 2:00", 200).unwrap(),
            Action::Cycle(CycleLength::Given(Some(120)))
        );
        assert_eq!(
            parse_action("cycle soon", 200).unwrap(),
            Action::Cycle(CycleLength::Given(None))
        );
    }

    #[test]
    fn outcome_must_be_final() {
        assert_eq!(
            parse_action("outcome alive", 200).unwrap(),
            Action::Outcome(PatientOutcome::Alive)
        );
        assert!(parse_action("outcome none", 200).is_err());
        assert!(parse_action("outcome", 200).is_err());
    }

    #[test]
    fn fast_forward_needs_a_positive_duration() {
        assert_eq!(parse_action("ff 30", 200).unwrap(), Action::FastForward(30));
        assert_eq!(parse_action("ff 3:00", 200).unwrap(), Action::FastForward(180));
        assert!(parse_action("ff", 200).is_err());
        assert!(parse_action("ff 0", 200).is_err());
    }

    #[test]
    fn free_text_commands_keep_their_text() {
        assert_eq!(
            parse_action("event IV access left arm", 200).unwrap(),
            Action::Other("IV access left arm".into())
        );
        assert_eq!(
            parse_action("med Calcium chloride", 200).unwrap(),
            Action::Medication("Calcium chloride".into())
        );
        assert_eq!(
            parse_action("alert Airway difficult", 200).unwrap(),
            Action::Alert("Airway difficult".into())
        );
        assert!(parse_action("alert", 200).is_err());
        assert!(parse_action("launch", 200).is_err());
    }

    #[test]
    fn alert_goes_into_the_record() {
        let mut ctx = Resuscitation::default();
        ctx.start(SessionMode::Training, at(0));

        let action = parse_action("alert Pads not charging", 200).unwrap();
        apply(&mut ctx, &action, at(5));

        let events = &ctx.session().unwrap().events;
        assert_eq!(
            events.as_slice()[0].kind,
            crate::model::EventKind::Alert {
                text: "Pads not charging".into()
            }
        );
    }

    #[test]
    fn applies_a_shockable_sequence() {
        let mut ctx = Resuscitation::default();
        ctx.start(SessionMode::Training, at(0));

        for (secs, line) in [(1, "rhythm vf"), (2, "shock"), (3, "cpr")] {
            let action = parse_action(line, 200).unwrap();
            apply(&mut ctx, &action, at(secs));
        }
        let snap = apply(&mut ctx, &Action::Cycle(CycleLength::Counter), at(120));

        assert_eq!(snap.phase, Phase::CprCycleManagement);
        assert_eq!(snap.cycle, 2);
        assert!(snap.attention.shock);
        assert_eq!(ctx.session().unwrap().events.shocks(), 1);
    }
}
