//! Saved-session commands: list, show, delete, export, clear, and edits to
//! a saved record.

use std::fs;
use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use jiff::SignedDuration;
use uuid::Uuid;

use crate::format::{describe, parse_duration};
use crate::model::{Event, EventKind, PatientOutcome, Session};
use crate::storage::Storage;

use super::ModeArg;
use super::format::{format_session_line, format_timeline, short_id};

#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// List saved sessions, newest first.
    List {
        /// Only sessions of this mode.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Show a session's timeline.
    Show {
        /// Session ID: full UUID or unambiguous prefix (e.g. `a3b`).
        id: String,
    },

    /// Delete a session.
    Delete {
        /// Session ID: full UUID or unambiguous prefix.
        id: String,
    },

    /// Export a session as JSON.
    ///
    /// Written to `--out` if given, otherwise stdout.
    Export {
        /// Session ID: full UUID or unambiguous prefix.
        id: String,

        /// Write the JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Add a free-form event to a saved session.
    AddEvent {
        /// Session ID: full UUID or unambiguous prefix.
        id: String,

        /// What happened.
        text: String,

        /// Offset from the session start (`MM:SS` or seconds). Defaults to
        /// the end of the session.
        #[arg(long)]
        at: Option<String>,
    },

    /// Remove an event from a saved session.
    DeleteEvent {
        /// Session ID: full UUID or unambiguous prefix.
        id: String,

        /// Event number as shown by `sessions show`.
        number: usize,
    },

    /// Correct a saved session's patient outcome.
    SetOutcome {
        /// Session ID: full UUID or unambiguous prefix.
        id: String,

        #[arg(value_enum)]
        outcome: OutcomeArg,
    },

    /// Delete every saved session.
    Clear {
        /// Confirm; nothing is deleted without it.
        #[arg(long)]
        yes: bool,
    },
}

/// CLI-facing patient outcome, mapped to the domain `PatientOutcome`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    Alive,
    Death,
    /// Clear a recorded outcome.
    None,
}

impl OutcomeArg {
    fn to_domain(self) -> PatientOutcome {
        match self {
            Self::Alive => PatientOutcome::Alive,
            Self::Death => PatientOutcome::Death,
            Self::None => PatientOutcome::NotRecorded,
        }
    }
}

pub(super) fn run(storage: &Storage, command: SessionsCommand) -> Result<(), String> {
    match command {
        SessionsCommand::List { mode } => cmd_list(storage, mode),
        SessionsCommand::Show { id } => {
            cmd_show(&resolve_session(storage, &id)?);
            Ok(())
        }
        SessionsCommand::Delete { id } => cmd_delete(storage, &resolve_session(storage, &id)?),
        SessionsCommand::Export { id, out } => cmd_export(&resolve_session(storage, &id)?, out),
        SessionsCommand::AddEvent { id, text, at } => {
            cmd_add_event(storage, resolve_session(storage, &id)?, &text, at.as_deref())
        }
        SessionsCommand::DeleteEvent { id, number } => {
            cmd_delete_event(storage, resolve_session(storage, &id)?, number)
        }
        SessionsCommand::SetOutcome { id, outcome } => {
            cmd_set_outcome(storage, resolve_session(storage, &id)?, outcome.to_domain())
        }
        SessionsCommand::Clear { yes } => cmd_clear(storage, yes),
    }
}

fn cmd_list(storage: &Storage, mode: Option<ModeArg>) -> Result<(), String> {
    let sessions = storage
        .list_sessions(mode.map(ModeArg::to_domain))
        .map_err(|e| format!("failed to list sessions: {e}"))?;

    if sessions.is_empty() {
        println!("No sessions");
        return Ok(());
    }

    for s in &sessions {
        println!("{}", format_session_line(s));
    }
    Ok(())
}

fn cmd_show(session: &Session) {
    println!("{}", format_session_line(session));
    println!("id: {}", session.id);
    if session.events.is_empty() {
        println!("(no events)");
    }
    for line in format_timeline(session) {
        println!("  {line}");
    }
}

fn cmd_delete(storage: &Storage, session: &Session) -> Result<(), String> {
    storage
        .delete_session(session.id)
        .map_err(|e| format!("failed to delete session: {e}"))?;
    eprintln!("Session {} deleted", short_id(session));
    Ok(())
}

fn cmd_export(session: &Session, out: Option<PathBuf>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(session)
        .map_err(|e| format!("failed to serialize session: {e}"))?;

    match out {
        Some(path) => {
            fs::write(&path, &json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Exported session {} → {}", short_id(session), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_add_event(
    storage: &Storage,
    mut session: Session,
    text: &str,
    at: Option<&str>,
) -> Result<(), String> {
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err("event text is empty".to_string());
    }
    let timestamp = match at {
        Some(offset) => {
            let secs = parse_duration(offset)
                .ok_or_else(|| format!("invalid offset '{offset}' (use MM:SS or seconds)"))?;
            session
                .started_at
                .checked_add(SignedDuration::from_secs(i64::from(secs)))
                .map_err(|e| format!("offset out of range: {e}"))?
        }
        None => session
            .ended_at
            .or_else(|| session.events.iter().last().map(|e| e.timestamp))
            .unwrap_or(session.started_at),
    };

    session
        .events
        .append(Event::new(EventKind::Other { text }, timestamp));
    save_edit(storage, &session)?;
    eprintln!(
        "Added event to session {} ({} events)",
        short_id(&session),
        session.events.len()
    );
    Ok(())
}

fn cmd_delete_event(storage: &Storage, mut session: Session, number: usize) -> Result<(), String> {
    let removed = number
        .checked_sub(1)
        .and_then(|index| session.events.remove(index))
        .ok_or_else(|| {
            format!(
                "no event {number} in session {} (it has {})",
                short_id(&session),
                session.events.len()
            )
        })?;
    save_edit(storage, &session)?;
    eprintln!(
        "Removed event {number} ({}) from session {}",
        describe(&removed.kind),
        short_id(&session)
    );
    Ok(())
}

fn cmd_set_outcome(
    storage: &Storage,
    mut session: Session,
    outcome: PatientOutcome,
) -> Result<(), String> {
    session.outcome = outcome;
    save_edit(storage, &session)?;
    eprintln!("Session {} outcome: {outcome}", short_id(&session));
    Ok(())
}

fn save_edit(storage: &Storage, session: &Session) -> Result<(), String> {
    storage
        .update_session(session)
        .map_err(|e| format!("failed to update session: {e}"))
}

fn cmd_clear(storage: &Storage, yes: bool) -> Result<(), String> {
    if !yes {
        return Err("refusing to delete every session without --yes".to_string());
    }
    let removed = storage
        .clear_sessions()
        .map_err(|e| format!("failed to clear sessions: {e}"))?;
    eprintln!("Deleted {removed} sessions");
    Ok(())
}

/// Resolve a session reference (full UUID or unambiguous prefix) to a session.
fn resolve_session(storage: &Storage, reference: &str) -> Result<Session, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return storage
            .load_session(id)
            .map_err(|e| format!("session not found: {e}"));
    }

    let sessions = storage
        .list_sessions(None)
        .map_err(|e| format!("failed to list sessions: {e}"))?;

    let mut matches: Vec<Session> = sessions
        .into_iter()
        .filter(|s| s.id.to_string().starts_with(reference))
        .collect();

    match matches.len() {
        0 => Err(format!("no session matching '{reference}'")),
        1 => Ok(matches.remove(0)),
        n => {
            let ids: Vec<String> = matches.iter().map(short_id).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {n} sessions: {}",
                ids.join(", ")
            ))
        }
    }
}
