//! CLI interface for Resus.
//!
//! Commands split into two groups:
//!
//! - `resus run`: an interactive console that walks a rescuer through one
//!   resuscitation and saves the record when it ends.
//! - `resus sessions list|show|delete|export|clear`: review of saved
//!   sessions, no live state involved. `add-event`, `delete-event` and
//!   `set-outcome` amend a saved record after the fact.
//!
//! Session ids take a full UUID or an unambiguous prefix.

mod console;
mod format;
mod sessions;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::model::SessionMode;
use crate::storage::Storage;

use sessions::SessionsCommand;

/// Resus: cardiac arrest protocol guidance.
#[derive(Debug, Parser)]
#[command(name = "resus", version, after_long_help = CONSOLE_HELP)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

const CONSOLE_HELP: &str = r"Console: one action per line
  rhythm pvt-vf | pea-as | rosc    record a rhythm check
  shock [joules]                   record a defibrillation shock
  cpr                              compressions started
  cycle [MM:SS]                    complete the current CPR cycle
  adrenaline | amiodarone          record a dose
  med <name>                       any other drug
  event <text>                     free-form event (intubation, IV access, ...)
  alert <text>                     a warning worth keeping in the record
  outcome alive | death            final patient outcome
  dismiss                          dismiss the current guidance
  ff <secs | MM:SS>                fast-forward the session clock
  status                           show guidance and timers
  end                              end and save the session";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a resuscitation in an interactive console.
    ///
    /// Reads actions from stdin, prints guidance after each one and whenever
    /// the clock raises new guidance. The session is saved on `end` or EOF.
    Run {
        /// Training drill or real patient. Defaults to the configured mode.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Review saved sessions.
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },
}

/// CLI-facing session mode, mapped to the domain `SessionMode`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// A drill.
    Training,
    /// A real patient.
    Clinical,
}

impl ModeArg {
    fn to_domain(self) -> SessionMode {
        match self {
            Self::Training => SessionMode::Training,
            Self::Clinical => SessionMode::Clinical,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<(), String> {
    match cli.command {
        Command::Run { mode } => {
            let mode = mode.map_or(config.default_mode, ModeArg::to_domain);
            console::cmd_run(config, storage, mode)
        }
        Command::Sessions { command } => sessions::run(storage, command),
    }
}
