//! Core data model.
//!
//! Sessions own an ordered record of events. Everything here is plain data:
//! the protocol lives in [`crate::protocol`], the clocks in [`crate::clock`].

mod event;
mod rhythm;
mod session;

pub use event::{Event, EventKind};
pub use rhythm::Rhythm;
pub use session::{PatientOutcome, Session, SessionMode};
