//! Cardiac arrest protocol guidance.
//!
//! A rescuer's actions and a once-per-second tick drive a protocol state
//! machine that recommends the next step and flags which controls need
//! attention. [`resuscitation::Resuscitation`] owns one session end to end;
//! everything below it is synchronous and takes `now` explicitly.

pub mod cli;
pub mod clock;
pub mod config;
pub mod event_log;
pub mod format;
pub mod model;
pub mod protocol;
pub mod resuscitation;
pub mod storage;
pub mod ticker;
