//! Timestamp-ordered record of a session's clinical actions.

use serde::{Deserialize, Serialize};

use crate::model::{Event, EventKind};

/// The ordered event record owned by a [`Session`](crate::model::Session).
///
/// Serialized as a plain list of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event, keeping the log sorted by timestamp.
    ///
    /// Events stamped with "now" land at the end. An event with an earlier
    /// timestamp is placed after every event at or before its instant.
    pub fn append(&mut self, event: Event) {
        let at = self
            .events
            .partition_point(|e| e.timestamp <= event.timestamp);
        if at != self.events.len() {
            log::warn!(
                "event {} at {} arrived out of order; inserted at position {at}",
                event.id,
                event.timestamp
            );
        }
        self.events.insert(at, event);
    }

    /// Removes the event at `index`, if there is one.
    pub fn remove(&mut self, index: usize) -> Option<Event> {
        (index < self.events.len()).then(|| self.events.remove(index))
    }

    pub fn first_matching(&self, predicate: impl Fn(&Event) -> bool) -> Option<&Event> {
        self.events.iter().find(|e| predicate(e))
    }

    pub fn last_matching(&self, predicate: impl Fn(&Event) -> bool) -> Option<&Event> {
        self.events.iter().rev().find(|e| predicate(e))
    }

    pub fn count_matching(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }

    // ── Derived facts ──

    /// Number of CPR cycles recorded as completed.
    pub fn completed_cycles(&self) -> usize {
        self.count_matching(|e| matches!(e.kind, EventKind::CprCycleCompleted { .. }))
    }

    /// Number of adrenaline doses given.
    pub fn adrenaline_doses(&self) -> usize {
        self.count_matching(|e| matches!(e.kind, EventKind::AdrenalineGiven { .. }))
    }

    /// The most recent adrenaline dose, if any.
    pub fn last_adrenaline(&self) -> Option<&Event> {
        self.last_matching(|e| matches!(e.kind, EventKind::AdrenalineGiven { .. }))
    }

    /// Number of amiodarone doses given.
    pub fn amiodarone_doses(&self) -> usize {
        self.count_matching(|e| matches!(e.kind, EventKind::AmiodaroneGiven { .. }))
    }

    /// Number of shocks delivered.
    pub fn shocks(&self) -> usize {
        self.count_matching(|e| matches!(e.kind, EventKind::ShockDelivered { .. }))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut log = Self::new();
        for event in iter {
            log.append(event);
        }
        log
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
