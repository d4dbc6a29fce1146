use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::entities::{AmbulanceId, PatientId};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    Call { patient: PatientId },
    ArrivePatient { patient: PatientId, ambulance: AmbulanceId },
    ArriveHospital { patient: PatientId, ambulance: AmbulanceId },
    ReturnBase { ambulance: AmbulanceId },
    NewPatientsTrigger,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScheduledEvent {
    pub time: u64,
    pub seq: u64,
    pub kind: EventKind,
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // seq is unique per queue, so ordering is total and replayable
        self.time
            .cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, time: u64, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { time, seq, kind }));
    }

    /// Pops the earliest event if it is due at or before `target`.
    pub fn pop_due(&mut self, target: u64) -> Option<ScheduledEvent> {
        let due = matches!(self.heap.peek(), Some(Reverse(event)) if event.time <= target);
        if due {
            self.heap.pop().map(|Reverse(event)| event)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
