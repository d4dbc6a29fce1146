use std::collections::VecDeque;

use serde::Serialize;

use crate::city::NodeId;

pub type AmbulanceId = usize;
pub type PatientId = usize;
pub type HospitalId = usize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmbulanceState {
    Idle,
    ToPatient,
    ToHospital,
    Returning,
}

impl AmbulanceState {
    pub fn label(self) -> &'static str {
        match self {
            AmbulanceState::Idle => "idle",
            AmbulanceState::ToPatient => "en route to patient",
            AmbulanceState::ToHospital => "transporting to hospital",
            AmbulanceState::Returning => "returning to base",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ambulance {
    pub id: AmbulanceId,
    pub location: NodeId,
    pub state: AmbulanceState,
    pub home_hospital: HospitalId,
    /// Set iff the ambulance is en route to a patient or to a hospital.
    pub patient: Option<PatientId>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientState {
    Waiting,
    PickedUp,
    Arrived,
}

impl PatientState {
    pub fn label(self) -> &'static str {
        match self {
            PatientState::Waiting => "waiting for ambulance",
            PatientState::PickedUp => "picked up",
            PatientState::Arrived => "arrived at hospital",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Patient {
    pub id: PatientId,
    pub call_time: u64,
    pub location: NodeId,
    pub destination: Option<NodeId>,
    pub state: PatientState,
    pub ambulance: Option<AmbulanceId>,
    pub pickup_time: Option<u64>,
    pub arrive_time: Option<u64>,
    /// Set iff the patient has arrived; equals arrive_time - call_time.
    pub total_time: Option<u64>,
}

impl Patient {
    pub fn new(id: PatientId, call_time: u64, location: NodeId) -> Self {
        Self {
            id,
            call_time,
            location,
            destination: None,
            state: PatientState::Waiting,
            ambulance: None,
            pickup_time: None,
            arrive_time: None,
            total_time: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Hospital {
    pub id: HospitalId,
    pub location: NodeId,
    /// Informational roster; dispatch scans the full fleet, never this queue.
    pub idle_ambulances: VecDeque<AmbulanceId>,
}
