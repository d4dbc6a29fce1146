use serde::Serialize;

use crate::city::NodeId;
use crate::entities::{AmbulanceId, AmbulanceState, HospitalId, PatientId, PatientState};

#[derive(Clone, Debug, Serialize)]
pub struct StatusSnapshot {
    pub time: u64,
    pub ambulances: Vec<AmbulanceStatus>,
    pub patients: Vec<PatientStatus>,
    pub hospitals: Vec<HospitalStatus>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AmbulanceStatus {
    pub id: AmbulanceId,
    pub location: NodeId,
    pub state: AmbulanceState,
    pub state_label: &'static str,
    pub home_hospital: HospitalId,
    pub patient: Option<PatientId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PatientStatus {
    pub id: PatientId,
    pub location: NodeId,
    pub state: PatientState,
    pub state_label: &'static str,
    pub call_time: u64,
    pub ambulance: Option<AmbulanceId>,
    pub total_time: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct HospitalStatus {
    pub id: HospitalId,
    pub location: NodeId,
    pub idle_ambulances: Vec<AmbulanceId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SummaryReport {
    pub completed: u64,
    pub avg_time: f64,
}
