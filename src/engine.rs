use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::city::{CityMap, NodeId};
use crate::entities::{
    Ambulance, AmbulanceId, AmbulanceState, Hospital, HospitalId, Patient, PatientId, PatientState,
};
use crate::error::{Error, Result};
use crate::events::{EventKind, EventQueue};
use crate::models::SimConfig;
use crate::status::{
    AmbulanceStatus, HospitalStatus, PatientStatus, StatusSnapshot, SummaryReport,
};

const CHAIN_EDGE_WEIGHT: u64 = 5;
const MIN_CITY_NODES: usize = 6;

#[derive(Debug)]
pub struct DispatchEngine {
    city: CityMap,
    queue: EventQueue,
    ambulances: Vec<Ambulance>,
    patients: Vec<Patient>,
    hospitals: Vec<Hospital>,
    time: u64,
    call_interval: u64,
    rng: StdRng,
}

impl DispatchEngine {
    pub fn new(config: &SimConfig) -> Result<Self> {
        validate_config(config)?;

        let hospital_count = config.hospitals as usize;
        let ambulance_count = config.ambulances as usize;
        let nodes = (hospital_count * 2).max(MIN_CITY_NODES);

        let hospitals = (0..hospital_count)
            .map(|id| Hospital {
                id,
                location: id * 2,
                idle_ambulances: VecDeque::new(),
            })
            .collect();

        let mut engine = Self {
            city: CityMap::chain(nodes, CHAIN_EDGE_WEIGHT),
            queue: EventQueue::new(),
            ambulances: Vec::with_capacity(ambulance_count),
            patients: Vec::new(),
            hospitals,
            time: 0,
            call_interval: config.call_interval,
            rng: StdRng::seed_from_u64(config.seed.unwrap_or(0)),
        };

        let per_hospital = ambulance_count / hospital_count;
        for hospital in 0..hospital_count {
            for _ in 0..per_hospital {
                engine.station_ambulance(hospital);
            }
        }
        // the remainder of an uneven split is stationed at the first hospital
        for _ in 0..ambulance_count - per_hospital * hospital_count {
            engine.station_ambulance(0);
        }

        engine
            .queue
            .schedule(engine.call_interval, EventKind::NewPatientsTrigger);

        log::info!(
            "initialized city: {} nodes, {} hospitals, {} ambulances",
            nodes,
            hospital_count,
            ambulance_count
        );
        Ok(engine)
    }

    fn station_ambulance(&mut self, hospital: HospitalId) {
        let id = self.ambulances.len();
        let location = self.hospitals[hospital].location;
        self.ambulances.push(Ambulance {
            id,
            location,
            state: AmbulanceState::Idle,
            home_hospital: hospital,
            patient: None,
        });
        self.hospitals[hospital].idle_ambulances.push_back(id);
    }

    pub fn current_time(&self) -> u64 {
        self.time
    }

    /// Restarts the visible clock without touching entities or queued events.
    pub fn rewind_clock(&mut self) {
        self.time = 0;
    }

    /// Admits a patient calling from `location` at the current simulated time.
    pub fn report_call(&mut self, location: NodeId) -> Result<PatientId> {
        if location >= self.city.node_count() {
            return Err(Error::NodeOutOfRange {
                node: location,
                nodes: self.city.node_count(),
            });
        }
        Ok(self.admit_patient(self.time, location))
    }

    fn admit_patient(&mut self, call_time: u64, location: NodeId) -> PatientId {
        let id = self.patients.len();
        self.patients.push(Patient::new(id, call_time, location));
        self.queue.schedule(call_time, EventKind::Call { patient: id });
        id
    }

    /// Processes every due event in (time, sequence) order, then advances the
    /// visible clock to `target`. Pure with respect to the wall clock.
    pub fn advance_to(&mut self, target: u64) -> Result<()> {
        while let Some(event) = self.queue.pop_due(target) {
            self.time = event.time;
            self.handle_event(event.kind)?;
        }
        self.time = self.time.max(target);
        Ok(())
    }

    fn handle_event(&mut self, kind: EventKind) -> Result<()> {
        match kind {
            EventKind::NewPatientsTrigger => self.handle_trigger(),
            EventKind::Call { patient } => self.handle_call(patient),
            EventKind::ArrivePatient { patient, ambulance } => {
                self.handle_arrive_patient(patient, ambulance)
            }
            EventKind::ArriveHospital { patient, ambulance } => {
                self.handle_arrive_hospital(patient, ambulance)
            }
            EventKind::ReturnBase { ambulance } => self.handle_return_base(ambulance),
        }
    }

    /// Single source of truth for call generation: admits one patient at a
    /// random node and reschedules itself one interval later.
    fn handle_trigger(&mut self) -> Result<()> {
        let location = self.rng.gen_range(0..self.city.node_count());
        let patient = self.admit_patient(self.time, location);
        log::debug!(
            "time={} patient {} calls from node {}",
            self.time,
            patient,
            location
        );
        let next = self.time + self.call_interval;
        self.queue.schedule(next, EventKind::NewPatientsTrigger);
        Ok(())
    }

    fn handle_call(&mut self, patient_id: PatientId) -> Result<()> {
        let patient = self.patient(patient_id)?;
        if patient.state != PatientState::Waiting || patient.ambulance.is_some() {
            return Ok(());
        }
        let location = patient.location;

        match self.nearest_idle_ambulance(location) {
            Some((ambulance, distance)) => self.dispatch(ambulance, patient_id, distance),
            None => {
                log::warn!(
                    "time={} no idle ambulance can reach patient {}; call stays pending",
                    self.time,
                    patient_id
                );
                Ok(())
            }
        }
    }

    /// Scans the fleet in id order with strict less-than, so the first
    /// encountered wins exact ties. Unreachable candidates are skipped.
    fn nearest_idle_ambulance(&self, location: NodeId) -> Option<(AmbulanceId, u64)> {
        let mut best: Option<(AmbulanceId, u64)> = None;
        for ambulance in &self.ambulances {
            if ambulance.state != AmbulanceState::Idle {
                continue;
            }
            let Some(distance) = self.city.shortest_distance(ambulance.location, location) else {
                continue;
            };
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((ambulance.id, distance));
            }
        }
        best
    }

    fn nearest_hospital(&self, location: NodeId) -> Option<(NodeId, u64)> {
        let mut best: Option<(NodeId, u64)> = None;
        for hospital in &self.hospitals {
            let Some(distance) = self.city.shortest_distance(location, hospital.location) else {
                continue;
            };
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((hospital.location, distance));
            }
        }
        best
    }

    fn dispatch(
        &mut self,
        ambulance_id: AmbulanceId,
        patient_id: PatientId,
        distance: u64,
    ) -> Result<()> {
        let arrive_at = self.time + distance;
        let home = {
            let ambulance = self.ambulance_mut(ambulance_id)?;
            ambulance.state = AmbulanceState::ToPatient;
            ambulance.patient = Some(patient_id);
            ambulance.home_hospital
        };
        if let Some(hospital) = self.hospitals.get_mut(home) {
            hospital.idle_ambulances.retain(|&id| id != ambulance_id);
        }
        self.patient_mut(patient_id)?.ambulance = Some(ambulance_id);
        self.queue.schedule(
            arrive_at,
            EventKind::ArrivePatient {
                patient: patient_id,
                ambulance: ambulance_id,
            },
        );
        log::debug!(
            "time={} ambulance {} dispatched to patient {} (distance {})",
            self.time,
            ambulance_id,
            patient_id,
            distance
        );
        Ok(())
    }

    fn handle_arrive_patient(
        &mut self,
        patient_id: PatientId,
        ambulance_id: AmbulanceId,
    ) -> Result<()> {
        let location = self.patient(patient_id)?.location;
        {
            let ambulance = self.ambulance_mut(ambulance_id)?;
            ambulance.state = AmbulanceState::ToHospital;
            ambulance.location = location;
        }

        let (destination, distance) =
            self.nearest_hospital(location)
                .ok_or(Error::NoRouteToHospital {
                    patient: patient_id,
                    location,
                })?;

        let now = self.time;
        let patient = self.patient_mut(patient_id)?;
        patient.state = PatientState::PickedUp;
        patient.pickup_time = Some(now);
        patient.destination = Some(destination);

        self.queue.schedule(
            now + distance,
            EventKind::ArriveHospital {
                patient: patient_id,
                ambulance: ambulance_id,
            },
        );
        log::debug!(
            "time={} ambulance {} picked up patient {}, heading to node {}",
            now,
            ambulance_id,
            patient_id,
            destination
        );
        Ok(())
    }

    fn handle_arrive_hospital(
        &mut self,
        patient_id: PatientId,
        ambulance_id: AmbulanceId,
    ) -> Result<()> {
        let now = self.time;
        let (destination, ride) = {
            let patient = self.patient_mut(patient_id)?;
            let destination = patient
                .destination
                .ok_or(Error::MissingDestination(patient_id))?;
            patient.state = PatientState::Arrived;
            patient.arrive_time = Some(now);
            patient.total_time = patient
                .arrive_time
                .map(|arrived| arrived - patient.call_time);
            let ride = patient.pickup_time.map_or(0, |picked| now - picked);
            (destination, ride)
        };

        let home = {
            let ambulance = self.ambulance_mut(ambulance_id)?;
            ambulance.state = AmbulanceState::Returning;
            ambulance.location = destination;
            // only en-route states carry an assignment
            ambulance.patient = None;
            ambulance.home_hospital
        };
        let home_location = self
            .hospitals
            .get(home)
            .map(|hospital| hospital.location)
            .ok_or(Error::HomeHospitalMissing {
                ambulance: ambulance_id,
                hospital: home,
            })?;
        let back = self
            .city
            .shortest_distance(destination, home_location)
            .ok_or(Error::NoRouteHome(ambulance_id))?;

        self.queue.schedule(
            now + back,
            EventKind::ReturnBase {
                ambulance: ambulance_id,
            },
        );
        log::debug!(
            "time={} patient {} delivered by ambulance {} after a {} unit ride",
            now,
            patient_id,
            ambulance_id,
            ride
        );
        Ok(())
    }

    fn handle_return_base(&mut self, ambulance_id: AmbulanceId) -> Result<()> {
        let home = self.ambulance(ambulance_id)?.home_hospital;
        let home_location = self
            .hospitals
            .get(home)
            .map(|hospital| hospital.location)
            .ok_or(Error::HomeHospitalMissing {
                ambulance: ambulance_id,
                hospital: home,
            })?;
        {
            let ambulance = self.ambulance_mut(ambulance_id)?;
            ambulance.state = AmbulanceState::Idle;
            ambulance.patient = None;
            ambulance.location = home_location;
        }
        self.hospitals[home].idle_ambulances.push_back(ambulance_id);
        self.redispatch_pending()
    }

    /// A freed ambulance gives the oldest still-unassigned caller another chance.
    fn redispatch_pending(&mut self) -> Result<()> {
        let pending = self
            .patients
            .iter()
            .find(|patient| patient.state == PatientState::Waiting && patient.ambulance.is_none())
            .map(|patient| patient.id);
        match pending {
            Some(patient) => self.handle_call(patient),
            None => Ok(()),
        }
    }

    fn ambulance(&self, id: AmbulanceId) -> Result<&Ambulance> {
        self.ambulances.get(id).ok_or(Error::UnknownAmbulance(id))
    }

    fn ambulance_mut(&mut self, id: AmbulanceId) -> Result<&mut Ambulance> {
        self.ambulances
            .get_mut(id)
            .ok_or(Error::UnknownAmbulance(id))
    }

    fn patient(&self, id: PatientId) -> Result<&Patient> {
        self.patients.get(id).ok_or(Error::UnknownPatient(id))
    }

    fn patient_mut(&mut self, id: PatientId) -> Result<&mut Patient> {
        self.patients.get_mut(id).ok_or(Error::UnknownPatient(id))
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            time: self.time,
            ambulances: self
                .ambulances
                .iter()
                .map(|ambulance| AmbulanceStatus {
                    id: ambulance.id,
                    location: ambulance.location,
                    state: ambulance.state,
                    state_label: ambulance.state.label(),
                    home_hospital: ambulance.home_hospital,
                    patient: ambulance.patient,
                })
                .collect(),
            patients: self
                .patients
                .iter()
                .map(|patient| PatientStatus {
                    id: patient.id,
                    location: patient.location,
                    state: patient.state,
                    state_label: patient.state.label(),
                    call_time: patient.call_time,
                    ambulance: patient.ambulance,
                    total_time: patient.total_time,
                })
                .collect(),
            hospitals: self
                .hospitals
                .iter()
                .map(|hospital| HospitalStatus {
                    id: hospital.id,
                    location: hospital.location,
                    idle_ambulances: hospital.idle_ambulances.iter().copied().collect(),
                })
                .collect(),
        }
    }

    pub fn summary(&self) -> SummaryReport {
        let times: Vec<u64> = self
            .patients
            .iter()
            .filter(|patient| patient.state == PatientState::Arrived)
            .filter_map(|patient| patient.total_time)
            .collect();
        let avg_time = if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<u64>() as f64 / times.len() as f64
        };
        SummaryReport {
            completed: times.len() as u64,
            avg_time,
        }
    }
}

fn validate_config(config: &SimConfig) -> Result<()> {
    if config.hospitals == 0 {
        return Err(Error::HospitalsZero);
    }
    if config.ambulances == 0 {
        return Err(Error::AmbulancesZero);
    }
    if config.speed == 0 {
        return Err(Error::SpeedZero);
    }
    if config.call_interval == 0 {
        return Err(Error::CallIntervalZero);
    }
    if config.tick_ms == 0 {
        return Err(Error::TickZero);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // keeps generated calls out of the way of hand-scheduled scenarios
    const QUIET: u64 = 1_000_000;

    fn config(hospitals: u32, ambulances: u32, call_interval: u64) -> SimConfig {
        SimConfig {
            hospitals,
            ambulances,
            call_interval,
            ..SimConfig::default()
        }
    }

    fn engine(hospitals: u32, ambulances: u32) -> DispatchEngine {
        DispatchEngine::new(&config(hospitals, ambulances, QUIET))
            .expect("engine should build")
    }

    #[test]
    fn init_builds_chain_city_and_stations_fleet() {
        let engine = DispatchEngine::new(&SimConfig::default()).expect("engine should build");
        let status = engine.status();
        assert_eq!(status.time, 0);
        assert_eq!(status.ambulances.len(), 4);
        assert!(status.patients.is_empty());
        assert_eq!(status.hospitals.len(), 2);
        assert_eq!(status.hospitals[0].location, 0);
        assert_eq!(status.hospitals[1].location, 2);
        assert_eq!(status.hospitals[0].idle_ambulances, vec![0, 1]);
        assert_eq!(status.hospitals[1].idle_ambulances, vec![2, 3]);
        for ambulance in &status.ambulances {
            assert_eq!(ambulance.state, AmbulanceState::Idle);
            assert_eq!(ambulance.patient, None);
        }
    }

    #[test]
    fn invalid_config_fails_fast() {
        let cases = [
            (config(0, 4, 5), "hospitals must be greater than 0"),
            (config(2, 0, 5), "ambulances must be greater than 0"),
            (config(2, 4, 0), "call interval must be greater than 0"),
        ];
        for (config, message) in cases {
            let err = DispatchEngine::new(&config).unwrap_err();
            assert_eq!(err.to_string(), message);
        }

        let bad_speed = SimConfig {
            speed: 0,
            ..SimConfig::default()
        };
        assert!(DispatchEngine::new(&bad_speed).is_err());

        let bad_tick = SimConfig {
            tick_ms: 0,
            ..SimConfig::default()
        };
        assert!(DispatchEngine::new(&bad_tick).is_err());
    }

    #[test]
    fn uneven_fleet_remainder_goes_to_first_hospital() {
        let engine = engine(3, 10);
        let status = engine.status();
        assert_eq!(status.hospitals[0].idle_ambulances, vec![0, 1, 2, 9]);
        assert_eq!(status.hospitals[1].idle_ambulances, vec![3, 4, 5]);
        assert_eq!(status.hospitals[2].idle_ambulances, vec![6, 7, 8]);
    }

    #[test]
    fn call_assigns_nearest_idle_and_schedules_arrival_at_call_time_plus_distance() {
        let mut engine = engine(1, 1);
        let patient = engine.report_call(4).expect("node should be valid");
        engine.advance_to(0).expect("advance should succeed");

        assert_eq!(engine.ambulances[0].state, AmbulanceState::ToPatient);
        assert_eq!(engine.ambulances[0].patient, Some(patient));
        assert_eq!(engine.patients[patient].ambulance, Some(0));
        assert!(engine.hospitals[0].idle_ambulances.is_empty());

        // distance 0 -> 4 on the weight-5 chain is 20
        engine.advance_to(19).expect("advance should succeed");
        assert_eq!(engine.ambulances[0].state, AmbulanceState::ToPatient);

        engine.advance_to(20).expect("advance should succeed");
        assert_eq!(engine.ambulances[0].state, AmbulanceState::ToHospital);
        assert_eq!(engine.ambulances[0].location, 4);
        assert_eq!(engine.patients[patient].state, PatientState::PickedUp);
        assert_eq!(engine.patients[patient].pickup_time, Some(20));
    }

    #[test]
    fn full_trip_walks_the_state_cycle_in_order() {
        let mut engine = engine(2, 2);
        // occupy ambulance 1 first so the tracked trip runs on ambulance 0
        engine.report_call(5).expect("node should be valid");
        engine.report_call(3).expect("node should be valid");

        let mut states = vec![engine.ambulances[0].state];
        for target in [0, 15, 20, 30] {
            engine.advance_to(target).expect("advance should succeed");
            states.push(engine.ambulances[0].state);
        }
        assert_eq!(
            states,
            vec![
                AmbulanceState::Idle,
                AmbulanceState::ToPatient,
                AmbulanceState::ToHospital,
                AmbulanceState::Returning,
                AmbulanceState::Idle,
            ]
        );

        // the assignment is cleared as soon as the delivery completes
        let mut probe = self::engine(2, 2);
        probe.report_call(5).expect("node should be valid");
        probe.report_call(3).expect("node should be valid");
        probe.advance_to(25).expect("advance should succeed");
        assert_eq!(probe.ambulances[0].state, AmbulanceState::Returning);
        assert_eq!(probe.ambulances[0].patient, None);

        // home again: back at node 0 and on the roster
        assert_eq!(engine.ambulances[0].location, 0);
        assert!(engine.hospitals[0].idle_ambulances.contains(&0));
    }

    #[test]
    fn end_to_end_chain_scenario() {
        let mut engine = engine(2, 4);
        engine.advance_to(5).expect("advance should succeed");
        let patient = engine.report_call(4).expect("node should be valid");
        engine.advance_to(5).expect("advance should succeed");

        // hospital 1 sits at node 2, distance 10; its first ambulance wins
        assert_eq!(engine.patients[patient].ambulance, Some(2));
        assert_eq!(engine.ambulances[2].state, AmbulanceState::ToPatient);

        engine.advance_to(14).expect("advance should succeed");
        assert_eq!(engine.ambulances[2].state, AmbulanceState::ToPatient);

        engine.advance_to(15).expect("advance should succeed");
        assert_eq!(engine.ambulances[2].state, AmbulanceState::ToHospital);
        assert_eq!(engine.patients[patient].state, PatientState::PickedUp);
        assert_eq!(engine.patients[patient].destination, Some(2));

        engine.advance_to(25).expect("advance should succeed");
        assert_eq!(engine.patients[patient].state, PatientState::Arrived);
        assert_eq!(engine.patients[patient].arrive_time, Some(25));
        assert_eq!(engine.patients[patient].total_time, Some(20));
        // the home hospital is already at the delivery node, so the return is immediate
        assert_eq!(engine.ambulances[2].state, AmbulanceState::Idle);
        assert_eq!(engine.ambulances[2].location, 2);
        assert_eq!(
            engine.hospitals[1].idle_ambulances,
            VecDeque::from(vec![3, 2])
        );

        let summary = engine.summary();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.avg_time, 20.0);
    }

    #[test]
    fn simultaneous_calls_resolve_in_enqueue_order() {
        let mut engine = engine(1, 2);
        let first = engine.report_call(3).expect("node should be valid");
        let second = engine.report_call(3).expect("node should be valid");
        engine.advance_to(0).expect("advance should succeed");
        assert_eq!(engine.patients[first].ambulance, Some(0));
        assert_eq!(engine.patients[second].ambulance, Some(1));
    }

    #[test]
    fn stranded_patient_is_retried_when_an_ambulance_returns() {
        let mut engine = engine(1, 1);
        let busy = engine.report_call(5).expect("node should be valid");
        let stranded = engine.report_call(3).expect("node should be valid");
        engine.advance_to(0).expect("advance should succeed");
        assert_eq!(engine.patients[busy].ambulance, Some(0));
        assert_eq!(engine.patients[stranded].ambulance, None);

        // the only ambulance is occupied until it returns at time 50
        engine.advance_to(49).expect("advance should succeed");
        assert_eq!(engine.patients[stranded].ambulance, None);
        assert_eq!(engine.patients[stranded].state, PatientState::Waiting);

        engine.advance_to(50).expect("advance should succeed");
        assert_eq!(engine.patients[busy].state, PatientState::Arrived);
        assert_eq!(engine.patients[busy].total_time, Some(50));
        assert_eq!(engine.patients[stranded].ambulance, Some(0));
        assert_eq!(engine.ambulances[0].state, AmbulanceState::ToPatient);

        engine.advance_to(65).expect("advance should succeed");
        assert_eq!(engine.patients[stranded].state, PatientState::PickedUp);
    }

    #[test]
    fn summary_is_zero_before_any_arrival() {
        let engine = engine(2, 4);
        let summary = engine.summary();
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.avg_time, 0.0);
    }

    #[test]
    fn trigger_admits_patients_on_the_interval() {
        let mut engine =
            DispatchEngine::new(&SimConfig::default()).expect("engine should build");
        engine.advance_to(12).expect("advance should succeed");
        assert_eq!(engine.patients.len(), 2);
        assert_eq!(engine.patients[0].call_time, 5);
        assert_eq!(engine.patients[1].call_time, 10);
        assert_eq!(engine.current_time(), 12);
        // the trigger rescheduled itself past the horizon
        assert!(!engine.queue.is_empty());
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let config = SimConfig {
            seed: Some(7),
            ..SimConfig::default()
        };
        let mut a = DispatchEngine::new(&config).expect("engine should build");
        let mut b = DispatchEngine::new(&config).expect("engine should build");
        a.advance_to(40).expect("advance should succeed");
        b.advance_to(40).expect("advance should succeed");

        let (left, right) = (a.status(), b.status());
        assert_eq!(left.patients.len(), right.patients.len());
        for (p, q) in left.patients.iter().zip(&right.patients) {
            assert_eq!(p.location, q.location);
            assert_eq!(p.state, q.state);
            assert_eq!(p.ambulance, q.ambulance);
            assert_eq!(p.total_time, q.total_time);
        }
    }

    #[test]
    fn report_call_rejects_unknown_nodes() {
        let mut engine = engine(2, 4);
        let err = engine.report_call(99).unwrap_err();
        assert_eq!(
            err.to_string(),
            "node 99 is out of range (city has 6 nodes)"
        );
    }

    #[test]
    fn rewind_clock_only_resets_time() {
        let mut engine = engine(1, 1);
        engine.advance_to(30).expect("advance should succeed");
        assert_eq!(engine.current_time(), 30);
        engine.rewind_clock();
        assert_eq!(engine.current_time(), 0);
        assert_eq!(engine.ambulances.len(), 1);
    }
}
