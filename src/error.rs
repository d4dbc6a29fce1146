use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("hospitals must be greater than 0")]
    HospitalsZero,
    #[error("ambulances must be greater than 0")]
    AmbulancesZero,
    #[error("speed must be greater than 0")]
    SpeedZero,
    #[error("call interval must be greater than 0")]
    CallIntervalZero,
    #[error("tick interval must be greater than 0")]
    TickZero,
    #[error("node {node} is out of range (city has {nodes} nodes)")]
    NodeOutOfRange { node: usize, nodes: usize },
    #[error("unknown ambulance id {0}")]
    UnknownAmbulance(usize),
    #[error("unknown patient id {0}")]
    UnknownPatient(usize),
    #[error("ambulance {ambulance} references missing home hospital {hospital}")]
    HomeHospitalMissing { ambulance: usize, hospital: usize },
    #[error("no route from node {location} to any hospital for patient {patient}")]
    NoRouteToHospital { patient: usize, location: usize },
    #[error("no route home for ambulance {0}")]
    NoRouteHome(usize),
    #[error("patient {0} has no destination set")]
    MissingDestination(usize),
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("failed to encode status: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
