use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default = "default_hospitals")]
    pub hospitals: u32,
    #[serde(default = "default_ambulances")]
    pub ambulances: u32,
    /// Simulated time units per elapsed wall-clock second.
    #[serde(default = "default_speed")]
    pub speed: u64,
    /// Gap between generated patient calls; the first call fires at this time.
    #[serde(default = "default_call_interval")]
    pub call_interval: u64,
    /// Pacing-loop cadence in wall-clock milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hospitals: default_hospitals(),
            ambulances: default_ambulances(),
            speed: default_speed(),
            call_interval: default_call_interval(),
            tick_ms: default_tick_ms(),
            seed: None,
        }
    }
}

fn default_hospitals() -> u32 {
    2
}

fn default_ambulances() -> u32 {
    4
}

fn default_speed() -> u64 {
    1
}

fn default_call_interval() -> u64 {
    5
}

fn default_tick_ms() -> u64 {
    200
}
