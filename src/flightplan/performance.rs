use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-plan performance payload. The common fields are typed; anything
/// aircraft specific rides along in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceData {
    #[serde(default)]
    pub cruise_flight_level: Option<u32>,
    #[serde(default)]
    pub cost_index: Option<u32>,
    #[serde(default)]
    pub zero_fuel_weight: Option<f64>,
    #[serde(default)]
    pub takeoff_flaps: Option<u8>,
    #[serde(default)]
    pub v1: Option<u16>,
    #[serde(default)]
    pub vr: Option<u16>,
    #[serde(default)]
    pub v2: Option<u16>,
    #[serde(default)]
    pub transition_altitude: Option<u32>,
    #[serde(default)]
    pub transition_level: Option<u32>,
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PerformanceData {
    /// Cruise altitude in feet, if a flight level is set
    pub fn cruise_altitude(&self) -> Option<f64> {
        self.cruise_flight_level.map(|fl| f64::from(fl) * 100.0)
    }
}
