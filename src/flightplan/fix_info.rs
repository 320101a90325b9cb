use serde::{Deserialize, Serialize};

use crate::error::{FlightPlanError, Result};
use crate::navdata::Fix;

pub const FIX_INFO_SLOTS: usize = 4;
const MAX_RADIALS: usize = 2;
const MAX_RADII: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixInfoRadial {
    pub magnetic_bearing: f64,
    pub true_bearing: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixInfoRadius {
    pub radius: f64,
}

/// Pilot-defined reference lines around a fix, independent of the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixInfoEntry {
    pub fix: Fix,
    #[serde(default)]
    pub radials: Vec<FixInfoRadial>,
    #[serde(default)]
    pub radii: Vec<FixInfoRadius>,
    #[serde(default)]
    pub abeam: bool,
}

impl FixInfoEntry {
    pub fn new(fix: Fix) -> Self {
        Self {
            fix,
            radials: Vec::new(),
            radii: Vec::new(),
            abeam: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.radials.len() > MAX_RADIALS {
            return Err(FlightPlanError::precondition(format!(
                "A fix info entry holds at most {} radials",
                MAX_RADIALS
            )));
        }
        if self.radii.len() > MAX_RADII {
            return Err(FlightPlanError::precondition(format!(
                "A fix info entry holds at most {} radius",
                MAX_RADII
            )));
        }
        if self.radii.iter().any(|r| r.radius <= 0.0) {
            return Err(FlightPlanError::precondition("Fix info radius must be positive"));
        }
        Ok(())
    }
}

/// Slot numbers are 1-based, as shown on the FIX INFO page
pub(crate) fn slot_offset(slot: usize) -> Result<usize> {
    if (1..=FIX_INFO_SLOTS).contains(&slot) {
        Ok(slot - 1)
    } else {
        Err(FlightPlanError::IndexOutOfRange {
            index: slot,
            len: FIX_INFO_SLOTS,
        })
    }
}
