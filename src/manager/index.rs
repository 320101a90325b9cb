use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FlightPlanError;

/// Named slot of the flight plan manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPlanIndex {
    Active,
    Temporary,
    Uplink,
    /// 1-based
    Secondary(usize),
}

impl FlightPlanIndex {
    pub const FIRST_SECONDARY: FlightPlanIndex = FlightPlanIndex::Secondary(1);

    pub fn is_secondary(self) -> bool {
        matches!(self, FlightPlanIndex::Secondary(_))
    }
}

impl fmt::Display for FlightPlanIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlightPlanIndex::Active => write!(f, "ACTIVE"),
            FlightPlanIndex::Temporary => write!(f, "TEMPORARY"),
            FlightPlanIndex::Uplink => write!(f, "UPLINK"),
            FlightPlanIndex::Secondary(n) => write!(f, "SECONDARY {}", n),
        }
    }
}

impl FromStr for FlightPlanIndex {
    type Err = FlightPlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "ACTIVE" | "ACT" => Ok(FlightPlanIndex::Active),
            "TEMPORARY" | "TMPY" => Ok(FlightPlanIndex::Temporary),
            "UPLINK" => Ok(FlightPlanIndex::Uplink),
            other => other
                .strip_prefix("SEC")
                .and_then(|n| n.trim_start_matches("ONDARY").trim().parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .map(FlightPlanIndex::Secondary)
                .ok_or_else(|| FlightPlanError::not_found("flight plan index", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!("active".parse::<FlightPlanIndex>().unwrap(), FlightPlanIndex::Active);
        assert_eq!("TMPY".parse::<FlightPlanIndex>().unwrap(), FlightPlanIndex::Temporary);
        assert_eq!("sec2".parse::<FlightPlanIndex>().unwrap(), FlightPlanIndex::Secondary(2));
        assert_eq!("secondary 1".parse::<FlightPlanIndex>().unwrap(), FlightPlanIndex::Secondary(1));
        assert!("sec0".parse::<FlightPlanIndex>().is_err());
        assert!("primary".parse::<FlightPlanIndex>().is_err());
    }

    #[test]
    fn test_index_order() {
        assert!(FlightPlanIndex::Active < FlightPlanIndex::Temporary);
        assert!(FlightPlanIndex::Uplink < FlightPlanIndex::Secondary(1));
        assert_eq!(FlightPlanIndex::Secondary(3).to_string(), "SECONDARY 3");
    }
}
