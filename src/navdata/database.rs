use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::types::{Airport, Airway, Fix, Procedure, ProcedureKind};
use crate::error::{FlightPlanError, Result};

/// Read-only navigation database the flight plans look things up in
pub trait NavigationDatabase: Send + Sync {
    fn airport(&self, icao: &str) -> Result<Airport>;

    /// All fixes (waypoints, navaids) sharing an ident
    fn fixes(&self, ident: &str) -> Vec<Fix>;

    fn airways(&self, ident: &str) -> Vec<Airway>;

    fn procedure(&self, airport: &Airport, kind: ProcedureKind, ident: &str) -> Result<Procedure> {
        airport
            .procedures(kind)
            .iter()
            .find(|p| p.ident == ident || p.database_id == ident)
            .cloned()
            .ok_or_else(|| FlightPlanError::not_found("procedure", format!("{} {}", airport.ident, ident)))
    }

    /// First fix with this ident, if any
    fn fix(&self, ident: &str) -> Result<Fix> {
        self.fixes(ident)
            .into_iter()
            .next()
            .ok_or_else(|| FlightPlanError::not_found("fix", ident))
    }

    /// First airway with this ident that passes through `via`
    fn airway_via(&self, ident: &str, via: &Fix) -> Result<Airway> {
        self.airways(ident)
            .into_iter()
            .find(|a| a.position_of(via).is_some())
            .ok_or_else(|| FlightPlanError::not_found("airway", format!("{} via {}", ident, via.ident)))
    }
}

/// On-disk layout of a navigation data file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavDataFile {
    #[serde(default)]
    pub airports: Vec<Airport>,
    #[serde(default)]
    pub fixes: Vec<Fix>,
    #[serde(default)]
    pub airways: Vec<Airway>,
}

/// In-memory database, usually loaded from a JSON file
#[derive(Debug, Clone, Default)]
pub struct StaticNavigationDatabase {
    airports: HashMap<String, Airport>,
    fixes: HashMap<String, Vec<Fix>>,
    airways: HashMap<String, Vec<Airway>>,
}

impl StaticNavigationDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: NavDataFile) -> Self {
        let mut db = Self::new();
        for airport in file.airports {
            db.add_airport(airport);
        }
        for fix in file.fixes {
            db.add_fix(fix);
        }
        for airway in file.airways {
            db.add_airway(airway);
        }
        db
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read navigation data: {:?}", path))?;
        let file: NavDataFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse navigation data JSON: {:?}", path))?;

        let db = Self::from_file(file);
        info!(
            "[NAVDATA] Loaded {} airports, {} fix idents, {} airways from {:?}",
            db.airports.len(),
            db.fixes.len(),
            db.airways.len(),
            path
        );
        Ok(db)
    }

    pub fn add_airport(&mut self, airport: Airport) {
        self.airports.insert(airport.ident.clone(), airport);
    }

    pub fn add_fix(&mut self, fix: Fix) {
        self.fixes.entry(fix.ident.clone()).or_default().push(fix);
    }

    pub fn add_airway(&mut self, airway: Airway) {
        self.airways.entry(airway.ident.clone()).or_default().push(airway);
    }

    pub fn airport_idents(&self) -> Vec<&str> {
        let mut idents: Vec<&str> = self.airports.keys().map(|s| s.as_str()).collect();
        idents.sort_unstable();
        idents
    }
}

impl NavigationDatabase for StaticNavigationDatabase {
    fn airport(&self, icao: &str) -> Result<Airport> {
        self.airports
            .get(icao)
            .cloned()
            .ok_or_else(|| FlightPlanError::not_found("airport", icao))
    }

    fn fixes(&self, ident: &str) -> Vec<Fix> {
        let mut found = self.fixes.get(ident).cloned().unwrap_or_default();
        if let Some(airport) = self.airports.get(ident) {
            found.push(airport.fix());
        }
        found
    }

    fn airways(&self, ident: &str) -> Vec<Airway> {
        self.airways.get(ident).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdata::types::Coordinates;

    fn sample() -> StaticNavigationDatabase {
        let json = r#"{
            "airports": [{
                "ident": "EGLL",
                "databaseId": "AEGLL",
                "location": { "lat": 51.4775, "long": -0.4614 },
                "runways": [{
                    "ident": "RW27R",
                    "databaseId": "REGLLRW27R",
                    "threshold": { "lat": 51.4776, "long": -0.4332 },
                    "bearing": 270.0
                }],
                "departures": [{
                    "ident": "BPK5K",
                    "databaseId": "PEGLLBPK5K",
                    "kind": "departure",
                    "legs": [{
                        "type": "TF",
                        "waypoint": {
                            "ident": "BPK",
                            "databaseId": "WBPK",
                            "location": { "lat": 51.75, "long": -0.1 },
                            "kind": "vhf_navaid"
                        }
                    }]
                }]
            }],
            "fixes": [{
                "ident": "DVR",
                "databaseId": "WDVR",
                "location": { "lat": 51.16, "long": 1.36 }
            }]
        }"#;
        let file: NavDataFile = serde_json::from_str(json).unwrap();
        StaticNavigationDatabase::from_file(file)
    }

    #[test]
    fn test_airport_lookup() {
        let db = sample();
        let egll = db.airport("EGLL").unwrap();
        assert_eq!(egll.runways.len(), 1);
        assert!(egll.runway("RW27R").is_some());

        let err = db.airport("XXXX").unwrap_err();
        assert!(matches!(err, FlightPlanError::NotFound { kind: "airport", .. }));
    }

    #[test]
    fn test_procedure_lookup_by_ident_or_id() {
        let db = sample();
        let egll = db.airport("EGLL").unwrap();

        let by_ident = db.procedure(&egll, ProcedureKind::Departure, "BPK5K").unwrap();
        let by_id = db.procedure(&egll, ProcedureKind::Departure, "PEGLLBPK5K").unwrap();
        assert_eq!(by_ident, by_id);

        assert!(db.procedure(&egll, ProcedureKind::Arrival, "BPK5K").is_err());
    }

    #[test]
    fn test_fix_lookup_includes_airports() {
        let mut db = sample();
        db.add_fix(Fix::waypoint("DVR", "WDVR2", Coordinates::new(10.0, 10.0)));

        assert_eq!(db.fixes("DVR").len(), 2);
        assert_eq!(db.fix("EGLL").unwrap().database_id, "AEGLL");
        assert!(db.fix("NOPE").is_err());
    }
}
