use super::legs::FlightPlanLeg;
use super::segments::SegmentKind;
use crate::error::{FlightPlanError, Result};
use crate::navdata::{Airway, Fix, LegType, NavigationDatabase};

/// One airway of a pending entry, from its entry fix to an optional exit
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAirwayElement {
    pub airway: Airway,
    pub entry: Fix,
    pub exit: Option<Fix>,
}

impl PendingAirwayElement {
    /// Fixes flown along the airway after the entry, up to and including the exit
    fn fixes(&self) -> Vec<Fix> {
        let (Some(exit), Some(from)) = (&self.exit, self.airway.position_of(&self.entry)) else {
            return Vec::new();
        };
        let Some(to) = self.airway.position_of(exit) else {
            return Vec::new();
        };

        if to >= from {
            self.airway.fixes[from + 1..=to].to_vec()
        } else {
            self.airway.fixes[to..from].iter().rev().cloned().collect()
        }
    }
}

/// Airway route being entered at a revision point, buffered until the
/// revision is committed or discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAirways {
    revision_index: usize,
    from: Fix,
    elements: Vec<PendingAirwayElement>,
}

impl PendingAirways {
    pub fn new(revision_index: usize, from: Fix) -> Self {
        Self {
            revision_index,
            from,
            elements: Vec::new(),
        }
    }

    pub fn revision_index(&self) -> usize {
        self.revision_index
    }

    pub fn elements(&self) -> &[PendingAirwayElement] {
        &self.elements
    }

    /// Appends an airway. If the previous airway has no exit yet, the first
    /// fix downstream of its entry that the new airway also passes through
    /// becomes both the exit of the previous and the entry of the new one.
    pub fn add_airway(&mut self, database: &dyn NavigationDatabase, ident: &str) -> Result<()> {
        let entry = match self.elements.last() {
            None => self.from.clone(),
            Some(PendingAirwayElement { exit: Some(exit), .. }) => exit.clone(),
            Some(open) => {
                let candidates = database.airways(ident);
                let intersection = downstream_fixes(open)
                    .into_iter()
                    .find(|fix| candidates.iter().any(|a| a.position_of(fix).is_some()))
                    .ok_or_else(|| {
                        FlightPlanError::not_found(
                            "airway intersection",
                            format!("{} {}", open.airway.ident, ident),
                        )
                    })?;

                if let Some(last) = self.elements.last_mut() {
                    last.exit = Some(intersection.clone());
                }
                intersection
            }
        };

        let airway = database.airway_via(ident, &entry)?;
        self.elements.push(PendingAirwayElement { airway, entry, exit: None });
        Ok(())
    }

    /// Closes the last airway at `exit`, which has to lie on it
    pub fn add_airway_exit(&mut self, exit: &Fix) -> Result<()> {
        let last = self
            .elements
            .last_mut()
            .ok_or_else(|| FlightPlanError::precondition("Cannot add an airway exit without an airway"))?;

        if last.exit.is_some() {
            return Err(FlightPlanError::precondition(format!(
                "Airway {} already has an exit",
                last.airway.ident
            )));
        }
        if last.airway.position_of(exit).is_none() || exit.same_as(&last.entry) {
            return Err(FlightPlanError::not_found(
                "fix on airway",
                format!("{} {}", last.airway.ident, exit.ident),
            ));
        }

        last.exit = Some(exit.clone());
        Ok(())
    }

    /// Legs to splice in after the revision point. Airways without an exit
    /// contribute nothing.
    pub(crate) fn legs(&self, segment: SegmentKind) -> Vec<FlightPlanLeg> {
        self.elements
            .iter()
            .flat_map(|element| {
                element.fixes().into_iter().map(move |fix| {
                    FlightPlanLeg::from_enroute_fix(segment, &fix, Some(&element.airway.ident), LegType::TF)
                })
            })
            .collect()
    }
}

fn downstream_fixes(element: &PendingAirwayElement) -> Vec<Fix> {
    match element.airway.position_of(&element.entry) {
        Some(from) => element.airway.fixes[from + 1..].to_vec(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdata::{Coordinates, StaticNavigationDatabase};

    fn fix(ident: &str) -> Fix {
        Fix::waypoint(ident, &format!("W{}", ident), Coordinates::new(50.0, 1.0))
    }

    fn database() -> StaticNavigationDatabase {
        let mut db = StaticNavigationDatabase::new();
        db.add_airway(Airway {
            ident: "UL9".to_string(),
            database_id: "EUL9".to_string(),
            fixes: vec![fix("A"), fix("B"), fix("C"), fix("D")],
        });
        db.add_airway(Airway {
            ident: "UN14".to_string(),
            database_id: "EUN14".to_string(),
            fixes: vec![fix("X"), fix("C"), fix("Y")],
        });
        db
    }

    #[test]
    fn test_airway_to_exit() {
        let db = database();
        let mut pending = PendingAirways::new(3, fix("A"));
        pending.add_airway(&db, "UL9").unwrap();
        pending.add_airway_exit(&fix("C")).unwrap();

        let legs = pending.legs(SegmentKind::Enroute);
        let idents: Vec<_> = legs.iter().map(|l| l.ident()).collect();
        assert_eq!(idents, vec!["B", "C"]);
        assert_eq!(legs[0].airway(), Some("UL9"));
    }

    #[test]
    fn test_airway_flown_backwards() {
        let db = database();
        let mut pending = PendingAirways::new(3, fix("D"));
        pending.add_airway(&db, "UL9").unwrap();
        pending.add_airway_exit(&fix("A")).unwrap();

        let idents: Vec<_> = pending.legs(SegmentKind::Enroute).iter().map(|l| l.ident().to_string()).collect();
        assert_eq!(idents, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_airway_intersection() {
        let db = database();
        let mut pending = PendingAirways::new(3, fix("A"));
        pending.add_airway(&db, "UL9").unwrap();
        pending.add_airway(&db, "UN14").unwrap();
        pending.add_airway_exit(&fix("Y")).unwrap();

        let idents: Vec<_> = pending.legs(SegmentKind::Enroute).iter().map(|l| l.ident().to_string()).collect();
        assert_eq!(idents, vec!["B", "C", "Y"]);
    }

    #[test]
    fn test_exit_must_be_on_airway() {
        let db = database();
        let mut pending = PendingAirways::new(3, fix("A"));
        assert!(pending.add_airway_exit(&fix("C")).is_err());
        pending.add_airway(&db, "UL9").unwrap();
        assert!(pending.add_airway_exit(&fix("Y")).is_err());
        assert!(pending.add_airway(&db, "UT10").is_err());
        assert!(pending.elements()[0].exit.is_none());
    }
}
