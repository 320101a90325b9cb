mod common;

use anyhow::Result;
use common::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fms_flightplan_rust::flightplan::{FlightPlan, HoldData, HoldType, PerformanceData, SegmentKind};
use fms_flightplan_rust::manager::FlightPlanIndex;
use fms_flightplan_rust::navdata::{LegType, TurnDirection};
use fms_flightplan_rust::ErrorKind;

fn assert_discontinuities_valid(plan: &FlightPlan) {
    let discos: Vec<bool> = plan.elements().map(|e| e.is_discontinuity()).collect();
    assert_ne!(discos.first(), Some(&true), "plan starts with a discontinuity");
    assert_ne!(discos.last(), Some(&true), "plan ends with a discontinuity");
    assert!(
        !discos.windows(2).any(|w| w[0] && w[1]),
        "doubled discontinuity in {:?}",
        idents(plan)
    );
}

fn selected(plan: &FlightPlan, kind: SegmentKind) -> Option<String> {
    plan.procedure(kind).map(|p| p.ident.clone())
}

fn hold(course: f64, turn: TurnDirection, hold_type: HoldType) -> HoldData {
    HoldData {
        inbound_magnetic_course: course,
        turn_direction: turn,
        distance: Some(4.0),
        time: None,
        hold_type,
    }
}

#[test]
fn test_departure_with_runway_and_enroute_transition() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;

    h.fps.set_origin_runway("04L", ACT, false)?;
    h.fps.set_departure_procedure(Some("GAYEL4"), ACT, false)?;
    h.fps.set_departure_enroute_transition(Some("SAX"), ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(idents(tmpy), vec!["RW04L", "(1500)", "DPK", "GAYEL", "SAX", "KLAX"]);
    assert_eq!(selected(tmpy, SegmentKind::DepartureRunwayTransition).as_deref(), Some("RW04L"));
    assert_eq!(selected(tmpy, SegmentKind::DepartureEnrouteTransition).as_deref(), Some("SAX"));
    assert_discontinuities_valid(tmpy);
    Ok(())
}

#[test]
fn test_runway_change_swaps_runway_transition() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_origin_runway("RW04L", ACT, false)?;
    h.fps.set_departure_procedure(Some("GAYEL4"), ACT, false)?;
    h.fps.set_departure_enroute_transition(Some("SAX"), ACT, false)?;

    h.fps.set_origin_runway("RW31L", ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(
        idents(tmpy),
        vec!["RW31L", "(1500)", "CRI", "DPK", "GAYEL", "SAX", "KLAX"]
    );
    assert_eq!(
        selected(tmpy, SegmentKind::DepartureRunwayTransition).as_deref(),
        Some("RW31L")
    );
    Ok(())
}

#[test]
fn test_new_origin_clears_departure() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_origin_runway("RW04L", ACT, false)?;
    h.fps.set_departure_procedure(Some("GAYEL4"), ACT, false)?;

    h.fps.set_origin_airport("KBOS", ACT)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(idents(tmpy), vec!["KBOS", "KLAX"]);
    assert!(tmpy.origin_runway().is_none());
    assert!(selected(tmpy, SegmentKind::Departure).is_none());
    assert!(selected(tmpy, SegmentKind::DepartureRunwayTransition).is_none());
    Ok(())
}

#[test]
fn test_vectors_departure_ends_in_discontinuity() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_departure_procedure(Some("SKORR5"), ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(idents(tmpy), vec!["KJFK", "(2000)", "MANUAL", "---", "KLAX"]);

    // The discontinuity after a manual leg stays put
    let err = h.fps.delete_element_at(3, ACT, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    Ok(())
}

#[test]
fn test_arrival_transition_and_approach() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;

    h.fps.set_arrival(Some("ANJLL4"), ACT, false)?;
    assert_eq!(
        idents(h.fps.temporary()?),
        vec!["KJFK", "---", "ANJLL", "SEAVU", "SMO", "KLAX"]
    );

    h.fps.set_arrival_enroute_transition(Some("TNP"), ACT, false)?;
    h.fps.set_approach(Some("I25L"), ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(
        idents(tmpy),
        vec![
            "KJFK", "---", "TNP", "ANJLL", "SEAVU", "SMO", "FUELR", "---", "SKOLL", "FALLT", "RW25L",
            "(2000)", "SMO"
        ]
    );
    assert_eq!(tmpy.destination_runway().map(|r| r.ident.as_str()), Some("RW25L"));
    assert_eq!(selected(tmpy, SegmentKind::ArrivalRunwayTransition).as_deref(), Some("RW25L"));
    assert_eq!(selected(tmpy, SegmentKind::MissedApproach).as_deref(), Some("I25L"));
    assert_eq!(tmpy.segment_kind_at(12), Some(SegmentKind::MissedApproach));

    h.fps.set_approach_via(Some("FUELR"), ACT, false)?;
    let tmpy = h.fps.temporary()?;
    assert_eq!(
        idents(tmpy),
        vec![
            "KJFK", "---", "TNP", "ANJLL", "SEAVU", "SMO", "FUELR", "SKOLL", "FALLT", "RW25L", "(2000)",
            "SMO"
        ]
    );
    assert_discontinuities_valid(tmpy);
    Ok(())
}

#[test]
fn test_approach_to_other_runway_drops_via() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_arrival(Some("ANJLL4"), ACT, false)?;
    h.fps.set_approach(Some("I25L"), ACT, false)?;
    h.fps.set_approach_via(Some("FUELR"), ACT, false)?;

    h.fps.set_approach(Some("R24R"), ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(
        idents(tmpy),
        vec!["KJFK", "---", "ANJLL", "SEAVU", "SMO", "SUZZI", "RW24R", "(2000)"]
    );
    assert!(selected(tmpy, SegmentKind::ApproachVia).is_none());
    assert_eq!(selected(tmpy, SegmentKind::ArrivalRunwayTransition).as_deref(), Some("RW24R"));
    Ok(())
}

#[test]
fn test_destination_runway_change_clears_mismatched_approach() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_arrival(Some("ANJLL4"), ACT, false)?;
    h.fps.set_approach(Some("I25L"), ACT, false)?;

    h.fps.set_destination_runway("24R", ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(
        idents(tmpy),
        vec!["KJFK", "---", "ANJLL", "SEAVU", "SMO", "SUZZI", "RW24R"]
    );
    assert!(selected(tmpy, SegmentKind::Approach).is_none());
    assert!(selected(tmpy, SegmentKind::MissedApproach).is_none());
    Ok(())
}

#[test]
fn test_reselecting_procedure_is_stable() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_arrival(Some("ANJLL4"), ACT, false)?;
    h.fps.set_arrival_enroute_transition(Some("TNP"), ACT, false)?;
    let once = h.fps.temporary()?.all_legs();

    h.fps.set_arrival_enroute_transition(Some("TNP"), ACT, false)?;
    assert_eq!(h.fps.temporary()?.all_legs(), once);
    Ok(())
}

#[test]
fn test_transition_without_procedure_fails() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;

    let err = h.fps.set_arrival_enroute_transition(Some("TNP"), ACT, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    let err = h.fps.set_approach_via(Some("FUELR"), ACT, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);

    assert_eq!(idents(h.fps.temporary()?), vec!["KJFK", "KLAX"]);
    Ok(())
}

#[test]
fn test_clearing_arrival_removes_dependents() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_arrival(Some("ANJLL4"), ACT, false)?;
    h.fps.set_arrival_enroute_transition(Some("TNP"), ACT, false)?;

    h.fps.set_arrival(None, ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert!(selected(tmpy, SegmentKind::Arrival).is_none());
    assert!(selected(tmpy, SegmentKind::ArrivalEnrouteTransition).is_none());
    assert!(!idents(tmpy).contains(&"TNP".to_string()));
    assert_discontinuities_valid(tmpy);
    Ok(())
}

#[test]
fn test_temporary_is_independent_of_active() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    h.fps.insert_waypoint_before(2, &fix("TNP"), ACT, false)?;
    h.fps.add_or_update_cruise_step(3, 37_000.0, TMPY, false)?;

    assert_eq!(idents(h.fps.active()?), vec!["KJFK", "SAX", "PSB", "DJB", "IRK", "HBU", "WPT1", "KLAX"]);
    assert!(h.fps.active()?.elements().all(|e| e.as_leg().map_or(true, |l| l.cruise_step().is_none())));
    assert_eq!(h.fps.temporary()?.leg_at(2)?.ident(), "TNP");
    assert!(h.fps.temporary()?.leg_at(3)?.cruise_step().is_some());
    Ok(())
}

#[test]
fn test_next_waypoint_skips_ahead() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    h.fps.next_waypoint(1, &fix("IRK"), ACT, false)?;

    assert_eq!(idents(h.fps.temporary()?), vec!["KJFK", "SAX", "IRK", "HBU", "WPT1", "KLAX"]);
    Ok(())
}

#[test]
fn test_next_waypoint_after_destination_fails() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    let err = h.fps.next_waypoint(7, &fix("TNP"), ACT, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    Ok(())
}

#[test]
fn test_insert_before_active_shifts_active_index() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;
    h.fps.set_active_leg_index(3, ACT)?;

    h.fps.insert_waypoint_before(2, &fix("TNP"), ACT, false)?;
    assert_eq!(h.fps.temporary()?.active_leg_index(), 4);

    h.fps.insert_waypoint_before(5, &fix("SEAVU"), ACT, false)?;
    assert_eq!(h.fps.temporary()?.active_leg_index(), 4);
    Ok(())
}

#[test]
fn test_new_dest_truncates_route() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    h.fps.new_dest(2, "KSFO", ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(idents(tmpy), vec!["KJFK", "SAX", "PSB", "---", "KSFO"]);
    assert_eq!(tmpy.destination_airport().map(|a| a.ident.as_str()), Some("KSFO"));
    Ok(())
}

#[test]
fn test_new_dest_clears_truncated_departure_selections() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_departure_procedure(Some("GAYEL4"), ACT, false)?;
    h.fps.set_departure_enroute_transition(Some("SAX"), ACT, false)?;

    h.fps.new_dest(2, "KSFO", ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(idents(tmpy), vec!["KJFK", "---", "DPK", "---", "KSFO"]);
    assert_eq!(selected(tmpy, SegmentKind::Departure).as_deref(), Some("GAYEL4"));
    assert_eq!(selected(tmpy, SegmentKind::DepartureEnrouteTransition), None);
    assert!(tmpy.segment(SegmentKind::DepartureEnrouteTransition).is_empty());
    Ok(())
}

#[test]
fn test_new_dest_inside_runway_transition_drops_sid() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.set_origin_runway("RW04L", ACT, false)?;
    h.fps.set_departure_procedure(Some("GAYEL4"), ACT, false)?;

    h.fps.new_dest(1, "KSFO", ACT, false)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(idents(tmpy)[..2], ["RW04L", "(1500)"]);
    assert_eq!(selected(tmpy, SegmentKind::Departure), None);
    assert_eq!(selected(tmpy, SegmentKind::DepartureRunwayTransition), None);
    assert!(!tmpy.segment(SegmentKind::DepartureRunwayTransition).is_empty());
    assert_discontinuities_valid(tmpy);
    Ok(())
}

#[test]
fn test_new_dest_moves_alternate_origin() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", Some("KBOS"), ACT)?;
    h.fps.insert_waypoint_before(1, &fix("SAX"), ACT, false)?;

    h.fps.new_dest(1, "KSFO", ACT, false)?;

    let alternate = h.fps.temporary()?.alternate().expect("alternate kept");
    assert_eq!(idents(alternate), vec!["KSFO", "KBOS"]);
    Ok(())
}

#[test]
fn test_enable_alternate() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", Some("KBOS"), ACT)?;
    for (n, ident) in ROUTE.iter().enumerate() {
        h.fps.insert_waypoint_before(n + 1, &fix(ident), ACT, false)?;
    }
    h.fps.temporary_insert()?;
    h.fps.set_active_leg_index(2, ACT)?;

    h.fps.enable_altn(0, ACT)?;

    let tmpy = h.fps.temporary()?;
    assert_eq!(idents(tmpy), vec!["KJFK", "SAX", "PSB", "KBOS"]);
    assert_eq!(tmpy.destination_airport().map(|a| a.ident.as_str()), Some("KBOS"));
    assert!(tmpy.alternate().is_none());
    assert_eq!(tmpy.active_leg_index(), 2);
    Ok(())
}

#[test]
fn test_enable_alternate_without_alternate_fails() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    let err = h.fps.enable_altn(0, ACT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    Ok(())
}

#[test]
fn test_manual_hold_lifecycle() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;
    let computed = hold(90.0, TurnDirection::Right, HoldType::Computed);

    let at = h.fps.add_or_edit_manual_hold(2, computed, None, computed, ACT, false)?;
    assert_eq!(at, 3);
    {
        let leg = h.fps.temporary()?.leg_at(3)?;
        assert_eq!(leg.ident(), "PSB");
        assert_eq!(leg.leg_type(), LegType::HM);
        assert_eq!(leg.default_hold(), Some(&computed));
        assert!(leg.modified_hold().is_none());
    }

    // Editing from the fix finds the hold right after it
    let pilot = hold(270.0, TurnDirection::Left, HoldType::Pilot);
    let at = h.fps.add_or_edit_manual_hold(2, pilot, Some(pilot), computed, ACT, false)?;
    assert_eq!(at, 3);
    {
        let leg = h.fps.temporary()?.leg_at(3)?;
        assert_eq!(leg.modified_hold(), Some(&pilot));
        assert_eq!(leg.definition().course, Some(270.0));
        assert_eq!(leg.definition().turn_direction, Some(TurnDirection::Left));
    }

    h.fps.revert_hold_to_computed(3, ACT, false)?;
    let leg = h.fps.temporary()?.leg_at(3)?;
    assert!(leg.modified_hold().is_none());
    assert_eq!(leg.definition().course, Some(90.0));

    let err = h.fps.revert_hold_to_computed(2, ACT, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    Ok(())
}

#[test]
fn test_airway_entry_via_intersection() -> Result<()> {
    let mut h = a320();
    h.fps.new_city_pair("KJFK", "KLAX", None, ACT)?;
    h.fps.next_waypoint(0, &fix("SAX"), ACT, false)?;
    assert_eq!(idents(h.fps.temporary()?), vec!["KJFK", "SAX", "---", "KLAX"]);

    h.fps.start_airway_entry(1, ACT, false)?;
    h.fps.add_airway("J80", ACT, false)?;
    h.fps.add_airway("J64", ACT, false)?;
    h.fps.add_airway_exit(&fix("HBU"), ACT, false)?;

    let pending = h.fps.temporary()?.pending_airways().expect("pending airways");
    assert_eq!(pending.elements().len(), 2);
    assert_eq!(pending.elements()[0].exit.as_ref().map(|f| f.ident.as_str()), Some("DJB"));

    h.fps.temporary_insert()?;

    let active = h.fps.active()?;
    assert_eq!(
        idents(active),
        vec!["KJFK", "SAX", "PSB", "DJB", "IRK", "HBU", "---", "KLAX"]
    );
    assert_eq!(active.leg_at(2)?.airway(), Some("J80"));
    assert_eq!(active.leg_at(4)?.airway(), Some("J64"));
    assert!(active.pending_airways().is_none());
    Ok(())
}

#[test]
fn test_airway_rejoins_existing_route() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    h.fps.start_airway_entry(1, ACT, false)?;
    h.fps.add_airway("J80", ACT, false)?;
    h.fps.add_airway_exit(&fix("DJB"), ACT, false)?;
    h.fps.temporary_insert()?;

    let active = h.fps.active()?;
    assert_eq!(
        idents(active),
        vec!["KJFK", "SAX", "PSB", "DJB", "IRK", "HBU", "WPT1", "KLAX"]
    );
    assert_eq!(active.leg_at(2)?.airway(), Some("J80"));
    assert_eq!(active.leg_at(3)?.airway(), Some("J80"));
    Ok(())
}

#[test]
fn test_airway_not_through_entry_is_rejected() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    h.fps.start_airway_entry(1, ACT, false)?;
    let err = h.fps.add_airway("J64", ACT, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let pending = h.fps.temporary()?.pending_airways().expect("entry still open");
    assert!(pending.elements().is_empty());
    Ok(())
}

#[test]
fn test_cruise_step() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    h.fps.add_or_update_cruise_step(3, 37_000.0, ACT, false)?;
    assert_eq!(h.fps.active()?.leg_at(3)?.cruise_step().map(|s| s.to_altitude), Some(37_000.0));

    h.fps.add_or_update_cruise_step(3, 39_000.0, ACT, false)?;
    assert_eq!(h.fps.active()?.leg_at(3)?.cruise_step().map(|s| s.to_altitude), Some(39_000.0));

    h.fps.remove_cruise_step(3, ACT, false)?;
    assert!(h.fps.active()?.leg_at(3)?.cruise_step().is_none());
    assert!(h.fps.remove_cruise_step(3, ACT, false).is_err());
    Ok(())
}

#[test]
fn test_overfly_toggle() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    assert!(h.fps.toggle_overfly_at(2, ACT, false)?);
    assert!(h.fps.active()?.leg_at(2)?.overfly());
    assert!(!h.fps.toggle_overfly_at(2, ACT, false)?);
    assert!(!h.fps.active()?.leg_at(2)?.overfly());
    Ok(())
}

#[test]
fn test_edit_leg_definition() -> Result<()> {
    let mut h = a320();
    route(&mut h, ROUTE)?;

    h.fps.edit_leg_definition(2, |definition| definition.course = Some(275.0), ACT, false)?;
    assert_eq!(h.fps.active()?.leg_at(2)?.definition().course, Some(275.0));
    assert!(h.fps.edit_leg_definition(42, |_| {}, ACT, false).is_err());
    Ok(())
}

#[test]
fn test_performance_data() -> Result<()> {
    let mut h = a320();
    let data = PerformanceData {
        cruise_flight_level: Some(350),
        cost_index: Some(40),
        ..Default::default()
    };

    h.fps.set_performance_data(data, ACT)?;
    h.fps.edit_performance_data(|p| p.v1 = Some(140), ACT)?;

    let performance = h.fps.active()?.performance();
    assert_eq!(performance.cruise_altitude(), Some(35_000.0));
    assert_eq!(performance.cost_index, Some(40));
    assert_eq!(performance.v1, Some(140));
    Ok(())
}

#[test]
fn test_plan_listing() -> Result<()> {
    let mut h = a320();
    route(&mut h, &["SAX"])?;

    let listing = h.fps.active()?.to_string();
    assert!(listing.lines().next().is_some_and(|header| header.ends_with("KJFK/KLAX")));
    assert!(listing.contains("SAX"));
    assert_eq!(listing.lines().filter(|l| l.starts_with('>')).count(), 1);
    Ok(())
}

#[test]
fn test_lateral_edit_sequences_keep_discontinuities_valid() -> Result<()> {
    const SEC1: FlightPlanIndex = FlightPlanIndex::Secondary(1);
    const POOL: &[&str] = &["SAX", "PSB", "DJB", "BVT", "IRK", "HBU", "TNP", "WPT1", "GAYEL"];

    for seed in 0..20 {
        let mut h = a320();
        let mut rng = StdRng::seed_from_u64(seed);
        h.fps.new_city_pair("KJFK", "KLAX", None, SEC1)?;
        for (n, ident) in ROUTE.iter().enumerate() {
            h.fps.insert_waypoint_before(n + 1, &fix(ident), SEC1, false)?;
        }

        for _ in 0..50 {
            let before = idents(h.fps.secondary(1)?);
            let len = before.len();
            let waypoint = fix(POOL[rng.gen_range(0..POOL.len())]);

            let outcome = match rng.gen_range(0..3) {
                0 => h.fps.insert_waypoint_before(rng.gen_range(1..len), &waypoint, SEC1, false),
                1 => h.fps.next_waypoint(rng.gen_range(0..len), &waypoint, SEC1, false),
                _ => h.fps.delete_element_at(rng.gen_range(0..len), SEC1, false),
            };

            let plan = h.fps.secondary(1)?;
            if outcome.is_err() {
                assert_eq!(idents(plan), before, "failed edit changed the plan (seed {})", seed);
            }
            assert_discontinuities_valid(plan);
            assert_eq!(idents(plan).first().map(String::as_str), Some("KJFK"));
            assert_eq!(idents(plan).last().map(String::as_str), Some("KLAX"));
        }
    }
    Ok(())
}
