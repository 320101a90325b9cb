//! Reconciles the boundaries between adjacent segments after one of them
//! has been repopulated.

use std::collections::HashSet;

use super::legs::{FlightPlanElement, FlightPlanLeg};
use super::segments::{FlightPlanSegment, SegmentKind};
use crate::navdata::LegType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RestringScope {
    Departure,
    Arrival,
}

impl RestringScope {
    fn covers_pair(self, a: SegmentKind, b: SegmentKind) -> bool {
        match self {
            RestringScope::Departure => a < SegmentKind::Enroute || b <= SegmentKind::Enroute,
            RestringScope::Arrival => b > SegmentKind::Enroute || a >= SegmentKind::Enroute,
        }
    }

    fn covers(self, kind: SegmentKind) -> bool {
        match self {
            RestringScope::Departure => kind <= SegmentKind::Enroute,
            RestringScope::Arrival => kind >= SegmentKind::Enroute,
        }
    }
}

/// Restrings every boundary in `scope` that touches a segment which is not
/// strung yet. Boundaries between two strung segments are left alone, so
/// running this twice in a row changes nothing the second time.
pub(crate) fn restring(segments: &mut [FlightPlanSegment], scope: RestringScope) {
    let mut fresh: Vec<bool> = segments.iter().map(|s| !s.is_strung()).collect();
    let mut visited: HashSet<(usize, usize)> = HashSet::new();

    while let Some((i, j)) = next_pair(segments, scope, &fresh, &visited) {
        visited.insert((i, j));

        let (left, right) = segments.split_at_mut(j);
        let (a, b) = (&mut left[i], &mut right[0]);
        reconcile(a, b, fresh[i], fresh[j]);

        // A segment that disappeared exposes its neighbour to the next one along
        if b.is_empty() {
            fresh[i] = true;
        }
        if a.is_empty() {
            fresh[j] = true;
        }
    }

    for (segment, was_fresh) in segments.iter_mut().zip(fresh) {
        if was_fresh && scope.covers(segment.kind()) {
            segment.set_strung(true);
        }
    }
}

fn next_pair(
    segments: &[FlightPlanSegment],
    scope: RestringScope,
    fresh: &[bool],
    visited: &HashSet<(usize, usize)>,
) -> Option<(usize, usize)> {
    let populated: Vec<usize> = (0..segments.len()).filter(|&i| !segments[i].is_empty()).collect();

    populated.windows(2).map(|w| (w[0], w[1])).find(|&(i, j)| {
        (fresh[i] || fresh[j])
            && !visited.contains(&(i, j))
            && scope.covers_pair(segments[i].kind(), segments[j].kind())
    })
}

fn last_leg(segment: &FlightPlanSegment) -> Option<&FlightPlanLeg> {
    segment.all_legs().last().and_then(FlightPlanElement::as_leg)
}

fn first_leg(segment: &FlightPlanSegment) -> Option<&FlightPlanLeg> {
    segment.all_legs().first().and_then(FlightPlanElement::as_leg)
}

enum Dedupe {
    DropTrailing,
    DropLeading,
}

fn reconcile(a: &mut FlightPlanSegment, b: &mut FlightPlanSegment, a_fresh: bool, b_fresh: bool) {
    let a_ends_disco = a.all_legs().last().is_some_and(FlightPlanElement::is_discontinuity);
    let b_starts_disco = b.all_legs().first().is_some_and(FlightPlanElement::is_discontinuity);
    if a_ends_disco && b_starts_disco {
        b.legs_mut().remove(0);
    }
    if a.is_empty() || b.is_empty() {
        return;
    }

    truncate_overlap(a, b, a_fresh, b_fresh);

    loop {
        let (Some(last), Some(first)) = (last_leg(a), first_leg(b)) else {
            break;
        };
        let same_fix = match (last.termination_waypoint(), first.termination_waypoint()) {
            (Some(x), Some(y)) => x.same_as(y),
            _ => false,
        };
        if !same_fix || first.is_hx() {
            break;
        }

        let action = if b.kind() == SegmentKind::Destination {
            if a.kind() == SegmentKind::Origin {
                break;
            }
            Dedupe::DropTrailing
        } else if a.kind() == SegmentKind::Origin || first.leg_type() == LegType::IF {
            Dedupe::DropLeading
        } else {
            Dedupe::DropTrailing
        };

        match action {
            Dedupe::DropTrailing => {
                if let Some(FlightPlanElement::Leg(dropped)) = a.legs_mut().pop() {
                    if let Some(first) = b.legs_mut().first_mut().and_then(FlightPlanElement::as_leg_mut) {
                        first.absorb_constraints(&dropped);
                    }
                }
            }
            Dedupe::DropLeading => {
                if let FlightPlanElement::Leg(dropped) = b.legs_mut().remove(0) {
                    if let Some(last) = a.legs_mut().last_mut().and_then(FlightPlanElement::as_leg_mut) {
                        last.absorb_constraints(&dropped);
                    }
                }
            }
        }
    }

    if let (Some(last), Some(first)) = (last_leg(a), first_leg(b)) {
        let disconnected = first.leg_type() == LegType::IF || last.is_vectors();
        if disconnected && b.kind() != SegmentKind::MissedApproach {
            a.legs_mut().push(FlightPlanElement::Discontinuity);
        }
    }
}

/// Cuts whatever lies between a shared fix on either side of the boundary
fn truncate_overlap(a: &mut FlightPlanSegment, b: &mut FlightPlanSegment, a_fresh: bool, b_fresh: bool) {
    let protected = matches!(b.kind(), SegmentKind::Destination | SegmentKind::MissedApproach);

    if b_fresh && !protected {
        let entry = first_leg(b)
            .filter(|leg| leg.leg_type() == LegType::IF)
            .and_then(|leg| leg.termination_waypoint())
            .cloned();
        if let Some(entry) = entry {
            if let Some(k) = a.all_legs().iter().rposition(|e| e.terminates_with_waypoint(&entry)) {
                a.legs_mut().truncate(k + 1);
            }
            return;
        }
    }

    if a_fresh && !protected {
        let exit = last_leg(a).and_then(|leg| leg.termination_waypoint()).cloned();
        if let Some(exit) = exit {
            let found = b.all_legs().iter().skip(1).position(|e| e.terminates_with_waypoint(&exit));
            if let Some(position) = found {
                b.legs_mut().drain(..=position);
            }
        }
    }
}
