use serde::Serialize;

use super::{Directions, DirectionsSegment, RouteSegment};
use crate::context::ContextEntryPoint;
use crate::types::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    Start,
    Continue,
    Turn,
    Walk,
    Arrival,
}

/// One turn-by-turn step. `distance_m` covers this step only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub step: usize,
    #[serde(rename = "type")]
    pub kind: InstructionKind,
    #[serde(rename = "instruction")]
    pub text: String,
    pub distance_m: f64,
    pub road: Option<String>,
    pub coordinates: Option<LatLng>,
}

/// Accumulates steps, numbering them from 1.
#[derive(Default)]
struct Steps(Vec<Instruction>);

impl Steps {
    fn push(&mut self, kind: InstructionKind, text: String, distance_m: f64, road: Option<&str>, coordinates: Option<LatLng>) {
        let step = self.0.len() + 1;
        self.0.push(Instruction { step, kind, text, distance_m, road: road.map(str::to_string), coordinates });
    }

    /// Travel along `segment`. A segment on the same road as the previous
    /// step extends it instead of starting a new one.
    fn travel(&mut self, kind: InstructionKind, text: fn(&str) -> String, segment: &RouteSegment) {
        let same_road = |last: &&mut Instruction| last.road.as_deref() == Some(segment.name.as_str());
        if let Some(last) = self.0.last_mut().filter(same_road) {
            last.distance_m += segment.distance_m;
            return;
        }
        self.push(kind, text(&segment.name), segment.distance_m, Some(segment.name.as_str()), None);
    }

    /// Walk from the access road, then arrive at the parcel.
    fn finish(mut self, entry: &ContextEntryPoint, walk_distance_m: f64, lr_no: &str) -> Vec<Instruction> {
        self.push(
            InstructionKind::Walk,
            format!("Walk {}m to Entry Point {}", walk_distance_m.round(), entry.label),
            walk_distance_m,
            None,
            Some(entry.coordinates),
        );
        self.push(InstructionKind::Arrival, format!("You have arrived at {lr_no}"), 0.0, None, Some(entry.coordinates));
        self.0
    }
}

fn head_towards(name: &str) -> String { format!("Head towards {name}") }

fn continue_on(name: &str) -> String { format!("Continue on {name}") }

fn turn_onto(name: &str) -> String { format!("Turn onto {name}") }

/// Steps for a stitched route: head towards the first road, continue at
/// each change of road name, turn onto the access road, walk, arrive.
/// Consecutive segments sharing a name make one step.
///
/// A single-road route has nothing to travel before the turn, so its start
/// step carries no distance and the turn carries the road.
pub fn local_instructions(
    segments: &[RouteSegment],
    entry: &ContextEntryPoint,
    walk_distance_m: f64,
    lr_no: &str,
) -> Vec<Instruction> {
    let mut steps = Steps::default();
    match segments {
        [] => {}
        [only] => {
            steps.push(InstructionKind::Start, head_towards(&only.name), 0.0, Some(only.name.as_str()), None);
            steps.push(InstructionKind::Turn, turn_onto(&only.name), only.distance_m, Some(only.name.as_str()), None);
        }
        [first, middle @ .., access] => {
            steps.travel(InstructionKind::Start, head_towards, first);
            for segment in middle {
                steps.travel(InstructionKind::Continue, continue_on, segment);
            }
            steps.travel(InstructionKind::Turn, turn_onto, access);
        }
    }
    steps.finish(entry, walk_distance_m, lr_no)
}

fn provider_kind(maneuver: &str) -> InstructionKind {
    match maneuver {
        "depart" => InstructionKind::Start,
        "turn" | "end of road" | "fork" | "on ramp" | "off ramp" | "roundabout" | "rotary" | "roundabout turn"
        | "exit roundabout" | "exit rotary" => InstructionKind::Turn,
        _ => InstructionKind::Continue,
    }
}

/// Provider steps that become route segments. The provider's own arrival is
/// replaced by the walk and arrival steps.
pub fn provider_legs(directions: &Directions) -> impl Iterator<Item = &DirectionsSegment> {
    directions.segments.iter().filter(|s| s.maneuver != "arrive")
}

/// Steps for a provider route, one per provider step, then walk and arrive.
pub fn provider_instructions(
    directions: &Directions,
    entry: &ContextEntryPoint,
    walk_distance_m: f64,
    lr_no: &str,
) -> Vec<Instruction> {
    let mut steps = Steps::default();
    for leg in provider_legs(directions) {
        let kind = provider_kind(&leg.maneuver);
        let text = leg.instruction.clone().unwrap_or_else(|| match kind {
            InstructionKind::Start => head_towards(&leg.name),
            InstructionKind::Turn => turn_onto(&leg.name),
            _ => continue_on(&leg.name),
        });
        let road = (!leg.name.is_empty()).then_some(leg.name.as_str());
        let start = leg.geometry.0.first().map(|&c| LatLng::from(c));
        steps.push(kind, text, leg.distance_m, road, start);
    }
    steps.finish(entry, walk_distance_m, lr_no)
}

#[cfg(test)]
mod tests {
    use geo::line_string;
    use smallvec::SmallVec;

    use super::*;

    fn entry() -> ContextEntryPoint {
        ContextEntryPoint {
            gid: 1,
            label: 1,
            coordinates: LatLng::new(-1.3, 36.8),
            distance_to_parcel_m: 3.0,
            nearest_roads: SmallVec::new(),
            slot: 0,
        }
    }

    fn segment(sequence: usize, name: &str, distance_m: f64) -> RouteSegment {
        RouteSegment {
            sequence,
            road_gid: Some(sequence as u64),
            name: name.into(),
            road_type: None,
            distance_m,
            duration_s: 0.0,
            maneuver: None,
            instruction: None,
            geometry: None,
        }
    }

    #[test]
    fn single_road_route() {
        let steps = local_instructions(&[segment(1, "Main Rd", 400.0)], &entry(), 2.6, "LR/123/45");
        let kinds: Vec<_> = steps.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, [InstructionKind::Start, InstructionKind::Turn, InstructionKind::Walk, InstructionKind::Arrival]);
        assert_eq!(steps[0].text, "Head towards Main Rd");
        assert_eq!(steps[1].distance_m, 400.0);
        assert_eq!(steps[2].text, "Walk 3m to Entry Point 1");
        assert_eq!(steps[3].text, "You have arrived at LR/123/45");
        assert_eq!(steps.iter().map(|s| s.step).collect::<Vec<_>>(), [1, 2, 3, 4]);
    }

    #[test]
    fn multi_road_route_continues_on_each_intermediate() {
        let segments = [segment(1, "North Ave", 100.0), segment(2, "Link St", 300.0), segment(3, "Main Rd", 400.0)];
        let steps = local_instructions(&segments, &entry(), 0.0, "LR/1");
        let texts: Vec<_> = steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts[..3], ["Head towards North Ave", "Continue on Link St", "Turn onto Main Rd"]);
        let travelled: f64 = steps.iter().map(|s| s.distance_m).sum();
        assert_eq!(travelled, 800.0);
    }

    #[test]
    fn repeated_road_names_make_one_step() {
        let segments = [
            segment(1, "North Ave", 100.0),
            segment(2, "Link St", 300.0),
            segment(3, "Link St", 200.0),
            segment(4, "Main Rd", 400.0),
        ];
        let steps = local_instructions(&segments, &entry(), 0.0, "LR/1");
        let texts: Vec<_> = steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts[..3], ["Head towards North Ave", "Continue on Link St", "Turn onto Main Rd"]);
        assert_eq!(steps[1].distance_m, 500.0);
        assert_eq!(steps.iter().map(|s| s.step).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn access_road_continuing_the_last_road_adds_no_turn() {
        let segments = [segment(1, "North Ave", 100.0), segment(2, "Main Rd", 300.0), segment(3, "Main Rd", 50.0)];
        let steps = local_instructions(&segments, &entry(), 0.0, "LR/1");
        let kinds: Vec<_> = steps.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, [InstructionKind::Start, InstructionKind::Continue, InstructionKind::Walk, InstructionKind::Arrival]);
        assert_eq!(steps[1].distance_m, 350.0);
    }

    #[test]
    fn provider_steps_map_one_to_one() {
        let leg = |name: &str, maneuver: &str, instruction: Option<&str>| DirectionsSegment {
            name: name.into(),
            geometry: line_string![(x: 36.8, y: -1.3), (x: 36.81, y: -1.3)],
            distance_m: 50.0,
            duration_s: 5.0,
            maneuver: maneuver.into(),
            modifier: None,
            instruction: instruction.map(str::to_string),
        };
        let directions = Directions {
            segments: vec![
                leg("Ngong Rd", "depart", None),
                leg("Argwings Kodhek Rd", "turn", Some("Turn left onto Argwings Kodhek Rd")),
                leg("", "arrive", Some("You have arrived")),
            ],
            total_distance_m: 100.0,
            total_duration_s: 10.0,
            congestion: Vec::new(),
        };
        let steps = provider_instructions(&directions, &entry(), 4.0, "LR/1");
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].kind, InstructionKind::Start);
        assert_eq!(steps[0].text, "Head towards Ngong Rd");
        assert_eq!(steps[1].text, "Turn left onto Argwings Kodhek Rd");
        assert_eq!(steps[2].kind, InstructionKind::Walk);
    }
}
