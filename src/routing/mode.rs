use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::RoadClass;

/// How the traveller moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walking,
    #[default]
    Driving,
    Cycling,
    Motorcycle,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] = [TravelMode::Walking, TravelMode::Driving, TravelMode::Cycling, TravelMode::Motorcycle];

    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Driving => "driving",
            TravelMode::Cycling => "cycling",
            TravelMode::Motorcycle => "motorcycle",
        }
    }

    /// Mapbox Directions profile for this mode. Motor traffic uses live traffic data.
    pub fn profile(self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
            TravelMode::Driving | TravelMode::Motorcycle => "driving-traffic",
        }
    }

    /// Whether a road of this class is usable in this mode.
    pub fn can_use(self, class: &RoadClass) -> bool {
        use TravelMode::*;
        match class {
            RoadClass::Motorway | RoadClass::Trunk => matches!(self, Driving | Motorcycle),
            RoadClass::Primary
            | RoadClass::Secondary
            | RoadClass::Tertiary
            | RoadClass::Unclassified
            | RoadClass::Residential
            | RoadClass::LivingStreet
            | RoadClass::Service => true,
            RoadClass::Track => matches!(self, Walking | Cycling | Motorcycle),
            RoadClass::Cycleway => matches!(self, Walking | Cycling),
            RoadClass::Footway | RoadClass::Pedestrian | RoadClass::Steps => self == Walking,
            RoadClass::Path => matches!(self, Walking | Cycling),
            RoadClass::Other(_) => true,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TravelMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TravelMode::ALL.into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown travel mode {s:?}")))
    }
}
