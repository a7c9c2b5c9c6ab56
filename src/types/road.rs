use std::{convert::Infallible, fmt, str::FromStr};

use geo::MultiLineString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A road segment from the road network.
#[derive(Debug, Clone, Serialize)]
pub struct Road {
    pub gid: u64,
    pub name: Option<String>,
    #[serde(rename = "fclass")]
    pub class: RoadClass,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oneway: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxspeed: Option<u32>,
    #[serde(skip)]
    pub geometry: MultiLineString<f64>,
}

impl Road {
    /// The road name, if it has a non-blank one.
    pub fn named(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Functional road class (OSM `fclass`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Unclassified,
    Residential,
    LivingStreet,
    Service,
    Track,
    Cycleway,
    Pedestrian,
    Footway,
    Steps,
    Path,
    Other(String),
}

impl RoadClass {
    pub fn as_str(&self) -> &str {
        match self {
            RoadClass::Motorway => "motorway",
            RoadClass::Trunk => "trunk",
            RoadClass::Primary => "primary",
            RoadClass::Secondary => "secondary",
            RoadClass::Tertiary => "tertiary",
            RoadClass::Unclassified => "unclassified",
            RoadClass::Residential => "residential",
            RoadClass::LivingStreet => "living_street",
            RoadClass::Service => "service",
            RoadClass::Track => "track",
            RoadClass::Cycleway => "cycleway",
            RoadClass::Pedestrian => "pedestrian",
            RoadClass::Footway => "footway",
            RoadClass::Steps => "steps",
            RoadClass::Path => "path",
            RoadClass::Other(other) => other,
        }
    }

    /// Base access quality, decreasing from motorways (10) to paths (2).
    pub fn base_quality(&self) -> f64 {
        match self {
            RoadClass::Motorway => 10.0,
            RoadClass::Trunk => 9.0,
            RoadClass::Primary => 8.0,
            RoadClass::Secondary => 7.0,
            RoadClass::Tertiary => 6.0,
            RoadClass::Unclassified | RoadClass::Residential => 5.0,
            RoadClass::LivingStreet | RoadClass::Service => 4.0,
            RoadClass::Track | RoadClass::Cycleway | RoadClass::Pedestrian | RoadClass::Other(_) => 3.0,
            RoadClass::Footway | RoadClass::Steps | RoadClass::Path => 2.0,
        }
    }
}

impl FromStr for RoadClass {
    type Err = Infallible;

    /// Link roads (`primary_link`, …) take the class of the road they connect.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let base = normalized.strip_suffix("_link").unwrap_or(&normalized);
        Ok(match base {
            "motorway" => RoadClass::Motorway,
            "trunk" => RoadClass::Trunk,
            "primary" => RoadClass::Primary,
            "secondary" => RoadClass::Secondary,
            "tertiary" => RoadClass::Tertiary,
            "unclassified" => RoadClass::Unclassified,
            "residential" => RoadClass::Residential,
            "living_street" => RoadClass::LivingStreet,
            "service" => RoadClass::Service,
            "track" | "track_grade1" | "track_grade2" | "track_grade3" | "track_grade4" | "track_grade5" => RoadClass::Track,
            "cycleway" => RoadClass::Cycleway,
            "pedestrian" => RoadClass::Pedestrian,
            "footway" => RoadClass::Footway,
            "steps" => RoadClass::Steps,
            "path" | "bridleway" => RoadClass::Path,
            _ => RoadClass::Other(normalized.clone()),
        })
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Serialize for RoadClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoadClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_else(|never: Infallible| match never {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_and_link_classes() {
        assert_eq!("residential".parse::<RoadClass>().unwrap(), RoadClass::Residential);
        assert_eq!("Primary_Link".parse::<RoadClass>().unwrap(), RoadClass::Primary);
        assert_eq!("track_grade3".parse::<RoadClass>().unwrap(), RoadClass::Track);
        assert_eq!("busway".parse::<RoadClass>().unwrap(), RoadClass::Other("busway".into()));
    }

    #[test]
    fn quality_decreases_from_motorway_to_path() {
        let ordered = [
            RoadClass::Motorway, RoadClass::Trunk, RoadClass::Primary, RoadClass::Secondary,
            RoadClass::Tertiary, RoadClass::Residential, RoadClass::Service, RoadClass::Track,
            RoadClass::Footway, RoadClass::Path,
        ];
        for pair in ordered.windows(2) { assert!(pair[0].base_quality() >= pair[1].base_quality()) }
        assert_eq!(RoadClass::Motorway.base_quality(), 10.0);
        assert_eq!(RoadClass::Path.base_quality(), 2.0);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for class in [RoadClass::LivingStreet, RoadClass::Footway, RoadClass::Other("ferry".into())] {
            assert_eq!(class.to_string().parse::<RoadClass>().unwrap(), class);
        }
    }
}
