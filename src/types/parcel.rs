use geo::MultiPolygon;
use serde::Serialize;

use super::LatLng;

/// A registered unit of land.
///
/// The geometry is kept in the coordinate system of the collection it was
/// loaded from; indexed copies live in the snapshot's spatial index.
#[derive(Debug, Clone, Serialize)]
pub struct Parcel {
    pub gid: u64,
    pub lr_no: String,
    pub fr_no: String,
    pub area: f64,
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pas: Option<String>,
    #[serde(skip)]
    pub geometry: MultiPolygon<f64>,
}

impl Parcel {
    /// The part of `lr_no` after its first separator (`"LR/123/45"` -> `"123/45"`).
    /// Codes without a separator are returned whole.
    pub fn registration_suffix(&self) -> &str {
        match self.lr_no.char_indices().find(|(_, c)| !c.is_alphanumeric()) {
            Some((i, c)) => &self.lr_no[i + c.len_utf8()..],
            None => &self.lr_no,
        }
    }
}

/// Listing/search view of a parcel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelSummary {
    pub gid: u64,
    pub lr_no: String,
    pub fr_no: String,
    pub area: f64,
    pub entity: String,
    pub centroid: Option<LatLng>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel(lr_no: &str) -> Parcel {
        Parcel {
            gid: 1,
            lr_no: lr_no.into(),
            fr_no: String::new(),
            area: 0.0,
            entity: String::new(),
            objectid: None,
            pas: None,
            geometry: MultiPolygon::new(vec![]),
        }
    }

    #[test]
    fn suffix_after_first_separator() {
        assert_eq!(parcel("LR/123/45").registration_suffix(), "123/45");
        assert_eq!(parcel("209/8765").registration_suffix(), "8765");
        assert_eq!(parcel("NAIROBI BLOCK 7").registration_suffix(), "BLOCK 7");
    }

    #[test]
    fn suffix_without_separator_is_whole_code() {
        assert_eq!(parcel("12345").registration_suffix(), "12345");
        assert_eq!(parcel("").registration_suffix(), "");
    }
}
