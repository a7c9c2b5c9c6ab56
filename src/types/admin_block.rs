use geo::MultiPolygon;
use serde::Serialize;

/// A named administrative region (constituency / county subdivision).
#[derive(Debug, Clone, Serialize)]
pub struct AdminBlock {
    pub gid: u64,
    pub name: String,
    pub constituency: String,
    pub county: String,
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub const_code: Option<i64>,
    #[serde(skip)]
    pub geometry: MultiPolygon<f64>,
}

impl AdminBlock {
    /// The short code used in tile labels, if the block has a non-blank one.
    pub fn short_code(&self) -> Option<&str> {
        self.short_name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
