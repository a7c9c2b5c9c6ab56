use std::path::PathBuf;

use parcelnav::routing::TravelMode;

/// Parcel lookup, tiles and entry-point routing over local GeoJSON data
#[derive(clap::Parser, Debug)]
#[command(name = "parcelnav", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding parcels.geojson, entry_points.geojson, roads.geojson and admin_blocks.geojson
    #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath, global = true)]
    pub data: PathBuf,

    /// JSON engine configuration, defaults built in
    #[arg(short, long, value_hint = clap::ValueHint::FilePath, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Resolve the parcel at a coordinate with its full context
    Identify(IdentifyArgs),

    /// Resolve a parcel by LR number with its full context
    Lookup(LookupArgs),

    /// Render one parcel vector tile
    Tile(TileArgs),

    /// Route from a coordinate to the best entry point of a parcel
    Route(RouteArgs),

    /// Physical address and short code records
    Address(AddressArgs),

    /// Search parcels by LR number fragment
    Search(SearchArgs),
}

#[derive(clap::Args, Debug)]
pub struct IdentifyArgs {
    pub lat: f64,
    pub lng: f64,

    /// Exact containment, no tolerance band
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// LR number, e.g. "LR/123/45"
    pub lr_no: String,
}

#[derive(clap::Args, Debug)]
pub struct TileArgs {
    pub z: u32,
    pub x: u32,
    pub y: u32,

    /// Output file, defaults to stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Gzip the encoded tile
    #[arg(long)]
    pub gzip: bool,
}

#[derive(clap::Args, Debug)]
pub struct RouteArgs {
    pub lat: f64,
    pub lng: f64,
    pub lr_no: String,

    /// walking, driving, cycling or motorcycle
    #[arg(short, long, default_value = "driving")]
    pub mode: TravelMode,

    /// Route to this entry point label instead of the best one
    #[arg(short, long)]
    pub entry: Option<i32>,

    /// One route per reachable entry point
    #[arg(long, conflicts_with = "entry")]
    pub alternatives: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddressArgs {
    /// LR number fragment
    pub lr_no: Option<String>,

    /// FR number fragment
    #[arg(long)]
    pub fr_no: Option<String>,

    /// Search around this position, as "lat,lng"
    #[arg(long, value_parser = parse_lat_lng)]
    pub near: Option<(f64, f64)>,

    /// Search radius in meters around --near
    #[arg(long, requires = "near")]
    pub radius: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    pub query: Option<String>,

    /// List all parcels page by page instead of searching
    #[arg(long, conflicts_with = "query")]
    pub page: Option<usize>,

    /// Page size for --page
    #[arg(long, requires = "page")]
    pub limit: Option<usize>,
}

fn parse_lat_lng(s: &str) -> Result<(f64, f64), String> {
    let (lat, lng) = s.split_once(',').ok_or_else(|| format!("expected \"lat,lng\", got {s:?}"))?;
    let parse = |v: &str| v.trim().parse::<f64>().map_err(|e| format!("{v:?}: {e}"));
    Ok((parse(lat)?, parse(lng)?))
}
