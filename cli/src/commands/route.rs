use anyhow::Result;
use parcelnav::LatLng;
use parcelnav::routing::RouteRequest;

use crate::cli::{Cli, RouteArgs};
use super::{open_engine, print_json};

pub fn run(cli: &Cli, args: &RouteArgs) -> Result<()> {
    let engine = open_engine(cli)?;
    let origin = LatLng::new(args.lat, args.lng);

    if args.alternatives {
        return print_json(&engine.alternative_routes(origin, &args.lr_no, args.mode)?);
    }

    let mut request = RouteRequest::new(origin, args.lr_no.as_str(), args.mode);
    if let Some(label) = args.entry {
        request = request.with_entry_label(label);
    }
    print_json(&engine.calculate_route(&request)?)
}
