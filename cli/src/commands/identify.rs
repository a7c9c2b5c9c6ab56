use anyhow::Result;
use parcelnav::LatLng;

use crate::cli::{Cli, IdentifyArgs};
use super::{open_engine, print_json};

pub fn run(cli: &Cli, args: &IdentifyArgs) -> Result<()> {
    let engine = open_engine(cli)?;
    let at = LatLng::new(args.lat, args.lng);

    if args.strict {
        return print_json(&engine.find_parcel_at(at)?);
    }
    print_json(&engine.resolve_context_at(at)?)
}
