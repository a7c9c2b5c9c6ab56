use anyhow::{bail, Result};
use parcelnav::LatLng;
use parcelnav::search::{AddressQuery, NearQuery};

use crate::cli::{AddressArgs, Cli};
use super::{open_engine, print_json};

pub fn run(cli: &Cli, args: &AddressArgs) -> Result<()> {
    if args.lr_no.is_none() && args.fr_no.is_none() && args.near.is_none() {
        bail!("give an LR number, --fr-no or --near");
    }

    let query = AddressQuery {
        lr_no: args.lr_no.clone(),
        fr_no: args.fr_no.clone(),
        near: args.near.map(|(lat, lng)| NearQuery { at: LatLng::new(lat, lng), radius_m: args.radius }),
    };
    let engine = open_engine(cli)?;
    print_json(&engine.search_addresses(&query)?)
}
