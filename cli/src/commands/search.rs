use anyhow::{bail, Result};

use crate::cli::{Cli, SearchArgs};
use super::{open_engine, print_json};

pub fn run(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let engine = open_engine(cli)?;
    match (&args.query, args.page) {
        (Some(query), _) => print_json(&engine.search_parcels(query)?),
        (None, Some(page)) => print_json(&engine.list_parcels(page, args.limit)?),
        (None, None) => bail!("give a query or --page"),
    }
}
