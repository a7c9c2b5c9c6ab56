use anyhow::Result;

use crate::cli::{Cli, LookupArgs};
use super::{open_engine, print_json};

pub fn run(cli: &Cli, args: &LookupArgs) -> Result<()> {
    let engine = open_engine(cli)?;
    print_json(&engine.resolve_context_by_lr_no(&args.lr_no)?)
}
