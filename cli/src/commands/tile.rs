use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{Cli, TileArgs};
use super::open_engine;

pub fn run(cli: &Cli, args: &TileArgs) -> Result<()> {
    let engine = open_engine(cli)?;
    let bytes = if args.gzip {
        engine.render_tile_gzip(args.z, args.x, args.y)?
    } else {
        engine.render_tile(args.z, args.x, args.y)?
    };
    info!(z = args.z, x = args.x, y = args.y, bytes = bytes.len(), "tile rendered");

    match &args.output {
        Some(path) => std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}
