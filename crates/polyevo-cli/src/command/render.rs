use std::path::PathBuf;

use anyhow::Context;
use polyevo_raster::SoftwareRasterizer;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RenderArg {
    /// Checkpoint written by `evolve`
    #[arg(long)]
    snapshot: PathBuf,
    /// Output width in pixels (defaults to the target's width)
    #[arg(long)]
    width: Option<u32>,
    /// Output height in pixels (defaults to the target's height)
    #[arg(long)]
    height: Option<u32>,
    /// Output PNG path
    #[arg(long)]
    output: PathBuf,
    /// Render hard polygon edges
    #[arg(long)]
    no_anti_alias: bool,
}

pub(crate) fn run(arg: &RenderArg) -> anyhow::Result<()> {
    let RenderArg {
        snapshot,
        width,
        height,
        output,
        no_anti_alias,
    } = arg;

    let checkpoint = util::read_checkpoint_file(snapshot)?;
    let genome = checkpoint
        .best_genome()
        .with_context(|| format!("Checkpoint holds no organisms: {}", snapshot.display()))?;
    let target = checkpoint.snapshot.target;
    let width = width.unwrap_or(target.width);
    let height = height.unwrap_or(target.height);

    let rasterizer = SoftwareRasterizer::new(!no_anti_alias);
    let pixmap = rasterizer
        .render(genome, width, height)
        .context("Failed to render best organism")?;
    let image = polyevo_raster::to_pixel_buffer(&pixmap)?;
    util::write_png_file(&image, output)?;

    eprintln!("Rendered {} polygons at {width}x{height}", genome.len());
    eprintln!("  Path: {}", output.display());
    Ok(())
}
