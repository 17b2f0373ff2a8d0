use clap::{Parser, Subcommand};

use self::{evolve::EvolveArg, params::ParamsArg, render::RenderArg};

mod evolve;
mod params;
mod render;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve polygons toward a target image
    Evolve(#[clap(flatten)] EvolveArg),
    /// Render the best organism of a saved checkpoint
    Render(#[clap(flatten)] RenderArg),
    /// Print the default evolution parameters as JSON
    Params(#[clap(flatten)] ParamsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Evolve(arg) => evolve::run(&arg)?,
        Mode::Render(arg) => render::run(&arg)?,
        Mode::Params(arg) => params::run(&arg)?,
    }
    Ok(())
}
