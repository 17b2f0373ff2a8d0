use std::path::PathBuf;

use polyevo_engine::EvolutionParams;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ParamsArg {
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ParamsArg) -> anyhow::Result<()> {
    let params = EvolutionParams::default();
    match &arg.output {
        Some(path) => util::write_json_file(&params, path),
        None => util::print_json(&params),
    }
}
