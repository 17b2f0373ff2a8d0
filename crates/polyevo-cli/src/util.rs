use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use polyevo_engine::{EvolutionParams, PixelBuffer};
use serde::{Serialize, de::DeserializeOwned};

use crate::model::checkpoint::Checkpoint;

/// Pretty-prints `value` to stdout.
pub fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: Serialize,
{
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON to stdout")?;
    writeln!(stdout).context("Failed to write JSON to stdout")?;
    Ok(())
}

/// Pretty-prints `value` into `path`.
///
/// The JSON goes to a sibling `.tmp` file first and is renamed over `path` once it
/// is on disk, so an interrupted run leaves the previous checkpoint intact.
pub fn write_json_file<T, P>(value: &T, path: P) -> anyhow::Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let staging = staging_path(path);
    let file = File::create(&staging)
        .with_context(|| format!("Failed to create output file: {}", staging.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {}", staging.display()))?;
    writeln!(writer)
        .and_then(|()| writer.into_inner().map_err(io::IntoInnerError::into_error))
        .and_then(|file| file.sync_all())
        .with_context(|| format!("Failed to flush output to {}", staging.display()))?;

    fs::rename(&staging, path).with_context(|| {
        format!(
            "Failed to move {} into place at {}",
            staging.display(),
            path.display()
        )
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_owned();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Parses a JSON file; `what` names the file in error messages.
fn read_json_file<T>(what: &str, path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {what} JSON file: {}", path.display()))
}

/// Read evolution parameters from a JSON file
///
/// Missing fields fall back to [`EvolutionParams::default`].
pub fn read_params_file<P>(path: P) -> anyhow::Result<EvolutionParams>
where
    P: AsRef<Path>,
{
    read_json_file("params", path.as_ref())
}

pub fn read_checkpoint_file<P>(path: P) -> anyhow::Result<Checkpoint>
where
    P: AsRef<Path>,
{
    read_json_file("checkpoint", path.as_ref())
}

pub fn read_png_file<P>(path: P) -> anyhow::Result<PixelBuffer>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    polyevo_raster::load_png(path)
        .with_context(|| format!("Failed to read target image: {}", path.display()))
}

pub fn write_png_file<P>(image: &PixelBuffer, path: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    polyevo_raster::save_png(image, path)
        .with_context(|| format!("Failed to write image: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("polyevo-cli-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_staging_path_is_a_sibling() {
        assert_eq!(
            staging_path(Path::new("out/snapshot.json")),
            Path::new("out/snapshot.json.tmp")
        );
    }

    #[test]
    fn test_write_replaces_previous_file() {
        let dir = scratch_dir("write-json");
        let path = dir.join("params.json");

        let mut params = EvolutionParams::default();
        write_json_file(&params, &path).unwrap();
        params.population_size = 12;
        write_json_file(&params, &path).unwrap();

        let read = read_params_file(&path).unwrap();
        assert_eq!(read.population_size, 12);
        assert!(!staging_path(&path).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_params_file() {
        let err = read_params_file("/nonexistent/params.json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to open params file: /nonexistent/params.json"
        );
    }

    #[test]
    fn test_malformed_checkpoint_file() {
        let dir = scratch_dir("bad-checkpoint");
        let path = dir.join("snapshot.json");
        fs::write(&path, "{\"seed\": 1}").unwrap();
        let err = read_checkpoint_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse checkpoint JSON file"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
