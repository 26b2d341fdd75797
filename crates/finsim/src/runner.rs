//! Load, simulate and report a set of scenario files

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{WrapErr, bail};
use finsim_core::{ProfileFactory, simulate_batch};
use tracing::info;

use crate::report::{ReportFormat, write_report};
use crate::scenario::load_scenario;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub scenarios: Vec<PathBuf>,
    /// A file for a single scenario or a directory for several. Stdout if unset.
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
}

pub fn run(options: &RunOptions) -> color_eyre::Result<()> {
    if options.scenarios.len() > 1 && options.output.is_none() {
        bail!("writing several reports requires --output <DIR>");
    }

    let configs = options
        .scenarios
        .iter()
        .map(|path| load_scenario(path))
        .collect::<color_eyre::Result<Vec<_>>>()?;

    let factory = ProfileFactory::standard();
    let results = simulate_batch(&configs, &factory);

    for (path, result) in options.scenarios.iter().zip(results) {
        let history =
            result.wrap_err_with(|| format!("simulation of {} failed", path.display()))?;
        info!(
            scenario = %path.display(),
            snapshots = history.len(),
            "simulation finished"
        );

        match report_path(options, path)? {
            Some(target) => {
                let file = File::create(&target)
                    .wrap_err_with(|| format!("failed to create {}", target.display()))?;
                let mut writer = BufWriter::new(file);
                write_report(&history, options.format, &mut writer)?;
                writer.flush()?;
                info!(path = %target.display(), "report written");
            }
            None => {
                let mut stdout = io::stdout().lock();
                write_report(&history, options.format, &mut stdout)?;
                stdout.flush()?;
            }
        }
    }
    Ok(())
}

/// Where the report for `scenario` goes, or `None` for stdout
fn report_path(options: &RunOptions, scenario: &Path) -> color_eyre::Result<Option<PathBuf>> {
    let Some(output) = &options.output else {
        return Ok(None);
    };
    let into_dir = options.scenarios.len() > 1 || output.is_dir();
    if !into_dir {
        return Ok(Some(output.clone()));
    }

    fs::create_dir_all(output)
        .wrap_err_with(|| format!("failed to create directory {}", output.display()))?;
    let stem = scenario
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scenario".to_string());
    Ok(Some(
        output.join(format!("{stem}.{}", options.format.extension())),
    ))
}
