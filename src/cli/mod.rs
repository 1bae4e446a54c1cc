// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code.
//!
//! Only 2 things should be public in this module: `GroundTod` and
//! `GroundTod::run`.

use std::path::PathBuf;

use clap::{AppSettings, Parser};
use log::{debug, info};

use crate::{
    atmosphere::{AirmassEmission, AnalyticAbsorption},
    comm::WorkerGroup,
    config::RunConfig,
    error::GroundTodError,
    pipeline::{run_pipeline, Collaborators},
};

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = "Simulate constant-elevation scans of a ground-based telescope: trajectory, flags, boresight pointing and atmosphere weighting"
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(infer_long_args = true)]
pub struct GroundTod {
    /// The toml file describing the run.
    #[clap(name = "RUN_FILE", parse(from_os_str))]
    run_file: PathBuf,

    /// The number of workers to split the samples between.
    #[clap(short, long, default_value = "1")]
    workers: usize,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,

    /// Only verify that the run file was correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    dry_run: bool,
}

impl GroundTod {
    pub fn run(self) -> Result<(), GroundTodError> {
        setup_logging(self.verbosity).expect("Failed to initialise logging.");
        info!("ground-tod {}", env!("CARGO_PKG_VERSION"));

        let params = RunConfig::read(&self.run_file)?.parse()?;
        info!(
            "Site '{}' (ID {}), {} detectors",
            params.site.name,
            params.site.id,
            params.focalplane.len()
        );
        info!(
            "{} samples at {} Hz from UNIX time {}, elevation {:.2} deg, {} coordinates",
            params.spec.num_samples(),
            params.spec.rate(),
            params.spec.first_time(),
            params.spec.el().to_degrees(),
            params.spec.coord()
        );
        if let Some(hwp) = &params.hwp {
            info!("Half-wave plate: {hwp:?}");
        }
        if let Some(atm) = &params.atmosphere {
            info!(
                "Atmosphere weighting at {} GHz, realization {}",
                atm.freq_ghz, atm.realization
            );
        }
        if self.dry_run {
            info!("Dry run; stopping here.");
            return Ok(());
        }

        let group = WorkerGroup::new(self.workers)?;
        let collaborators = Collaborators {
            turbulence: Some(&AirmassEmission),
            absorption: Some(&AnalyticAbsorption),
        };
        let summaries = group.run(|comm| run_pipeline(comm, &params, collaborators, false))?;
        for (rank, summary) in summaries.iter().enumerate() {
            debug!(
                "Worker {rank}: samples {}..{}",
                summary.range.offset,
                summary.range.end()
            );
        }
        if let Some(summary) = summaries.first() {
            for (det, factor) in &summary.factors {
                info!("{det}: absorption {factor:.6}");
            }
        }

        info!("ground-tod complete.");
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()?;

    Ok(())
}
