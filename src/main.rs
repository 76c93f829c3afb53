#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::similar_names, clippy::cast_possible_truncation)]

use anyhow::{Context, Result};
use log::info;
use minhs::{hgr, report::Settings, solve, Instance, SolverError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

/// The JSON instance format used when `--hgr` is not given: a plain vertex
/// count plus an edge list, both 0-based.
#[derive(Debug, Deserialize)]
struct JsonInstance {
    num_vertices: usize,
    edges: Vec<Vec<usize>>,
}

#[derive(Debug, Serialize)]
struct SolutionFile {
    hitting_set: Vec<usize>,
    size: usize,
}

#[derive(Debug, StructOpt)]
#[structopt(name = "minhs", about = "An exact branch-and-bound solver for minimum hitting set")]
enum Opt {
    /// Solve a hitting set instance.
    Solve {
        /// Path to the instance file.
        input_path: PathBuf,

        /// Path to a JSON settings file.
        config_path: PathBuf,

        /// Where to write the found hitting set, as JSON.
        #[structopt(long)]
        solution: Option<PathBuf>,

        /// Where to write the full solve report, as JSON.
        #[structopt(long)]
        report: Option<PathBuf>,

        /// Parse `input_path` as a `.hgr` hypergraph file instead of JSON.
        #[structopt(long)]
        hgr: bool,
    },
}

fn load_instance(input_path: &PathBuf, as_hgr: bool) -> Result<Instance, SolverError> {
    let file = File::open(input_path)
        .map_err(|err| SolverError::Input(format!("cannot open {}: {}", input_path.display(), err)))?;
    let reader = BufReader::new(file);

    if as_hgr {
        hgr::read(reader)
    } else {
        let parsed: JsonInstance = serde_json::from_reader(reader)
            .map_err(|err| SolverError::Input(format!("malformed instance JSON: {}", err)))?;
        Instance::new(parsed.num_vertices, parsed.edges)
    }
}

fn load_settings(config_path: &PathBuf) -> Result<Settings, SolverError> {
    let file = File::open(config_path)
        .map_err(|err| SolverError::Config(format!("cannot open {}: {}", config_path.display(), err)))?;
    let settings: Settings = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| SolverError::Config(format!("malformed settings JSON: {}", err)))?;
    settings.validate()?;
    Ok(settings)
}

fn write_json(path: &PathBuf, value: &impl Serialize) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))
}

fn run() -> Result<i32, SolverError> {
    let Opt::Solve {
        input_path,
        config_path,
        solution,
        report,
        hgr,
    } = Opt::from_args();

    let instance_name = input_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_path.display().to_string());

    let instance = load_instance(&input_path, hgr)?;
    let settings = load_settings(&config_path)?;

    info!(
        "Solving {} ({} vertices, {} edges)",
        instance_name,
        instance.num_nodes(),
        instance.num_edges()
    );

    let (hitting_set, report_data) = solve(instance, instance_name, settings)?;
    info!(
        "Found hitting set of size {} (proved optimal: {})",
        hitting_set.len(),
        report_data.proved_optimal
    );

    if let Some(path) = &solution {
        let solution_file = SolutionFile {
            size: hitting_set.len(),
            hitting_set,
        };
        write_json(path, &solution_file).map_err(|err| SolverError::Internal(err.to_string()))?;
    }
    if let Some(path) = &report {
        write_json(path, &report_data).map_err(|err| SolverError::Internal(err.to_string()))?;
    }

    Ok(if report_data.proved_optimal { 0 } else { 2 })
}

fn main() {
    env_logger::from_env(env_logger::Env::new().filter_or("MINHS_LOG", "info"))
        .format_timestamp_millis()
        .init();

    match run() {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(err.exit_code());
        }
    }
}

