use std::path::Path;

use experiment::Experiment;
use simulator::{RunSummary, Simulator};
use table::Table;
use workload::Workload;

pub mod analysis;
pub mod config;
pub mod error;
pub mod experiment;
pub mod render;
pub mod simulator;
pub mod stats;
pub mod table;
pub mod workload;

pub use config::HarnessConfig;
pub use error::{Error, Result};

/// Runs every planned simulation, then rebuilds the summary table from everything
/// under the results directory, so earlier runs of other experiments stay in `csv`.
/// The csv is left untouched when no simulation completed.
pub fn run_and_aggregate<S: Simulator + ?Sized>(
    sim: &S,
    experiments: &[Box<dyn Experiment>],
    workloads: &[Workload],
    config: &HarnessConfig,
    csv: &Path,
) -> Result<(RunSummary, Table)> {
    let plan = simulator::plan(experiments, workloads, config);
    let summary = simulator::run_all(sim, plan);
    let table = Table::collect(&config.results_dir)?;
    if !summary.completed.is_empty() {
        table.write_csv(csv)?;
    }
    Ok((summary, table))
}
