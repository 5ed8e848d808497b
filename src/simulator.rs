use std::{
    fs::File,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::{debug, info, warn};

use crate::{
    config::HarnessConfig,
    error::{exit_code, Error, Result},
    experiment::{Experiment, ExperimentKind},
    workload::Workload,
};

pub const STATS_FILE: &str = "stats.txt";

/// A single (configuration, workload) simulator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub experiment: ExperimentKind,
    pub configuration: String,
    pub workload: Workload,
    pub script: PathBuf,
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub out_dir: PathBuf,
}

impl RunSpec {
    pub fn stats_path(&self) -> PathBuf {
        self.out_dir.join(STATS_FILE)
    }

    pub fn name(&self) -> String {
        format!(
            "{}/{}/{}",
            self.experiment.dir_name(),
            self.configuration,
            self.workload
        )
    }
}

/// Results directory of one run: `<results>/<experiment>/<configuration>/<workload>`.
pub fn run_dir(results: &Path, kind: ExperimentKind, configuration: &str, w: Workload) -> PathBuf {
    results
        .join(kind.dir_name())
        .join(configuration)
        .join(w.as_ref())
}

pub trait Simulator {
    /// Runs the simulation and returns the path of its stats file.
    fn simulate(&self, spec: &RunSpec) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct Gem5 {
    binary: PathBuf,
}

impl Gem5 {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.gem5_binary())
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn command(&self, spec: &RunSpec) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(format!("--outdir={}", spec.out_dir.display()))
            .arg(&spec.script)
            .arg(&spec.binary)
            .args(&spec.args);
        cmd
    }

    /// Builds the simulator with scons inside the gem5 checkout.
    pub fn build(config: &HarnessConfig) -> Result<Self> {
        let scons = which::which("scons").map_err(|_| Error::ToolNotFound("scons".to_owned()))?;
        let target = format!("build/{}/gem5.opt", config.isa);

        let mut cmd = Command::new(scons);
        cmd.current_dir(&config.gem5_dir)
            .arg(&target)
            .arg(format!("-j{}", config.build_jobs.max(1)));
        info!(dir = %config.gem5_dir.display(), %target, "building simulator");

        let status = cmd.status().map_err(|e| Error::io(&config.gem5_dir, e))?;
        if !status.success() {
            return Err(Error::SimulatorBuild(exit_code(status)));
        }
        Ok(Self::from_config(config))
    }
}

impl Simulator for Gem5 {
    fn simulate(&self, spec: &RunSpec) -> Result<PathBuf> {
        if !self.binary.is_file() {
            return Err(Error::SimulatorNotFound(self.binary.clone()));
        }
        std::fs::create_dir_all(&spec.out_dir).map_err(|e| Error::io(&spec.out_dir, e))?;

        let simout = spec.out_dir.join("simout");
        let simerr = spec.out_dir.join("simerr");
        let stdout = File::create(&simout).map_err(|e| Error::io(&simout, e))?;
        let stderr = File::create(&simerr).map_err(|e| Error::io(&simerr, e))?;

        let mut cmd = self.command(spec);
        cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
        debug!(?cmd, "launching simulator");

        let status = cmd.status().map_err(|e| Error::io(&self.binary, e))?;
        if !status.success() {
            return Err(Error::Simulation {
                run: spec.name(),
                status: exit_code(status),
            });
        }

        let stats = spec.stats_path();
        if !stats.is_file() {
            return Err(Error::MissingStats {
                run: spec.name(),
                path: stats,
            });
        }
        Ok(stats)
    }
}

/// Every (experiment, configuration, workload) triple, in a stable order.
pub fn plan(
    experiments: &[Box<dyn Experiment>],
    workloads: &[Workload],
    config: &HarnessConfig,
) -> Vec<RunSpec> {
    let mut runs = Vec::new();
    for exp in experiments {
        let kind = exp.kind();
        let script = config.config_dir.join(exp.script());
        for cfg in exp.configurations() {
            for &w in workloads {
                runs.push(RunSpec {
                    experiment: kind,
                    configuration: cfg.label.clone(),
                    workload: w,
                    script: script.clone(),
                    binary: w.binary_path(&config.build_dir),
                    args: cfg.args.clone(),
                    out_dir: run_dir(&config.results_dir, kind, &cfg.label, w),
                });
            }
        }
    }
    runs
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<(RunSpec, PathBuf)>,
    pub failed: Vec<(RunSpec, Error)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Runs the plan in order. A failing run is recorded and does not stop the rest.
pub fn run_all<S: Simulator + ?Sized>(sim: &S, plan: Vec<RunSpec>) -> RunSummary {
    let mut summary = RunSummary::default();
    let total = plan.len();

    for (i, spec) in plan.into_iter().enumerate() {
        info!(run = %spec.name(), "[{}/{}] simulating", i + 1, total);
        match sim.simulate(&spec) {
            Ok(stats) => summary.completed.push((spec, stats)),
            Err(e) => {
                warn!(run = %spec.name(), error = %e, "run failed");
                summary.failed.push((spec, e));
            }
        }
    }

    summary
}
