#![allow(dead_code)]

use std::{cell::RefCell, path::PathBuf};

use ilp::{
    experiment::issue_width_of,
    simulator::{RunSpec, Simulator},
    workload::Workload,
    Error, HarnessConfig, Result,
};

/// Stands in for gem5: writes a canned stats dump whose IPC depends on the configuration.
#[derive(Default)]
pub struct FakeSim {
    pub fail_on: Option<Workload>,
    pub fail_all: bool,
    /// Exits cleanly but leaves an empty dump for this workload.
    pub empty_on: Option<Workload>,
    pub runs: RefCell<Vec<String>>,
}

pub fn fake_ipc(configuration: &str, workload: Workload) -> f64 {
    let base = match configuration {
        "none" => 0.5,
        "local" => 0.8,
        "bimode" => 0.85,
        "tournament" => 0.9,
        label => issue_width_of(label).map_or(0.7, |w| 0.75 * w as f64),
    };
    match workload {
        Workload::SimpleLoop => base,
        Workload::BranchIntensive => base * 0.5,
        Workload::ParallelWorkload => base * 1.25,
    }
}

pub fn fake_stats(ipc: f64) -> String {
    let cycles = 1_000_000u64;
    let insts = (ipc * cycles as f64) as u64;
    format!(
        "---------- Begin Simulation Statistics ----------\n\
         sim_seconds 0.001000 # Number of seconds simulated\n\
         system.cpu.numCycles {cycles} # number of cpu cycles simulated\n\
         system.cpu.committedInsts {insts} # Number of instructions committed\n\
         system.cpu.ipc {ipc:.6} # IPC: Instructions Per Cycle\n\
         system.cpu.branchPred.lookups 1200 # lookups\n\
         system.cpu.branchPred.condPredicted 1000 # predicted\n\
         system.cpu.branchPred.condIncorrect 100 # incorrect\n\
         system.cpu.dcache.overall_hits::total 950 # hits\n\
         system.cpu.dcache.overall_misses::total 50 # misses\n\
         system.cpu.commit.rate {ipc:.6} # committed per cycle\n\
         ---------- End Simulation Statistics   ----------\n"
    )
}

impl Simulator for FakeSim {
    fn simulate(&self, spec: &RunSpec) -> Result<PathBuf> {
        self.runs.borrow_mut().push(spec.name());
        if self.fail_all || self.fail_on == Some(spec.workload) {
            return Err(Error::Simulation {
                run: spec.name(),
                status: 1,
            });
        }

        std::fs::create_dir_all(&spec.out_dir).map_err(|e| Error::io(&spec.out_dir, e))?;
        let path = spec.stats_path();
        let contents = if self.empty_on == Some(spec.workload) {
            String::new()
        } else {
            fake_stats(fake_ipc(&spec.configuration, spec.workload))
        };
        std::fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}

pub fn config_in(dir: &std::path::Path) -> HarnessConfig {
    HarnessConfig {
        results_dir: dir.join("results"),
        build_dir: dir.join("bin"),
        config_dir: dir.join("gem5-configs"),
        ..HarnessConfig::default()
    }
}
