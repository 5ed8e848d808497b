use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    experiment::{experiment_for, Experiment, ExperimentKind},
    simulator::STATS_FILE,
    stats::Stats,
    workload::Workload,
};

/// One row of the performance summary: the headline numbers of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Experiment", with = "by_name")]
    pub experiment: ExperimentKind,
    #[serde(rename = "Configuration")]
    pub configuration: String,
    #[serde(rename = "Workload", with = "by_name")]
    pub workload: Workload,
    #[serde(rename = "IPC")]
    pub ipc: f64,
    #[serde(rename = "Cycles")]
    pub cycles: u64,
    #[serde(rename = "Instructions")]
    pub instructions: u64,
    #[serde(rename = "Sim_Seconds")]
    pub sim_seconds: f64,
    #[serde(rename = "Branch_Accuracy")]
    pub branch_accuracy: f64,
    /// L1 data cache.
    #[serde(rename = "Cache_Hit_Rate")]
    pub cache_hit_rate: f64,
    #[serde(rename = "L2_Hit_Rate")]
    pub l2_hit_rate: f64,
    #[serde(rename = "Branch_Lookups")]
    pub branch_lookups: u64,
    /// Mispredicted conditional branches.
    #[serde(rename = "Branch_Mispredictions")]
    pub branch_mispredictions: u64,
    // Per-cycle stage throughput, only dumped by the O3 model.
    #[serde(rename = "Fetch_Rate")]
    pub fetch_rate: f64,
    #[serde(rename = "Decode_Rate")]
    pub decode_rate: f64,
    #[serde(rename = "Commit_Rate")]
    pub commit_rate: f64,
}

impl Record {
    pub fn from_stats(
        experiment: ExperimentKind,
        configuration: impl Into<String>,
        workload: Workload,
        stats: &Stats,
    ) -> Self {
        Self {
            experiment,
            configuration: configuration.into(),
            workload,
            ipc: stats.get_or_zero("ipc"),
            cycles: stats.get_or_zero("numCycles") as u64,
            instructions: stats.get_or_zero("committedInsts") as u64,
            sim_seconds: stats.get_or_zero("sim_seconds"),
            branch_accuracy: stats.get_or_zero("branch_accuracy"),
            cache_hit_rate: stats.get_or_zero("dcache_hit_rate"),
            l2_hit_rate: stats.get_or_zero("l2cache_hit_rate"),
            branch_lookups: stats.get_or_zero("branch_lookups") as u64,
            branch_mispredictions: stats.get_or_zero("branch_condIncorrect") as u64,
            fetch_rate: stats.get_or_zero("fetch_rate"),
            decode_rate: stats.get_or_zero("decode_rate"),
            commit_rate: stats.get_or_zero("commit_rate"),
        }
    }
}

// Experiments and workloads are stored by their names in the csv.
mod by_name {
    use std::{fmt::Display, result::Result, str::FromStr};

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: AsRef<str>, S: Serializer>(v: &T, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(v.as_ref())
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Walks `<results>/<experiment>/<configuration>/<workload>/stats.txt`.
    /// Runs whose dump yields no metrics are left out.
    pub fn collect(results_dir: &Path) -> Result<Self> {
        let mut table = Table::new();

        for kind in ExperimentKind::iter() {
            let exp_dir = results_dir.join(kind.dir_name());
            if !exp_dir.is_dir() {
                debug!(dir = %exp_dir.display(), "no results for experiment");
                continue;
            }

            for cfg_dir in sorted_configurations(kind, &exp_dir)? {
                let label = file_name(&cfg_dir);
                for wl_dir in subdirs(&cfg_dir)? {
                    let name = file_name(&wl_dir);
                    let Ok(workload) = name.parse::<Workload>() else {
                        debug!(dir = %wl_dir.display(), "skipping unknown workload");
                        continue;
                    };

                    let stats = Stats::from_file(&wl_dir.join(STATS_FILE))?;
                    if stats.is_empty() {
                        warn!(dir = %wl_dir.display(), "no metrics extracted, skipping run");
                        continue;
                    }
                    table.push(Record::from_stats(kind, label.clone(), workload, &stats));
                }
            }
        }

        info!(rows = table.len(), dir = %results_dir.display(), "collected results");
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let mut wtr = csv::Writer::from_path(path).map_err(|e| Error::csv(path, e))?;
        for row in &self.rows {
            wtr.serialize(row).map_err(|e| Error::csv(path, e))?;
        }
        wtr.flush().map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path).map_err(|e| Error::csv(path, e))?;
        let rows = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<Record>, _>>()
            .map_err(|e| Error::csv(path, e))?;
        Ok(Self { rows })
    }

    pub fn filter(&self, kind: ExperimentKind) -> impl Iterator<Item = &Record> {
        self.rows.iter().filter(move |r| r.experiment == kind)
    }

    /// Workloads present in the table, in first-seen order.
    pub fn workloads(&self) -> Vec<Workload> {
        let mut out = Vec::new();
        for r in &self.rows {
            if !out.contains(&r.workload) {
                out.push(r.workload);
            }
        }
        out
    }

    /// Configuration labels of one experiment, in first-seen order.
    pub fn configurations(&self, kind: ExperimentKind) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in self.filter(kind) {
            if !out.contains(&r.configuration) {
                out.push(r.configuration.clone());
            }
        }
        out
    }

    pub fn find(&self, kind: ExperimentKind, configuration: &str, w: Workload) -> Option<&Record> {
        self.filter(kind)
            .find(|r| r.configuration == configuration && r.workload == w)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

// Known configurations keep the experiment's own order (1way before 16way), the rest follow.
fn sorted_configurations(kind: ExperimentKind, exp_dir: &Path) -> Result<Vec<PathBuf>> {
    let known: Vec<String> = experiment_for(kind)
        .configurations()
        .into_iter()
        .map(|c| c.label)
        .collect();
    let mut dirs = subdirs(exp_dir)?;
    dirs.sort_by_key(|d| {
        let name = file_name(d);
        let pos = known.iter().position(|k| *k == name).unwrap_or(known.len());
        (pos, name)
    });
    Ok(dirs)
}
