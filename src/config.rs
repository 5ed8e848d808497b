use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "ilp.toml";

/// Paths and tool settings shared by every stage of the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// gem5 source checkout, used by `build-sim`.
    pub gem5_dir: PathBuf,
    /// Simulator executable. Derived from `gem5_dir` and `isa` when unset.
    pub gem5_binary: Option<PathBuf>,
    pub isa: String,
    /// Directory holding the simulator config scripts.
    pub config_dir: PathBuf,
    pub workload_dir: PathBuf,
    pub build_dir: PathBuf,
    pub results_dir: PathBuf,
    pub cc: String,
    pub cflags: Vec<String>,
    pub build_jobs: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            gem5_dir: PathBuf::from("gem5"),
            gem5_binary: None,
            isa: "X86".to_owned(),
            config_dir: PathBuf::from("gem5-configs"),
            workload_dir: PathBuf::from("workloads"),
            build_dir: PathBuf::from("workloads/bin"),
            results_dir: PathBuf::from("results"),
            cc: "gcc".to_owned(),
            cflags: vec!["-O2".to_owned(), "-static".to_owned()],
            build_jobs: 4,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        contents.parse::<Self>().map_err(|source| Error::Config {
            path: path.to_owned(),
            source,
        })
    }

    /// Loads `path` if given, otherwise `ilp.toml` when it exists, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn gem5_binary(&self) -> PathBuf {
        self.gem5_binary.clone().unwrap_or_else(|| {
            self.gem5_dir
                .join("build")
                .join(&self.isa)
                .join("gem5.opt")
        })
    }

    pub fn summary_csv(&self) -> PathBuf {
        self.results_dir.join("performance_summary.csv")
    }
}

impl std::str::FromStr for HarnessConfig {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        toml::from_str(s)
    }
}
