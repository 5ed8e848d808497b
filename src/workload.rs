use std::{
    path::{Path, PathBuf},
    process::Command,
};

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, info};

use crate::{
    config::HarnessConfig,
    error::{Error, Result},
};

/// One of the C programs fed to the simulator.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Workload {
    /// Short dependency chains with masked feedback.
    SimpleLoop,
    /// Mix of predictable, random and data-dependent branches.
    BranchIntensive,
    /// Unrolled loop of independent arithmetic batches.
    ParallelWorkload,
}

impl Workload {
    pub fn all() -> Vec<Workload> {
        Workload::iter().collect()
    }

    pub fn source_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.c", self))
    }

    pub fn binary_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.as_ref())
    }
}

/// Resolves the configured compiler to an absolute path.
pub fn find_compiler(cc: &str) -> Result<PathBuf> {
    which::which(cc).map_err(|_| Error::ToolNotFound(cc.to_owned()))
}

pub fn compile(workload: Workload, config: &HarnessConfig) -> Result<PathBuf> {
    let cc = find_compiler(&config.cc)?;
    let src = workload.source_path(&config.workload_dir);
    let out = workload.binary_path(&config.build_dir);

    std::fs::create_dir_all(&config.build_dir).map_err(|e| Error::io(&config.build_dir, e))?;

    let mut cmd = Command::new(&cc);
    cmd.args(&config.cflags).arg("-o").arg(&out).arg(&src);
    debug!(?cmd, "compiling workload");

    let output = cmd.output().map_err(|e| Error::io(&cc, e))?;
    if !output.status.success() {
        return Err(Error::Compile {
            workload: workload.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    info!(%workload, binary = %out.display(), "compiled");
    Ok(out)
}

pub fn compile_all(config: &HarnessConfig) -> Result<Vec<(Workload, PathBuf)>> {
    Workload::iter()
        .map(|w| compile(w, config).map(|bin| (w, bin)))
        .collect()
}
