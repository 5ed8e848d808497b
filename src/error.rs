use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("simulator binary not found at {}", .0.display())]
    SimulatorNotFound(PathBuf),

    #[error("failed to compile {workload}: {stderr}")]
    Compile { workload: String, stderr: String },

    #[error("simulator build failed with status {0}")]
    SimulatorBuild(i32),

    #[error("simulation {run} exited with status {status}")]
    Simulation { run: String, status: i32 },

    #[error("simulation {run} produced no stats file at {}", .path.display())]
    MissingStats { run: String, path: PathBuf },

    #[error("csv error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("chart rendering failed: {0}")]
    Render(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Exit code of a finished child process, `-1` if it was killed by a signal.
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
