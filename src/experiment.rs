use std::str::FromStr;

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, AsRefStr, Display,
)]
pub enum ExperimentKind {
    #[strum(serialize = "Basic Pipeline")]
    BasicPipeline,
    #[strum(serialize = "Branch Prediction")]
    BranchPrediction,
    #[strum(serialize = "Superscalar")]
    Superscalar,
}

impl ExperimentKind {
    /// Name of the results sub-directory for this experiment.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ExperimentKind::BasicPipeline => "basic_pipeline",
            ExperimentKind::BranchPrediction => "branch_prediction",
            ExperimentKind::Superscalar => "superscalar",
        }
    }
}

// Accepts both the display name used in the summary table and the directory name.
impl FromStr for ExperimentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ExperimentKind::iter()
            .find(|k| k.as_ref().eq_ignore_ascii_case(s) || k.dir_name() == s)
            .ok_or_else(|| format!("unknown experiment: '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub label: String,
    pub args: Vec<String>,
}

impl Configuration {
    pub fn new(label: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            label: label.into(),
            args,
        }
    }
}

/// A family of simulator runs sharing one config script.
pub trait Experiment {
    fn kind(&self) -> ExperimentKind;

    /// File name of the simulator config script, relative to the config dir.
    fn script(&self) -> &'static str;

    fn configurations(&self) -> Vec<Configuration>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicPipeline;

impl Experiment for BasicPipeline {
    fn kind(&self) -> ExperimentKind {
        ExperimentKind::BasicPipeline
    }

    fn script(&self) -> &'static str {
        "basic_pipeline.py"
    }

    fn configurations(&self) -> Vec<Configuration> {
        vec![Configuration::new("default", vec![])]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BranchPredictor {
    /// Prediction disabled; the baseline for improvement figures.
    None,
    Local,
    BiMode,
    Tournament,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchPrediction;

impl Experiment for BranchPrediction {
    fn kind(&self) -> ExperimentKind {
        ExperimentKind::BranchPrediction
    }

    fn script(&self) -> &'static str {
        "branch_prediction.py"
    }

    fn configurations(&self) -> Vec<Configuration> {
        BranchPredictor::iter()
            .map(|bp| {
                Configuration::new(bp.as_ref(), vec!["--branch-pred".to_owned(), bp.to_string()])
            })
            .collect()
    }
}

pub const DEFAULT_ISSUE_WIDTHS: [u32; 4] = [1, 2, 4, 8];
pub const DEFAULT_ROB_SIZE: u32 = 192;

#[derive(Debug, Clone)]
pub struct Superscalar {
    pub widths: Vec<u32>,
    pub rob_size: u32,
}

impl Default for Superscalar {
    fn default() -> Self {
        Self {
            widths: DEFAULT_ISSUE_WIDTHS.to_vec(),
            rob_size: DEFAULT_ROB_SIZE,
        }
    }
}

impl Experiment for Superscalar {
    fn kind(&self) -> ExperimentKind {
        ExperimentKind::Superscalar
    }

    fn script(&self) -> &'static str {
        "superscalar.py"
    }

    fn configurations(&self) -> Vec<Configuration> {
        self.widths
            .iter()
            .map(|w| {
                Configuration::new(
                    width_label(*w),
                    vec![
                        "--issue-width".to_owned(),
                        w.to_string(),
                        "--rob-size".to_owned(),
                        self.rob_size.to_string(),
                    ],
                )
            })
            .collect()
    }
}

pub fn width_label(width: u32) -> String {
    format!("{width}way")
}

/// Recovers the issue width from a label such as `4way`.
pub fn issue_width_of(label: &str) -> Option<u32> {
    label.strip_suffix("way")?.parse().ok().filter(|w| *w > 0)
}

pub fn experiment_for(kind: ExperimentKind) -> Box<dyn Experiment> {
    match kind {
        ExperimentKind::BasicPipeline => Box::new(BasicPipeline),
        ExperimentKind::BranchPrediction => Box::new(BranchPrediction),
        ExperimentKind::Superscalar => Box::new(Superscalar::default()),
    }
}

pub fn all_experiments() -> Vec<Box<dyn Experiment>> {
    ExperimentKind::iter().map(experiment_for).collect()
}
