//! Summaries of the three experiments, computed from the aggregated table.

use std::fmt;

use strum::IntoEnumIterator;

use crate::{
    experiment::{issue_width_of, BranchPredictor, ExperimentKind},
    table::{Record, Table},
    workload::Workload,
};

/// Percentage change of `ipc` over `baseline`; zero without a usable baseline.
pub fn improvement(baseline: Option<f64>, ipc: f64) -> f64 {
    match baseline {
        Some(b) if b > 0.0 => (ipc - b) / b * 100.0,
        _ => 0.0,
    }
}

fn mean(xs: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = xs.fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub rows: Vec<Record>,
    pub average_ipc: f64,
    pub best: (Workload, f64),
    pub worst: (Workload, f64),
}

impl PipelineSummary {
    pub fn new(table: &Table) -> Option<Self> {
        let rows: Vec<Record> = table.filter(ExperimentKind::BasicPipeline).cloned().collect();
        let best = rows.iter().max_by(|a, b| a.ipc.total_cmp(&b.ipc))?;
        let worst = rows.iter().min_by(|a, b| a.ipc.total_cmp(&b.ipc))?;
        Some(Self {
            average_ipc: mean(rows.iter().map(|r| r.ipc)),
            best: (best.workload, best.ipc),
            worst: (worst.workload, worst.ipc),
            rows,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorRow {
    pub predictor: String,
    pub workload: Workload,
    pub ipc: f64,
    pub accuracy: f64,
    pub lookups: u64,
    pub mispredictions: u64,
    /// Percent over the `none` predictor on the same workload.
    pub improvement: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorAverage {
    pub predictor: String,
    pub ipc: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchSummary {
    pub rows: Vec<PredictorRow>,
    pub averages: Vec<PredictorAverage>,
}

impl BranchSummary {
    pub fn new(table: &Table) -> Option<Self> {
        let kind = ExperimentKind::BranchPrediction;
        let baseline_label = BranchPredictor::None.to_string();
        let baseline = |w: Workload| table.find(kind, &baseline_label, w).map(|r| r.ipc);

        let mut rows = Vec::new();
        let mut averages = Vec::new();
        for predictor in table.configurations(kind) {
            let records: Vec<&Record> = table
                .filter(kind)
                .filter(|r| r.configuration == predictor)
                .collect();
            for r in &records {
                rows.push(PredictorRow {
                    predictor: predictor.clone(),
                    workload: r.workload,
                    ipc: r.ipc,
                    accuracy: r.branch_accuracy,
                    lookups: r.branch_lookups,
                    mispredictions: r.branch_mispredictions,
                    improvement: improvement(baseline(r.workload), r.ipc),
                });
            }
            averages.push(PredictorAverage {
                ipc: mean(records.iter().map(|r| r.ipc)),
                accuracy: mean(records.iter().map(|r| r.branch_accuracy)),
                predictor,
            });
        }

        if rows.is_empty() {
            None
        } else {
            Some(Self { rows, averages })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingRow {
    pub configuration: String,
    pub width: u32,
    pub workload: Workload,
    pub ipc: f64,
    /// IPC as a fraction of the issue width.
    pub efficiency: f64,
    /// IPC relative to the 1-way run of the same workload.
    pub scaling: f64,
    pub fetch_rate: f64,
    pub decode_rate: f64,
    pub commit_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingSummary {
    /// Sorted by issue width, then table order.
    pub rows: Vec<ScalingRow>,
}

impl ScalingSummary {
    pub fn new(table: &Table) -> Option<Self> {
        let kind = ExperimentKind::Superscalar;
        let records: Vec<(u32, &Record)> = table
            .filter(kind)
            .filter_map(|r| issue_width_of(&r.configuration).map(|w| (w, r)))
            .collect();

        let baseline = |w: Workload| {
            records
                .iter()
                .find(|(width, r)| *width == 1 && r.workload == w)
                .map(|(_, r)| r.ipc)
                .filter(|ipc| *ipc > 0.0)
        };

        let mut rows: Vec<ScalingRow> = records
            .iter()
            .map(|(width, r)| ScalingRow {
                configuration: r.configuration.clone(),
                width: *width,
                workload: r.workload,
                ipc: r.ipc,
                efficiency: r.ipc / *width as f64,
                scaling: baseline(r.workload).map_or(1.0, |b| r.ipc / b),
                fetch_rate: r.fetch_rate,
                decode_rate: r.decode_rate,
                commit_rate: r.commit_rate,
            })
            .collect();
        rows.sort_by_key(|r| r.width);

        if rows.is_empty() {
            None
        } else {
            Some(Self { rows })
        }
    }

    pub fn for_workload(&self, w: Workload) -> impl Iterator<Item = &ScalingRow> {
        self.rows.iter().filter(move |r| r.workload == w)
    }

    /// Workloads with at least one row, in row order.
    pub fn workloads(&self) -> Vec<Workload> {
        let mut out = Vec::new();
        for r in &self.rows {
            if !out.contains(&r.workload) {
                out.push(r.workload);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub best: Option<Record>,
    /// (no prediction IPC, tournament IPC, percent gain) on the branch-heavy workload.
    pub tournament_gain: Option<(f64, f64, f64)>,
    /// (IPC, efficiency) of the widest standard configuration on the parallel workload.
    pub eight_way_parallel: Option<(f64, f64)>,
    /// Mean IPC per workload across every run, highest first.
    pub workload_ranking: Vec<(Workload, f64)>,
    /// Mean IPC of each experiment that has runs.
    pub experiment_averages: Vec<(ExperimentKind, f64)>,
}

impl Insights {
    pub fn new(table: &Table) -> Self {
        let best = table
            .rows
            .iter()
            .max_by(|a, b| a.ipc.total_cmp(&b.ipc))
            .cloned();

        let bp = ExperimentKind::BranchPrediction;
        let tournament_gain = table
            .find(bp, BranchPredictor::None.as_ref(), Workload::BranchIntensive)
            .zip(table.find(bp, BranchPredictor::Tournament.as_ref(), Workload::BranchIntensive))
            .filter(|(none, _)| none.ipc > 0.0)
            .map(|(none, t)| (none.ipc, t.ipc, improvement(Some(none.ipc), t.ipc)));

        let eight_way_parallel = table
            .find(ExperimentKind::Superscalar, "8way", Workload::ParallelWorkload)
            .map(|r| (r.ipc, r.ipc / 8.0));

        let mut workload_ranking: Vec<(Workload, f64)> = table
            .workloads()
            .into_iter()
            .map(|w| {
                let ipc = mean(table.rows.iter().filter(|r| r.workload == w).map(|r| r.ipc));
                (w, ipc)
            })
            .collect();
        workload_ranking.sort_by(|a, b| b.1.total_cmp(&a.1));

        let experiment_averages = ExperimentKind::iter()
            .filter(|k| table.filter(*k).next().is_some())
            .map(|k| (k, mean(table.filter(k).map(|r| r.ipc))))
            .collect();

        Self {
            best,
            tournament_gain,
            eight_way_parallel,
            workload_ranking,
            experiment_averages,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub pipeline: Option<PipelineSummary>,
    pub branch: Option<BranchSummary>,
    pub superscalar: Option<ScalingSummary>,
    pub insights: Insights,
}

pub fn analyze(table: &Table) -> Report {
    Report {
        pipeline: PipelineSummary::new(table),
        branch: BranchSummary::new(table),
        superscalar: ScalingSummary::new(table),
        insights: Insights::new(table),
    }
}

const RULE: &str = "============================================================";

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "           ILP EXPERIMENT PERFORMANCE ANALYSIS")?;
        writeln!(f, "{RULE}")?;

        if let Some(p) = &self.pipeline {
            writeln!(f, "\nBASIC PIPELINE")?;
            writeln!(f, "{}", "-".repeat(50))?;
            for r in &p.rows {
                writeln!(
                    f,
                    "  {:18}: IPC={:.4}, Cycles={}, Cache Hit={:.1}%",
                    r.workload.as_ref(),
                    r.ipc,
                    r.cycles,
                    r.cache_hit_rate * 100.0
                )?;
            }
            writeln!(f, "\n  Average IPC: {:.4}", p.average_ipc)?;
            writeln!(f, "  Best:  {} (IPC={:.4})", p.best.0, p.best.1)?;
            writeln!(f, "  Worst: {} (IPC={:.4})", p.worst.0, p.worst.1)?;
        }

        if let Some(b) = &self.branch {
            writeln!(f, "\nBRANCH PREDICTION")?;
            writeln!(f, "{}", "-".repeat(50))?;
            writeln!(
                f,
                "  Predictor    | Workload           | IPC    | Accuracy | Improvement | Lookups    | Mispredicted"
            )?;
            for r in &b.rows {
                writeln!(
                    f,
                    "  {:12} | {:18} | {:.4} | {:7.1}% | {:+10.1}% | {:10} | {:12}",
                    r.predictor,
                    r.workload.as_ref(),
                    r.ipc,
                    r.accuracy * 100.0,
                    r.improvement,
                    r.lookups,
                    r.mispredictions
                )?;
            }
            writeln!(f)?;
            for a in &b.averages {
                writeln!(
                    f,
                    "  {:12}: Avg IPC={:.4}, Avg Accuracy={:.1}%",
                    a.predictor,
                    a.ipc,
                    a.accuracy * 100.0
                )?;
            }
        }

        if let Some(s) = &self.superscalar {
            writeln!(f, "\nSUPERSCALAR")?;
            writeln!(f, "{}", "-".repeat(50))?;
            writeln!(
                f,
                "  Width | Workload           | IPC    | Efficiency | Scaling | Fetch  | Decode | Commit"
            )?;
            for r in &s.rows {
                writeln!(
                    f,
                    "  {:5} | {:18} | {:.4} | {:9.1}% | {:6.2}x | {:.4} | {:.4} | {:.4}",
                    r.configuration,
                    r.workload.as_ref(),
                    r.ipc,
                    r.efficiency * 100.0,
                    r.scaling,
                    r.fetch_rate,
                    r.decode_rate,
                    r.commit_rate
                )?;
            }

            writeln!(f, "\nScaling efficiency summary:")?;
            for w in s.workloads() {
                writeln!(f, "  {w}:")?;
                for r in s.for_workload(w) {
                    writeln!(
                        f,
                        "    {}: IPC={:.3}, Efficiency={:.1}%, Scaling={:.2}x",
                        r.configuration,
                        r.ipc,
                        r.efficiency * 100.0,
                        r.scaling
                    )?;
                }
            }
        }

        writeln!(f, "\n{RULE}")?;
        writeln!(f, "                    KEY INSIGHTS")?;
        writeln!(f, "{RULE}")?;

        let i = &self.insights;
        match &i.best {
            Some(best) => {
                writeln!(f, "Best overall: {:.4} IPC", best.ipc)?;
                writeln!(f, "  Configuration: {} - {}", best.experiment, best.configuration)?;
                writeln!(f, "  Workload: {}", best.workload)?;
            }
            None => writeln!(f, "No results.")?,
        }

        if let Some((none, tournament, gain)) = i.tournament_gain {
            writeln!(f, "\nBranch prediction impact:")?;
            writeln!(f, "  Tournament vs no prediction: {gain:.1}% IPC improvement")?;
            writeln!(f, "  On {}: {none:.3} -> {tournament:.3} IPC", Workload::BranchIntensive)?;
        }

        if let Some((ipc, eff)) = i.eight_way_parallel {
            writeln!(f, "\nSuperscalar scaling:")?;
            writeln!(
                f,
                "  8-way {}: {ipc:.3} IPC ({:.1}% efficiency)",
                Workload::ParallelWorkload,
                eff * 100.0
            )?;
        }

        if !i.workload_ranking.is_empty() {
            writeln!(f, "\nAverage IPC by workload:")?;
            for (w, ipc) in &i.workload_ranking {
                writeln!(f, "  {:18}: {ipc:.3}", w.as_ref())?;
            }
        }

        if !i.experiment_averages.is_empty() {
            writeln!(f, "\nAverage IPC by experiment:")?;
            for (k, ipc) in &i.experiment_averages {
                writeln!(f, "  {:18}: {ipc:.3}", k.as_ref())?;
            }
        }

        Ok(())
    }
}
