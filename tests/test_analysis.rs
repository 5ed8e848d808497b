use ilp::{
    analysis::{analyze, improvement},
    experiment::ExperimentKind::{self, *},
    render,
    table::{Record, Table},
    workload::Workload::{self, *},
};

fn record(experiment: ExperimentKind, cfg: &str, workload: Workload, ipc: f64, acc: f64) -> Record {
    Record {
        experiment,
        configuration: cfg.to_owned(),
        workload,
        ipc,
        cycles: 1000,
        instructions: (ipc * 1000.0) as u64,
        sim_seconds: 0.001,
        branch_accuracy: acc,
        cache_hit_rate: 0.95,
        l2_hit_rate: 0.5,
        branch_lookups: 2000,
        branch_mispredictions: ((1.0 - acc) * 1000.0).round() as u64,
        fetch_rate: ipc * 1.2,
        decode_rate: ipc * 1.1,
        commit_rate: ipc,
    }
}

fn sample() -> Table {
    let mut t = Table::new();
    for (w, ipc) in [(SimpleLoop, 0.8), (BranchIntensive, 0.4), (ParallelWorkload, 1.0)] {
        t.push(record(BasicPipeline, "default", w, ipc, 0.0));
    }
    for (cfg, scale, acc) in [("none", 1.0, 0.5), ("local", 1.5, 0.8), ("tournament", 2.0, 0.95)] {
        t.push(record(BranchPrediction, cfg, SimpleLoop, 0.5 * scale, acc));
        t.push(record(BranchPrediction, cfg, BranchIntensive, 0.25 * scale, acc - 0.1));
    }
    for (cfg, ipc) in [("1way", 0.9), ("2way", 1.6), ("4way", 2.4), ("8way", 3.2)] {
        t.push(record(Superscalar, cfg, ParallelWorkload, ipc, 0.9));
    }
    t
}

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn improvement_over_baseline() {
    approx(improvement(Some(0.5), 0.75), 50.0);
    approx(improvement(Some(1.0), 0.5), -50.0);
    approx(improvement(Some(0.0), 0.5), 0.0);
    approx(improvement(None, 0.5), 0.0);
}

#[test]
fn basic_pipeline() {
    let report = analyze(&sample());
    let p = report.pipeline.unwrap();
    assert_eq!(p.rows.len(), 3);
    approx(p.average_ipc, (0.8 + 0.4 + 1.0) / 3.0);
    assert_eq!(p.best, (ParallelWorkload, 1.0));
    assert_eq!(p.worst, (BranchIntensive, 0.4));
}

#[test]
fn branch_prediction() {
    let report = analyze(&sample());
    let b = report.branch.unwrap();
    assert_eq!(b.rows.len(), 6);

    let tournament_bi = b
        .rows
        .iter()
        .find(|r| r.predictor == "tournament" && r.workload == BranchIntensive)
        .unwrap();
    approx(tournament_bi.improvement, 100.0);
    assert!(b.rows.iter().filter(|r| r.predictor == "none").all(|r| r.improvement == 0.0));

    let names: Vec<_> = b.averages.iter().map(|a| a.predictor.as_str()).collect();
    assert_eq!(names, vec!["none", "local", "tournament"]);
    approx(b.averages[1].ipc, (0.75 + 0.375) / 2.0);
    approx(b.averages[2].accuracy, (0.95 + 0.85) / 2.0);

    let local_sl = b
        .rows
        .iter()
        .find(|r| r.predictor == "local" && r.workload == SimpleLoop)
        .unwrap();
    assert_eq!((local_sl.lookups, local_sl.mispredictions), (2000, 200));
}

#[test]
fn superscalar() {
    let report = analyze(&sample());
    let s = report.superscalar.unwrap();
    let widths: Vec<_> = s.rows.iter().map(|r| r.width).collect();
    assert_eq!(widths, vec![1, 2, 4, 8]);

    let eight = &s.rows[3];
    approx(eight.efficiency, 0.4);
    approx(eight.scaling, 3.2 / 0.9);
    approx(s.rows[0].scaling, 1.0);
    approx(eight.fetch_rate, 3.2 * 1.2);
    approx(eight.commit_rate, 3.2);
    assert_eq!(s.workloads(), vec![ParallelWorkload]);
}

#[test]
fn scaling_without_baseline() {
    let mut t = Table::new();
    t.push(record(Superscalar, "4way", SimpleLoop, 2.0, 0.9));
    t.push(record(Superscalar, "wide", SimpleLoop, 2.0, 0.9));
    let s = analyze(&t).superscalar.unwrap();
    assert_eq!(s.rows.len(), 1);
    approx(s.rows[0].scaling, 1.0);
    approx(s.rows[0].efficiency, 0.5);
}

#[test]
fn insights() {
    let i = analyze(&sample()).insights;
    let best = i.best.unwrap();
    assert_eq!((best.experiment, best.configuration.as_str()), (Superscalar, "8way"));

    let (none, tournament, gain) = i.tournament_gain.unwrap();
    approx(none, 0.25);
    approx(tournament, 0.5);
    approx(gain, 100.0);

    let (ipc, eff) = i.eight_way_parallel.unwrap();
    approx(ipc, 3.2);
    approx(eff, 0.4);

    assert_eq!(i.workload_ranking[0].0, ParallelWorkload);
    assert_eq!(i.workload_ranking.last().unwrap().0, BranchIntensive);

    let kinds: Vec<_> = i.experiment_averages.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, vec![BasicPipeline, BranchPrediction, Superscalar]);
    approx(i.experiment_averages[0].1, (0.8 + 0.4 + 1.0) / 3.0);
    approx(i.experiment_averages[2].1, (0.9 + 1.6 + 2.4 + 3.2) / 4.0);
}

#[test]
fn experiment_averages_skip_missing_experiments() {
    let mut t = Table::new();
    t.push(record(Superscalar, "2way", SimpleLoop, 1.0, 0.9));
    t.push(record(Superscalar, "4way", SimpleLoop, 2.0, 0.9));
    let i = analyze(&t).insights;
    assert_eq!(i.experiment_averages.len(), 1);
    assert_eq!(i.experiment_averages[0].0, Superscalar);
    approx(i.experiment_averages[0].1, 1.5);
}

#[test]
fn empty_table() {
    let report = analyze(&Table::new());
    assert!(report.pipeline.is_none());
    assert!(report.branch.is_none());
    assert!(report.superscalar.is_none());
    assert!(report.insights.best.is_none());
    assert!(report.insights.experiment_averages.is_empty());
    assert!(report.to_string().contains("No results."));
}

#[test]
fn report_text() {
    let text = analyze(&sample()).to_string();
    assert!(text.contains("BASIC PIPELINE"));
    assert!(text.contains("BRANCH PREDICTION"));
    assert!(text.contains("SUPERSCALAR"));
    assert!(text.contains("Tournament vs no prediction: 100.0% IPC improvement"));
    assert!(text.contains("3.200 IPC (40.0% efficiency)"));

    assert!(text.contains("Average IPC by experiment:"));
    assert!(text.contains("Basic Pipeline    : 0.733"));
    assert!(text.contains("Scaling efficiency summary:"));
    assert!(text.contains("8way: IPC=3.200, Efficiency=40.0%, Scaling=3.56x"));
    assert!(text.contains("| 3.8400 | 3.5200 | 3.2000"));
    assert!(text.contains("|       2000 |          150"));
}

#[test]
fn render_charts() {
    let dir = tempfile::tempdir().unwrap();
    let written = render::render_all(&sample(), dir.path()).unwrap();
    let names: Vec<_> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "ipc_comparison.svg",
            "branch_prediction.svg",
            "branch_improvement.svg",
            "superscalar_scaling.svg",
            "superscalar_efficiency.svg",
            "ipc_heatmap.svg",
        ]
    );
    for path in &written {
        let svg = std::fs::read_to_string(path).unwrap();
        assert!(svg.contains("<svg"));
    }
}

#[test]
fn render_skips_missing_experiments() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = Table::new();
    t.push(record(BasicPipeline, "default", SimpleLoop, 0.8, 0.0));

    let written = render::render_all(&t, dir.path()).unwrap();
    assert_eq!(
        written,
        vec![dir.path().join("ipc_comparison.svg"), dir.path().join("ipc_heatmap.svg")]
    );
    assert!(!dir.path().join("superscalar_scaling.svg").exists());
    assert!(!dir.path().join("branch_improvement.svg").exists());
}

#[test]
fn heatmap_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("heat.svg");
    assert!(render::ipc_heatmap(&sample(), &path).unwrap());

    // One cell per run, each labelled with its IPC.
    let svg = std::fs::read_to_string(&path).unwrap();
    assert!(svg.contains("3.200"));
    assert!(svg.contains("0.375"));
    assert!(svg.matches("<rect").count() >= sample().len());
}

#[test]
fn improvement_chart_handles_losses() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = Table::new();
    t.push(record(BranchPrediction, "none", SimpleLoop, 1.0, 0.5));
    t.push(record(BranchPrediction, "local", SimpleLoop, 0.8, 0.7));
    let path = dir.path().join("imp.svg");
    assert!(render::branch_improvement(&t, &path).unwrap());

    // Only the baseline: nothing to compare.
    let mut t = Table::new();
    t.push(record(BranchPrediction, "none", SimpleLoop, 1.0, 0.5));
    assert!(!render::branch_improvement(&t, &dir.path().join("none.svg")).unwrap());
}
