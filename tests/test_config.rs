use std::path::{Path, PathBuf};

use ilp::{
    experiment::{
        all_experiments, issue_width_of, width_label, BranchPrediction, BranchPredictor,
        Experiment, ExperimentKind, Superscalar,
    },
    workload::Workload,
    Error, HarnessConfig,
};

#[test]
fn empty_file_is_default() {
    let cfg: HarnessConfig = "".parse().unwrap();
    assert_eq!(cfg, HarnessConfig::default());
    assert_eq!(cfg.gem5_binary(), PathBuf::from("gem5/build/X86/gem5.opt"));
    assert_eq!(cfg.cflags, vec!["-O2", "-static"]);
}

#[test]
fn overrides() {
    let cfg: HarnessConfig = r#"
        isa = "ARM"
        cflags = ["-O3"]
        results_dir = "out"
    "#
    .parse()
    .unwrap();
    assert_eq!(cfg.gem5_binary(), PathBuf::from("gem5/build/ARM/gem5.opt"));
    assert_eq!(cfg.cflags, vec!["-O3"]);
    assert_eq!(cfg.summary_csv(), PathBuf::from("out/performance_summary.csv"));
    assert_eq!(cfg.cc, "gcc");
}

#[test]
fn explicit_binary_wins() {
    let cfg: HarnessConfig = "gem5_binary = \"/opt/gem5/gem5.fast\"".parse().unwrap();
    assert_eq!(cfg.gem5_binary(), PathBuf::from("/opt/gem5/gem5.fast"));
}

#[test]
fn unknown_keys_rejected() {
    assert!("gem5 = \"x\"".parse::<HarnessConfig>().is_err());
}

#[test]
fn load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ilp.toml");
    std::fs::write(&path, "build_jobs = 16\n").unwrap();
    let cfg = HarnessConfig::load_or_default(Some(path.as_path())).unwrap();
    assert_eq!(cfg.build_jobs, 16);

    std::fs::write(&path, "build_jobs = \"many\"\n").unwrap();
    assert!(matches!(HarnessConfig::load(&path), Err(Error::Config { .. })));

    let missing = dir.path().join("missing.toml");
    assert!(matches!(
        HarnessConfig::load_or_default(Some(missing.as_path())),
        Err(Error::Io { .. })
    ));
}

#[test]
fn workload_names() {
    assert_eq!(
        Workload::all(),
        vec![
            Workload::SimpleLoop,
            Workload::BranchIntensive,
            Workload::ParallelWorkload
        ]
    );
    assert_eq!("branch_intensive".parse::<Workload>().unwrap(), Workload::BranchIntensive);
    assert!("bogus".parse::<Workload>().is_err());
    assert_eq!(
        Workload::ParallelWorkload.source_path(Path::new("workloads")),
        PathBuf::from("workloads/parallel_workload.c")
    );
    assert_eq!(
        Workload::SimpleLoop.binary_path(Path::new("bin")),
        PathBuf::from("bin/simple_loop")
    );
}

#[test]
fn workload_sources_ship_with_the_crate() {
    for w in Workload::all() {
        assert!(w.source_path(Path::new("workloads")).is_file(), "{w} missing");
    }
}

#[test]
fn experiment_names() {
    for kind in [
        ExperimentKind::BasicPipeline,
        ExperimentKind::BranchPrediction,
        ExperimentKind::Superscalar,
    ] {
        assert_eq!(kind.to_string().parse::<ExperimentKind>().unwrap(), kind);
        assert_eq!(kind.dir_name().parse::<ExperimentKind>().unwrap(), kind);
    }
    assert_eq!(
        "branch prediction".parse::<ExperimentKind>().unwrap(),
        ExperimentKind::BranchPrediction
    );
    assert!("smt".parse::<ExperimentKind>().is_err());

    let kinds: Vec<_> = all_experiments().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ExperimentKind::BasicPipeline,
            ExperimentKind::BranchPrediction,
            ExperimentKind::Superscalar
        ]
    );
}

#[test]
fn branch_prediction_configurations() {
    let cfgs = BranchPrediction.configurations();
    let labels: Vec<_> = cfgs.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["none", "local", "bimode", "tournament"]);
    assert_eq!(cfgs[2].args, vec!["--branch-pred", "bimode"]);
    assert_eq!("bimode".parse::<BranchPredictor>().unwrap(), BranchPredictor::BiMode);
}

#[test]
fn superscalar_configurations() {
    let cfgs = Superscalar::default().configurations();
    let labels: Vec<_> = cfgs.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["1way", "2way", "4way", "8way"]);
    assert_eq!(cfgs[3].args, vec!["--issue-width", "8", "--rob-size", "192"]);

    let custom = Superscalar {
        widths: vec![3],
        rob_size: 64,
    };
    assert_eq!(
        custom.configurations()[0].args,
        vec!["--issue-width", "3", "--rob-size", "64"]
    );

    assert_eq!(issue_width_of(&width_label(16)), Some(16));
    assert_eq!(issue_width_of("4way"), Some(4));
    assert_eq!(issue_width_of("0way"), None);
    assert_eq!(issue_width_of("tournament"), None);
}
