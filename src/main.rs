use std::{path::PathBuf, time::Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ilp::{
    analysis,
    experiment::{all_experiments, experiment_for, ExperimentKind},
    render,
    simulator::{Gem5, RunSummary},
    table::Table,
    workload::{self, Workload},
    HarnessConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ilp")]
#[command(about = "Drives gem5 ILP experiments and summarizes their statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Harness config file (defaults to ./ilp.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the results directory
    #[arg(short, long, global = true)]
    results_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the simulator with scons
    BuildSim,

    /// Compile the workload programs
    Compile,

    /// Run the simulator for every experiment configuration and workload
    Run {
        /// Only run these experiments (e.g. branch_prediction)
        #[arg(short, long = "experiment")]
        experiments: Vec<ExperimentKind>,

        /// Only run these workloads (e.g. simple_loop)
        #[arg(short, long = "workload")]
        workloads: Vec<Workload>,
    },

    /// Extract stats from the results directory into the summary csv
    Extract {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the analysis report for a summary csv
    Report {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Render charts from a summary csv
    Plot {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Compile, run, extract, report and plot
    All,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = HarnessConfig::load_or_default(cli.config.as_deref())
        .context("failed to load harness config")?;
    if let Some(dir) = cli.results_dir {
        config.results_dir = dir;
    }

    match cli.command {
        Commands::BuildSim => {
            let gem5 = Gem5::build(&config)?;
            println!("simulator built at {}", gem5.binary().display());
        }
        Commands::Compile => {
            for (w, bin) in workload::compile_all(&config)? {
                println!("{:>18}: {}", w.as_ref(), bin.display());
            }
        }
        Commands::Run {
            experiments,
            workloads,
        } => {
            let experiments = if experiments.is_empty() {
                all_experiments()
            } else {
                experiments.into_iter().map(experiment_for).collect()
            };
            let workloads = if workloads.is_empty() {
                Workload::all()
            } else {
                workloads
            };
            run(&config, &experiments, &workloads)?;
        }
        Commands::Extract { output } => {
            let output = output.unwrap_or_else(|| config.summary_csv());
            extract(&config, &output)?;
        }
        Commands::Report { input } => {
            let input = input.unwrap_or_else(|| config.summary_csv());
            report(&input)?;
        }
        Commands::Plot { input, output_dir } => {
            let input = input.unwrap_or_else(|| config.summary_csv());
            let output_dir = output_dir.unwrap_or_else(|| config.results_dir.clone());
            plot(&input, &output_dir)?;
        }
        Commands::All => {
            workload::compile_all(&config)?;
            run(&config, &all_experiments(), &Workload::all())?;
            let csv = config.summary_csv();
            extract(&config, &csv)?;
            report(&csv)?;
            plot(&csv, &config.results_dir)?;
        }
    }

    Ok(())
}

fn run(
    config: &HarnessConfig,
    experiments: &[Box<dyn ilp::experiment::Experiment>],
    workloads: &[Workload],
) -> anyhow::Result<()> {
    let start = Instant::now();
    let gem5 = Gem5::from_config(config);
    let (summary, table) =
        ilp::run_and_aggregate(&gem5, experiments, workloads, config, &config.summary_csv())?;

    print_summary(&summary, start);
    if summary.completed.is_empty() {
        if summary.total() > 0 {
            bail!("all {} simulations failed", summary.total());
        }
        return Ok(());
    }
    println!("  Summary written to {} ({} rows)", config.summary_csv().display(), table.len());
    Ok(())
}

fn print_summary(summary: &RunSummary, start: Instant) {
    println!("    SIMULATIONS COMPLETED");
    println!("    =====================");
    println!("          Runs planned: {}", summary.total());
    println!("        Runs succeeded: {}", summary.completed.len());
    println!("           Runs failed: {}", summary.failed.len());
    for (spec, err) in &summary.failed {
        println!("      {}: {}", spec.name(), err);
    }
    println!("  Harness time elapsed: {:.2}s", start.elapsed().as_secs_f32());
}

fn extract(config: &HarnessConfig, output: &std::path::Path) -> anyhow::Result<()> {
    let table = Table::collect(&config.results_dir)
        .with_context(|| format!("failed to scan {}", config.results_dir.display()))?;
    if table.is_empty() {
        bail!("no experiment data found in {}", config.results_dir.display());
    }
    table.write_csv(output)?;
    println!("{} runs written to {}", table.len(), output.display());
    Ok(())
}

fn report(input: &std::path::Path) -> anyhow::Result<()> {
    let table = Table::read_csv(input)
        .with_context(|| format!("failed to read summary {}", input.display()))?;
    print!("{}", analysis::analyze(&table));
    Ok(())
}

fn plot(input: &std::path::Path, output_dir: &std::path::Path) -> anyhow::Result<()> {
    let table = Table::read_csv(input)
        .with_context(|| format!("failed to read summary {}", input.display()))?;
    for chart in render::render_all(&table, output_dir)? {
        println!("chart saved to {}", chart.display());
    }
    Ok(())
}
