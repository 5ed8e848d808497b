//! Static SVG charts of the summary table.

use std::path::{Path, PathBuf};

use plotters::{
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use tracing::{info, warn};

use crate::{
    analysis::{BranchSummary, ScalingSummary},
    error::{Error, Result},
    experiment::{BranchPredictor, ExperimentKind},
    table::Table,
};

const SIZE: (u32, u32) = (1000, 600);

fn render_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

/// One named row of bar heights, one value per category.
type Series = (String, Vec<f64>);

/// Writes every chart the table has data for, returning the files written.
pub fn render_all(table: &Table, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

    let mut written = Vec::new();
    let charts: [(&str, fn(&Table, &Path) -> Result<bool>); 6] = [
        ("ipc_comparison.svg", ipc_comparison),
        ("branch_prediction.svg", branch_prediction),
        ("branch_improvement.svg", branch_improvement),
        ("superscalar_scaling.svg", superscalar_scaling),
        ("superscalar_efficiency.svg", superscalar_efficiency),
        ("ipc_heatmap.svg", ipc_heatmap),
    ];
    for (name, draw) in charts {
        let path = out_dir.join(name);
        if draw(table, &path)? {
            info!(chart = %path.display(), "rendered");
            written.push(path);
        } else {
            warn!(chart = name, "no data, skipped");
        }
    }
    Ok(written)
}

/// IPC of every (experiment, configuration) pair, grouped by workload.
pub fn ipc_comparison(table: &Table, path: &Path) -> Result<bool> {
    let workloads = table.workloads();
    let mut series: Vec<Series> = Vec::new();
    for kind in [
        ExperimentKind::BasicPipeline,
        ExperimentKind::BranchPrediction,
        ExperimentKind::Superscalar,
    ] {
        for cfg in table.configurations(kind) {
            let values = workloads
                .iter()
                .map(|w| table.find(kind, &cfg, *w).map_or(0.0, |r| r.ipc))
                .collect();
            series.push((format!("{} ({})", kind, cfg), values));
        }
    }

    let categories: Vec<String> = workloads.iter().map(|w| w.to_string()).collect();
    grouped_bars(
        path,
        "IPC Comparison Across Experiments and Workloads",
        "Workload",
        "Instructions Per Cycle (IPC)",
        &categories,
        &series,
    )
}

/// Branch prediction accuracy per predictor, grouped by workload.
pub fn branch_prediction(table: &Table, path: &Path) -> Result<bool> {
    let kind = ExperimentKind::BranchPrediction;
    let workloads: Vec<_> = table
        .workloads()
        .into_iter()
        .filter(|w| table.filter(kind).any(|r| r.workload == *w))
        .collect();

    let series: Vec<Series> = table
        .configurations(kind)
        .into_iter()
        .map(|cfg| {
            let values = workloads
                .iter()
                .map(|w| {
                    table
                        .find(kind, &cfg, *w)
                        .map_or(0.0, |r| r.branch_accuracy * 100.0)
                })
                .collect();
            (cfg, values)
        })
        .collect();

    let categories: Vec<String> = workloads.iter().map(|w| w.to_string()).collect();
    grouped_bars(
        path,
        "Branch Prediction Accuracy",
        "Workload",
        "Accuracy (%)",
        &categories,
        &series,
    )
}

/// IPC gain of each predictor over no prediction, grouped by workload.
pub fn branch_improvement(table: &Table, path: &Path) -> Result<bool> {
    let Some(summary) = BranchSummary::new(table) else {
        return Ok(false);
    };
    let baseline = BranchPredictor::None.to_string();

    let mut workloads = Vec::new();
    for r in &summary.rows {
        if !workloads.contains(&r.workload) {
            workloads.push(r.workload);
        }
    }

    let series: Vec<Series> = summary
        .averages
        .iter()
        .map(|a| &a.predictor)
        .filter(|p| **p != baseline)
        .map(|p| {
            let values = workloads
                .iter()
                .map(|w| {
                    summary
                        .rows
                        .iter()
                        .find(|r| r.predictor == *p && r.workload == *w)
                        .map_or(0.0, |r| r.improvement)
                })
                .collect();
            (p.clone(), values)
        })
        .collect();

    let categories: Vec<String> = workloads.iter().map(|w| w.to_string()).collect();
    grouped_bars(
        path,
        "IPC Improvement over No Prediction",
        "Workload",
        "IPC improvement (%)",
        &categories,
        &series,
    )
}

/// IPC against issue width per workload, with the ideal IPC = width line.
pub fn superscalar_scaling(table: &Table, path: &Path) -> Result<bool> {
    let Some(summary) = ScalingSummary::new(table) else {
        return Ok(false);
    };

    let max_width = summary.rows.iter().map(|r| r.width).max().unwrap_or(1) as f64;
    let max_ipc = summary.rows.iter().map(|r| r.ipc).fold(0.0, f64::max);
    let y_max = max_ipc.max(max_width) * 1.1;

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Superscalar Scaling", ("sans-serif", 28).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..max_width + 1.0, 0.0..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Issue width")
        .y_desc("IPC")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(
            [(0.0, 0.0), (max_width, max_width)],
            BLACK.mix(0.4).stroke_width(1),
        ))
        .map_err(render_err)?
        .label("ideal")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.4)));

    for (i, w) in table.workloads().into_iter().enumerate() {
        let points: Vec<(f64, f64)> = summary
            .for_workload(w)
            .map(|r| (r.width as f64, r.ipc))
            .collect();
        if points.is_empty() {
            continue;
        }

        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(render_err)?
            .label(w.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(true)
}

/// IPC as a percentage of the issue width, grouped by width.
pub fn superscalar_efficiency(table: &Table, path: &Path) -> Result<bool> {
    let Some(summary) = ScalingSummary::new(table) else {
        return Ok(false);
    };

    let mut widths: Vec<(u32, String)> = Vec::new();
    for r in &summary.rows {
        if !widths.iter().any(|(w, _)| *w == r.width) {
            widths.push((r.width, r.configuration.clone()));
        }
    }

    let series: Vec<Series> = summary
        .workloads()
        .into_iter()
        .map(|w| {
            let values = widths
                .iter()
                .map(|(width, _)| {
                    summary
                        .for_workload(w)
                        .find(|r| r.width == *width)
                        .map_or(0.0, |r| r.efficiency * 100.0)
                })
                .collect();
            (w.to_string(), values)
        })
        .collect();

    let categories: Vec<String> = widths.into_iter().map(|(_, label)| label).collect();
    grouped_bars(
        path,
        "Superscalar Efficiency",
        "Issue width",
        "Efficiency (% of issue width)",
        &categories,
        &series,
    )
}

/// IPC of every (experiment, configuration) row against every workload column.
pub fn ipc_heatmap(table: &Table, path: &Path) -> Result<bool> {
    let workloads = table.workloads();
    let mut rows: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    for kind in [
        ExperimentKind::BasicPipeline,
        ExperimentKind::BranchPrediction,
        ExperimentKind::Superscalar,
    ] {
        for cfg in table.configurations(kind) {
            let cells = workloads
                .iter()
                .map(|w| table.find(kind, &cfg, *w).map(|r| r.ipc))
                .collect();
            rows.push((format!("{} ({})", kind, cfg), cells));
        }
    }
    if rows.is_empty() || workloads.is_empty() {
        return Ok(false);
    }

    let max_ipc = rows
        .iter()
        .flat_map(|(_, cells)| cells.iter().flatten().copied())
        .fold(0.0, f64::max);
    let (n_cols, n_rows) = (workloads.len(), rows.len());
    let columns: Vec<String> = workloads.iter().map(|w| w.to_string()).collect();
    // First row at the top.
    let row_names: Vec<String> = rows.iter().rev().map(|(name, _)| name.clone()).collect();

    let root = SVGBackend::new(path, (SIZE.0, SIZE.1.max(80 + 40 * n_rows as u32)))
        .into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("IPC Heatmap", ("sans-serif", 28).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(220)
        .build_cartesian_2d(-0.5..n_cols as f64 - 0.5, -0.5..n_rows as f64 - 0.5)
        .map_err(render_err)?;

    let x_label = |x: &f64| category_at(&columns, *x);
    let y_label = |y: &f64| category_at(&row_names, *y);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_cols)
        .y_labels(n_rows)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_desc("Workload")
        .draw()
        .map_err(render_err)?;

    let cells: Vec<(f64, f64, f64)> = rows
        .iter()
        .enumerate()
        .flat_map(|(r, (_, cells))| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(c, ipc)| {
                    ipc.map(|ipc| (c as f64, (n_rows - 1 - r) as f64, ipc))
                })
        })
        .collect();

    chart
        .draw_series(cells.iter().map(|&(x, y, ipc)| {
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                heat(ipc, max_ipc).filled(),
            )
        }))
        .map_err(render_err)?;

    let text = ("sans-serif", 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart
        .draw_series(
            cells
                .iter()
                .map(|&(x, y, ipc)| Text::new(format!("{ipc:.3}"), (x, y), text.clone())),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(true)
}

// Pale yellow at zero to dark red at the highest IPC.
fn heat(ipc: f64, max: f64) -> RGBColor {
    let t = if max > 0.0 { (ipc / max).clamp(0.0, 1.0) } else { 0.0 };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(255.0, 189.0), lerp(255.0, 0.0), lerp(204.0, 38.0))
}

/// Categories sit on integer coordinates; every other tick is left blank.
fn category_at(categories: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < categories.len() {
        categories[i as usize].clone()
    } else {
        String::new()
    }
}

fn grouped_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    categories: &[String],
    series: &[Series],
) -> Result<bool> {
    if categories.is_empty() || series.is_empty() {
        return Ok(false);
    }

    let (y_min, y_max) = series
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .fold((0.0, 0.0), |(lo, hi): (f64, f64), v| (lo.min(v), hi.max(v)));
    let y_max = if y_max > 0.0 { y_max * 1.15 } else { 1.0 };
    let y_min = y_min * 1.15;
    let n = categories.len();
    let bar = 0.8 / series.len() as f64;

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..n as f64 - 0.5, y_min..y_max)
        .map_err(render_err)?;

    let label = |x: &f64| category_at(categories, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label)
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()
        .map_err(render_err)?;

    for (s, (name, values)) in series.iter().enumerate() {
        let color = Palette99::pick(s).to_rgba();
        let bars = values.iter().enumerate().map(|(c, v)| {
            let x0 = c as f64 - 0.4 + s as f64 * bar;
            Rectangle::new([(x0, 0.0), (x0 + bar, *v)], color.filled())
        });
        chart
            .draw_series(bars)
            .map_err(render_err)?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(true)
}
