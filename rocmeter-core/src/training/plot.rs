//! ROC curve plots written as JPEG images under the save folder.

use crate::config::PlotConfig;
use crate::error::{MeterError, Result};
use crate::logging::mkdir;
use crate::training::meter::Phase;
use crate::training::roc::roc_curve;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// A plot image on disk and the name it was logged under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPlot {
    pub name: String,
    pub path: PathBuf,
}

/// `ROC_<phase>_<epoch>_<auc to 4 places>`, used for both the file stem and the legend.
pub fn roc_plot_name(phase: &Phase, epoch: usize, roc: f64) -> String {
    format!("ROC_{phase}_{epoch}_{roc:.4}")
}

fn plot_err<E: std::fmt::Display>(err: E) -> MeterError {
    MeterError::plot(err.to_string())
}

/// Draw the ROC curve of `labels`/`scores` against the chance diagonal.
pub fn plot_roc(
    roc: f64,
    labels: &[u8],
    scores: &[f64],
    phase: &Phase,
    epoch: usize,
    folder: &Path,
    config: &PlotConfig,
) -> Result<RenderedPlot> {
    let plot_folder = folder.join(&config.dir_name);
    mkdir(&plot_folder)?;

    let curve = roc_curve(labels, scores)?;
    let name = roc_plot_name(phase, epoch, roc);
    let path = plot_folder.join(format!("{name}.jpg"));

    let points: Vec<(f64, f64)> = curve.points().collect();
    draw_roc(&path, &points, &name, config)?;

    tracing::debug!(path = %path.display(), points = curve.len(), "Wrote ROC plot");
    Ok(RenderedPlot { name, path })
}

fn draw_roc(path: &Path, points: &[(f64, f64)], name: &str, config: &PlotConfig) -> Result<()> {
    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)
        .map_err(plot_err)?;

    let mut mesh = chart.configure_mesh();
    if cfg!(feature = "ttf") {
        mesh.x_desc("False positive rate").y_desc("True positive rate");
    } else {
        // Without a font backend any text draw panics inside plotters.
        mesh.disable_axes().x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(plot_err)?;

    chart
        .draw_series(DashedLineSeries::new(
            vec![(0.0, 0.0), (1.0, 1.0)],
            10,
            6,
            BLUE.stroke_width(1),
        ))
        .map_err(plot_err)?
        .label("diagonal-line")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(points.iter().copied(), RED.stroke_width(2)).point_size(3))
        .map_err(plot_err)?
        .label(name)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    if cfg!(feature = "ttf") {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)
}
