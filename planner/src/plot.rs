//! HTML chart of a capital trajectory (feature `plot`).

use std::path::Path;

use plotly::common::{DashType, Line, Mode, Title};
use plotly::{Layout, Plot, Scatter};

use portfolio_prep::CapitalTrajectory;

use crate::error::Result;

/// Write planned and real capital as two line traces to `path`.
pub fn write_html(trajectory: &CapitalTrajectory, path: &Path, title: &str) -> Result<()> {
    let (planned_x, planned_y): (Vec<String>, Vec<f64>) = trajectory
        .points
        .iter()
        .filter_map(|p| p.planned.map(|v| (p.date.to_string(), v)))
        .unzip();
    let (real_x, real_y): (Vec<String>, Vec<f64>) = trajectory
        .points
        .iter()
        .filter_map(|p| p.real.map(|v| (p.date.to_string(), v)))
        .unzip();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(planned_x, planned_y)
            .name("Planned")
            .mode(Mode::Lines)
            .line(Line::new().color("#1f77b4")),
    );
    plot.add_trace(
        Scatter::new(real_x, real_y)
            .name("Real")
            .mode(Mode::Lines)
            .line(Line::new().color("#d62728").dash(DashType::Dash)),
    );
    plot.set_layout(Layout::new().title(Title::from(title)));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, plot.to_html())?;
    Ok(())
}
