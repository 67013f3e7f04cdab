use std::io::Write;

use crate::distribution::PositionDistribution;
use crate::error::AnalysisError;

pub const SUBPLOTS_PER_ROW: usize = 3;
pub const Y_LABEL: &str = "percentage";
pub const X_LABEL: &str = "rank position";

/// One bar subplot: the percentage of races a driver finished in each rank.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub row: usize,
    pub col: usize,
    /// `percentages[i]` belongs to rank `i + 1`.
    pub percentages: Vec<f64>,
    pub y_label: Option<&'static str>,
    pub x_label: Option<&'static str>,
}

/// Grid of per-driver position histograms sharing both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionFigure {
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    pub ranks: usize,
    /// Shared y-axis maximum across all panels.
    pub y_max: f64,
    pub panels: Vec<Panel>,
}

impl DistributionFigure {
    pub fn from_distribution(dist: &PositionDistribution) -> Self {
        let no_drivers = dist.no_drivers();
        let rows = (no_drivers + SUBPLOTS_PER_ROW - 1) / SUBPLOTS_PER_ROW;

        let panels: Vec<Panel> = dist
            .drivers()
            .iter()
            .enumerate()
            .map(|(idx, initials)| {
                let row = idx / SUBPLOTS_PER_ROW;
                let col = idx % SUBPLOTS_PER_ROW;
                Panel {
                    title: initials.clone(),
                    row,
                    col,
                    percentages: dist.percentages(initials).unwrap_or_default(),
                    y_label: (col == 0).then_some(Y_LABEL),
                    x_label: (row + 1 == rows).then_some(X_LABEL),
                }
            })
            .collect();

        let y_max = panels
            .iter()
            .flat_map(|p| p.percentages.iter().copied())
            .fold(0.0, f64::max);

        Self {
            title: format!("Distribution of final positions ({} simulated races)", dist.runs()),
            rows,
            cols: SUBPLOTS_PER_ROW,
            ranks: no_drivers,
            y_max,
            panels,
        }
    }
}

/// Something that can draw a [`DistributionFigure`].
pub trait PlotBackend {
    fn render(&mut self, figure: &DistributionFigure) -> Result<(), AnalysisError>;
}

/// Renders the figure as horizontal text bars, scaled to the shared maximum.
pub struct TextPlot<W: Write> {
    out: W,
    width: usize,
}

impl<W: Write> TextPlot<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self { out, width: width.max(1) }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PlotBackend for TextPlot<W> {
    fn render(&mut self, figure: &DistributionFigure) -> Result<(), AnalysisError> {
        writeln!(self.out, "{}", figure.title)?;
        for panel in &figure.panels {
            let mut header = format!("\n[{},{}] {}", panel.row + 1, panel.col + 1, panel.title);
            if let Some(label) = panel.y_label {
                header.push_str(&format!("  (y: {})", label));
            }
            if let Some(label) = panel.x_label {
                header.push_str(&format!("  (x: {})", label));
            }
            writeln!(self.out, "{}", header)?;

            for (idx, pct) in panel.percentages.iter().enumerate() {
                let len = if figure.y_max > 0.0 {
                    (pct / figure.y_max * self.width as f64).round() as usize
                } else {
                    0
                };
                writeln!(
                    self.out,
                    "{:>3} |{:<width$}| {:5.1}%",
                    idx + 1,
                    "#".repeat(len),
                    pct,
                    width = self.width
                )?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
