//! Chart artifact model
//!
//! [`Chart`] is the renderable snapshot handed to the rendering collaborator.
//! [`PlotState`] is the interpreter-side figure registry behind the `plt`
//! namespace and the figure/axes handles scripts hold.

use quire_table::Cell;
use serde::{Deserialize, Serialize};

/// Mark type of a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Bar,
    BarH,
    Line,
    Scatter,
    Pie,
    Hist,
}

impl TraceKind {
    /// Kind named by a `kind=` argument of a data plot call
    #[must_use]
    pub fn from_plot_kind(kind: &str) -> Option<Self> {
        match kind {
            "bar" => Some(Self::Bar),
            "barh" => Some(Self::BarH),
            "line" => Some(Self::Line),
            "scatter" => Some(Self::Scatter),
            "pie" => Some(Self::Pie),
            "hist" => Some(Self::Hist),
            _ => None,
        }
    }
}

/// One drawn series
///
/// For pies `x` holds the wedge labels, for histograms the left bin edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub kind: TraceKind,
    pub label: Option<String>,
    pub color: Option<String>,
    pub x: Vec<Cell>,
    pub y: Vec<f64>,
}

/// One subplot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartAxes {
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub xticks: Option<Vec<String>>,
    pub legend: bool,
    pub grid: bool,
    pub traces: Vec<Trace>,
}

/// A figure snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: Option<String>,
    /// Width and height in inches, when set
    pub size: Option<[f64; 2]>,
    pub axes: Vec<ChartAxes>,
}

impl Chart {
    /// Total traces over all axes
    #[must_use]
    pub fn trace_count(&self) -> usize {
        self.axes.iter().map(|a| a.traces.len()).sum()
    }

    /// Check if anything was drawn
    #[inline]
    #[must_use]
    pub fn has_traces(&self) -> bool {
        self.trace_count() > 0
    }
}

/// Handle to one axes of one figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct AxesRef {
    pub(crate) figure: usize,
    pub(crate) index: usize,
}

#[derive(Debug, Default)]
struct FigureSlot {
    chart: Chart,
    current_axes: usize,
}

/// Figures created during one execution
#[derive(Debug, Default)]
pub(crate) struct PlotState {
    figures: Vec<FigureSlot>,
    current: Option<usize>,
}

impl PlotState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Open a new figure and make it current
    pub(crate) fn figure(&mut self, size: Option<[f64; 2]>) -> usize {
        self.figures.push(FigureSlot {
            chart: Chart {
                size,
                ..Chart::default()
            },
            current_axes: 0,
        });
        let id = self.figures.len() - 1;
        self.current = Some(id);
        id
    }

    /// Current figure, opened on demand
    pub(crate) fn gcf(&mut self) -> usize {
        match self.current {
            Some(id) => id,
            None => self.figure(None),
        }
    }

    /// Current axes of the current figure, created on demand
    pub(crate) fn gca(&mut self) -> AxesRef {
        let figure = self.gcf();
        self.axes_of(figure)
    }

    /// Current axes of a figure, created on demand
    pub(crate) fn axes_of(&mut self, figure: usize) -> AxesRef {
        let slot = &mut self.figures[figure];
        if slot.chart.axes.is_empty() {
            slot.chart.axes.push(ChartAxes::default());
            slot.current_axes = 0;
        }
        AxesRef {
            figure,
            index: slot.current_axes,
        }
    }

    /// Append a subplot to a figure and make it current
    pub(crate) fn add_axes(&mut self, figure: usize) -> AxesRef {
        let slot = &mut self.figures[figure];
        slot.chart.axes.push(ChartAxes::default());
        slot.current_axes = slot.chart.axes.len() - 1;
        self.current = Some(figure);
        AxesRef {
            figure,
            index: slot.current_axes,
        }
    }

    /// Make an axes (and its figure) current
    pub(crate) fn select(&mut self, axes: AxesRef) {
        if let Some(slot) = self.figures.get_mut(axes.figure) {
            slot.current_axes = axes.index;
            self.current = Some(axes.figure);
        }
    }

    /// Detach the current figure; handles held by the script stay valid
    pub(crate) fn close(&mut self) {
        self.current = None;
    }

    pub(crate) fn current(&self) -> Option<usize> {
        self.current
    }

    pub(crate) fn chart(&self, figure: usize) -> Option<&Chart> {
        self.figures.get(figure).map(|s| &s.chart)
    }

    pub(crate) fn chart_mut(&mut self, figure: usize) -> Option<&mut Chart> {
        self.figures.get_mut(figure).map(|s| &mut s.chart)
    }

    pub(crate) fn axes_mut(&mut self, axes: AxesRef) -> Option<&mut ChartAxes> {
        self.figures
            .get_mut(axes.figure)
            .and_then(|s| s.chart.axes.get_mut(axes.index))
    }
}

/// Histogram of numeric samples into `bins` equal-width bins
///
/// Returns left edges and counts. Non-numeric and empty cells are skipped.
pub(crate) fn histogram(values: &[Cell], bins: usize) -> (Vec<Cell>, Vec<f64>) {
    let samples: Vec<f64> = values
        .iter()
        .filter_map(Cell::as_f64)
        .filter(|v| v.is_finite())
        .collect();
    let bins = bins.max(1);
    if samples.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, lo + 0.5) };
    #[allow(clippy::cast_precision_loss)]
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0.0; bins];
    for v in samples {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let edges = (0..bins)
        .map(|i| Cell::Float(lo + width * i as f64))
        .collect();
    (edges, counts)
}
