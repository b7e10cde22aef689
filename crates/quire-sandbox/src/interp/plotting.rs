//! Plotting namespace, figures, axes and data-frame plot accessors
//!
//! Drawing calls append [`Trace`]s to the figure registry; purely visual
//! settings (colors maps, spines, layout, limits) are accepted and dropped.

use super::{Args, Interpreter};
use crate::error::{type_error, FaultResult, RuntimeFault};
use crate::frame::Series;
use crate::plot::{histogram, AxesRef, ChartAxes, Trace, TraceKind};
use crate::value::{Namespace, Value};
use quire_table::Cell;

const PLT_FUNCTIONS: &[&str] = &[
    "figure", "subplots", "subplot", "plot", "bar", "barh", "scatter", "pie", "hist", "title",
    "xlabel", "ylabel", "xticks", "yticks", "legend", "grid", "tight_layout", "show", "close",
    "gca", "gcf", "savefig", "suptitle", "axis", "xlim", "ylim", "text", "annotate", "axhline",
    "axvline", "colorbar", "rc", "subplots_adjust",
];

const FIGURE_METHODS: &[&str] = &[
    "add_subplot", "suptitle", "tight_layout", "savefig", "set_size_inches", "subplots_adjust",
    "gca", "show", "colorbar",
];

const AXES_METHODS: &[&str] = &[
    "plot", "bar", "barh", "scatter", "pie", "hist", "set_title", "set_xlabel", "set_ylabel",
    "set_xticks", "set_xticklabels", "set_yticks", "set_yticklabels", "legend", "grid", "axhline",
    "axvline", "text", "annotate", "set_xlim", "set_ylim", "tick_params", "invert_yaxis",
    "get_figure", "axis", "set",
];

/// Calls that change nothing a chart snapshot records
const COSMETIC_CALLS: &[&str] = &[
    "tight_layout", "show", "savefig", "subplots_adjust", "axis", "xlim", "ylim", "text",
    "annotate", "axhline", "axvline", "colorbar", "rc", "set_xlim", "set_ylim", "tick_params",
    "invert_yaxis", "yticks", "set_yticks", "set_yticklabels",
];

fn figure_size(args: &Args) -> FaultResult<Option<[f64; 2]>> {
    match args.kw("figsize") {
        None | Some(Value::None) => Ok(None),
        Some(Value::Tuple(items)) if items.len() == 2 => {
            let w = items[0].as_f64().ok_or_else(|| type_error("figsize must be numeric"))?;
            let h = items[1].as_f64().ok_or_else(|| type_error("figsize must be numeric"))?;
            Ok(Some([w, h]))
        }
        Some(Value::List(items)) if items.borrow().len() == 2 => {
            let items = items.borrow();
            let w = items[0].as_f64().ok_or_else(|| type_error("figsize must be numeric"))?;
            let h = items[1].as_f64().ok_or_else(|| type_error("figsize must be numeric"))?;
            Ok(Some([w, h]))
        }
        Some(other) => Err(type_error(format!(
            "figsize must be a pair, got '{}'",
            other.type_name()
        ))),
    }
}

fn positions(len: usize) -> Vec<Cell> {
    (0..len)
        .map(|i| Cell::Int(i64::try_from(i).unwrap_or(i64::MAX)))
        .collect()
}

fn to_floats(cells: &[Cell]) -> FaultResult<Vec<f64>> {
    cells
        .iter()
        .map(|c| match c {
            Cell::Empty => Ok(f64::NAN),
            other => other.as_f64().ok_or_else(|| {
                RuntimeFault::Value(format!("could not convert string to float: '{other}'"))
            }),
        })
        .collect()
}

fn text_kw(args: &Args, name: &str) -> Option<String> {
    match args.kw(name) {
        None | Some(Value::None) => None,
        Some(v) => Some(v.to_display()),
    }
}

impl Interpreter<'_> {
    pub(super) fn plot_attr(&mut self, value: &Value, name: &str) -> FaultResult<Value> {
        let known = match value {
            Value::Namespace(Namespace::Plotting) => match name {
                "rcParams" | "style" | "cm" => return Ok(Value::Cosmetic),
                _ => PLT_FUNCTIONS.contains(&name),
            },
            Value::Figure(id) => match name {
                "axes" => {
                    let count = self.plots.chart(*id).map_or(0, |c| c.axes.len());
                    return Ok(Value::list(
                        (0..count)
                            .map(|index| Value::Axes(AxesRef { figure: *id, index }))
                            .collect(),
                    ));
                }
                _ => FIGURE_METHODS.contains(&name),
            },
            Value::Axes(axes) => match name {
                "figure" => return Ok(Value::Figure(axes.figure)),
                "spines" | "xaxis" | "yaxis" | "patches" => return Ok(Value::Cosmetic),
                _ => AXES_METHODS.contains(&name),
            },
            Value::Cosmetic => true,
            _ => false,
        };
        if known {
            Ok(Value::method(value.clone(), name))
        } else {
            Err(RuntimeFault::Attribute {
                type_name: value.type_name().to_string(),
                attr: name.to_string(),
            })
        }
    }

    pub(super) fn call_plot_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &Args,
    ) -> FaultResult<Value> {
        if matches!(receiver, Value::Cosmetic) || COSMETIC_CALLS.contains(&name) {
            return Ok(Value::Cosmetic);
        }
        match name {
            "figure" => {
                let id = self.plots.figure(figure_size(args)?);
                Ok(Value::Figure(id))
            }
            "gcf" => Ok(Value::Figure(self.plots.gcf())),
            "gca" => Ok(Value::Axes(self.target_axes(receiver))),
            "get_figure" => Ok(match receiver {
                Value::Axes(axes) => Value::Figure(axes.figure),
                _ => Value::Figure(self.plots.gcf()),
            }),
            "close" => {
                self.plots.close();
                Ok(Value::None)
            }
            "subplots" => self.subplots(args),
            "subplot" | "add_subplot" => {
                let figure = match receiver {
                    Value::Figure(id) => *id,
                    _ => self.plots.gcf(),
                };
                self.subplot(figure, args)
            }
            "set_size_inches" => {
                let w = args.require(0, "w", name)?.as_f64();
                let h = args.require(1, "h", name)?.as_f64();
                if let (Value::Figure(id), Some(w), Some(h)) = (receiver, w, h) {
                    if let Some(chart) = self.plots.chart_mut(*id) {
                        chart.size = Some([w, h]);
                    }
                }
                Ok(Value::None)
            }
            "suptitle" => {
                let figure = match receiver {
                    Value::Figure(id) => *id,
                    _ => self.plots.gcf(),
                };
                let title = args.text(0, "t");
                if let Some(chart) = self.plots.chart_mut(figure) {
                    chart.title = title;
                }
                Ok(Value::Cosmetic)
            }
            "plot" | "bar" | "barh" | "scatter" | "pie" | "hist" => {
                let axes = self.target_axes(receiver);
                let kind = match name {
                    "plot" => TraceKind::Line,
                    other => TraceKind::from_plot_kind(other)
                        .ok_or_else(|| type_error(format!("unknown plot kind '{other}'")))?,
                };
                let trace = self.trace_from_args(kind, args)?;
                self.push_trace(axes, trace)?;
                Ok(Value::Cosmetic)
            }
            "set" => {
                let axes = self.target_axes(receiver);
                let (title, xlabel, ylabel) =
                    (text_kw(args, "title"), text_kw(args, "xlabel"), text_kw(args, "ylabel"));
                self.with_axes(axes, |a| {
                    a.title = title.or(a.title.take());
                    a.xlabel = xlabel.or(a.xlabel.take());
                    a.ylabel = ylabel.or(a.ylabel.take());
                })?;
                Ok(Value::None)
            }
            "title" | "set_title" | "xlabel" | "set_xlabel" | "ylabel" | "set_ylabel" => {
                let axes = self.target_axes(receiver);
                let text = args.text(0, "label");
                let field = name.trim_start_matches("set_");
                self.with_axes(axes, |a| match field {
                    "title" => a.title = text,
                    "xlabel" => a.xlabel = text,
                    _ => a.ylabel = text,
                })?;
                Ok(Value::Cosmetic)
            }
            "xticks" | "set_xticks" | "set_xticklabels" => {
                let axes = self.target_axes(receiver);
                let labels = if name == "set_xticklabels" {
                    args.get(0, "labels")
                } else {
                    args.get(1, "labels").or_else(|| args.get(0, "ticks"))
                };
                let labels = match labels {
                    None | Some(Value::None) => return Ok(Value::Cosmetic),
                    Some(v) => self
                        .iterate(v)?
                        .iter()
                        .map(Value::to_display)
                        .collect::<Vec<_>>(),
                };
                self.budget.alloc_len(labels.len())?;
                self.with_axes(axes, |a| a.xticks = Some(labels))?;
                Ok(Value::Cosmetic)
            }
            "legend" => {
                let axes = self.target_axes(receiver);
                self.with_axes(axes, |a| a.legend = true)?;
                Ok(Value::Cosmetic)
            }
            "grid" => {
                let axes = self.target_axes(receiver);
                let visible = match args.get(0, "visible") {
                    Some(v) => v.truthy()?,
                    None => true,
                };
                self.with_axes(axes, |a| a.grid = visible)?;
                Ok(Value::None)
            }
            _ => Err(RuntimeFault::Attribute {
                type_name: receiver.type_name().to_string(),
                attr: name.to_string(),
            }),
        }
    }

    /// `df.plot(...)`, `df.plot.bar(...)`, `series.plot(kind="pie")`
    pub(super) fn data_plot(
        &mut self,
        target: &Value,
        kind: Option<&str>,
        args: &Args,
    ) -> FaultResult<Value> {
        let kind_name = match kind {
            Some(k) => k.to_string(),
            None => text_kw(args, "kind").unwrap_or_else(|| "line".to_string()),
        };
        let kind = TraceKind::from_plot_kind(&kind_name)
            .ok_or_else(|| RuntimeFault::Value(format!("{kind_name} is not a valid plot kind")))?;

        let axes = match args.kw("ax") {
            Some(Value::Axes(axes)) => *axes,
            _ => {
                let figure = self.plots.figure(figure_size(args)?);
                self.plots.add_axes(figure)
            }
        };
        let bins = self.bins(args)?;
        let color = text_kw(args, "color");

        let (traces, xlabel) = match target {
            Value::Series(series) => {
                let mut trace = series_trace(kind, series, bins)?;
                trace.color = color;
                (vec![trace], series.index_name.clone())
            }
            Value::Frame(frame) => {
                let frame = frame.borrow();
                let x_name = text_kw(args, "x");
                let x_cells = match &x_name {
                    Some(name) => frame.column(name)?.values,
                    None => frame.index.clone(),
                };
                let y_names: Vec<String> = match args.kw("y") {
                    None | Some(Value::None) => frame
                        .numeric_columns()
                        .into_iter()
                        .filter(|c| Some(c) != x_name.as_ref())
                        .collect(),
                    Some(Value::Str(name)) => vec![name.to_string()],
                    Some(other) => self.iterate(other)?.iter().map(Value::to_display).collect(),
                };
                let mut traces = Vec::with_capacity(y_names.len());
                for name in &y_names {
                    let column = frame.column(name)?;
                    let series = Series::with_index(column.name, x_cells.clone(), column.values);
                    let mut trace = series_trace(kind, &series, bins)?;
                    trace.color.clone_from(&color);
                    traces.push(trace);
                }
                let legend = traces.len() > 1;
                if legend {
                    self.with_axes(axes, |a| a.legend = true)?;
                }
                (traces, x_name.or_else(|| frame.index_name.clone()))
            }
            other => {
                return Err(type_error(format!(
                    "'{}' object has no plot accessor",
                    other.type_name()
                )))
            }
        };

        let title = text_kw(args, "title");
        let xlabel = if matches!(kind, TraceKind::Pie | TraceKind::Hist) {
            None
        } else {
            xlabel
        };
        self.with_axes(axes, |a| {
            if title.is_some() {
                a.title = title;
            }
            if a.xlabel.is_none() {
                a.xlabel = xlabel;
            }
        })?;
        for trace in traces {
            self.push_trace(axes, trace)?;
        }
        Ok(Value::Axes(axes))
    }

    fn target_axes(&mut self, receiver: &Value) -> AxesRef {
        match receiver {
            Value::Axes(axes) => *axes,
            Value::Figure(id) => self.plots.axes_of(*id),
            _ => self.plots.gca(),
        }
    }

    fn with_axes(&mut self, axes: AxesRef, edit: impl FnOnce(&mut ChartAxes)) -> FaultResult<()> {
        let target = self
            .plots
            .axes_mut(axes)
            .ok_or_else(|| RuntimeFault::Value("axes no longer exists".to_string()))?;
        edit(target);
        Ok(())
    }

    fn push_trace(&mut self, axes: AxesRef, trace: Trace) -> FaultResult<()> {
        self.budget.alloc_len(trace.y.len())?;
        self.with_axes(axes, |a| a.traces.push(trace))
    }

    fn bins(&self, args: &Args) -> FaultResult<usize> {
        let bins = args.kw("bins").map_or(Ok(10), Value::as_int)?;
        let bins = usize::try_from(bins.max(1)).unwrap_or(1);
        self.budget.check_len(bins)?;
        Ok(bins)
    }

    fn cells_of(&self, value: &Value) -> FaultResult<Vec<Cell>> {
        match value {
            Value::Series(series) => Ok(series.values.clone()),
            other => {
                let items = self.iterate(other)?;
                self.budget.alloc_len(items.len())?;
                items.iter().map(Value::to_cell).collect()
            }
        }
    }

    fn trace_from_args(&mut self, kind: TraceKind, args: &Args) -> FaultResult<Trace> {
        let first = args.require(0, "x", "plot")?;
        let second = match args.positional.get(1) {
            // plt.plot(y, "o-") passes a format string second
            Some(Value::Str(_)) => None,
            Some(v) => Some(v),
            None => match kind {
                TraceKind::Bar => args.kw("height"),
                TraceKind::BarH => args.kw("width"),
                TraceKind::Line | TraceKind::Scatter => args.kw("y"),
                TraceKind::Pie | TraceKind::Hist => None,
            },
        };

        let (x, y) = match kind {
            TraceKind::Hist => histogram(&self.cells_of(first)?, self.bins(args)?),
            TraceKind::Pie => {
                let values = to_floats(&self.cells_of(first)?)?;
                let labels = match args.kw("labels") {
                    Some(v) if !matches!(v, Value::None) => self.cells_of(v)?,
                    _ => positions(values.len()),
                };
                (labels, values)
            }
            _ => match second {
                Some(y) => (self.cells_of(first)?, to_floats(&self.cells_of(y)?)?),
                None => {
                    let values = to_floats(&self.cells_of(first)?)?;
                    (positions(values.len()), values)
                }
            },
        };
        if x.len() != y.len() {
            return Err(RuntimeFault::Value(format!(
                "x and y must have same first dimension, but have shapes ({},) and ({},)",
                x.len(),
                y.len()
            )));
        }
        Ok(Trace {
            kind,
            label: text_kw(args, "label"),
            color: text_kw(args, "color"),
            x,
            y,
        })
    }

    fn subplots(&mut self, args: &Args) -> FaultResult<Value> {
        let nrows = args.get(0, "nrows").map_or(Ok(1), Value::as_int)?;
        let ncols = args.get(1, "ncols").map_or(Ok(1), Value::as_int)?;
        let (Ok(nrows), Ok(ncols)) = (usize::try_from(nrows), usize::try_from(ncols)) else {
            return Err(RuntimeFault::Value("number of rows and columns must be positive".to_string()));
        };
        let count = nrows.saturating_mul(ncols);
        if count == 0 {
            return Err(RuntimeFault::Value("number of rows and columns must be positive".to_string()));
        }
        self.budget.check_len(count)?;

        let figure = self.plots.figure(figure_size(args)?);
        let handles: Vec<AxesRef> = (0..count).map(|_| self.plots.add_axes(figure)).collect();
        self.plots.select(handles[0]);

        let axes = if count == 1 {
            Value::Axes(handles[0])
        } else if nrows == 1 || ncols == 1 {
            Value::list(handles.into_iter().map(Value::Axes).collect())
        } else {
            Value::list(
                handles
                    .chunks(ncols)
                    .map(|row| Value::list(row.iter().copied().map(Value::Axes).collect()))
                    .collect(),
            )
        };
        Ok(Value::tuple(vec![Value::Figure(figure), axes]))
    }

    /// `subplot(2, 1, 1)` or `subplot(211)`
    fn subplot(&mut self, figure: usize, args: &Args) -> FaultResult<Value> {
        let numbers = args
            .positional
            .iter()
            .map(Value::as_int)
            .collect::<FaultResult<Vec<_>>>()?;
        let (rows, cols, index) = match numbers.as_slice() {
            [] => (1, 1, 1),
            [code] if (111..=999).contains(code) => (code / 100, (code / 10) % 10, code % 10),
            [rows, cols, index] => (*rows, *cols, *index),
            _ => return Err(type_error("subplot expects three integers")),
        };
        if index < 1 || index > rows.saturating_mul(cols) {
            return Err(RuntimeFault::Value(format!(
                "num must be an integer with 1 <= num <= {}, not {index}",
                rows.saturating_mul(cols)
            )));
        }
        let index = usize::try_from(index - 1).unwrap_or(0);
        self.budget.check_len(index + 1)?;
        while self.plots.chart(figure).map_or(0, |c| c.axes.len()) <= index {
            self.plots.add_axes(figure);
        }
        let axes = AxesRef { figure, index };
        self.plots.select(axes);
        Ok(Value::Axes(axes))
    }
}

fn series_trace(kind: TraceKind, series: &Series, bins: usize) -> FaultResult<Trace> {
    let (x, y) = match kind {
        TraceKind::Hist => histogram(&series.values, bins),
        _ => (series.index.clone(), to_floats(&series.values)?),
    };
    Ok(Trace {
        kind,
        label: series.name.clone(),
        color: None,
        x,
        y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_keep_gaps() {
        let floats = to_floats(&[Cell::Int(1), Cell::Empty, Cell::text("2.5")]).unwrap();
        assert_eq!(floats[0], 1.0);
        assert!(floats[1].is_nan());
        assert_eq!(floats[2], 2.5);
        assert!(to_floats(&[Cell::text("north")]).is_err());
    }

    #[test]
    fn series_traces_use_index_for_x() {
        let series = Series::with_index(
            Some("units".to_string()),
            vec![Cell::text("north"), Cell::text("south")],
            vec![Cell::Int(17), Cell::Int(4)],
        );
        let trace = series_trace(TraceKind::Bar, &series, 10).unwrap();
        assert_eq!(trace.x, vec![Cell::text("north"), Cell::text("south")]);
        assert_eq!(trace.y, vec![17.0, 4.0]);
        assert_eq!(trace.label.as_deref(), Some("units"));
    }
}
