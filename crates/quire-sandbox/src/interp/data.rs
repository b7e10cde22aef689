//! Data-frame namespace, frames, series and group-bys

use super::{Args, Interpreter};
use crate::error::{type_error, unsupported, FaultResult, RuntimeFault};
use crate::frame::{to_numeric_cell, Agg, Frame, GroupBy, Grouped, Selection, Series};
use crate::value::{Key, Namespace, Value};
use quire_table::{Cell, Table};
use std::rc::Rc;

const PD_FUNCTIONS: &[&str] = &["to_numeric", "Series", "DataFrame", "concat", "isna", "notna"];

const FRAME_METHODS: &[&str] = &[
    "head", "tail", "groupby", "sort_values", "dropna", "fillna", "reset_index", "rename", "drop",
    "copy", "sum", "mean", "min", "max", "count", "nunique", "nlargest", "nsmallest",
];

const SERIES_METHODS: &[&str] = &[
    "head", "tail", "sum", "mean", "min", "max", "count", "nunique", "unique", "value_counts",
    "sort_values", "sort_index", "fillna", "dropna", "astype", "idxmax", "idxmin", "tolist",
    "to_list", "reset_index", "rename", "copy", "nlargest", "nsmallest", "isna", "notna", "round",
];

const GROUPBY_METHODS: &[&str] = &["sum", "mean", "min", "max", "count", "size", "nunique", "agg"];

fn count_value(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn grouped_value(grouped: Grouped) -> Value {
    match grouped {
        Grouped::Series(series) => Value::series(series),
        Grouped::Frame(frame) => Value::frame(frame),
    }
}

fn column_names(value: &Value) -> FaultResult<Vec<String>> {
    match value {
        Value::Str(s) => Ok(vec![s.to_string()]),
        Value::List(items) => items.borrow().iter().map(name_of).collect(),
        Value::Tuple(items) => items.iter().map(name_of).collect(),
        other => Err(type_error(format!(
            "expected a column name or list of names, got '{}'",
            other.type_name()
        ))),
    }
}

fn name_of(value: &Value) -> FaultResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_error("column names must be strings"))
}

fn head_count(args: &Args) -> FaultResult<usize> {
    let n = args.get(0, "n").map_or(Ok(5), Value::as_int)?;
    Ok(usize::try_from(n).unwrap_or(0))
}

fn ascending(args: &Args) -> FaultResult<bool> {
    args.flag("ascending", true)
}

/// Label of the extreme value of a series
fn idx_extreme(series: &Series, minimum: bool) -> FaultResult<Value> {
    let agg = if minimum { Agg::Min } else { Agg::Max };
    let target = series.aggregate(agg)?;
    series
        .values
        .iter()
        .position(|v| !matches!(v, Cell::Empty) && v.same_key(&target))
        .map(|p| Value::from_cell(&series.index[p]))
        .ok_or_else(|| RuntimeFault::Value("attempt to get argmax of an empty sequence".to_string()))
}

fn missing_mask(series: &Series, present: bool) -> Series {
    series.with_values(
        series
            .values
            .iter()
            .map(|v| Cell::Bool(matches!(v, Cell::Empty) != present))
            .collect(),
    )
}

impl Interpreter<'_> {
    pub(super) fn data_attr(&mut self, value: &Value, name: &str) -> FaultResult<Value> {
        let known = match value {
            Value::Namespace(Namespace::Data) => PD_FUNCTIONS.contains(&name),
            Value::Frame(frame) => {
                let frame = frame.borrow();
                match name {
                    "columns" => {
                        return Ok(Value::list(
                            frame.columns.iter().map(|c| Value::str(c.as_str())).collect(),
                        ))
                    }
                    "shape" => {
                        return Ok(Value::tuple(vec![
                            count_value(frame.len()),
                            count_value(frame.columns.len()),
                        ]))
                    }
                    "index" => return Ok(Value::list(frame.index.iter().map(Value::from_cell).collect())),
                    "empty" => return Ok(Value::Bool(frame.len() == 0 || frame.columns.is_empty())),
                    "plot" => return Ok(Value::PlotAccessor(Rc::new(value.clone()))),
                    _ if FRAME_METHODS.contains(&name) => true,
                    _ if frame.position(name).is_some() => {
                        return Ok(Value::series(frame.column(name)?))
                    }
                    _ => false,
                }
            }
            Value::Series(series) => match name {
                "name" => {
                    return Ok(series.name.as_deref().map_or(Value::None, Value::str))
                }
                "index" => return Ok(Value::list(series.index.iter().map(Value::from_cell).collect())),
                "values" => return Ok(Value::list(series.values.iter().map(Value::from_cell).collect())),
                "size" => return Ok(count_value(series.len())),
                "shape" => return Ok(Value::tuple(vec![count_value(series.len())])),
                "empty" => return Ok(Value::Bool(series.len() == 0)),
                "plot" => return Ok(Value::PlotAccessor(Rc::new(value.clone()))),
                _ => SERIES_METHODS.contains(&name),
            },
            Value::GroupBy(_) => GROUPBY_METHODS.contains(&name),
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

    pub(super) fn call_data_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &Args,
    ) -> FaultResult<Value> {
        match receiver {
            Value::Frame(frame) => {
                let result = self.frame_method(&frame.borrow(), name, args)?;
                // `inplace=True` swaps the receiver's contents
                if args.flag("inplace", false)? {
                    if let Value::Frame(updated) = &result {
                        let updated = updated.borrow().clone();
                        *frame.borrow_mut() = updated;
                        return Ok(Value::None);
                    }
                }
                Ok(result)
            }
            Value::Series(series) => self.series_method(series, name, args),
            Value::GroupBy(groupby) => Self::groupby_method(groupby, name, args),
            other => Err(RuntimeFault::Attribute {
                type_name: other.type_name().to_string(),
                attr: name.to_string(),
            }),
        }
    }

    fn frame_method(&mut self, frame: &Frame, name: &str, args: &Args) -> FaultResult<Value> {
        let out = match name {
            "head" => Value::frame(frame.head(head_count(args)?)),
            "tail" => Value::frame(frame.tail(head_count(args)?)),
            "copy" => Value::frame(frame.clone()),
            "groupby" => {
                let by = args.require(0, "by", "groupby")?;
                let key = match column_names(by)?.as_slice() {
                    [one] => one.clone(),
                    _ => return Err(unsupported("grouping by several columns")),
                };
                Value::GroupBy(Rc::new(frame.groupby(&key)?))
            }
            "sort_values" => {
                let by = column_names(args.require(0, "by", "sort_values")?)?;
                Value::frame(frame.sort_values(&by, ascending(args)?)?)
            }
            "nlargest" | "nsmallest" => {
                let n = usize::try_from(args.require(0, "n", name)?.as_int()?).unwrap_or(0);
                let by = column_names(args.require(1, "columns", name)?)?;
                Value::frame(frame.sort_values(&by, name == "nsmallest")?.head(n))
            }
            "dropna" => {
                let subset = args.kw("subset").map(column_names).transpose()?;
                Value::frame(frame.dropna(subset.as_deref())?)
            }
            "fillna" => {
                let fill = args.require(0, "value", "fillna")?.to_cell()?;
                Value::frame(frame.fillna(&fill))
            }
            "reset_index" => {
                if args.flag("drop", false)? {
                    let mut reset = frame.clone();
                    reset.index = (0..frame.len()).map(|i| Cell::Int(i64::try_from(i).unwrap_or(i64::MAX))).collect();
                    reset.index_name = None;
                    Value::frame(reset)
                } else {
                    Value::frame(frame.reset_index())
                }
            }
            "rename" => {
                let mut renamed = frame.clone();
                if let Some(Value::Dict(mapping)) = args.kw("columns") {
                    for (old, new) in mapping.borrow().iter() {
                        if let (Key::Str(old), Some(new)) = (old, new.as_str()) {
                            if let Some(pos) = renamed.position(old) {
                                renamed.columns[pos] = new.to_string();
                            }
                        }
                    }
                }
                Value::frame(renamed)
            }
            "drop" => {
                let names = match args.kw("columns").or_else(|| args.get(0, "labels")) {
                    Some(v) => column_names(v)?,
                    None => return Err(type_error("drop() needs columns")),
                };
                let keep: Vec<String> = frame
                    .columns
                    .iter()
                    .filter(|c| !names.contains(c))
                    .cloned()
                    .collect();
                if let Some(missing) = names.iter().find(|n| frame.position(n).is_none()) {
                    return Err(RuntimeFault::Key(format!("'{missing}' not found in axis")));
                }
                Value::frame(frame.select(&keep)?)
            }
            "sum" | "mean" | "min" | "max" | "count" | "nunique" => {
                let agg = Agg::from_name(name).ok_or_else(|| unsupported(name.to_string()))?;
                let columns = if matches!(agg, Agg::Count | Agg::Nunique) {
                    frame.columns.clone()
                } else {
                    frame.numeric_columns()
                };
                let mut values = Vec::with_capacity(columns.len());
                for column in &columns {
                    values.push(frame.column(column)?.aggregate(agg)?);
                }
                Value::series(Series::with_index(
                    None,
                    columns.into_iter().map(Cell::Text).collect(),
                    values,
                ))
            }
            _ => {
                return Err(RuntimeFault::Attribute {
                    type_name: "DataFrame".to_string(),
                    attr: name.to_string(),
                })
            }
        };
        self.check_value_size(&out)?;
        Ok(out)
    }

    fn series_method(&mut self, series: &Series, name: &str, args: &Args) -> FaultResult<Value> {
        if let Some(agg) = Agg::from_name(name) {
            return Ok(Value::from_cell(&series.aggregate(agg)?));
        }
        let out = match name {
            "head" => Value::series(series.head(head_count(args)?)),
            "tail" => Value::series(series.tail(head_count(args)?)),
            "copy" => Value::series(series.clone()),
            "unique" => Value::list(series.unique().iter().map(Value::from_cell).collect()),
            "value_counts" => Value::series(series.value_counts()),
            "sort_values" => Value::series(series.sort_values(ascending(args)?)),
            "sort_index" => Value::series(series.sort_index(ascending(args)?)),
            "nlargest" | "nsmallest" => {
                let n = args.get(0, "n").map_or(Ok(5), Value::as_int)?;
                let n = usize::try_from(n).unwrap_or(0);
                Value::series(series.sort_values(name == "nsmallest").head(n))
            }
            "fillna" => {
                let fill = args.require(0, "value", "fillna")?.to_cell()?;
                Value::series(
                    series.with_values(
                        series
                            .values
                            .iter()
                            .map(|v| if matches!(v, Cell::Empty) { fill.clone() } else { v.clone() })
                            .collect(),
                    ),
                )
            }
            "dropna" => {
                let mask: Vec<bool> = series.values.iter().map(|v| !matches!(v, Cell::Empty)).collect();
                Value::series(series.filter(&mask)?)
            }
            "isna" => Value::series(missing_mask(series, false)),
            "notna" => Value::series(missing_mask(series, true)),
            "astype" => {
                let target = match args.require(0, "dtype", "astype")? {
                    Value::Builtin(b) => format!("{b:?}").to_lowercase(),
                    other => other.to_display(),
                };
                let values = series
                    .values
                    .iter()
                    .map(|v| cast_cell(v, &target))
                    .collect::<FaultResult<Vec<_>>>()?;
                Value::series(series.with_values(values))
            }
            "round" => {
                let digits = args.get(0, "decimals").map_or(Ok(0), Value::as_int)?;
                let builtin_args = Args::positional(vec![Value::series(series.clone()), Value::Int(digits)]);
                return self.call_builtin(crate::value::Builtin::Round, builtin_args);
            }
            "idxmax" => idx_extreme(series, false)?,
            "idxmin" => idx_extreme(series, true)?,
            "tolist" | "to_list" => Value::list(series.values.iter().map(Value::from_cell).collect()),
            "rename" => Value::series(series.renamed(args.text(0, "index"))),
            "reset_index" => {
                let index_column = series
                    .index_name
                    .clone()
                    .unwrap_or_else(|| "index".to_string());
                let value_column = args
                    .kw("name")
                    .map(Value::to_display)
                    .or_else(|| series.name.clone())
                    .unwrap_or_else(|| "0".to_string());
                Value::frame(Frame::from_columns(vec![
                    (index_column, series.index.clone()),
                    (value_column, series.values.clone()),
                ])?)
            }
            _ => {
                return Err(RuntimeFault::Attribute {
                    type_name: "Series".to_string(),
                    attr: name.to_string(),
                })
            }
        };
        self.check_value_size(&out)?;
        Ok(out)
    }

    fn groupby_method(groupby: &GroupBy, name: &str, args: &Args) -> FaultResult<Value> {
        let agg_name = if name == "agg" {
            args.text(0, "func")
                .ok_or_else(|| type_error("agg() needs an aggregation name"))?
        } else {
            name.to_string()
        };
        let agg = Agg::from_name(&agg_name)
            .ok_or_else(|| unsupported(format!("aggregation '{agg_name}'")))?;
        Ok(grouped_value(groupby.aggregate(agg)?))
    }

    pub(super) fn call_pd(&mut self, name: &str, args: &Args) -> FaultResult<Value> {
        match name {
            "to_numeric" => {
                let coerce = args.kw("errors").and_then(Value::as_str) == Some("coerce");
                match args.require(0, "arg", "to_numeric")? {
                    Value::Series(series) => Ok(Value::series(series.to_numeric(coerce)?)),
                    Value::List(_) | Value::Tuple(_) => {
                        let items = self.iterate(args.require(0, "arg", "to_numeric")?)?;
                        let cells = items
                            .iter()
                            .map(|v| v.to_cell().and_then(|c| to_numeric_cell(&c, coerce)))
                            .collect::<FaultResult<Vec<_>>>()?;
                        Ok(Value::series(Series::new(None, cells)))
                    }
                    scalar => Ok(Value::from_cell(&to_numeric_cell(&scalar.to_cell()?, coerce)?)),
                }
            }
            "isna" | "notna" => {
                let missing = match args.require(0, "obj", name)? {
                    Value::Series(series) => {
                        return Ok(Value::series(missing_mask(series, name == "notna")))
                    }
                    Value::None => true,
                    Value::Float(f) => f.is_nan(),
                    _ => false,
                };
                Ok(Value::Bool(missing == (name == "isna")))
            }
            "Series" => {
                let data = args.get(0, "data").cloned().unwrap_or(Value::None);
                let series_name = args.kw("name").map(Value::to_display);
                match data {
                    Value::Dict(map) => {
                        let map = map.borrow();
                        let index = map
                            .keys()
                            .map(|k| k.to_value().to_cell())
                            .collect::<FaultResult<Vec<_>>>()?;
                        let values = map.values().map(Value::to_cell).collect::<FaultResult<Vec<_>>>()?;
                        Ok(Value::series(Series::with_index(series_name, index, values)))
                    }
                    Value::None => Ok(Value::series(Series::new(series_name, Vec::new()))),
                    other => {
                        let cells = self
                            .iterate(&other)?
                            .iter()
                            .map(Value::to_cell)
                            .collect::<FaultResult<Vec<_>>>()?;
                        self.budget.check_len(cells.len())?;
                        Ok(Value::series(Series::new(series_name, cells)))
                    }
                }
            }
            "DataFrame" => self.build_frame(args.get(0, "data")),
            "concat" => {
                let parts = self.iterate(args.require(0, "objs", "concat")?)?;
                let mut tables: Vec<Table> = Vec::with_capacity(parts.len());
                for part in &parts {
                    match part {
                        Value::Frame(frame) => tables.push(frame.borrow().to_table()?),
                        other => {
                            return Err(type_error(format!(
                                "cannot concatenate object of type '{}'",
                                other.type_name()
                            )))
                        }
                    }
                }
                let merged = Frame::from_table(&Table::concat(tables.iter()));
                self.budget.check_len(merged.len())?;
                Ok(Value::frame(merged))
            }
            _ => Err(RuntimeFault::Attribute {
                type_name: "module".to_string(),
                attr: name.to_string(),
            }),
        }
    }

    fn build_frame(&mut self, data: Option<&Value>) -> FaultResult<Value> {
        let frame = match data {
            None | Some(Value::None) => Frame::from_columns(Vec::new())?,
            // {"col": [..], ..}
            Some(Value::Dict(map)) => {
                let entries: Vec<(Key, Value)> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let mut columns = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let name = key.to_value().to_display();
                    let cells = match &value {
                        Value::Series(series) => series.values.clone(),
                        other => self
                            .iterate(other)?
                            .iter()
                            .map(Value::to_cell)
                            .collect::<FaultResult<Vec<_>>>()?,
                    };
                    self.budget.check_len(cells.len())?;
                    columns.push((name, cells));
                }
                Frame::from_columns(columns)?
            }
            // [{"col": v, ..}, ..]
            Some(records) => {
                let rows = self.iterate(records)?;
                let mut names: Vec<String> = Vec::new();
                for row in &rows {
                    let Value::Dict(map) = row else {
                        return Err(unsupported("DataFrame from rows that are not dicts"));
                    };
                    for key in map.borrow().keys() {
                        let name = key.to_value().to_display();
                        if !names.contains(&name) {
                            names.push(name);
                        }
                    }
                }
                let mut columns: Vec<(String, Vec<Cell>)> =
                    names.iter().map(|n| (n.clone(), Vec::with_capacity(rows.len()))).collect();
                for row in &rows {
                    if let Value::Dict(map) = row {
                        let map = map.borrow();
                        for (name, cells) in &mut columns {
                            let cell = map
                                .get(&Key::Str(name.as_str().into()))
                                .map_or(Ok(Cell::Empty), Value::to_cell)?;
                            cells.push(cell);
                        }
                    }
                }
                self.budget.check_len(rows.len())?;
                Frame::from_columns(columns)?
            }
        };
        Ok(Value::frame(frame))
    }

    pub(super) fn data_get_item(&mut self, container: &Value, key: &Value) -> FaultResult<Value> {
        match (container, key) {
            (Value::Frame(frame), Value::Str(name)) => Ok(Value::series(frame.borrow().column(name)?)),
            (Value::Frame(frame), Value::List(_)) => {
                Ok(Value::frame(frame.borrow().select(&column_names(key)?)?))
            }
            (Value::Frame(frame), Value::Series(mask)) => {
                Ok(Value::frame(frame.borrow().filter(&mask.bools()?)?))
            }
            (Value::Frame(frame), Value::Slice(a, b, c)) => {
                let frame = frame.borrow();
                let rows = super::expr::slice_indices(frame.len(), *a, *b, *c)?;
                Ok(Value::frame(frame.take(&rows)))
            }
            (Value::Series(series), Value::Series(mask)) => {
                Ok(Value::series(series.filter(&mask.bools()?)?))
            }
            (Value::Series(series), Value::Slice(a, b, c)) => {
                let rows = super::expr::slice_indices(series.len(), *a, *b, *c)?;
                Ok(Value::series(series.take(&rows)))
            }
            (Value::Series(series), label) => {
                let label = label.to_cell()?;
                series
                    .at_label(&label)
                    .map(Value::from_cell)
                    .ok_or_else(|| RuntimeFault::Key(label.to_string()))
            }
            (Value::GroupBy(groupby), Value::Str(name)) => Ok(Value::GroupBy(Rc::new(
                groupby.select(Selection::Column(name.to_string()))?,
            ))),
            (Value::GroupBy(groupby), Value::List(_)) => Ok(Value::GroupBy(Rc::new(
                groupby.select(Selection::Columns(column_names(key)?))?,
            ))),
            (container, key) => Err(type_error(format!(
                "cannot index {} with {}",
                container.type_name(),
                key.type_name()
            ))),
        }
    }

    pub(super) fn data_set_item(&mut self, container: &Value, key: &Value, value: Value) -> FaultResult<()> {
        let Value::Frame(frame) = container else {
            return Err(type_error(format!(
                "'{}' object does not support item assignment",
                container.type_name()
            )));
        };
        let name = key
            .as_str()
            .ok_or_else(|| unsupported("assignment to a non-column key"))?;
        let len = frame.borrow().len();
        let cells = match &value {
            Value::Series(series) => series.values.clone(),
            Value::List(_) | Value::Tuple(_) => self
                .iterate(&value)?
                .iter()
                .map(Value::to_cell)
                .collect::<FaultResult<Vec<_>>>()?,
            scalar => vec![scalar.to_cell()?; len],
        };
        self.budget.charge_elements(cells.len())?;
        frame.borrow_mut().set_column(name, cells)
    }

    fn check_value_size(&self, value: &Value) -> FaultResult<()> {
        match value {
            Value::Frame(frame) => self.budget.check_len(frame.borrow().len()),
            Value::Series(series) => self.budget.check_len(series.len()),
            _ => Ok(()),
        }
    }
}

fn cast_cell(cell: &Cell, target: &str) -> FaultResult<Cell> {
    if matches!(cell, Cell::Empty) {
        return Ok(Cell::Empty);
    }
    Ok(match target {
        "str" | "object" | "string" => Cell::Text(cell.as_text()),
        "float" | "float64" => match to_numeric_cell(cell, false)? {
            Cell::Int(i) => {
                #[allow(clippy::cast_precision_loss)]
                let f = i as f64;
                Cell::Float(f)
            }
            other => other,
        },
        "int" | "int64" => match to_numeric_cell(cell, false)? {
            Cell::Float(f) if f.is_finite() => {
                #[allow(clippy::cast_possible_truncation)]
                let i = f.trunc() as i64;
                Cell::Int(i)
            }
            Cell::Float(_) => {
                return Err(RuntimeFault::Value(
                    "cannot convert non-finite values to integer".to_string(),
                ))
            }
            other => other,
        },
        "bool" => Cell::Bool(match cell {
            Cell::Text(s) => !s.is_empty(),
            other => other.as_f64().is_some_and(|f| f != 0.0),
        }),
        other => return Err(unsupported(format!("dtype '{other}'"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casts() {
        assert_eq!(cast_cell(&Cell::text("3"), "int").unwrap(), Cell::Int(3));
        assert_eq!(cast_cell(&Cell::Int(3), "float").unwrap(), Cell::Float(3.0));
        assert_eq!(cast_cell(&Cell::Float(2.7), "int").unwrap(), Cell::Int(2));
        assert_eq!(cast_cell(&Cell::Int(5), "str").unwrap(), Cell::text("5"));
        assert_eq!(cast_cell(&Cell::Empty, "int").unwrap(), Cell::Empty);
        assert!(cast_cell(&Cell::text("x"), "int").is_err());
    }

    #[test]
    fn idx_of_extremes() {
        let series = Series::with_index(
            None,
            vec![Cell::text("a"), Cell::text("b"), Cell::text("c")],
            vec![Cell::Int(2), Cell::Int(9), Cell::Empty],
        );
        assert!(matches!(idx_extreme(&series, false), Ok(Value::Str(s)) if &*s == "b"));
        assert!(matches!(idx_extreme(&series, true), Ok(Value::Str(s)) if &*s == "a"));
    }
}
