//! Interpreter values
//!
//! Mutable containers are shared through `Rc<RefCell<..>>` so aliasing
//! behaves the way scripts expect (`a = b; a.append(1)` changes both).

use crate::error::{type_error, FaultResult, RuntimeFault};
use crate::frame::{Frame, GroupBy, Series};
use crate::plot::AxesRef;
use indexmap::IndexMap;
use quire_table::Cell;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::rc::Rc;

/// Hashable dictionary key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Key {
    None,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Tuple(Vec<Key>),
}

impl Key {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Key::None => Value::None,
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(i) => Value::Int(*i),
            Key::Str(s) => Value::Str(s.clone()),
            Key::Tuple(items) => Value::tuple(items.iter().map(Key::to_value).collect()),
        }
    }
}

/// Namespaces that can be bound or imported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Namespace {
    /// `plt`
    Plotting,
    /// `pd`
    Data,
}

/// Allow-listed builtin functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Len,
    Range,
    Print,
    Sum,
    Min,
    Max,
    Sorted,
    Str,
    Int,
    Float,
    Bool,
    List,
    Tuple,
    Dict,
    Round,
    Abs,
    Enumerate,
    Zip,
}

impl Builtin {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "len" => Self::Len,
            "range" => Self::Range,
            "print" => Self::Print,
            "sum" => Self::Sum,
            "min" => Self::Min,
            "max" => Self::Max,
            "sorted" => Self::Sorted,
            "str" => Self::Str,
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "list" => Self::List,
            "tuple" => Self::Tuple,
            "dict" => Self::Dict,
            "round" => Self::Round,
            "abs" => Self::Abs,
            "enumerate" => Self::Enumerate,
            "zip" => Self::Zip,
            _ => return None,
        })
    }
}

/// A method looked up on a value, waiting for its call
#[derive(Debug)]
pub(crate) struct BoundMethod {
    pub(crate) receiver: Value,
    pub(crate) name: String,
}

#[derive(Debug, Clone)]
pub(crate) enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Dict(Rc<RefCell<IndexMap<Key, Value>>>),
    Range(i64, i64, i64),
    Slice(Option<i64>, Option<i64>, Option<i64>),
    Frame(Rc<RefCell<Frame>>),
    Series(Rc<Series>),
    GroupBy(Rc<GroupBy>),
    Namespace(Namespace),
    /// Settings objects whose state never reaches the chart (`rcParams`,
    /// styles, spines, artists returned by drawing calls)
    Cosmetic,
    Figure(usize),
    Axes(AxesRef),
    Builtin(Builtin),
    Method(Rc<BoundMethod>),
    /// `.plot` of a frame or series
    PlotAccessor(Rc<Value>),
}

impl Value {
    pub(crate) fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub(crate) fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub(crate) fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    pub(crate) fn frame(frame: Frame) -> Self {
        Value::Frame(Rc::new(RefCell::new(frame)))
    }

    pub(crate) fn series(series: Series) -> Self {
        Value::Series(Rc::new(series))
    }

    pub(crate) fn method(receiver: Value, name: &str) -> Self {
        Value::Method(Rc::new(BoundMethod {
            receiver,
            name: name.to_string(),
        }))
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range(..) => "range",
            Value::Slice(..) => "slice",
            Value::Frame(_) => "DataFrame",
            Value::Series(_) => "Series",
            Value::GroupBy(_) => "DataFrameGroupBy",
            Value::Namespace(_) => "module",
            Value::Cosmetic => "object",
            Value::Figure(_) => "Figure",
            Value::Axes(_) => "Axes",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Method(_) => "method",
            Value::PlotAccessor(_) => "PlotAccessor",
        }
    }

    pub(crate) fn truthy(&self) -> FaultResult<bool> {
        Ok(match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::Tuple(t) => !t.is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::Range(start, stop, step) => range_len(*start, *stop, *step) > 0,
            Value::Frame(_) | Value::Series(_) => {
                return Err(RuntimeFault::Value(format!(
                    "the truth value of a {} is ambiguous",
                    self.type_name()
                )))
            }
            _ => true,
        })
    }

    pub(crate) fn from_cell(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => Value::None,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::Int(*i),
            Cell::Float(f) => Value::Float(*f),
            Cell::Text(s) => Value::str(s.as_str()),
        }
    }

    /// Scalar as a cell; containers are a type error
    pub(crate) fn to_cell(&self) -> FaultResult<Cell> {
        Ok(match self {
            Value::None => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Int(i) => Cell::Int(*i),
            Value::Float(f) if f.is_nan() => Cell::Empty,
            Value::Float(f) => Cell::Float(*f),
            Value::Str(s) => Cell::Text(s.to_string()),
            other => {
                return Err(type_error(format!(
                    "cannot store a {} in a table cell",
                    other.type_name()
                )))
            }
        })
    }

    pub(crate) fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    pub(crate) fn to_key(&self) -> FaultResult<Key> {
        Ok(match self {
            Value::None => Key::None,
            Value::Bool(b) => Key::Bool(*b),
            Value::Int(i) => Key::Int(*i),
            #[allow(clippy::cast_possible_truncation)]
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Key::Int(*f as i64),
            Value::Str(s) => Key::Str(s.clone()),
            Value::Tuple(items) => Key::Tuple(
                items
                    .iter()
                    .map(Value::to_key)
                    .collect::<FaultResult<Vec<_>>>()?,
            ),
            other => return Err(type_error(format!("unhashable type: '{}'", other.type_name()))),
        })
    }

    pub(crate) fn as_int(&self) -> FaultResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// `str(value)`
    pub(crate) fn to_display(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.repr(),
        }
    }

    /// `repr(value)`
    pub(crate) fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::List(items) => format!("[{}]", join_repr(&items.borrow())),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_repr(items)),
            Value::Dict(map) => {
                let body = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_value().repr(), v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{body}}}")
            }
            Value::Range(start, stop, 1) => format!("range({start}, {stop})"),
            Value::Range(start, stop, step) => format!("range({start}, {stop}, {step})"),
            Value::Slice(..) => "slice(..)".to_string(),
            Value::Frame(frame) => frame.borrow().render(),
            Value::Series(series) => series.render(),
            other => format!("<{}>", other.type_name()),
        }
    }
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

/// Python-style float text: `1.0`, `0.25`, `1e+20`, `nan`
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else if f.abs() >= 1e16 || (f != 0.0 && f.abs() < 1e-4) {
        let mut s = format!("{f:e}");
        if let Some(pos) = s.find('e') {
            if !s[pos + 1..].starts_with('-') {
                s.insert(pos + 1, '+');
            }
        }
        s
    } else {
        format!("{f}")
    }
}

/// Widest width or precision a format spec may ask for
pub(crate) const MAX_FORMAT_FIELD: usize = 10_000;

fn format_field(digits: &str, what: &str) -> FaultResult<Option<usize>> {
    if digits.is_empty() {
        return Ok(None);
    }
    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_FORMAT_FIELD => Ok(Some(n)),
        _ => Err(RuntimeFault::Value(format!(
            "format {what} {digits} exceeds {MAX_FORMAT_FIELD}"
        ))),
    }
}

/// Apply a format spec (`.2f`, `,`, `.1%`, `d`, `>8`) to a value
pub(crate) fn format_with_spec(value: &Value, spec: &str) -> FaultResult<String> {
    if spec.is_empty() {
        return Ok(value.to_display());
    }
    let (align, rest) = match spec.chars().next() {
        Some(c @ ('<' | '>' | '^')) => (Some(c), &spec[1..]),
        _ => (None, spec),
    };
    let (zero_pad, rest) = match rest.strip_prefix('0') {
        Some(r) if align.is_none() && r.starts_with(|c: char| c.is_ascii_digit()) => (true, r),
        _ => (false, rest),
    };
    let width_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let width = format_field(&rest[..width_end], "width")?.unwrap_or(0);
    let rest = &rest[width_end..];
    let (grouping, rest) = match rest.strip_prefix(',') {
        Some(r) => (true, r),
        None => (false, rest),
    };
    let (precision, kind) = match rest.strip_prefix('.') {
        Some(r) => {
            let end = r.find(|c: char| !c.is_ascii_digit()).unwrap_or(r.len());
            (format_field(&r[..end], "precision")?, &r[end..])
        }
        None => (None, rest),
    };

    let body = match (kind, value) {
        ("%", v) => {
            let f = v
                .as_f64()
                .ok_or_else(|| type_error("'%' format needs a number"))?;
            format!("{:.*}%", precision.unwrap_or(6), f * 100.0)
        }
        ("f" | "F", v) | ("", v @ Value::Float(_)) if !kind.is_empty() || precision.is_some() => {
            let f = v
                .as_f64()
                .ok_or_else(|| type_error("'f' format needs a number"))?;
            let s = format!("{:.*}", precision.unwrap_or(6), f);
            if grouping {
                group_thousands(&s)
            } else {
                s
            }
        }
        ("d", Value::Int(i)) => {
            if grouping {
                group_thousands(&i.to_string())
            } else {
                i.to_string()
            }
        }
        ("", Value::Int(i)) if grouping => group_thousands(&i.to_string()),
        ("" | "s", v) => v.to_display(),
        (other, v) => {
            return Err(RuntimeFault::Value(format!(
                "unknown format code '{other}' for {}",
                v.type_name()
            )))
        }
    };

    let pad = width.saturating_sub(body.chars().count());
    if zero_pad && value.as_f64().is_some() {
        let (sign, digits) = match body.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", body.as_str()),
        };
        return Ok(format!("{sign}{}{digits}", "0".repeat(pad)));
    }
    Ok(match align.unwrap_or(if value.as_f64().is_some() { '>' } else { '<' }) {
        '>' => format!("{}{body}", " ".repeat(pad)),
        '^' => format!(
            "{}{body}{}",
            " ".repeat(pad / 2),
            " ".repeat(pad - pad / 2)
        ),
        _ => format!("{body}{}", " ".repeat(pad)),
    })
}

fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac) = match unsigned.find('.') {
        Some(pos) => unsigned.split_at(pos),
        None => (unsigned, ""),
    };
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let mut out = String::with_capacity(grouped.len() + frac.len() + 1);
    let _ = write!(out, "{sign}{grouped}{frac}");
    out
}

pub(crate) fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let span = if step > 0 {
        i128::from(stop) - i128::from(start)
    } else {
        i128::from(start) - i128::from(stop)
    };
    if span <= 0 || step == 0 {
        return 0;
    }
    let step = i128::from(step).abs();
    usize::try_from((span + step - 1) / step).unwrap_or(usize::MAX)
}

/// `==` between values
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| values_equal(p, q))
        }
        (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| values_equal(p, q))
        }
        (Value::Dict(x), Value::Dict(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Frame(x), Value::Frame(y)) => Rc::ptr_eq(x, y),
        (Value::Series(x), Value::Series(y)) => Rc::ptr_eq(x, y),
        (Value::Namespace(x), Value::Namespace(y)) => x == y,
        (Value::Figure(x), Value::Figure(y)) => x == y,
        (Value::Axes(x), Value::Axes(y)) => x == y,
        (x, y) => match (x.as_f64(), y.as_f64()) {
            (Some(p), Some(q)) => p == q,
            _ => false,
        },
    }
}

/// Ordering for `<`, `sorted`, `min` and `max`
pub(crate) fn compare_values(a: &Value, b: &Value) -> FaultResult<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::List(x), Value::List(y)) => compare_seq(&x.borrow(), &y.borrow()),
        (Value::Tuple(x), Value::Tuple(y)) => compare_seq(x, y),
        (x, y) => match (x.as_f64(), y.as_f64()) {
            (Some(p), Some(q)) => p
                .partial_cmp(&q)
                .ok_or_else(|| RuntimeFault::Value("cannot order nan".to_string())),
            _ => Err(type_error(format!(
                "'<' not supported between instances of '{}' and '{}'",
                x.type_name(),
                y.type_name()
            ))),
        },
    }
}

fn compare_seq(x: &[Value], y: &[Value]) -> FaultResult<Ordering> {
    for (p, q) in x.iter().zip(y.iter()) {
        if !values_equal(p, q) {
            return compare_values(p, q);
        }
    }
    Ok(x.len().cmp(&y.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_text_matches_python() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(f64::NAN), "nan");
    }

    #[test]
    fn format_specs() {
        let pi = Value::Float(3.14159);
        assert_eq!(format_with_spec(&pi, ".2f").unwrap(), "3.14");
        assert_eq!(format_with_spec(&Value::Float(0.256), ".1%").unwrap(), "25.6%");
        assert_eq!(format_with_spec(&Value::Int(1234567), ",").unwrap(), "1,234,567");
        assert_eq!(format_with_spec(&Value::Int(42), ">5").unwrap(), "   42");
        assert_eq!(format_with_spec(&Value::Int(7), "03d").unwrap(), "007");
        assert_eq!(format_with_spec(&Value::Float(-1.5), "06.2f").unwrap(), "-01.50");
        assert_eq!(format_with_spec(&Value::str("ab"), "<4").unwrap(), "ab  ");
        assert!(format_with_spec(&Value::str("ab"), "x").is_err());
    }

    #[test]
    fn oversized_format_fields_fail() {
        let widest = format!(">{MAX_FORMAT_FIELD}");
        assert_eq!(
            format_with_spec(&Value::Int(1), &widest).unwrap().len(),
            MAX_FORMAT_FIELD
        );
        for spec in [".70000f", ">99999999", "099999999999999999999999d", ".1%0"] {
            let err = format_with_spec(&Value::Float(1.5), spec).unwrap_err();
            assert!(matches!(err, RuntimeFault::Value(_)), "{spec:?} gave {err:?}");
        }
    }

    #[test]
    fn range_lengths() {
        assert_eq!(range_len(0, 5, 1), 5);
        assert_eq!(range_len(0, 5, 2), 3);
        assert_eq!(range_len(5, 0, -1), 5);
        assert_eq!(range_len(5, 0, 1), 0);
    }

    #[test]
    fn repr_of_containers() {
        let v = Value::list(vec![Value::Int(1), Value::str("a"), Value::None]);
        assert_eq!(v.repr(), "[1, 'a', None]");
        assert_eq!(Value::tuple(vec![Value::Int(1)]).repr(), "(1,)");
    }

    #[test]
    fn mixed_numeric_equality() {
        assert!(values_equal(&Value::Int(1), &Value::Float(1.0)));
        assert!(values_equal(&Value::Bool(true), &Value::Int(1)));
        assert!(!values_equal(&Value::str("1"), &Value::Int(1)));
    }
}
