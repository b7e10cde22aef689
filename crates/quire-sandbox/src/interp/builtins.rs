//! Builtin functions and methods of `str`, `list` and `dict`

use super::{Args, Interpreter};
use crate::error::{type_error, FaultResult, RuntimeFault};
use crate::frame::Agg;
use crate::value::{compare_values, format_with_spec, range_len, values_equal, Builtin, Key, Value};
use indexmap::IndexMap;
use quire_table::Cell;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "join", "replace", "startswith",
    "endswith", "format", "title", "capitalize", "find", "count", "zfill", "isdigit", "center",
    "ljust", "rjust", "splitlines",
];

const LIST_METHODS: &[&str] = &[
    "append", "extend", "pop", "insert", "remove", "index", "count", "sort", "reverse", "copy",
    "clear",
];

const DICT_METHODS: &[&str] = &[
    "get", "keys", "values", "items", "update", "pop", "setdefault", "copy", "clear",
];

pub(super) fn has_container_method(value: &Value, name: &str) -> bool {
    let table = match value {
        Value::Str(_) => STR_METHODS,
        Value::List(_) => LIST_METHODS,
        Value::Dict(_) => DICT_METHODS,
        _ => return false,
    };
    table.contains(&name)
}

fn len_value(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Round half to even
fn round_half_even(f: f64) -> f64 {
    if (f - f.trunc()).abs() == 0.5 {
        2.0 * (f / 2.0).round()
    } else {
        f.round()
    }
}

fn float_to_int(f: f64) -> FaultResult<i64> {
    if !f.is_finite() {
        return Err(RuntimeFault::Value(format!(
            "cannot convert float {f} to integer"
        )));
    }
    if f.abs() >= 9.2e18 {
        return Err(RuntimeFault::Overflow);
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(f.trunc() as i64)
}

/// Sort with a fallible comparison, keeping the first error
fn sort_checked<T>(items: &mut [T], reverse: bool, key: impl Fn(&T) -> &Value) -> FaultResult<()> {
    let mut error = None;
    items.sort_by(|a, b| match compare_values(key(a), key(b)) {
        Ok(ord) if reverse => ord.reverse(),
        Ok(ord) => ord,
        Err(e) => {
            error.get_or_insert(e);
            Ordering::Equal
        }
    });
    error.map_or(Ok(()), Err)
}

/// `str.format` with positional, numbered and named fields
fn str_format(template: &str, args: &Args) -> FaultResult<String> {
    let mut out = String::new();
    let mut auto = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => field.push(ch),
                        None => {
                            return Err(RuntimeFault::Value(
                                "single '{' encountered in format string".to_string(),
                            ))
                        }
                    }
                }
                let (name, spec) = field.split_once(':').unwrap_or((field.as_str(), ""));
                let (name, conversion) = match name.split_once('!') {
                    Some((n, c)) => (n, Some(c)),
                    None => (name, None),
                };
                let value = if name.is_empty() {
                    auto += 1;
                    args.positional.get(auto - 1)
                } else if let Ok(i) = name.parse::<usize>() {
                    args.positional.get(i)
                } else {
                    args.keywords.get(name)
                }
                .ok_or_else(|| RuntimeFault::Key(format!("'{name}'")))?;
                let value = match conversion {
                    Some("r") => Value::str(value.repr()),
                    _ => value.clone(),
                };
                out.push_str(&format_with_spec(&value, spec)?);
            }
            '}' => {
                return Err(RuntimeFault::Value(
                    "single '}' encountered in format string".to_string(),
                ))
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn pad(s: &str, width: usize, fill: char, align: char) -> String {
    let count = s.chars().count();
    if count >= width {
        return s.to_string();
    }
    let total = width - count;
    let (left, right) = match align {
        '<' => (0, total),
        '>' => (total, 0),
        _ => (total / 2, total - total / 2),
    };
    let fill = fill.to_string();
    format!("{}{s}{}", fill.repeat(left), fill.repeat(right))
}

impl Interpreter<'_> {
    pub(super) fn call_builtin(&mut self, builtin: Builtin, args: Args) -> FaultResult<Value> {
        match builtin {
            Builtin::Len => {
                let value = args.require(0, "obj", "len")?;
                Ok(len_value(match value {
                    Value::Str(s) => s.chars().count(),
                    Value::List(items) => items.borrow().len(),
                    Value::Tuple(items) => items.len(),
                    Value::Dict(map) => map.borrow().len(),
                    Value::Range(a, b, c) => range_len(*a, *b, *c),
                    Value::Frame(frame) => frame.borrow().len(),
                    Value::Series(series) => series.len(),
                    other => {
                        return Err(type_error(format!(
                            "object of type '{}' has no len()",
                            other.type_name()
                        )))
                    }
                }))
            }
            Builtin::Range => {
                let bounds = args
                    .positional
                    .iter()
                    .map(Value::as_int)
                    .collect::<FaultResult<Vec<_>>>()?;
                let (start, stop, step) = match bounds.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => return Err(type_error("range expected 1 to 3 arguments")),
                };
                if step == 0 {
                    return Err(RuntimeFault::Value("range() arg 3 must not be zero".to_string()));
                }
                Ok(Value::Range(start, stop, step))
            }
            Builtin::Print => {
                let sep = args.kw("sep").map_or_else(|| " ".to_string(), Value::to_display);
                let end = args.kw("end").map_or_else(|| "\n".to_string(), Value::to_display);
                let line = args
                    .positional
                    .iter()
                    .map(Value::to_display)
                    .collect::<Vec<_>>()
                    .join(&sep);
                self.budget.check_str(self.printed.len() + line.len() + end.len())?;
                self.budget.charge_bytes(line.len() + end.len())?;
                self.printed.push_str(&line);
                self.printed.push_str(&end);
                Ok(Value::None)
            }
            Builtin::Sum => {
                let iterable = args.require(0, "iterable", "sum")?;
                if let Value::Series(series) = iterable {
                    return Ok(Value::from_cell(&series.aggregate(Agg::Sum)?));
                }
                let mut total = args.get(1, "start").cloned().unwrap_or(Value::Int(0));
                for item in self.iterate(iterable)? {
                    total = self.binary("+", &total, &item)?;
                }
                Ok(total)
            }
            Builtin::Min | Builtin::Max => self.extreme(builtin == Builtin::Min, &args),
            Builtin::Sorted => {
                let iterable = args.require(0, "iterable", "sorted")?;
                let items = self.iterate(iterable)?;
                let reverse = args.flag("reverse", false)?;
                let mut keyed = self.keyed(items, args.kw("key"))?;
                sort_checked(&mut keyed, reverse, |(k, _)| k)?;
                Ok(Value::list(keyed.into_iter().map(|(_, v)| v).collect()))
            }
            Builtin::Str => Ok(Value::str(
                args.get(0, "object").map_or_else(String::new, Value::to_display),
            )),
            Builtin::Int => match args.get(0, "x") {
                None => Ok(Value::Int(0)),
                Some(Value::Int(i)) => Ok(Value::Int(*i)),
                Some(Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
                Some(Value::Float(f)) => float_to_int(*f).map(Value::Int),
                Some(Value::Str(s)) => s
                    .trim()
                    .replace('_', "")
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| {
                        RuntimeFault::Value(format!("invalid literal for int(): '{s}'"))
                    }),
                Some(other) => Err(type_error(format!(
                    "int() argument must be a string or a number, not '{}'",
                    other.type_name()
                ))),
            },
            Builtin::Float => match args.get(0, "x") {
                None => Ok(Value::Float(0.0)),
                Some(Value::Str(s)) => {
                    let t = s.trim().to_ascii_lowercase();
                    let parsed = match t.as_str() {
                        "nan" => Some(f64::NAN),
                        "inf" | "infinity" => Some(f64::INFINITY),
                        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
                        _ => t.replace('_', "").parse::<f64>().ok(),
                    };
                    parsed.map(Value::Float).ok_or_else(|| {
                        RuntimeFault::Value(format!("could not convert string to float: '{s}'"))
                    })
                }
                Some(other) => other.as_f64().map(Value::Float).ok_or_else(|| {
                    type_error(format!(
                        "float() argument must be a string or a number, not '{}'",
                        other.type_name()
                    ))
                }),
            },
            Builtin::Bool => Ok(Value::Bool(match args.get(0, "x") {
                Some(v) => v.truthy()?,
                None => false,
            })),
            Builtin::List => Ok(Value::list(match args.get(0, "iterable") {
                Some(v) => self.iterate(v)?,
                None => Vec::new(),
            })),
            Builtin::Tuple => Ok(Value::tuple(match args.get(0, "iterable") {
                Some(v) => self.iterate(v)?,
                None => Vec::new(),
            })),
            Builtin::Dict => {
                let mut map = IndexMap::new();
                match args.positional.first() {
                    None => {}
                    Some(Value::Dict(other)) => {
                        map.extend(other.borrow().iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                    Some(other) => {
                        for pair in self.iterate(other)? {
                            let items = self.iterate(&pair)?;
                            let [k, v] = items.as_slice() else {
                                return Err(RuntimeFault::Value(
                                    "dictionary update sequence element has wrong length"
                                        .to_string(),
                                ));
                            };
                            map.insert(k.to_key()?, v.clone());
                        }
                    }
                }
                for (name, value) in &args.keywords {
                    map.insert(Key::Str(name.as_str().into()), value.clone());
                }
                self.budget.check_len(map.len())?;
                Ok(Value::Dict(Rc::new(RefCell::new(map))))
            }
            Builtin::Round => {
                let number = args.require(0, "number", "round")?;
                let digits = match args.get(1, "ndigits") {
                    None | Some(Value::None) => None,
                    Some(d) => Some(d.as_int()?),
                };
                match (number, digits) {
                    (Value::Int(i), _) => Ok(Value::Int(*i)),
                    (Value::Bool(b), _) => Ok(Value::Int(i64::from(*b))),
                    (Value::Float(f), None) => float_to_int(round_half_even(*f)).map(Value::Int),
                    (Value::Float(f), Some(d)) => {
                        let d = i32::try_from(d.clamp(-300, 300)).unwrap_or(0);
                        let scale = 10f64.powi(d);
                        Ok(Value::Float(round_half_even(f * scale) / scale))
                    }
                    (Value::Series(series), _) => {
                        let d = i32::try_from(digits.unwrap_or(0).clamp(-300, 300)).unwrap_or(0);
                        let scale = 10f64.powi(d);
                        let values = series
                            .values
                            .iter()
                            .map(|c| match c {
                                Cell::Float(f) => {
                                    Cell::Float(round_half_even(f * scale) / scale)
                                }
                                other => other.clone(),
                            })
                            .collect();
                        Ok(Value::series(series.with_values(values)))
                    }
                    (other, _) => Err(type_error(format!(
                        "type {} doesn't define __round__",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Abs => match args.require(0, "x", "abs")? {
                Value::Int(i) => i.checked_abs().map(Value::Int).ok_or(RuntimeFault::Overflow),
                Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                series @ Value::Series(_) => {
                    let negated = self.unary("-", series)?;
                    let mask = self.compare("<", series, &Value::Int(0))?;
                    let (Value::Series(s), Value::Series(n), Value::Series(m)) =
                        (series, &negated, &mask)
                    else {
                        return Err(type_error("bad operand type for abs()"));
                    };
                    let values = s
                        .values
                        .iter()
                        .zip(n.values.iter().zip(m.values.iter()))
                        .map(|(orig, (neg, below))| {
                            if matches!(below, Cell::Bool(true)) {
                                neg.clone()
                            } else {
                                orig.clone()
                            }
                        })
                        .collect();
                    Ok(Value::series(s.with_values(values)))
                }
                other => Err(type_error(format!(
                    "bad operand type for abs(): '{}'",
                    other.type_name()
                ))),
            },
            Builtin::Enumerate => {
                let iterable = args.require(0, "iterable", "enumerate")?;
                let start = args.get(1, "start").map_or(Ok(0), Value::as_int)?;
                let items = self.iterate(iterable)?;
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let offset = i64::try_from(i).map_err(|_| RuntimeFault::Overflow)?;
                    let n = start.checked_add(offset).ok_or(RuntimeFault::Overflow)?;
                    out.push(Value::tuple(vec![Value::Int(n), item]));
                }
                Ok(Value::list(out))
            }
            Builtin::Zip => {
                let columns = args
                    .positional
                    .iter()
                    .map(|v| self.iterate(v))
                    .collect::<FaultResult<Vec<_>>>()?;
                let len = columns.iter().map(Vec::len).min().unwrap_or(0);
                let rows = (0..len)
                    .map(|i| Value::tuple(columns.iter().map(|c| c[i].clone()).collect()))
                    .collect();
                Ok(Value::list(rows))
            }
        }
    }

    /// Pair each item with its sort key
    fn keyed(&mut self, items: Vec<Value>, key: Option<&Value>) -> FaultResult<Vec<(Value, Value)>> {
        match key {
            None | Some(Value::None) => Ok(items.into_iter().map(|v| (v.clone(), v)).collect()),
            Some(func) => items
                .into_iter()
                .map(|v| {
                    let k = self.call(func.clone(), Args::positional(vec![v.clone()]))?;
                    Ok((k, v))
                })
                .collect(),
        }
    }

    fn extreme(&mut self, minimum: bool, args: &Args) -> FaultResult<Value> {
        let name = if minimum { "min" } else { "max" };
        let items = match args.positional.as_slice() {
            [Value::Series(series)] => {
                let agg = if minimum { Agg::Min } else { Agg::Max };
                return Ok(Value::from_cell(&series.aggregate(agg)?));
            }
            [single] => self.iterate(single)?,
            [] => return Err(type_error(format!("{name} expected at least 1 argument"))),
            many => many.to_vec(),
        };
        let keyed = self.keyed(items, args.kw("key"))?;
        let mut best: Option<(Value, Value)> = None;
        for (k, v) in keyed {
            best = match best {
                None => Some((k, v)),
                Some((bk, bv)) => {
                    let ord = compare_values(&k, &bk)?;
                    let better = if minimum {
                        ord == Ordering::Less
                    } else {
                        ord == Ordering::Greater
                    };
                    if better {
                        Some((k, v))
                    } else {
                        Some((bk, bv))
                    }
                }
            };
        }
        match best {
            Some((_, v)) => Ok(v),
            None => args.kw("default").cloned().ok_or_else(|| {
                RuntimeFault::Value(format!("{name}() arg is an empty sequence"))
            }),
        }
    }

    pub(super) fn call_container_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Args,
    ) -> FaultResult<Value> {
        match receiver {
            Value::Str(s) => self.str_method(s, name, &args),
            Value::List(items) => self.list_method(items, name, &args),
            Value::Dict(map) => self.dict_method(map, name, &args),
            other => Err(RuntimeFault::Attribute {
                type_name: other.type_name().to_string(),
                attr: name.to_string(),
            }),
        }
    }

    fn str_method(&mut self, s: &str, name: &str, args: &Args) -> FaultResult<Value> {
        let chars = args.text(0, "chars");
        let trim_set = |c: char| chars.as_deref().map_or(c.is_whitespace(), |set| set.contains(c));
        let out = match name {
            "upper" => Value::str(s.to_uppercase()),
            "lower" => Value::str(s.to_lowercase()),
            "strip" => Value::str(s.trim_matches(trim_set)),
            "lstrip" => Value::str(s.trim_start_matches(trim_set)),
            "rstrip" => Value::str(s.trim_end_matches(trim_set)),
            "split" => {
                let parts: Vec<Value> = match args.text(0, "sep") {
                    Some(sep) if sep.is_empty() => {
                        return Err(RuntimeFault::Value("empty separator".to_string()))
                    }
                    Some(sep) => s.split(sep.as_str()).map(Value::str).collect(),
                    None => s.split_whitespace().map(Value::str).collect(),
                };
                self.budget.check_len(parts.len())?;
                Value::list(parts)
            }
            "splitlines" => Value::list(s.lines().map(Value::str).collect()),
            "join" => {
                let items = self.iterate(args.require(0, "iterable", "join")?)?;
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Str(p) => parts.push(p.to_string()),
                        other => {
                            return Err(type_error(format!(
                                "sequence item: expected str instance, {} found",
                                other.type_name()
                            )))
                        }
                    }
                }
                let joined = parts.join(s);
                self.budget.check_str(joined.len())?;
                Value::str(joined)
            }
            "replace" => {
                let old = args.text(0, "old").unwrap_or_default();
                let new = args.text(1, "new").unwrap_or_default();
                let replaced = s.replace(old.as_str(), &new);
                self.budget.check_str(replaced.len())?;
                Value::str(replaced)
            }
            "startswith" => Value::Bool(s.starts_with(args.text(0, "prefix").unwrap_or_default().as_str())),
            "endswith" => Value::Bool(s.ends_with(args.text(0, "suffix").unwrap_or_default().as_str())),
            "format" => {
                let formatted = str_format(s, args)?;
                self.budget.check_str(formatted.len())?;
                Value::str(formatted)
            }
            "title" => {
                let mut out = String::with_capacity(s.len());
                let mut boundary = true;
                for c in s.chars() {
                    if boundary {
                        out.extend(c.to_uppercase());
                    } else {
                        out.extend(c.to_lowercase());
                    }
                    boundary = !c.is_alphabetic();
                }
                Value::str(out)
            }
            "capitalize" => {
                let mut chars = s.chars();
                Value::str(match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                })
            }
            "find" => {
                let needle = args.text(0, "sub").unwrap_or_default();
                Value::Int(match s.find(needle.as_str()) {
                    Some(byte) => i64::try_from(s[..byte].chars().count()).unwrap_or(i64::MAX),
                    None => -1,
                })
            }
            "count" => {
                let needle = args.text(0, "sub").unwrap_or_default();
                len_value(if needle.is_empty() {
                    s.chars().count() + 1
                } else {
                    s.matches(needle.as_str()).count()
                })
            }
            "zfill" => {
                let width = usize::try_from(args.require(0, "width", "zfill")?.as_int()?).unwrap_or(0);
                self.budget.check_str(width)?;
                let (sign, digits) = match s.strip_prefix(['-', '+']) {
                    Some(rest) => (&s[..1], rest),
                    None => ("", s),
                };
                let fill = width.saturating_sub(s.chars().count());
                Value::str(format!("{sign}{}{digits}", "0".repeat(fill)))
            }
            "isdigit" => Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())),
            "center" | "ljust" | "rjust" => {
                let width = usize::try_from(args.require(0, "width", name)?.as_int()?).unwrap_or(0);
                self.budget.check_str(width)?;
                let fill = args.text(1, "fillchar").and_then(|f| f.chars().next()).unwrap_or(' ');
                let align = match name {
                    "ljust" => '<',
                    "rjust" => '>',
                    _ => '^',
                };
                Value::str(pad(s, width, fill, align))
            }
            _ => {
                return Err(RuntimeFault::Attribute {
                    type_name: "str".to_string(),
                    attr: name.to_string(),
                })
            }
        };
        Ok(out)
    }

    fn list_method(
        &mut self,
        items: &Rc<RefCell<Vec<Value>>>,
        name: &str,
        args: &Args,
    ) -> FaultResult<Value> {
        match name {
            "append" => {
                let value = args.require(0, "object", "append")?.clone();
                let mut items = items.borrow_mut();
                items.push(value);
                self.budget.check_len(items.len())?;
                self.budget.charge_elements(1)?;
                Ok(Value::None)
            }
            "extend" => {
                let extra = self.iterate(args.require(0, "iterable", "extend")?)?;
                let mut items = items.borrow_mut();
                self.budget.check_len(items.len() + extra.len())?;
                self.budget.charge_elements(extra.len())?;
                items.extend(extra);
                Ok(Value::None)
            }
            "insert" => {
                let index = args.require(0, "index", "insert")?.as_int()?;
                let value = args.require(1, "object", "insert")?.clone();
                let mut items = items.borrow_mut();
                let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
                let at = if index < 0 { (index + len).max(0) } else { index.min(len) };
                items.insert(usize::try_from(at).unwrap_or(0), value);
                self.budget.check_len(items.len())?;
                self.budget.charge_elements(1)?;
                Ok(Value::None)
            }
            "pop" => {
                let mut items = items.borrow_mut();
                if items.is_empty() {
                    return Err(RuntimeFault::Index("pop from empty list".to_string()));
                }
                let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
                let index = args.get(0, "index").map_or(Ok(-1), Value::as_int)?;
                let at = if index < 0 { index + len } else { index };
                if !(0..len).contains(&at) {
                    return Err(RuntimeFault::Index("pop index out of range".to_string()));
                }
                Ok(items.remove(usize::try_from(at).unwrap_or(0)))
            }
            "remove" | "index" => {
                let target = args.require(0, "value", name)?;
                let position = items.borrow().iter().position(|v| values_equal(v, target));
                match (position, name) {
                    (Some(p), "remove") => {
                        items.borrow_mut().remove(p);
                        Ok(Value::None)
                    }
                    (Some(p), _) => Ok(len_value(p)),
                    (None, _) => Err(RuntimeFault::Value(format!(
                        "{} is not in list",
                        target.repr()
                    ))),
                }
            }
            "count" => {
                let target = args.require(0, "value", "count")?;
                Ok(len_value(
                    items.borrow().iter().filter(|v| values_equal(v, target)).count(),
                ))
            }
            "sort" => {
                let reverse = args.flag("reverse", false)?;
                let current = items.borrow().clone();
                let mut keyed = self.keyed(current, args.kw("key"))?;
                sort_checked(&mut keyed, reverse, |(k, _)| k)?;
                *items.borrow_mut() = keyed.into_iter().map(|(_, v)| v).collect();
                Ok(Value::None)
            }
            "reverse" => {
                items.borrow_mut().reverse();
                Ok(Value::None)
            }
            "copy" => Ok(Value::list(items.borrow().clone())),
            "clear" => {
                items.borrow_mut().clear();
                Ok(Value::None)
            }
            _ => Err(RuntimeFault::Attribute {
                type_name: "list".to_string(),
                attr: name.to_string(),
            }),
        }
    }

    fn dict_method(
        &mut self,
        map: &Rc<RefCell<IndexMap<Key, Value>>>,
        name: &str,
        args: &Args,
    ) -> FaultResult<Value> {
        match name {
            "get" => {
                let key = args.require(0, "key", "get")?.to_key()?;
                Ok(map
                    .borrow()
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| args.get(1, "default").cloned().unwrap_or(Value::None)))
            }
            "keys" => Ok(Value::list(map.borrow().keys().map(Key::to_value).collect())),
            "values" => Ok(Value::list(map.borrow().values().cloned().collect())),
            "items" => Ok(Value::list(
                map.borrow()
                    .iter()
                    .map(|(k, v)| Value::tuple(vec![k.to_value(), v.clone()]))
                    .collect(),
            )),
            "update" => {
                let mut entries: Vec<(Key, Value)> = Vec::new();
                match args.positional.first() {
                    Some(Value::Dict(other)) => entries.extend(
                        other.borrow().iter().map(|(k, v)| (k.clone(), v.clone())),
                    ),
                    Some(other) => {
                        for pair in self.iterate(other)? {
                            if let [k, v] = self.iterate(&pair)?.as_slice() {
                                entries.push((k.to_key()?, v.clone()));
                            }
                        }
                    }
                    None => {}
                }
                for (k, v) in &args.keywords {
                    entries.push((Key::Str(k.as_str().into()), v.clone()));
                }
                self.budget.charge_elements(entries.len())?;
                let mut map = map.borrow_mut();
                map.extend(entries);
                self.budget.check_len(map.len())?;
                Ok(Value::None)
            }
            "pop" => {
                let key_value = args.require(0, "key", "pop")?;
                let key = key_value.to_key()?;
                match map.borrow_mut().shift_remove(&key) {
                    Some(v) => Ok(v),
                    None => args
                        .get(1, "default")
                        .cloned()
                        .ok_or_else(|| RuntimeFault::Key(key_value.repr())),
                }
            }
            "setdefault" => {
                let key = args.require(0, "key", "setdefault")?.to_key()?;
                let default = args.get(1, "default").cloned().unwrap_or(Value::None);
                let mut map = map.borrow_mut();
                if !map.contains_key(&key) {
                    self.budget.charge_elements(1)?;
                }
                let value = map.entry(key).or_insert(default).clone();
                self.budget.check_len(map.len())?;
                Ok(value)
            }
            "copy" => Ok(Value::Dict(Rc::new(RefCell::new(map.borrow().clone())))),
            "clear" => {
                map.borrow_mut().clear();
                Ok(Value::None)
            }
            _ => Err(RuntimeFault::Attribute {
                type_name: "dict".to_string(),
                attr: name.to_string(),
            }),
        }
    }
}
