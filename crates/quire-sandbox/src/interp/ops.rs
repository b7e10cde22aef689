//! Operators
//!
//! Scalar arithmetic follows Python (floor division and modulo round toward
//! negative infinity, `/` always yields a float). Integer overflow is a
//! fault rather than a silent promotion. Series operands broadcast
//! element-wise and empty cells propagate.

use super::Interpreter;
use crate::error::{type_error, unsupported, FaultResult, RuntimeFault};
use crate::frame::Series;
use crate::value::{compare_values, range_len, values_equal, Value};
use std::cmp::Ordering;
use std::rc::Rc;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn float(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn operand_error(op: &str, a: &Value, b: &Value) -> RuntimeFault {
    type_error(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        a.type_name(),
        b.type_name()
    ))
}

impl Interpreter<'_> {
    pub(super) fn binary(&self, op: &str, a: &Value, b: &Value) -> FaultResult<Value> {
        if matches!(a, Value::Series(_)) || matches!(b, Value::Series(_)) {
            return self.broadcast(a, b, |l, r| {
                if matches!(l, Value::None) || matches!(r, Value::None) {
                    Ok(Value::None)
                } else {
                    self.scalar_binary(op, l, r)
                }
            });
        }
        self.scalar_binary(op, a, b)
    }

    fn scalar_binary(&self, op: &str, a: &Value, b: &Value) -> FaultResult<Value> {
        match (op, a, b) {
            ("+", Value::Str(x), Value::Str(y)) => {
                self.budget.alloc_str(x.len() + y.len())?;
                Ok(Value::str(format!("{x}{y}")))
            }
            ("+", Value::List(x), Value::List(y)) => {
                let mut items = x.borrow().clone();
                items.extend(y.borrow().iter().cloned());
                self.budget.alloc_len(items.len())?;
                Ok(Value::list(items))
            }
            ("+", Value::Tuple(x), Value::Tuple(y)) => {
                let mut items = x.to_vec();
                items.extend(y.iter().cloned());
                self.budget.alloc_len(items.len())?;
                Ok(Value::tuple(items))
            }
            ("*", Value::Str(s), n) | ("*", n, Value::Str(s)) if Num::of(n).is_some() => {
                let times = repeat_count(n)?;
                self.budget.alloc_str(s.len().saturating_mul(times))?;
                Ok(Value::str(s.repeat(times)))
            }
            ("*", Value::List(items), n) | ("*", n, Value::List(items)) if Num::of(n).is_some() => {
                let times = repeat_count(n)?;
                let items = items.borrow();
                self.budget.alloc_len(items.len().saturating_mul(times))?;
                let mut out = Vec::with_capacity(items.len() * times);
                for _ in 0..times {
                    out.extend(items.iter().cloned());
                }
                Ok(Value::list(out))
            }
            ("%", Value::Str(_), _) => Err(unsupported("printf-style string formatting")),
            ("&" | "|" | "^", Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(match op {
                "&" => *x && *y,
                "|" => *x || *y,
                _ => x != y,
            })),
            _ => {
                let (Some(x), Some(y)) = (Num::of(a), Num::of(b)) else {
                    return Err(operand_error(op, a, b));
                };
                arithmetic(op, x, y).map_err(|e| match e {
                    RuntimeFault::Type(_) => operand_error(op, a, b),
                    other => other,
                })
            }
        }
    }

    pub(super) fn unary(&self, op: &str, value: &Value) -> FaultResult<Value> {
        if let Value::Series(series) = value {
            let values = series
                .values
                .iter()
                .map(|c| match Value::from_cell(c) {
                    Value::None => Ok(Value::None),
                    // `~mask` inverts booleans element-wise
                    Value::Bool(b) if op == "~" => Ok(Value::Bool(!b)),
                    v => self.unary(op, &v),
                })
                .map(|v| v.and_then(|v| v.to_cell()))
                .collect::<FaultResult<Vec<_>>>()?;
            return Ok(Value::series(series.with_values(values)));
        }
        match (op, Num::of(value)) {
            ("-", Some(Num::Int(i))) => i.checked_neg().map(Value::Int).ok_or(RuntimeFault::Overflow),
            ("-", Some(Num::Float(f))) => Ok(Value::Float(-f)),
            ("+", Some(Num::Int(i))) => Ok(Value::Int(i)),
            ("+", Some(Num::Float(f))) => Ok(Value::Float(f)),
            ("~", Some(Num::Int(i))) => Ok(Value::Int(!i)),
            _ => Err(type_error(format!(
                "bad operand type for unary {op}: '{}'",
                value.type_name()
            ))),
        }
    }

    pub(super) fn compare(&self, op: &str, a: &Value, b: &Value) -> FaultResult<Value> {
        match op {
            "in" => return Ok(Value::Bool(self.contains(b, a)?)),
            "not in" => return Ok(Value::Bool(!self.contains(b, a)?)),
            "is" => return Ok(Value::Bool(is_same(a, b))),
            "is not" => return Ok(Value::Bool(!is_same(a, b))),
            _ => {}
        }
        if matches!(a, Value::Series(_)) || matches!(b, Value::Series(_)) {
            return self.broadcast(a, b, |l, r| {
                if matches!(l, Value::None) || matches!(r, Value::None) {
                    // missing values compare unequal to everything
                    Ok(Value::Bool(op == "!=" || op == "<>"))
                } else {
                    scalar_compare(op, l, r).map(Value::Bool)
                }
            });
        }
        scalar_compare(op, a, b).map(Value::Bool)
    }

    fn contains(&self, container: &Value, item: &Value) -> FaultResult<bool> {
        Ok(match container {
            Value::Str(haystack) => {
                let needle = item.as_str().ok_or_else(|| {
                    type_error(format!(
                        "'in <string>' requires string as left operand, not {}",
                        item.type_name()
                    ))
                })?;
                haystack.contains(needle)
            }
            Value::List(items) => items.borrow().iter().any(|v| values_equal(v, item)),
            Value::Tuple(items) => items.iter().any(|v| values_equal(v, item)),
            Value::Dict(map) => map.borrow().contains_key(&item.to_key()?),
            Value::Range(start, stop, step) => match item.as_f64() {
                Some(f) if f.fract() == 0.0 => {
                    let i = item.as_int().unwrap_or_else(|_| {
                        #[allow(clippy::cast_possible_truncation)]
                        let truncated = f as i64;
                        truncated
                    });
                    let offset = i128::from(i) - i128::from(*start);
                    let step_i = i128::from(*step);
                    let in_span = if *step > 0 {
                        i >= *start && i < *stop
                    } else {
                        i <= *start && i > *stop
                    };
                    in_span && offset % step_i == 0 && range_len(*start, *stop, *step) > 0
                }
                _ => false,
            },
            // pandas membership tests the index labels
            Value::Series(series) => {
                let label = item.to_cell()?;
                series.index.iter().any(|i| i.same_key(&label))
            }
            Value::Frame(frame) => item
                .as_str()
                .is_some_and(|name| frame.borrow().position(name).is_some()),
            other => {
                return Err(type_error(format!(
                    "argument of type '{}' is not iterable",
                    other.type_name()
                )))
            }
        })
    }

    fn broadcast(
        &self,
        a: &Value,
        b: &Value,
        apply: impl Fn(&Value, &Value) -> FaultResult<Value>,
    ) -> FaultResult<Value> {
        let (template, left, right): (&Rc<Series>, Vec<Value>, Vec<Value>) = match (a, b) {
            (Value::Series(x), Value::Series(y)) => {
                if x.len() != y.len() {
                    return Err(RuntimeFault::Value(format!(
                        "series lengths differ ({} and {})",
                        x.len(),
                        y.len()
                    )));
                }
                (
                    x,
                    x.values.iter().map(Value::from_cell).collect(),
                    y.values.iter().map(Value::from_cell).collect(),
                )
            }
            (Value::Series(x), scalar) if scalar.is_scalar() => (
                x,
                x.values.iter().map(Value::from_cell).collect(),
                vec![scalar.clone(); x.len()],
            ),
            (scalar, Value::Series(y)) if scalar.is_scalar() => (
                y,
                vec![scalar.clone(); y.len()],
                y.values.iter().map(Value::from_cell).collect(),
            ),
            _ => {
                return Err(type_error(format!(
                    "cannot combine '{}' and '{}' element-wise",
                    a.type_name(),
                    b.type_name()
                )))
            }
        };
        self.budget.alloc_len(left.len())?;
        let values = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| apply(l, r).and_then(|v| v.to_cell()))
            .collect::<FaultResult<Vec<_>>>()?;
        Ok(Value::series(template.with_values(values)))
    }
}

fn repeat_count(n: &Value) -> FaultResult<usize> {
    match Num::of(n) {
        Some(Num::Int(i)) => Ok(usize::try_from(i).unwrap_or(0)),
        _ => Err(type_error("can't multiply sequence by non-int of type 'float'")),
    }
}

fn arithmetic(op: &str, x: Num, y: Num) -> FaultResult<Value> {
    if let (Num::Int(a), Num::Int(b)) = (x, y) {
        return int_arithmetic(op, a, b);
    }
    let (a, b) = (x.float(), y.float());
    Ok(Value::Float(match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b == 0.0 {
                return Err(RuntimeFault::ZeroDivision);
            }
            a / b
        }
        "//" => {
            if b == 0.0 {
                return Err(RuntimeFault::ZeroDivision);
            }
            (a / b).floor()
        }
        "%" => {
            if b == 0.0 {
                return Err(RuntimeFault::ZeroDivision);
            }
            a - b * (a / b).floor()
        }
        "**" => a.powf(b),
        other => return Err(type_error(format!("operator '{other}' on floats"))),
    }))
}

fn int_arithmetic(op: &str, a: i64, b: i64) -> FaultResult<Value> {
    let overflow = || RuntimeFault::Overflow;
    Ok(match op {
        "+" => Value::Int(a.checked_add(b).ok_or_else(overflow)?),
        "-" => Value::Int(a.checked_sub(b).ok_or_else(overflow)?),
        "*" => Value::Int(a.checked_mul(b).ok_or_else(overflow)?),
        "/" => {
            if b == 0 {
                return Err(RuntimeFault::ZeroDivision);
            }
            #[allow(clippy::cast_precision_loss)]
            Value::Float(a as f64 / b as f64)
        }
        "//" => {
            if b == 0 {
                return Err(RuntimeFault::ZeroDivision);
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            let r = a % b;
            Value::Int(if r != 0 && ((r < 0) != (b < 0)) { q - 1 } else { q })
        }
        "%" => {
            if b == 0 {
                return Err(RuntimeFault::ZeroDivision);
            }
            let r = a.checked_rem(b).ok_or_else(overflow)?;
            Value::Int(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
        }
        "**" => {
            if b < 0 {
                #[allow(clippy::cast_precision_loss)]
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exp = u32::try_from(b).map_err(|_| RuntimeFault::Overflow)?;
            Value::Int(a.checked_pow(exp).ok_or_else(overflow)?)
        }
        "&" => Value::Int(a & b),
        "|" => Value::Int(a | b),
        "^" => Value::Int(a ^ b),
        "<<" => {
            let shift = u32::try_from(b).map_err(|_| RuntimeFault::Value("negative shift count".to_string()))?;
            let shifted = a.checked_shl(shift).ok_or_else(overflow)?;
            if shifted >> shift != a {
                return Err(RuntimeFault::Overflow);
            }
            Value::Int(shifted)
        }
        ">>" => {
            let shift = u32::try_from(b).map_err(|_| RuntimeFault::Value("negative shift count".to_string()))?;
            Value::Int(a >> shift.min(63))
        }
        other => return Err(type_error(format!("operator '{other}' on ints"))),
    })
}

fn scalar_compare(op: &str, a: &Value, b: &Value) -> FaultResult<bool> {
    match op {
        "==" => Ok(values_equal(a, b)),
        "!=" | "<>" => Ok(!values_equal(a, b)),
        "<" => Ok(compare_values(a, b)? == Ordering::Less),
        "<=" => Ok(compare_values(a, b)? != Ordering::Greater),
        ">" => Ok(compare_values(a, b)? == Ordering::Greater),
        ">=" => Ok(compare_values(a, b)? != Ordering::Less),
        other => Err(unsupported(format!("comparison '{other}'"))),
    }
}

fn is_same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::List(x), Value::List(y)) => Rc::ptr_eq(x, y),
        (Value::Dict(x), Value::Dict(y)) => Rc::ptr_eq(x, y),
        (Value::Frame(x), Value::Frame(y)) => Rc::ptr_eq(x, y),
        (Value::Series(x), Value::Series(y)) => Rc::ptr_eq(x, y),
        (Value::Namespace(x), Value::Namespace(y)) => x == y,
        (Value::Figure(x), Value::Figure(y)) => x == y,
        (Value::Axes(x), Value::Axes(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => Rc::ptr_eq(x, y) || x == y,
        _ => false,
    }
}
