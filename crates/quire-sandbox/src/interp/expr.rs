//! Expressions, literals, calls, subscripts and comprehensions

use super::{Args, Interpreter};
use crate::error::{type_error, unsupported, FaultResult, RuntimeFault};
use crate::value::{format_with_spec, range_len, Key, Value};
use indexmap::IndexMap;
use std::rc::Rc;
use tree_sitter::Node;

impl<'p> Interpreter<'p> {
    pub(super) fn eval(&mut self, node: Node<'p>) -> FaultResult<Value> {
        self.enter()?;
        let result = self.eval_inner(node);
        self.leave();
        result
    }

    fn eval_inner(&mut self, node: Node<'p>) -> FaultResult<Value> {
        match node.kind() {
            "identifier" => self.lookup(self.text(node)),
            "integer" => parse_int(self.text(node)),
            "float" => parse_float(self.text(node)),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "none" => Ok(Value::None),
            "string" => Ok(Value::str(self.eval_string(node)?)),
            "concatenated_string" => {
                let mut out = String::new();
                for part in Self::named(node) {
                    out.push_str(&self.eval_string(part)?);
                    self.budget.check_str(out.len())?;
                }
                self.budget.charge_bytes(out.len())?;
                Ok(Value::str(out))
            }
            "list" => {
                let items = self.eval_items(node)?;
                Ok(Value::list(items))
            }
            "tuple" | "expression_list" => {
                let items = self.eval_items(node)?;
                Ok(Value::tuple(items))
            }
            "dictionary" => self.eval_dict(node),
            "parenthesized_expression" => match Self::named(node).first() {
                Some(inner) => self.eval(*inner),
                None => Ok(Value::tuple(Vec::new())),
            },
            "binary_operator" => {
                let left = self.eval(Self::field(node, "left")?)?;
                let right = self.eval(Self::field(node, "right")?)?;
                let op = self.text(Self::field(node, "operator")?);
                self.binary(op, &left, &right)
            }
            "unary_operator" => {
                let operand = self.eval(Self::field(node, "argument")?)?;
                let op = self.text(Self::field(node, "operator")?);
                self.unary(op, &operand)
            }
            "not_operator" => {
                let operand = self.eval(Self::field(node, "argument")?)?;
                Ok(Value::Bool(!operand.truthy()?))
            }
            "boolean_operator" => {
                let left = self.eval(Self::field(node, "left")?)?;
                let op = self.text(Self::field(node, "operator")?);
                let short_circuit = match op {
                    "and" => !left.truthy()?,
                    "or" => left.truthy()?,
                    other => return Err(unsupported(format!("operator '{other}'"))),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(Self::field(node, "right")?)
                }
            }
            "comparison_operator" => self.eval_comparison(node),
            "conditional_expression" => {
                let parts = Self::named(node);
                let [body, condition, alternative] = parts.as_slice() else {
                    return Err(unsupported("malformed conditional expression"));
                };
                if self.eval(*condition)?.truthy()? {
                    self.eval(*body)
                } else {
                    self.eval(*alternative)
                }
            }
            "attribute" => {
                let object = self.eval(Self::field(node, "object")?)?;
                let attr = self.text(Self::field(node, "attribute")?);
                let value = self.get_attr(&object, attr)?;
                self.charge_fresh(&value)?;
                Ok(value)
            }
            "subscript" => {
                let container = self.eval(Self::field(node, "value")?)?;
                let key = self.subscript_key(node)?;
                let value = self.get_item(&container, &key)?;
                self.charge_fresh(&value)?;
                Ok(value)
            }
            "slice" => self.eval_slice(node),
            "call" => {
                let callee = self.eval(Self::field(node, "function")?)?;
                let args = self.eval_args(Self::field(node, "arguments")?)?;
                let value = self.call(callee, args)?;
                self.charge_fresh(&value)?;
                Ok(value)
            }
            "list_comprehension" | "generator_expression" => {
                let items = self.eval_comprehension(node)?;
                Ok(Value::list(items))
            }
            "dictionary_comprehension" => {
                let pairs = self.eval_comprehension(node)?;
                let mut map = IndexMap::new();
                for pair in pairs {
                    if let Value::Tuple(kv) = pair {
                        if let [k, v] = kv.as_slice() {
                            map.insert(k.to_key()?, v.clone());
                        }
                    }
                }
                Ok(Value::Dict(Rc::new(std::cell::RefCell::new(map))))
            }
            "named_expression" => {
                let name = self.text(Self::field(node, "name")?);
                let value = self.eval(Self::field(node, "value")?)?;
                self.bind(name, value.clone());
                Ok(value)
            }
            "pair" => {
                let key = self.eval(Self::field(node, "key")?)?;
                let value = self.eval(Self::field(node, "value")?)?;
                Ok(Value::tuple(vec![key, value]))
            }
            other => Err(unsupported(format!("'{other}' expression"))),
        }
    }

    fn eval_items(&mut self, node: Node<'p>) -> FaultResult<Vec<Value>> {
        let mut items = Vec::new();
        for child in Self::named(node) {
            if child.kind() == "list_splat" {
                let inner = Self::named(child)
                    .first()
                    .copied()
                    .ok_or_else(|| unsupported("empty splat"))?;
                let value = self.eval(inner)?;
                items.extend(self.iterate(&value)?);
            } else {
                items.push(self.eval(child)?);
            }
            self.budget.check_len(items.len())?;
        }
        self.budget.charge_elements(items.len())?;
        Ok(items)
    }

    fn eval_dict(&mut self, node: Node<'p>) -> FaultResult<Value> {
        let mut map = IndexMap::new();
        for child in Self::named(node) {
            match child.kind() {
                "pair" => {
                    let key = self.eval(Self::field(child, "key")?)?;
                    let value = self.eval(Self::field(child, "value")?)?;
                    map.insert(key.to_key()?, value);
                }
                "dictionary_splat" => {
                    let inner = Self::named(child)
                        .first()
                        .copied()
                        .ok_or_else(|| unsupported("empty splat"))?;
                    if let Value::Dict(other) = self.eval(inner)? {
                        for (k, v) in other.borrow().iter() {
                            map.insert(k.clone(), v.clone());
                        }
                    } else {
                        return Err(type_error("'**' needs a mapping"));
                    }
                }
                other => return Err(unsupported(format!("'{other}' in dict literal"))),
            }
            self.budget.check_len(map.len())?;
        }
        self.budget.charge_elements(map.len())?;
        Ok(Value::Dict(Rc::new(std::cell::RefCell::new(map))))
    }

    fn eval_string(&mut self, node: Node<'p>) -> FaultResult<String> {
        let mut out = String::new();
        let mut formatted = false;
        let mut raw = false;
        let mut cursor = node.walk();
        let parts: Vec<Node<'p>> = node.children(&mut cursor).collect();

        for part in parts {
            match part.kind() {
                "string_start" => {
                    let prefix = self
                        .text(part)
                        .trim_end_matches(['"', '\''])
                        .to_ascii_lowercase();
                    formatted = prefix.contains('f');
                    raw = prefix.contains('r');
                }
                "string_content" => {
                    let mut content = self.text(part).to_string();
                    if formatted {
                        content = content.replace("{{", "{").replace("}}", "}");
                    }
                    if raw {
                        out.push_str(&content);
                    } else {
                        out.push_str(&unescape(&content));
                    }
                }
                "escape_sequence" => {
                    let text = self.text(part);
                    if raw {
                        out.push_str(text);
                    } else {
                        out.push_str(&unescape(text));
                    }
                }
                "escape_interpolation" => out.push_str(&self.text(part)[..1]),
                "interpolation" => {
                    let value = self.eval(Self::field(part, "expression")?)?;
                    let value = match part.child_by_field_name("type_conversion") {
                        Some(conv) if self.text(conv) == "!r" => Value::str(value.repr()),
                        _ => value,
                    };
                    let spec = part
                        .child_by_field_name("format_specifier")
                        .map_or("", |s| self.text(s).trim_start_matches(':'));
                    out.push_str(&format_with_spec(&value, spec)?);
                }
                _ => {}
            }
            self.budget.check_str(out.len())?;
        }
        self.budget.charge_bytes(out.len())?;
        Ok(out)
    }

    fn eval_comparison(&mut self, node: Node<'p>) -> FaultResult<Value> {
        let mut cursor = node.walk();
        let children: Vec<Node<'p>> = node
            .children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect();
        let mut iter = children.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| unsupported("empty comparison"))?;
        let mut left = self.eval(first)?;
        let mut result = Value::Bool(true);

        while let Some(op) = iter.next() {
            let right_node = iter
                .next()
                .ok_or_else(|| unsupported("dangling comparison operator"))?;
            let right = self.eval(right_node)?;
            let op_text = self.text(op).split_whitespace().collect::<Vec<_>>().join(" ");
            result = self.compare(&op_text, &left, &right)?;
            if matches!(result, Value::Bool(false)) {
                return Ok(result);
            }
            left = right;
        }
        Ok(result)
    }

    pub(super) fn eval_args(&mut self, node: Node<'p>) -> FaultResult<Args> {
        if node.kind() == "generator_expression" {
            return Ok(Args::positional(vec![self.eval(node)?]));
        }
        let mut args = Args::default();
        for child in Self::named(node) {
            match child.kind() {
                "keyword_argument" => {
                    let name = self.text(Self::field(child, "name")?).to_string();
                    let value = self.eval(Self::field(child, "value")?)?;
                    args.keywords.insert(name, value);
                }
                "list_splat" => {
                    let inner = Self::named(child)
                        .first()
                        .copied()
                        .ok_or_else(|| unsupported("empty splat"))?;
                    let value = self.eval(inner)?;
                    args.positional.extend(self.iterate(&value)?);
                }
                "dictionary_splat" => {
                    let inner = Self::named(child)
                        .first()
                        .copied()
                        .ok_or_else(|| unsupported("empty splat"))?;
                    let Value::Dict(map) = self.eval(inner)? else {
                        return Err(type_error("'**' needs a mapping"));
                    };
                    for (k, v) in map.borrow().iter() {
                        let Key::Str(name) = k else {
                            return Err(type_error("keywords must be strings"));
                        };
                        args.keywords.insert(name.to_string(), v.clone());
                    }
                }
                _ => args.positional.push(self.eval(child)?),
            }
        }
        Ok(args)
    }

    fn eval_comprehension(&mut self, node: Node<'p>) -> FaultResult<Vec<Value>> {
        let body = Self::field(node, "body")?;
        let clauses: Vec<Node<'p>> = Self::named(node)
            .into_iter()
            .filter(|c| matches!(c.kind(), "for_in_clause" | "if_clause"))
            .collect();
        self.scopes.push(IndexMap::new());
        let mut out = Vec::new();
        let result = self.comprehend(body, &clauses, &mut out);
        self.scopes.pop();
        result?;
        self.budget.charge_elements(out.len())?;
        Ok(out)
    }

    fn comprehend(
        &mut self,
        body: Node<'p>,
        clauses: &[Node<'p>],
        out: &mut Vec<Value>,
    ) -> FaultResult<()> {
        let Some((clause, rest)) = clauses.split_first() else {
            out.push(self.eval(body)?);
            return self.budget.check_len(out.len());
        };
        match clause.kind() {
            "for_in_clause" => {
                let target = Self::field(*clause, "left")?;
                let iterable = self.eval(Self::field(*clause, "right")?)?;
                for item in self.iterate(&iterable)? {
                    self.budget.tick()?;
                    self.assign(target, item)?;
                    self.comprehend(body, rest, out)?;
                }
                Ok(())
            }
            _ => {
                let condition = Self::named(*clause)
                    .first()
                    .copied()
                    .ok_or_else(|| unsupported("empty if clause"))?;
                if self.eval(condition)?.truthy()? {
                    self.comprehend(body, rest, out)?;
                }
                Ok(())
            }
        }
    }

    // ---- subscripts --------------------------------------------------------

    pub(super) fn subscript_key(&mut self, node: Node<'p>) -> FaultResult<Value> {
        let subscripts = Self::fields(node, "subscript");
        match subscripts.as_slice() {
            [one] => self.eval(*one),
            many => {
                let mut items = Vec::with_capacity(many.len());
                for s in many {
                    items.push(self.eval(*s)?);
                }
                Ok(Value::tuple(items))
            }
        }
    }

    fn eval_slice(&mut self, node: Node<'p>) -> FaultResult<Value> {
        let mut parts: [Option<i64>; 3] = [None; 3];
        let mut slot = 0;
        let mut cursor = node.walk();
        let children: Vec<Node<'p>> = node.children(&mut cursor).collect();
        for child in children {
            if child.kind() == ":" {
                slot += 1;
                continue;
            }
            if !child.is_named() || child.kind() == "comment" || slot > 2 {
                continue;
            }
            parts[slot] = match self.eval(child)? {
                Value::None => None,
                other => Some(other.as_int()?),
            };
        }
        Ok(Value::Slice(parts[0], parts[1], parts[2]))
    }

    pub(super) fn get_item(&mut self, container: &Value, key: &Value) -> FaultResult<Value> {
        match container {
            Value::List(items) => {
                let items = items.borrow();
                match key {
                    Value::Slice(a, b, c) => {
                        let picked = slice_indices(items.len(), *a, *b, *c)?
                            .into_iter()
                            .map(|i| items[i].clone())
                            .collect();
                        Ok(Value::list(picked))
                    }
                    other => Ok(items[seq_index(items.len(), other.as_int()?)?].clone()),
                }
            }
            Value::Tuple(items) => match key {
                Value::Slice(a, b, c) => {
                    let picked = slice_indices(items.len(), *a, *b, *c)?
                        .into_iter()
                        .map(|i| items[i].clone())
                        .collect();
                    Ok(Value::tuple(picked))
                }
                other => Ok(items[seq_index(items.len(), other.as_int()?)?].clone()),
            },
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                match key {
                    Value::Slice(a, b, c) => Ok(Value::str(
                        slice_indices(chars.len(), *a, *b, *c)?
                            .into_iter()
                            .map(|i| chars[i])
                            .collect::<String>(),
                    )),
                    other => Ok(Value::str(
                        chars[seq_index(chars.len(), other.as_int()?)?].to_string(),
                    )),
                }
            }
            Value::Range(..) => {
                let items = self.iterate(container)?;
                self.get_item(&Value::list(items), key)
            }
            Value::Dict(map) => map
                .borrow()
                .get(&key.to_key()?)
                .cloned()
                .ok_or_else(|| RuntimeFault::Key(key.repr())),
            Value::Frame(_) | Value::Series(_) | Value::GroupBy(_) => {
                self.data_get_item(container, key)
            }
            Value::Cosmetic => Ok(Value::Cosmetic),
            other => Err(type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    pub(super) fn set_item(&mut self, container: &Value, key: Value, value: Value) -> FaultResult<()> {
        match container {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let idx = seq_index(items.len(), key.as_int()?)?;
                items[idx] = value;
                Ok(())
            }
            Value::Dict(map) => {
                let mut map = map.borrow_mut();
                map.insert(key.to_key()?, value);
                self.budget.check_len(map.len())?;
                self.budget.charge_elements(1)
            }
            Value::Frame(_) => self.data_set_item(container, &key, value),
            Value::Cosmetic => Ok(()),
            other => Err(type_error(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))),
        }
    }

    pub(super) fn del_item(&mut self, container: &Value, key: &Value) -> FaultResult<()> {
        match container {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let idx = seq_index(items.len(), key.as_int()?)?;
                items.remove(idx);
                Ok(())
            }
            Value::Dict(map) => map
                .borrow_mut()
                .shift_remove(&key.to_key()?)
                .map(|_| ())
                .ok_or_else(|| RuntimeFault::Key(key.repr())),
            Value::Frame(frame) => {
                let name = key
                    .as_str()
                    .ok_or_else(|| type_error("column names are strings"))?;
                let mut frame = frame.borrow_mut();
                let pos = frame
                    .position(name)
                    .ok_or_else(|| RuntimeFault::Key(format!("'{name}'")))?;
                frame.columns.remove(pos);
                frame.data.remove(pos);
                Ok(())
            }
            other => Err(type_error(format!(
                "'{}' object does not support item deletion",
                other.type_name()
            ))),
        }
    }

    /// Materialize the items a `for` loop would visit
    pub(super) fn iterate(&self, value: &Value) -> FaultResult<Vec<Value>> {
        match value {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Tuple(items) => Ok(items.to_vec()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            Value::Dict(map) => Ok(map.borrow().keys().map(Key::to_value).collect()),
            Value::Range(start, stop, step) => {
                let len = range_len(*start, *stop, *step);
                self.budget.check_len(len)?;
                let mut items = Vec::with_capacity(len);
                let mut current = *start;
                for _ in 0..len {
                    items.push(Value::Int(current));
                    current = current.saturating_add(*step);
                }
                Ok(items)
            }
            Value::Series(series) => Ok(series.values.iter().map(Value::from_cell).collect()),
            Value::Frame(frame) => Ok(frame
                .borrow()
                .columns
                .iter()
                .map(|c| Value::str(c.as_str()))
                .collect()),
            other => Err(type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }
}

fn parse_int(literal: &str) -> FaultResult<Value> {
    let cleaned = literal.replace('_', "").to_ascii_lowercase();
    if cleaned.ends_with('j') {
        return Err(unsupported("complex numbers"));
    }
    let cleaned = cleaned.trim_end_matches('l');
    let parsed = if let Some(hex) = cleaned.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(oct) = cleaned.strip_prefix("0o") {
        i64::from_str_radix(oct, 8)
    } else if let Some(bin) = cleaned.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else {
        cleaned.parse::<i64>()
    };
    parsed.map(Value::Int).map_err(|_| RuntimeFault::Overflow)
}

fn parse_float(literal: &str) -> FaultResult<Value> {
    let cleaned = literal.replace('_', "");
    if cleaned.ends_with(['j', 'J']) {
        return Err(unsupported("complex numbers"));
    }
    cleaned
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| RuntimeFault::Value(format!("invalid float literal '{literal}'")))
}

/// Resolve backslash escapes of a non-raw string literal
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn seq_index(len: usize, idx: i64) -> FaultResult<usize> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if idx < 0 { idx + len_i } else { idx };
    if (0..len_i).contains(&resolved) {
        usize::try_from(resolved).map_err(|_| RuntimeFault::Index("index out of range".to_string()))
    } else {
        Err(RuntimeFault::Index(format!("index {idx} out of range")))
    }
}

/// Positions selected by `[start:stop:step]` on a sequence of `len`
pub(super) fn slice_indices(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> FaultResult<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(RuntimeFault::Value("slice step cannot be zero".to_string()));
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
    let clamp = |bound: i64| {
        if bound < 0 {
            (bound + len).max(lower)
        } else {
            bound.min(upper)
        }
    };
    let start = start.map_or(if step > 0 { lower } else { upper }, clamp);
    let stop = stop.map_or(if step > 0 { upper } else { lower }, clamp);

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(pos) = usize::try_from(i) {
            out.push(pos);
        }
        i += step;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_follow_python() {
        assert_eq!(slice_indices(5, None, None, None).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(slice_indices(5, Some(1), Some(3), None).unwrap(), vec![1, 2]);
        assert_eq!(slice_indices(5, Some(-2), None, None).unwrap(), vec![3, 4]);
        assert_eq!(slice_indices(5, None, None, Some(-1)).unwrap(), vec![4, 3, 2, 1, 0]);
        assert_eq!(slice_indices(5, None, Some(10), Some(2)).unwrap(), vec![0, 2, 4]);
        assert!(slice_indices(5, None, None, Some(0)).is_err());
    }

    #[test]
    fn literal_parsing() {
        assert!(matches!(parse_int("1_000"), Ok(Value::Int(1000))));
        assert!(matches!(parse_int("0xff"), Ok(Value::Int(255))));
        assert!(matches!(
            parse_int("99999999999999999999"),
            Err(RuntimeFault::Overflow)
        ));
        assert!(matches!(parse_float("2.5e1"), Ok(Value::Float(f)) if f == 25.0));
    }

    #[test]
    fn escapes() {
        assert_eq!(unescape(r"a\nb\t\\"), "a\nb\t\\");
        assert_eq!(unescape(r"\x41é"), "Aé");
        assert_eq!(unescape(r"\d"), r"\d");
    }

    #[test]
    fn negative_indices() {
        assert_eq!(seq_index(3, -1).unwrap(), 2);
        assert!(seq_index(3, 3).is_err());
        assert!(seq_index(3, -4).is_err());
    }
}
