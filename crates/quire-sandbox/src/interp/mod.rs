//! Restricted interpreter
//!
//! Walks the tree-sitter syntax tree of a [`ValidatedProgram`](crate::ValidatedProgram)
//! directly. Only the constructs and names this module knows are reachable;
//! anything else stops the run with [`RuntimeFault::Unsupported`].

mod builtins;
mod data;
mod expr;
mod ops;
mod plotting;

use crate::error::{unsupported, FaultResult, RuntimeFault};
use crate::executor::{Binding, Bindings};
use crate::frame::Frame;
use crate::limits::{Budget, ExecutionLimits};
use crate::plot::{Chart, PlotState};
use crate::value::{Builtin, Namespace, Value};
use indexmap::IndexMap;
use std::rc::Rc;
use tree_sitter::Node;

/// Deepest expression nesting evaluated before giving up
const MAX_DEPTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
}

/// Positional and keyword arguments of one call
#[derive(Debug, Default)]
pub(crate) struct Args {
    positional: Vec<Value>,
    keywords: IndexMap<String, Value>,
}

impl Args {
    pub(crate) fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            keywords: IndexMap::new(),
        }
    }

    /// Argument by position, falling back to keyword
    fn get(&self, pos: usize, name: &str) -> Option<&Value> {
        self.positional.get(pos).or_else(|| self.keywords.get(name))
    }

    fn kw(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    fn require(&self, pos: usize, name: &str, func: &str) -> FaultResult<&Value> {
        self.get(pos, name).ok_or_else(|| {
            RuntimeFault::Type(format!("{func}() missing required argument '{name}'"))
        })
    }

    /// Optional string argument
    fn text(&self, pos: usize, name: &str) -> Option<String> {
        self.get(pos, name).and_then(|v| match v {
            Value::None => None,
            other => Some(other.to_display()),
        })
    }

    /// Optional boolean argument with default
    fn flag(&self, name: &str, default: bool) -> FaultResult<bool> {
        self.kw(name).map_or(Ok(default), Value::truthy)
    }

    fn len(&self) -> usize {
        self.positional.len()
    }
}

pub(crate) struct Interpreter<'p> {
    src: &'p [u8],
    globals: IndexMap<String, Value>,
    /// Comprehension scopes, innermost last
    scopes: Vec<IndexMap<String, Value>>,
    /// Binding name to namespace value, for import resolution
    namespaces: IndexMap<String, Value>,
    aliases: &'p IndexMap<String, String>,
    plots: PlotState,
    budget: Budget,
    printed: String,
    line: usize,
    depth: usize,
}

impl<'p> Interpreter<'p> {
    pub(crate) fn new(
        source: &'p str,
        bindings: &Bindings,
        aliases: &'p IndexMap<String, String>,
        limits: ExecutionLimits,
    ) -> Self {
        let mut globals = IndexMap::new();
        let mut namespaces = IndexMap::new();
        for (name, binding) in bindings.iter() {
            let value = match binding {
                Binding::Table(table) => Value::frame(Frame::from_table(table)),
                Binding::Plotting => Value::Namespace(Namespace::Plotting),
                Binding::Data => Value::Namespace(Namespace::Data),
                Binding::Scalar(cell) => Value::from_cell(cell),
            };
            if matches!(value, Value::Namespace(_)) {
                namespaces.insert(name.to_string(), value.clone());
            }
            globals.insert(name.to_string(), value);
        }

        Self {
            src: source.as_bytes(),
            globals,
            scopes: Vec::new(),
            namespaces,
            aliases,
            plots: PlotState::new(),
            budget: Budget::start(limits),
            printed: String::new(),
            line: 1,
            depth: 0,
        }
    }

    /// Execute a module
    pub(crate) fn run(&mut self, root: Node<'p>) -> FaultResult<()> {
        match self.exec_block(root)? {
            Flow::Normal => Ok(()),
            Flow::Break | Flow::Continue => Err(RuntimeFault::Unsupported(
                "'break' or 'continue' outside loop".to_string(),
            )),
        }
    }

    /// Line of the statement being executed (1-based)
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn steps(&self) -> u64 {
        self.budget.steps()
    }

    pub(crate) fn take_printed(&mut self) -> String {
        std::mem::take(&mut self.printed)
    }

    /// First chart-capable value in global order
    ///
    /// Bindings come first because they were inserted first; names the
    /// script created follow in assignment order.
    pub(crate) fn find_chart(&self) -> Option<(String, Chart)> {
        self.globals.iter().find_map(|(name, value)| {
            let figure = match value {
                Value::Namespace(Namespace::Plotting) => self.plots.current(),
                Value::Figure(id) => Some(*id),
                Value::Axes(axes) => Some(axes.figure),
                _ => None,
            }?;
            self.plots
                .chart(figure)
                .filter(|c| c.has_traces())
                .map(|c| (name.clone(), c.clone()))
        })
    }

    // ---- node helpers ------------------------------------------------------

    fn text(&self, node: Node<'p>) -> &'p str {
        node.utf8_text(self.src).unwrap_or("")
    }

    fn named(node: Node<'p>) -> Vec<Node<'p>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .collect()
    }

    fn field(node: Node<'p>, name: &str) -> FaultResult<Node<'p>> {
        node.child_by_field_name(name)
            .ok_or_else(|| unsupported(format!("{} without {name}", node.kind())))
    }

    fn fields(node: Node<'p>, name: &str) -> Vec<Node<'p>> {
        let mut cursor = node.walk();
        node.children_by_field_name(name, &mut cursor).collect()
    }

    // ---- names -------------------------------------------------------------

    fn lookup(&self, name: &str) -> FaultResult<Value> {
        if let Some(value) = self.scopes.iter().rev().find_map(|s| s.get(name)) {
            return Ok(value.clone());
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        Builtin::from_name(name)
            .map(Value::Builtin)
            .ok_or_else(|| RuntimeFault::Name(name.to_string()))
    }

    fn bind(&mut self, name: &str, value: Value) {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    // ---- statements --------------------------------------------------------

    fn exec_block(&mut self, node: Node<'p>) -> FaultResult<Flow> {
        for stmt in Self::named(node) {
            let flow = self.exec_stmt(stmt)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, node: Node<'p>) -> FaultResult<Flow> {
        self.line = node.start_position().row + 1;
        self.budget.tick()?;

        match node.kind() {
            "expression_statement" => {
                for child in Self::named(node) {
                    match child.kind() {
                        "assignment" => {
                            self.exec_assignment(child)?;
                        }
                        "augmented_assignment" => self.exec_augmented(child)?,
                        _ => {
                            self.eval(child)?;
                        }
                    }
                }
                Ok(Flow::Normal)
            }
            "import_statement" => {
                self.exec_import(node)?;
                Ok(Flow::Normal)
            }
            "import_from_statement" => {
                self.exec_import_from(node)?;
                Ok(Flow::Normal)
            }
            "future_import_statement" | "pass_statement" => Ok(Flow::Normal),
            "break_statement" => Ok(Flow::Break),
            "continue_statement" => Ok(Flow::Continue),
            "if_statement" => self.exec_if(node),
            "for_statement" => self.exec_for(node),
            "while_statement" => self.exec_while(node),
            "block" => self.exec_block(node),
            "delete_statement" => {
                for target in Self::named(node) {
                    self.exec_delete(target)?;
                }
                Ok(Flow::Normal)
            }
            other => Err(unsupported(format!("'{other}' statement"))),
        }
    }

    fn exec_assignment(&mut self, node: Node<'p>) -> FaultResult<Value> {
        let left = Self::field(node, "left")?;
        let Some(right) = node.child_by_field_name("right") else {
            // bare annotation: `x: int`
            return Ok(Value::None);
        };
        let value = if right.kind() == "assignment" {
            self.exec_assignment(right)?
        } else {
            self.eval(right)?
        };
        self.assign(left, value.clone())?;
        Ok(value)
    }

    fn exec_augmented(&mut self, node: Node<'p>) -> FaultResult<()> {
        let left = Self::field(node, "left")?;
        let right = Self::field(node, "right")?;
        let op_node = Self::field(node, "operator")?;
        let op = self.text(op_node).trim_end_matches('=');

        let current = self.eval(left)?;
        let rhs = self.eval(right)?;
        let result = match (&current, op) {
            // lists extend in place
            (Value::List(items), "+") => {
                let extra = self.iterate(&rhs)?;
                let mut items_mut = items.borrow_mut();
                self.budget.check_len(items_mut.len() + extra.len())?;
                self.budget.charge_elements(extra.len())?;
                items_mut.extend(extra);
                drop(items_mut);
                current.clone()
            }
            _ => self.binary(op, &current, &rhs)?,
        };
        self.assign(left, result)
    }

    fn assign(&mut self, target: Node<'p>, value: Value) -> FaultResult<()> {
        match target.kind() {
            "identifier" => {
                let name = self.text(target);
                self.bind(name, value);
                Ok(())
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
            | "expression_list" => {
                let targets = Self::named(target);
                let values = self.iterate(&value)?;
                if targets.len() != values.len() {
                    return Err(RuntimeFault::Value(format!(
                        "expected {} values to unpack, got {}",
                        targets.len(),
                        values.len()
                    )));
                }
                for (t, v) in targets.into_iter().zip(values) {
                    self.assign(t, v)?;
                }
                Ok(())
            }
            "parenthesized_expression" => match Self::named(target).first() {
                Some(inner) => self.assign(*inner, value),
                None => Err(unsupported("empty assignment target")),
            },
            "subscript" => {
                let container = self.eval(Self::field(target, "value")?)?;
                let key = self.subscript_key(target)?;
                self.set_item(&container, key, value)
            }
            "attribute" => {
                let object = self.eval(Self::field(target, "object")?)?;
                let attr = self.text(Self::field(target, "attribute")?);
                self.set_attr(&object, attr, value)
            }
            other => Err(unsupported(format!("assignment to '{other}'"))),
        }
    }

    fn exec_delete(&mut self, target: Node<'p>) -> FaultResult<()> {
        match target.kind() {
            "identifier" => {
                let name = self.text(target);
                self.globals
                    .shift_remove(name)
                    .map(|_| ())
                    .ok_or_else(|| RuntimeFault::Name(name.to_string()))
            }
            "expression_list" => {
                for t in Self::named(target) {
                    self.exec_delete(t)?;
                }
                Ok(())
            }
            "subscript" => {
                let container = self.eval(Self::field(target, "value")?)?;
                let key = self.subscript_key(target)?;
                self.del_item(&container, &key)
            }
            other => Err(unsupported(format!("del of '{other}'"))),
        }
    }

    fn exec_if(&mut self, node: Node<'p>) -> FaultResult<Flow> {
        let condition = self.eval(Self::field(node, "condition")?)?;
        if condition.truthy()? {
            return self.exec_block(Self::field(node, "consequence")?);
        }
        for clause in Self::fields(node, "alternative") {
            match clause.kind() {
                "elif_clause" => {
                    let condition = self.eval(Self::field(clause, "condition")?)?;
                    if condition.truthy()? {
                        return self.exec_block(Self::field(clause, "consequence")?);
                    }
                }
                "else_clause" => return self.exec_block(Self::field(clause, "body")?),
                other => return Err(unsupported(format!("'{other}' in if statement"))),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(&mut self, node: Node<'p>) -> FaultResult<Flow> {
        let target = Self::field(node, "left")?;
        let iterable = self.eval(Self::field(node, "right")?)?;
        let body = Self::field(node, "body")?;

        for item in self.iterate(&iterable)? {
            self.budget.tick()?;
            self.assign(target, item)?;
            if self.exec_block(body)? == Flow::Break {
                return Ok(Flow::Normal);
            }
        }
        match node.child_by_field_name("alternative") {
            Some(else_clause) => self.exec_block(Self::field(else_clause, "body")?),
            None => Ok(Flow::Normal),
        }
    }

    fn exec_while(&mut self, node: Node<'p>) -> FaultResult<Flow> {
        let condition = Self::field(node, "condition")?;
        let body = Self::field(node, "body")?;
        loop {
            self.budget.tick()?;
            if !self.eval(condition)?.truthy()? {
                break;
            }
            if self.exec_block(body)? == Flow::Break {
                return Ok(Flow::Normal);
            }
        }
        match node.child_by_field_name("alternative") {
            Some(else_clause) => self.exec_block(Self::field(else_clause, "body")?),
            None => Ok(Flow::Normal),
        }
    }

    // ---- imports -----------------------------------------------------------

    fn resolve_module(&self, path: &str) -> FaultResult<Value> {
        self.aliases
            .get(path)
            .and_then(|binding| self.namespaces.get(binding))
            .cloned()
            .ok_or_else(|| RuntimeFault::Import(path.to_string()))
    }

    fn exec_import(&mut self, node: Node<'p>) -> FaultResult<()> {
        for name in Self::fields(node, "name") {
            if name.kind() == "aliased_import" {
                let path = self.text(Self::field(name, "name")?);
                let alias = self.text(Self::field(name, "alias")?);
                let module = self.resolve_module(path)?;
                self.bind(alias, module);
            } else {
                let path = self.text(name);
                // `import a.b` must be importable and binds `a`
                self.resolve_module(path)?;
                let root = path.split('.').next().unwrap_or(path);
                let module = self.resolve_module(root)?;
                self.bind(root, module);
            }
        }
        tracing::debug!("Import resolved on line {}", self.line);
        Ok(())
    }

    fn exec_import_from(&mut self, node: Node<'p>) -> FaultResult<()> {
        let module_path = self.text(Self::field(node, "module_name")?);
        let names = Self::fields(node, "name");
        if names.is_empty() {
            return Err(unsupported("wildcard import"));
        }
        for name in names {
            let (member, alias) = if name.kind() == "aliased_import" {
                (
                    self.text(Self::field(name, "name")?),
                    self.text(Self::field(name, "alias")?),
                )
            } else {
                let member = self.text(name);
                (member, member)
            };
            let full = format!("{module_path}.{member}");
            let value = match self.resolve_module(&full) {
                Ok(module) => module,
                Err(_) => {
                    let module = self.resolve_module(module_path)?;
                    self.get_attr(&module, member)
                        .map_err(|_| RuntimeFault::Import(full.clone()))?
                }
            };
            self.bind(alias, value);
        }
        Ok(())
    }

    // ---- dispatch ----------------------------------------------------------

    /// Charges a value produced by a call, attribute or subscript against the
    /// cumulative allowance. Values still shared with a binding are existing
    /// objects and cost nothing.
    pub(super) fn charge_fresh(&self, value: &Value) -> FaultResult<()> {
        match value {
            Value::Str(s) if Rc::strong_count(s) == 1 => self.budget.charge_bytes(s.len()),
            Value::List(items) if Rc::strong_count(items) == 1 => {
                self.budget.charge_elements(items.borrow().len())
            }
            Value::Tuple(items) if Rc::strong_count(items) == 1 => {
                self.budget.charge_elements(items.len())
            }
            Value::Dict(map) if Rc::strong_count(map) == 1 => {
                self.budget.charge_elements(map.borrow().len())
            }
            Value::Series(series) if Rc::strong_count(series) == 1 => {
                self.budget.charge_elements(series.len())
            }
            Value::Frame(frame) if Rc::strong_count(frame) == 1 => {
                let frame = frame.borrow();
                self.budget
                    .charge_elements(frame.len().saturating_mul(frame.columns.len()))
            }
            _ => Ok(()),
        }
    }

    fn call(&mut self, callee: Value, args: Args) -> FaultResult<Value> {
        match callee {
            Value::Builtin(builtin) => self.call_builtin(builtin, args),
            Value::Method(method) => self.call_method(&method.receiver, &method.name, args),
            Value::PlotAccessor(target) => self.data_plot(&target, None, &args),
            other => Err(RuntimeFault::Type(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_method(&mut self, receiver: &Value, name: &str, args: Args) -> FaultResult<Value> {
        match receiver {
            Value::Str(_) | Value::List(_) | Value::Dict(_) => {
                self.call_container_method(receiver, name, args)
            }
            Value::Frame(_) | Value::Series(_) | Value::GroupBy(_) => {
                self.call_data_method(receiver, name, &args)
            }
            Value::Namespace(Namespace::Data) => self.call_pd(name, &args),
            Value::Namespace(Namespace::Plotting)
            | Value::Figure(_)
            | Value::Axes(_)
            | Value::Cosmetic => self.call_plot_method(receiver, name, &args),
            Value::PlotAccessor(target) => self.data_plot(target, Some(name), &args),
            other => Err(RuntimeFault::Attribute {
                type_name: other.type_name().to_string(),
                attr: name.to_string(),
            }),
        }
    }

    fn get_attr(&mut self, value: &Value, name: &str) -> FaultResult<Value> {
        match value {
            Value::Frame(_) | Value::Series(_) | Value::GroupBy(_) | Value::Namespace(Namespace::Data) => {
                self.data_attr(value, name)
            }
            Value::Namespace(Namespace::Plotting) | Value::Figure(_) | Value::Axes(_) | Value::Cosmetic => {
                self.plot_attr(value, name)
            }
            Value::PlotAccessor(_) if crate::plot::TraceKind::from_plot_kind(name).is_some() => {
                Ok(Value::method(value.clone(), name))
            }
            Value::Str(_) | Value::List(_) | Value::Dict(_) if builtins::has_container_method(value, name) => {
                Ok(Value::method(value.clone(), name))
            }
            other => Err(RuntimeFault::Attribute {
                type_name: other.type_name().to_string(),
                attr: name.to_string(),
            }),
        }
    }

    fn set_attr(&mut self, object: &Value, name: &str, _value: Value) -> FaultResult<()> {
        match object {
            // figure/axes properties written directly have no effect on the snapshot
            Value::Cosmetic | Value::Figure(_) | Value::Axes(_) => Ok(()),
            other => Err(unsupported(format!(
                "setting attribute '{name}' on {}",
                other.type_name()
            ))),
        }
    }

    fn enter(&mut self) -> FaultResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(unsupported("expression nesting too deep"));
        }
        self.budget.tick()
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
