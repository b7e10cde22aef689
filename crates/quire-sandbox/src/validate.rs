//! Structural validation
//!
//! Source is parsed with the tree-sitter Python grammar and every node is
//! checked against the denylist in [`crate::policy`]. Text that merely looks
//! dangerous (inside a string or comment) is not flagged; constructs that are
//! dangerous are flagged wherever they appear. Unparseable input fails closed.

use crate::error::{SandboxError, SandboxResult};
use crate::policy::{builtin_category, is_dunder, module_category, Finding, FindingCategory};
use tree_sitter::{Node, Parser, Tree};

/// Source that passed validation, with its syntax tree
///
/// Only [`check`] creates one; [`Sandbox::run`](crate::Sandbox::run)
/// consumes it, so a program executes at most once.
#[derive(Debug)]
pub struct ValidatedProgram {
    source: String,
    tree: Tree,
}

impl ValidatedProgram {
    /// Source text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub(crate) fn tree(&self) -> &Tree {
        &self.tree
    }
}

/// Check source and report whether it may run
///
/// Never raises: syntax errors and parser failures also return `false`.
#[must_use]
pub fn validate(source: &str) -> bool {
    inspect(source).is_empty()
}

/// Every finding behind the verdict of [`validate`], ordered by line
#[must_use]
pub fn inspect(source: &str) -> Vec<Finding> {
    match parse(source) {
        Ok(tree) => match first_syntax_error(tree.root_node()) {
            Some((line, column)) => vec![Finding {
                category: FindingCategory::Syntax,
                line,
                detail: format!("syntax error at column {column}"),
            }],
            None => collect_findings(tree.root_node(), source.as_bytes()),
        },
        Err(e) => vec![Finding {
            category: FindingCategory::Syntax,
            line: 1,
            detail: e.to_string(),
        }],
    }
}

/// Validate source into a runnable program
///
/// # Errors
/// - `SyntaxInvalid` if the source does not parse
/// - `ValidationRejected` with all findings if anything is denied
pub fn check(source: &str) -> SandboxResult<ValidatedProgram> {
    let tree = parse(source)?;
    if let Some((line, column)) = first_syntax_error(tree.root_node()) {
        tracing::warn!("Generated code has a syntax error at {}:{}", line, column);
        return Err(SandboxError::SyntaxInvalid { line, column });
    }

    let findings = collect_findings(tree.root_node(), source.as_bytes());
    if !findings.is_empty() {
        tracing::warn!("Generated code rejected with {} finding(s)", findings.len());
        return Err(SandboxError::ValidationRejected { findings });
    }

    Ok(ValidatedProgram {
        source: source.to_string(),
        tree,
    })
}

fn parse(source: &str) -> SandboxResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SandboxError::ParserInit(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| SandboxError::ParserInit("parse cancelled".to_string()))
}

/// 1-based position of the first error or missing node
fn first_syntax_error(root: Node<'_>) -> Option<(usize, usize)> {
    if !root.has_error() {
        return None;
    }
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            return Some((pos.row + 1, pos.column + 1));
        }
        if node.has_error() {
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    // has_error() with no error node below: report the root
    Some((1, 1))
}

fn collect_findings(root: Node<'_>, src: &[u8]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        inspect_node(node, src, &mut findings);
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    findings.sort_by(|a, b| (a.line, a.category).cmp(&(b.line, b.category)));
    findings.dedup();
    findings
}

fn inspect_node(node: Node<'_>, src: &[u8], findings: &mut Vec<Finding>) {
    let line = node.start_position().row + 1;
    let mut push = |category: FindingCategory, detail: String| {
        findings.push(Finding {
            category,
            line,
            detail,
        });
    };

    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                let path = import_path(name, src);
                if let Some(category) = module_category(path) {
                    push(category, format!("import of '{path}'"));
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                let path = text(module, src);
                if module.kind() == "relative_import" {
                    push(FindingCategory::OsRuntime, format!("relative import '{path}'"));
                } else if let Some(category) = module_category(path) {
                    push(category, format!("import from '{path}'"));
                }
            }
        }
        "exec_statement" => push(
            FindingCategory::DynamicEvaluation,
            "exec statement".to_string(),
        ),
        "identifier" => {
            let name = text(node, src);
            if is_dunder(name) {
                push(FindingCategory::Introspection, format!("dunder name '{name}'"));
            } else if let Some(category) = builtin_category(name) {
                if !is_member_name(node) {
                    let detail = if is_call_target(node) {
                        format!("call to '{name}'")
                    } else {
                        format!("reference to '{name}'")
                    };
                    push(category, detail);
                }
            }
        }
        "while_statement" => {
            if node
                .child_by_field_name("condition")
                .is_some_and(|c| is_literal_truthy(c, src))
            {
                push(
                    FindingCategory::UnboundedLoop,
                    "while loop with a constant true condition".to_string(),
                );
            }
        }
        _ => {}
    }
}

fn text<'s>(node: Node<'_>, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or("")
}

fn import_path<'s>(node: Node<'_>, src: &'s [u8]) -> &'s str {
    if node.kind() == "aliased_import" {
        node.child_by_field_name("name")
            .map_or("", |name| text(name, src))
    } else {
        text(node, src)
    }
}

/// Attribute names (`obj.open`) and keyword names (`f(input=...)`) are not
/// references to the builtins they spell
fn is_member_name(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "attribute" => parent.child_by_field_name("attribute") == Some(node),
        "keyword_argument" => parent.child_by_field_name("name") == Some(node),
        _ => false,
    }
}

fn is_call_target(node: Node<'_>) -> bool {
    node.parent()
        .filter(|p| p.kind() == "call")
        .and_then(|p| p.child_by_field_name("function"))
        == Some(node)
}

fn is_literal_truthy(node: Node<'_>, src: &[u8]) -> bool {
    match node.kind() {
        "true" | "ellipsis" => true,
        "integer" | "float" => numeric_literal_nonzero(text(node, src)),
        "string" | "concatenated_string" => string_literal_nonempty(node),
        "list" | "tuple" | "set" | "dictionary" => node.named_child_count() > 0,
        "parenthesized_expression" => node
            .named_child(0)
            .is_some_and(|inner| is_literal_truthy(inner, src)),
        "not_operator" => node
            .child_by_field_name("argument")
            .is_some_and(|arg| is_literal_falsy(arg, src)),
        _ => false,
    }
}

fn is_literal_falsy(node: Node<'_>, src: &[u8]) -> bool {
    match node.kind() {
        "false" | "none" => true,
        "integer" | "float" => !numeric_literal_nonzero(text(node, src)),
        "string" | "concatenated_string" => !string_literal_nonempty(node),
        "list" | "tuple" | "dictionary" => node.named_child_count() == 0,
        "parenthesized_expression" => node
            .named_child(0)
            .is_some_and(|inner| is_literal_falsy(inner, src)),
        "not_operator" => node
            .child_by_field_name("argument")
            .is_some_and(|arg| is_literal_truthy(arg, src)),
        _ => false,
    }
}

fn numeric_literal_nonzero(literal: &str) -> bool {
    let lower = literal.to_ascii_lowercase();
    if let Some(digits) = ["0x", "0o", "0b"].iter().find_map(|p| lower.strip_prefix(p)) {
        return digits.chars().any(|c| c.is_ascii_hexdigit() && c != '0');
    }
    let mantissa = lower.split('e').next().unwrap_or(&lower);
    mantissa.chars().any(|c| c.is_ascii_digit() && c != '0')
}

fn string_literal_nonempty(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    children.into_iter().any(|child| match child.kind() {
        "string_content" | "interpolation" | "escape_sequence" => child.end_byte() > child.start_byte(),
        "string" => string_literal_nonempty(child),
        _ => false,
    })
}
