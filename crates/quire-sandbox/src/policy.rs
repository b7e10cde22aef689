//! Denylist policy
//!
//! Module groups and primitive names that make generated code unsafe to run.
//! The list is necessarily incomplete: it narrows what generated code can
//! reach, while the interpreter's allow-list and limits bound what it can do.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a rejected construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    /// Interpreter and operating system internals
    OsRuntime,
    /// Process and thread spawning
    Process,
    /// Sockets and protocol clients
    Network,
    /// Files, archives and paths
    Filesystem,
    /// Object (de)serialization
    Serialization,
    /// eval / exec / compile
    DynamicEvaluation,
    /// Raw file open
    FileAccess,
    /// Interactive input
    InteractiveInput,
    /// Dunder attributes and namespace introspection
    Introspection,
    /// Loop whose condition is a literal true value
    UnboundedLoop,
    /// Unparseable source
    Syntax,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OsRuntime => "os_runtime",
            Self::Process => "process",
            Self::Network => "network",
            Self::Filesystem => "filesystem",
            Self::Serialization => "serialization",
            Self::DynamicEvaluation => "dynamic_evaluation",
            Self::FileAccess => "file_access",
            Self::InteractiveInput => "interactive_input",
            Self::Introspection => "introspection",
            Self::UnboundedLoop => "unbounded_loop",
            Self::Syntax => "syntax",
        };
        write!(f, "{name}")
    }
}

/// One reason a program was rejected
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    /// 1-based source line
    pub line: usize,
    pub detail: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.detail, self.category)
    }
}

const OS_RUNTIME_MODULES: &[&str] = &[
    "os", "sys", "ctypes", "cffi", "importlib", "builtins", "signal", "resource", "inspect",
    "gc", "platform", "posix", "nt", "code", "codeop", "runpy",
];

const PROCESS_MODULES: &[&str] = &[
    "subprocess", "multiprocessing", "threading", "_thread", "concurrent", "asyncio", "pty",
    "sched",
];

const NETWORK_MODULES: &[&str] = &[
    "socket", "ssl", "requests", "urllib", "urllib3", "http", "httpx", "ftplib", "smtplib",
    "telnetlib", "poplib", "imaplib", "xmlrpc", "socketserver", "aiohttp", "webbrowser",
];

const FILESYSTEM_MODULES: &[&str] = &[
    "shutil", "pathlib", "glob", "tempfile", "io", "fileinput", "zipfile", "tarfile", "fcntl",
    "mmap",
];

const SERIALIZATION_MODULES: &[&str] = &[
    "pickle", "dill", "marshal", "shelve", "joblib", "cloudpickle", "dbm", "copyreg",
];

/// Category of a module path, judged on its top-level package
#[must_use]
pub(crate) fn module_category(path: &str) -> Option<FindingCategory> {
    let root = path.split('.').next().unwrap_or(path);
    [
        (OS_RUNTIME_MODULES, FindingCategory::OsRuntime),
        (PROCESS_MODULES, FindingCategory::Process),
        (NETWORK_MODULES, FindingCategory::Network),
        (FILESYSTEM_MODULES, FindingCategory::Filesystem),
        (SERIALIZATION_MODULES, FindingCategory::Serialization),
    ]
    .into_iter()
    .find(|(modules, _)| modules.contains(&root))
    .map(|(_, category)| category)
}

/// Category of a forbidden builtin name
#[must_use]
pub(crate) fn builtin_category(name: &str) -> Option<FindingCategory> {
    match name {
        "eval" | "exec" | "compile" | "__import__" => Some(FindingCategory::DynamicEvaluation),
        "open" => Some(FindingCategory::FileAccess),
        "input" | "breakpoint" => Some(FindingCategory::InteractiveInput),
        "globals" | "locals" | "vars" | "getattr" | "setattr" | "delattr" | "dir" => {
            Some(FindingCategory::Introspection)
        }
        _ => None,
    }
}

/// Check if an attribute or identifier is a dunder name
#[inline]
#[must_use]
pub(crate) fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_by_top_level_package() {
        assert_eq!(module_category("os"), Some(FindingCategory::OsRuntime));
        assert_eq!(module_category("os.path"), Some(FindingCategory::OsRuntime));
        assert_eq!(module_category("urllib.request"), Some(FindingCategory::Network));
        assert_eq!(module_category("pickle"), Some(FindingCategory::Serialization));
        assert_eq!(module_category("pandas"), None);
        assert_eq!(module_category("matplotlib.pyplot"), None);
        assert_eq!(module_category("osmnx"), None);
    }

    #[test]
    fn forbidden_builtins() {
        assert_eq!(builtin_category("exec"), Some(FindingCategory::DynamicEvaluation));
        assert_eq!(builtin_category("open"), Some(FindingCategory::FileAccess));
        assert_eq!(builtin_category("print"), None);
    }

    #[test]
    fn dunder_detection() {
        assert!(is_dunder("__class__"));
        assert!(!is_dunder("__"));
        assert!(!is_dunder("_private"));
    }
}
