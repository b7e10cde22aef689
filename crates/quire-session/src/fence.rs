//! Code extraction from generated replies

use once_cell::sync::Lazy;
use regex::Regex;

/// First fenced block, optionally tagged `python`
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:python)?\n(.*?)```").expect("code fence pattern is valid")
});

/// Program text carried by a reply
///
/// The body of the first ```` ```python ```` or bare ```` ``` ```` block,
/// trimmed; the whole trimmed reply when there is no such block.
#[must_use]
pub fn extract_code(reply: &str) -> String {
    CODE_FENCE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| reply.trim(), |body| body.as_str().trim())
        .to_string()
}
