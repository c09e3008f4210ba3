//! Source-level lowering of syntax the grammars do not accept

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// `export v from "m"` and `export v, { a, b } from "m"` at the start of a line
    static ref EXPORT_DEFAULT_FROM: Regex = Regex::new(
        r#"(?m)^([ \t]*)export[ \t]+([A-Za-z_$][A-Za-z0-9_$]*)[ \t]*(?:,[ \t]*\{([^}\n]*)\})?[ \t]*from[ \t]*("[^"\n]*"|'[^'\n]*')"#
    )
    .expect("valid regex");
}

const RESERVED: &[&str] = &[
    "default", "const", "let", "var", "function", "class", "async", "type", "interface",
    "enum", "abstract", "declare", "namespace", "as", "import",
];

/// Rewrite `export v from "m"` to `export { default as v } from "m"`.
///
/// The replacement stays on the same line, so diagnostics keep their line
/// numbers.
pub(crate) fn expand_export_default_from(source: &str) -> Cow<'_, str> {
    EXPORT_DEFAULT_FROM.replace_all(source, |caps: &Captures| {
        let binding = &caps[2];
        if RESERVED.contains(&binding) {
            return caps[0].to_string();
        }
        let named = caps
            .get(3)
            .map(|m| m.as_str().trim().trim_end_matches(',').trim())
            .filter(|names| !names.is_empty())
            .map(|names| format!(", {}", names))
            .unwrap_or_default();
        format!(
            "{}export {{ default as {}{} }} from {}",
            &caps[1], binding, named, &caps[4]
        )
    })
}
