//! Common utilities for Python code generation.
//!
//! Identifier checks, string quoting and block indentation shared by the
//! builder, the synthesizer and the emitter.

use std::collections::HashSet;
use std::sync::LazyLock;

/// One indentation level in emitted code.
pub const INDENT: &str = "    ";

/// Python hard keywords; none of them can name a parameter, function or class.
pub static PY_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
        "try", "while", "with", "yield",
    ]
    .into_iter()
    .collect()
});

/// Check that `name` has identifier shape: a letter or underscore followed by
/// letters, digits or underscores. Keywords pass this check.
pub fn is_identifier_shape(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Check that `name` can be used as a Python binding name.
pub fn is_valid_identifier(name: &str) -> bool {
    is_identifier_shape(name) && !PY_RESERVED_WORDS.contains(name)
}

/// Quote a string the way Python's `repr` does.
///
/// Single quotes unless the value contains a single quote and no double
/// quote; backslashes, the chosen quote and control characters are escaped.
pub fn quote_py_string(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Escape text for use inside a `"""` docstring.
pub fn escape_docstring(text: &str) -> String {
    let mut escaped = text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    if escaped.ends_with('"') {
        escaped.pop();
        escaped.push_str("\\\"");
    }
    escaped
}

/// Remove the common leading whitespace of all non-blank lines, like
/// `textwrap.dedent`, and drop leading and trailing blank lines.
pub fn dedent(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(start), Some(end)) = (start, end) else {
        return Vec::new();
    };
    strip_margin(&lines[start..=end])
}

/// Remove the longest whitespace prefix shared by every non-blank line.
///
/// The prefix is compared as text, so a tab and four spaces are different
/// margins. Blank lines become empty.
pub fn strip_margin<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let margin = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| &l[..l.len() - l.trim_start().len()])
        .reduce(common_prefix)
        .unwrap_or("");

    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.strip_prefix(margin).unwrap_or(l)
            }
        })
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let shorter = a.len().min(b.len());
    let len = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or(shorter, |((i, _), _)| i);
    &a[..len]
}

/// Indent each line with `prefix`; blank lines stay empty. Every line ends with `\n`.
pub fn indent_lines<'a>(lines: impl IntoIterator<Item = &'a str>, prefix: &str) -> String {
    lines
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                "\n".to_string()
            } else {
                format!("{prefix}{line}\n")
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("resource_name"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("id2"));
        assert!(is_valid_identifier("match"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier("foo.bar"));
        assert!(!is_valid_identifier("class"));
        assert!(!is_valid_identifier("None"));
    }

    #[test]
    fn test_identifier_shape_accepts_keywords() {
        assert!(is_identifier_shape("None"));
        assert!(is_identifier_shape("def"));
        assert!(!is_identifier_shape("a b"));
    }

    #[test]
    fn test_quote_py_string() {
        assert_eq!(quote_py_string("json"), "'json'");
        assert_eq!(quote_py_string("it's"), "\"it's\"");
        assert_eq!(quote_py_string("say \"hi\""), "'say \"hi\"'");
        assert_eq!(quote_py_string("both ' and \""), "'both \\' and \"'");
        assert_eq!(quote_py_string("a\\b"), "'a\\\\b'");
        assert_eq!(quote_py_string("line\nbreak"), "'line\\nbreak'");
        assert_eq!(quote_py_string("\u{1}"), "'\\x01'");
        assert_eq!(quote_py_string("精灵"), "'精灵'");
    }

    #[test]
    fn test_escape_docstring() {
        assert_eq!(escape_docstring("Client class."), "Client class.");
        assert_eq!(escape_docstring("a \"\"\" b"), "a \\\"\\\"\\\" b");
        assert_eq!(escape_docstring("ends with \""), "ends with \\\"");
        assert_eq!(escape_docstring("C:\\path"), "C:\\\\path");
    }

    #[test]
    fn test_dedent() {
        let body = "\n    response = await self._client.get(url)\n\n    return response.json()\n";
        assert_eq!(
            dedent(body),
            vec!["response = await self._client.get(url)", "", "return response.json()"]
        );
        assert_eq!(dedent("if x:\n    pass"), vec!["if x:", "    pass"]);
        assert!(dedent("  \n\t\n").is_empty());
    }

    #[test]
    fn test_dedent_compares_margin_as_text() {
        assert_eq!(
            dedent("\tif x:\n\t\treturn 1\n    return 2"),
            vec!["\tif x:", "\t\treturn 1", "    return 2"]
        );
        assert_eq!(
            dedent("\tif x:\n\t\treturn 1\n\treturn 2"),
            vec!["if x:", "\treturn 1", "return 2"]
        );
        assert_eq!(dedent("  \ta\n  b"), vec!["\ta", "b"]);
    }

    #[test]
    fn test_strip_margin_keeps_relative_indent() {
        assert_eq!(
            strip_margin(&["    Example:", "", "        get('pet')"]),
            vec!["Example:", "", "    get('pet')"]
        );
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(indent_lines(["a", "", "b"], INDENT), "    a\n\n    b\n");
        assert_eq!(indent_lines(Vec::<&str>::new(), INDENT), "");
    }
}
