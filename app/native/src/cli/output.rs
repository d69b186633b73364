//! CLI output formatting utilities.
//!
//! - JSON syntax highlighting for `status` and friends
//! - Small cell formatters for `tabled` rows

use std::fmt::Write;

use colored::Colorize;
use serde_json::Value;

const INDENT: &str = "  ";

/// Prints JSON with syntax highlighting.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
pub fn print_highlighted_json(value: &Value) { println!("{}", highlight_json(value)); }

/// Renders `value` the way `serde_json::to_string_pretty` does, with colors.
#[must_use]
pub fn highlight_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => push(out, "null".magenta()),
        Value::Bool(flag) => push(out, flag.to_string().magenta()),
        Value::Number(number) => push(out, number.to_string().yellow()),
        Value::String(text) => push(out, quote(text).green()),
        Value::Array(items) => {
            write_block(out, depth, ('[', ']'), items.iter(), |out, item| {
                write_value(out, item, depth + 1);
            });
        }
        Value::Object(map) => {
            write_block(out, depth, ('{', '}'), map.iter(), |out, (key, item)| {
                push(out, quote(key).cyan());
                out.push_str(": ");
                write_value(out, item, depth + 1);
            });
        }
    }
}

fn write_block<I, F>(
    out: &mut String,
    depth: usize,
    (open, close): (char, char),
    items: I,
    mut each: F,
) where
    I: ExactSizeIterator,
    F: FnMut(&mut String, I::Item),
{
    if items.len() == 0 {
        push(out, format!("{open}{close}").white().bold());
        return;
    }

    push(out, open.to_string().white().bold());
    for (position, item) in items.enumerate() {
        if position > 0 {
            push(out, ",".white());
        }
        out.push('\n');
        out.push_str(&INDENT.repeat(depth + 1));
        each(out, item);
    }
    out.push('\n');
    out.push_str(&INDENT.repeat(depth));
    push(out, close.to_string().white().bold());
}

fn push(out: &mut String, token: impl std::fmt::Display) { let _ = write!(out, "{token}"); }

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

/// Truncates to `max_chars` characters, adding an ellipsis when cut.
///
/// Counts characters, not bytes, so multi-byte text is never split.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }

    let cut = s.char_indices().nth(max_chars - 1).map_or(s.len(), |(idx, _)| idx);
    format!("{}…", &s[..cut])
}

/// Formats a boolean as a colored check mark or cross.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_matches_pretty_printer_without_colors() {
        colored::control::set_override(false);
        let value = serde_json::json!({
            "picture_url": "https://www.bing.com/th?id=A_UHD.jpg",
            "index": 2,
            "zoom": 1.3,
            "favorite": true,
            "favorite_id": null,
            "history": [],
            "nested": { "tags": ["a", "b \"quoted\""], "empty": {} }
        });

        assert_eq!(highlight_json(&value), serde_json::to_string_pretty(&value).unwrap());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello world", 8), "hello w…");
        assert_eq!(truncate("hello", 1), "…");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Paysage d'été à Genève", 12), "Paysage d'é…");
        assert_eq!(truncate("hello 🌍 world", 8), "hello 🌍…");
    }

    #[test]
    fn test_format_bool() {
        assert!(format_bool(true).contains('✓'));
        assert!(format_bool(false).contains('✗'));
    }
}
