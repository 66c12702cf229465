//! CLI output formatting utilities.
//!
//! Tables are built with `tabled` by each command; this module holds the
//! shared pieces: JSON highlighting and small cell formatters.

use std::fmt::Write as _;

use colored::Colorize;

use crate::wallpaper::WallpaperKind;

/// Prints JSON with syntax highlighting.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
pub fn print_highlighted_json(value: &serde_json::Value) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    println!("{}", highlight_json(&json));
}

/// Colors a pretty-printed JSON document.
#[must_use]
pub fn highlight_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len() * 2);
    let mut token = String::new();
    let mut in_string = false;
    let mut escape_next = false;
    let mut is_key = false;
    let mut after_colon = false;

    for ch in json.chars() {
        if in_string {
            token.push(ch);
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                let colored = if is_key { token.cyan() } else { token.green() };
                let _ = write!(out, "{colored}");
                token.clear();
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                flush_scalar(&mut out, &mut token);
                token.push(ch);
                in_string = true;
                is_key = !after_colon;
                after_colon = false;
            }
            ':' => {
                flush_scalar(&mut out, &mut token);
                out.push(':');
                after_colon = true;
            }
            ',' => {
                flush_scalar(&mut out, &mut token);
                out.push(',');
                after_colon = false;
            }
            '{' | '}' | '[' | ']' => {
                flush_scalar(&mut out, &mut token);
                let _ = write!(out, "{}", ch.to_string().bold());
                after_colon = false;
            }
            _ => token.push(ch),
        }
    }

    flush_scalar(&mut out, &mut token);
    out
}

/// Writes a pending unquoted token, coloring numbers and literals.
fn flush_scalar(out: &mut String, token: &mut String) {
    if token.is_empty() {
        return;
    }

    let start = token.len() - token.trim_start().len();
    let end = token.trim_end().len();
    let (prefix, rest) = token.split_at(start);
    let (value, suffix) = rest.split_at(end.saturating_sub(start));

    out.push_str(prefix);
    match value {
        "" => {}
        "true" | "false" | "null" => {
            let _ = write!(out, "{}", value.magenta());
        }
        number if number.parse::<f64>().is_ok() => {
            let _ = write!(out, "{}", number.yellow());
        }
        other => out.push_str(other),
    }
    out.push_str(suffix);

    token.clear();
}

/// Truncates a string to a maximum number of characters, adding an ellipsis if needed.
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

/// Formats a boolean as a colored check mark.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

/// Joins phase kinds for a table cell, e.g. `time, appearance`.
#[must_use]
pub fn format_kinds(kinds: &[WallpaperKind]) -> String {
    if kinds.is_empty() {
        return "-".to_string();
    }
    kinds.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Shortens a content hash for display.
#[must_use]
pub fn short_hash(hash: &str) -> &str { hash.get(..12).unwrap_or(hash) }
