// src/compiler/escape.rs
//! Literal escaping for generated source

use std::fmt::Write;

/// Double-quoted Python string literal
pub fn py_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && (c as u32) < 0x100 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Single-quoted JavaScript string literal
pub fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() && (c as u32) < 0x100 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Text safe to place after a line-comment marker
pub fn comment_text(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_control() || c == '\u{2028}' || c == '\u{2029}' {
                ' '
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Number literal valid in both Python and JavaScript
pub fn number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_string() {
        assert_eq!(py_string("plain"), r#""plain""#);
        assert_eq!(py_string(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(py_string("a\\b"), r#""a\\b""#);
        assert_eq!(py_string("line\nbreak"), r#""line\nbreak""#);
        assert_eq!(py_string("\u{1}"), r#""\x01""#);
        assert_eq!(py_string("héllo"), "\"héllo\"");
    }

    #[test]
    fn test_js_string() {
        assert_eq!(js_string("it's"), r"'it\'s'");
        assert_eq!(js_string(r"C:\tmp"), r"'C:\\tmp'");
        assert_eq!(js_string("a\u{2028}b"), r"'a\u2028b'");
        assert_eq!(js_string("tab\there"), r"'tab\there'");
    }

    #[test]
    fn test_escaping_is_not_applied_twice() {
        // An already-escaped sequence is treated as literal text
        assert_eq!(js_string(r"\'"), r"'\\\''");
        assert_eq!(py_string(r#"\""#), r#""\\\"""#);
    }

    #[test]
    fn test_comment_text() {
        assert_eq!(comment_text("step one\nrm -rf /"), "step one rm -rf /");
        assert_eq!(comment_text("  padded\r\n"), "padded");
    }

    #[test]
    fn test_number() {
        assert_eq!(number(120.0), "120");
        assert_eq!(number(-3.0), "-3");
        assert_eq!(number(44.5), "44.5");
        assert_eq!(number(f64::NAN), "0");
    }
}
