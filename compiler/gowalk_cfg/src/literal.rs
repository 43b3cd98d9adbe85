//! Literal text → compile-time constant.
//!
//! Coercion order: integer (with Go base prefixes and `_` separators),
//! float, rune, interpreted string, raw string. Text matching none of these
//! is kept verbatim as a string constant.

use gowalk_ir::Constant;

/// Parse literal source text into a constant.
pub fn parse_literal(text: &str) -> Constant {
    if let Some(value) = parse_int(text) {
        return Constant::Int(value);
    }
    if let Some(value) = parse_float(text) {
        return Constant::Float(value);
    }
    if let Some(rune) = parse_rune(text) {
        return Constant::Int(i64::from(u32::from(rune)));
    }
    if let Some(s) = parse_string(text) {
        return Constant::Str(s.into_boxed_str());
    }
    Constant::Str(Box::from(text))
}

fn parse_int(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let (digits, radix) = match cleaned.get(..2) {
        Some("0x" | "0X") => (&cleaned[2..], 16),
        Some("0o" | "0O") => (&cleaned[2..], 8),
        Some("0b" | "0B") => (&cleaned[2..], 2),
        _ if cleaned.len() > 1 && cleaned.starts_with('0') => (&cleaned[1..], 8),
        _ => (cleaned.as_str(), 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

fn parse_float(text: &str) -> Option<f64> {
    // Rust accepts `inf`/`NaN`; in source those are identifiers.
    let first = text.chars().next()?;
    if !(first.is_ascii_digit() || first == '.') {
        return None;
    }
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    cleaned.parse().ok()
}

fn parse_rune(text: &str) -> Option<char> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let decoded = unescape(inner, '\'')?;
    let mut chars = decoded.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_string(text: &str) -> Option<String> {
    if let Some(inner) = text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
        return Some(inner.replace('\r', ""));
    }
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    unescape(inner, '"')
}

/// Decode backslash escapes; `None` on a malformed escape.
fn unescape(s: &str, quote: char) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'v' => '\u{0B}',
            '\\' => '\\',
            c if c == quote => c,
            'x' => hex_escape(&mut chars, 2)?,
            'u' => hex_escape(&mut chars, 4)?,
            'U' => hex_escape(&mut chars, 8)?,
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, len: usize) -> Option<char> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.len() != len {
        return None;
    }
    let code = u32::from_str_radix(&digits, 16).ok()?;
    char::from_u32(code)
}
