//! Response cleaning ahead of the strategy chain
//!
//! LLMs wrap JSON in markdown fences, leak prose around it, emit `\uXXXX`
//! escapes for CJK text, and truncate objects mid-stream. The cleaner repairs
//! what it can without ever failing: every step degrades to its input when it
//! cannot improve it.

use tracing::debug;

/// Switches for the individual cleaning steps
#[derive(Debug, Clone)]
pub struct CleaningOptions {
    /// Decode `\uXXXX` escape sequences outside of legal JSON escapes
    pub fix_unicode: bool,
    /// Repair missing commas and unbalanced braces
    pub fix_format: bool,
    /// Emit before/after length logging
    pub detailed_logging: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            fix_unicode: true,
            fix_format: true,
            detailed_logging: false,
        }
    }
}

/// A total cleaning function: must never fail, may return its input unchanged
pub trait Cleaner: Send + Sync {
    /// Clean a raw response ahead of decoding
    fn clean(&self, raw: &str, options: &CleaningOptions) -> String;
}

/// Default cleaning pipeline
///
/// Steps run in order: strip markdown fences, decode unicode escapes, extract
/// the first balanced JSON object, then repair commas and braces.
#[derive(Debug, Default, Clone)]
pub struct DefaultCleaner;

impl Cleaner for DefaultCleaner {
    fn clean(&self, raw: &str, options: &CleaningOptions) -> String {
        let mut result = strip_markdown_fences(raw);
        if options.fix_unicode {
            result = decode_unicode_escapes(&result);
        }
        result = extract_json_object(&result);
        if options.fix_format {
            result = fix_missing_commas(&result);
            result = balance_braces(&result);
        }
        if options.detailed_logging {
            debug!(
                raw_len = raw.len(),
                cleaned_len = result.len(),
                "response cleaning finished"
            );
        }
        result
    }
}

/// Remove a ```json ... ``` (or bare ```) wrapper if present
fn strip_markdown_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed.to_string();
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim().to_string(),
        None => body.trim().to_string(),
    }
}

/// Decode `\uXXXX` sequences into their characters
///
/// Legal JSON escapes (`\"`, `\n`, `\t`, `\\`) are left untouched; rewriting
/// them corrupts strings that were escaped correctly.
fn decode_unicode_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\\' && text.as_bytes().get(i + 1) == Some(&b'u') {
            if let Some(hex) = text.get(i + 2..i + 6) {
                if hex.chars().all(|h| h.is_ascii_hexdigit()) {
                    if let Some(decoded) =
                        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                    {
                        out.push(decoded);
                        // Skip the 'u' and four hex digits
                        for _ in 0..5 {
                            chars.next();
                        }
                        continue;
                    }
                }
            }
        }
        out.push(c);
    }
    out
}

/// Extract the first balanced `{...}` object by brace counting
///
/// A truncated object (more `{` than `}`) keeps its tail and gains a closing
/// brace; text without any `{` comes back as `{}`.
fn extract_json_object(text: &str) -> String {
    let start = match text.find('{') {
        Some(i) => i,
        None => return "{}".to_string(),
    };
    let mut depth = 0usize;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return text[start..start + i + 1].to_string();
                }
            }
            _ => {}
        }
    }
    format!("{}}}", &text[start..])
}

/// Insert a comma between `}` and a following `"` when one is missing
fn fix_missing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if c == '}' && chars.get(i + 1) == Some(&'"') && i > 0 && chars[i - 1] != ',' {
            out.push(',');
        }
    }
    out
}

/// Append missing `}` or drop surplus trailing `}` so the counts balance
fn balance_braces(text: &str) -> String {
    let open = text.matches('{').count();
    let close = text.matches('}').count();
    if open > close {
        let mut result = text.to_string();
        result.push_str(&"}".repeat(open - close));
        result
    } else if close > open {
        let mut result = text.to_string();
        for _ in 0..close - open {
            if let Some(i) = result.rfind('}') {
                result.remove(i);
            }
        }
        result
    } else {
        text.to_string()
    }
}
