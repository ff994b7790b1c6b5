//! Distinct character listing.
//!
//! Collects every character occurring in a text, ignoring line terminators,
//! and reports each once in code-point order.

use anyhow::Result;
use content_inspector::ContentType;
use std::collections::BTreeMap;

/// A character and how often it occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCount {
    /// The character
    pub ch: char,
    /// Number of occurrences
    pub count: usize,
}

impl CharCount {
    /// Printable form: control characters and whitespace other than a plain
    /// space are shown as escapes
    #[must_use]
    pub fn display(&self) -> String {
        match self.ch {
            '\t' => "\\t".to_string(),
            c if c.is_control() => c.escape_unicode().to_string(),
            c if c.is_whitespace() && c != ' ' => c.escape_unicode().to_string(),
            c => c.to_string(),
        }
    }

    /// Code point in `U+XXXX` notation
    #[must_use]
    pub fn code_point(&self) -> String {
        format!("U+{:04X}", u32::from(self.ch))
    }
}

/// Validate raw input as UTF-8 text
///
/// # Errors
///
/// Returns an error if the input looks binary or is not valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> Result<&str> {
    match content_inspector::inspect(bytes) {
        ContentType::BINARY => anyhow::bail!("Input looks like binary data"),
        ContentType::UTF_16LE
        | ContentType::UTF_16BE
        | ContentType::UTF_32LE
        | ContentType::UTF_32BE => {
            anyhow::bail!("Input is UTF-16/32 encoded; convert it to UTF-8 first")
        }
        _ => {}
    }

    let text = simdutf8::basic::from_utf8(bytes)
        .map_err(|_| anyhow::anyhow!("Input is not valid UTF-8"))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Distinct characters of `text` in code-point order, without `\n` and `\r`
#[must_use]
pub fn distinct_chars(text: &str) -> Vec<CharCount> {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for ch in text.chars().filter(|c| !matches!(c, '\n' | '\r')) {
        *counts.entry(ch).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(ch, count)| CharCount { ch, count })
        .collect()
}
