//! Tag-list splitting
//!
//! Parses the angle-bracket structured values found in VCF meta-information
//! lines, e.g. `<ID=DP,Number=1,Type=Integer,Description="Total depth, x">`.
//!
//! Splitting happens on top-level commas only. Double- or single-quoted
//! sections are kept intact (commas and `=` inside them are literal) and the
//! quote characters themselves are dropped from the value.

use crate::core::error::TagParseError;
use indexmap::IndexMap;

/// Ordered key -> value mapping parsed from one tag list
pub type TagMap = IndexMap<String, String>;

/// Split a tag list into an ordered key -> value map
///
/// Leading `<` and trailing `>` are stripped first. Each top-level token is
/// split on its first `=`; a token without `=` is an error.
///
/// # Examples
/// ```
/// use fast_vcfparser::core::tags::split_to_dict;
///
/// let tags = split_to_dict(r#"<ID=AC,Number=A,Description="Allele count, per ALT">"#).unwrap();
/// assert_eq!(tags["ID"], "AC");
/// assert_eq!(tags["Description"], "Allele count, per ALT");
/// ```
pub fn split_to_dict(input: &str) -> Result<TagMap, TagParseError> {
    let body = input.trim_start_matches('<').trim_end_matches('>');
    let mut tags = TagMap::new();

    for token in split_top_level(body)? {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| TagParseError::MissingEquals { token: token.clone() })?;
        tags.insert(key.trim().to_string(), value.to_string());
    }

    Ok(tags)
}

/// Undo the `\"` and `\\` escapes of a double-quoted value
///
/// Any other backslash is kept as written.
pub fn unescape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        let escaped = if c == '\\' {
            chars.next_if(|&n| n == '"' || n == '\\')
        } else {
            None
        };
        out.push(escaped.unwrap_or(c));
    }
    out
}

/// Tokenize on unquoted commas, removing quote characters
///
/// Backslash escapes the next character outside quotes, and `"` or `\`
/// inside double quotes. Empty tokens are skipped.
fn split_top_level(body: &str) -> Result<Vec<String>, TagParseError> {
    let mut tokens = Vec::new();
    let mut current = String::with_capacity(body.len());
    let mut quote: Option<char> = None;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => match chars.peek() {
                Some(&next) if next == '"' || next == '\\' => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push(c),
            },
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => quote = Some(c),
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                ',' => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            },
        }
    }

    if quote.is_some() {
        return Err(TagParseError::UnterminatedQuote {
            input: body.to_string(),
        });
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}
