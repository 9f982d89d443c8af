//! Candidate parsing.
//!
//! Turns a raw scanned token like `hover:dark:bg-red-500/50` into a
//! structured [`UtilitySpec`]. The parser is pure and total: the same token
//! always parses the same way, there is no configuration input, and failure
//! is a returned rejection. Scanned content is mostly noise, so callers in
//! a scanning context drop rejections silently.

use crate::CandidateRejection;

/// Utility bases the candidate grammar recognizes. The longest entry that
/// prefixes the final segment wins, so `text-lg` resolves as its own base
/// while `text-red-500` resolves as `text` + value.
pub const UTILITY_ROOTS: &[&str] = &[
    // Display and position
    "block", "inline-block", "inline", "flex", "inline-flex", "grid", "hidden",
    "relative", "absolute", "fixed", "sticky", "static", "container",
    // Flexbox helpers
    "flex-row", "flex-col", "flex-wrap", "flex-nowrap",
    "items-start", "items-center", "items-end", "items-stretch", "items-baseline",
    "justify-start", "justify-center", "justify-end", "justify-between", "justify-around",
    // Typography
    "italic", "not-italic", "underline", "overline", "line-through", "no-underline",
    "uppercase", "lowercase", "capitalize", "normal-case", "truncate", "antialiased",
    "text-left", "text-center", "text-right", "text-justify",
    "text-xs", "text-sm", "text-base", "text-lg", "text-xl", "text-2xl", "text-3xl",
    "text-4xl",
    "font-sans", "font-serif", "font-mono",
    "font", "leading", "tracking", "text",
    // Color namespaces
    "bg", "border",
    // Spacing and sizing
    "p", "px", "py", "pt", "pr", "pb", "pl",
    "m", "mx", "my", "mt", "mr", "mb", "ml",
    "w", "h", "min-w", "max-w", "min-h", "max-h",
    "gap", "gap-x", "gap-y",
    "inset", "inset-x", "inset-y", "top", "right", "bottom", "left",
    // Misc scales
    "rounded", "shadow", "opacity", "z",
];

/// Check if a name is a recognized utility base.
pub fn is_utility_root(name: &str) -> bool {
    UTILITY_ROOTS.contains(&name)
}

/// A variant in a candidate's stack, outermost-first as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantToken {
    /// A named variant like `hover` or `sm`; resolved against the variant
    /// table later.
    Named(String),
    /// An arbitrary template taken verbatim from `[...]`: either a selector
    /// pattern containing `&` or an at-rule starting with `@`.
    Arbitrary(String),
}

/// The value part of a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueToken {
    /// A theme token reference like `red-500`.
    Named(String),
    /// A literal from `[...]`, already un-escaped.
    Arbitrary(String),
}

/// The parsed form of a utility candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilitySpec {
    pub raw: String,
    pub variants: Vec<VariantToken>,
    pub base: String,
    pub value: Option<ValueToken>,
    /// Trailing `/xxx` on the value, e.g. the alpha in `bg-red-500/50`.
    pub modifier: Option<String>,
    pub important: bool,
    pub negative: bool,
}

impl UtilitySpec {
    /// Canonical class-name form. Not necessarily byte-identical to the
    /// input token, but resolves to the same meaning.
    pub fn class_name(&self) -> String {
        let mut out = String::new();
        for variant in &self.variants {
            match variant {
                VariantToken::Named(name) => out.push_str(name),
                VariantToken::Arbitrary(body) => {
                    out.push('[');
                    out.push_str(&escape_arbitrary(body));
                    out.push(']');
                }
            }
            out.push(':');
        }
        if self.important {
            out.push('!');
        }
        if self.negative {
            out.push('-');
        }
        out.push_str(&self.base);
        match &self.value {
            None => {}
            Some(ValueToken::Named(v)) => {
                out.push('-');
                out.push_str(v);
            }
            Some(ValueToken::Arbitrary(v)) => {
                out.push_str("-[");
                out.push_str(&escape_arbitrary(v));
                out.push(']');
            }
        }
        if let Some(modifier) = &self.modifier {
            out.push('/');
            out.push_str(modifier);
        }
        out
    }
}

/// Parse a raw candidate token.
pub fn parse(token: &str) -> Result<UtilitySpec, CandidateRejection> {
    if token.is_empty() {
        return Err(CandidateRejection::Empty);
    }
    if token.chars().any(char::is_whitespace) {
        return Err(CandidateRejection::Whitespace(token.to_string()));
    }
    if !brackets_balanced(token) {
        return Err(CandidateRejection::UnbalancedBrackets(token.to_string()));
    }

    let mut segments = split_on_unnested(token, ':');
    let utility = segments
        .pop()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CandidateRejection::MalformedVariant(token.to_string()))?;

    let mut variants = Vec::with_capacity(segments.len());
    for segment in segments {
        variants.push(parse_variant(segment)?);
    }

    let (base, value, modifier, important, negative) = parse_utility_segment(utility)?;

    Ok(UtilitySpec {
        raw: token.to_string(),
        variants,
        base,
        value,
        modifier,
        important,
        negative,
    })
}

fn parse_variant(segment: &str) -> Result<VariantToken, CandidateRejection> {
    if segment.is_empty() {
        return Err(CandidateRejection::MalformedVariant(segment.to_string()));
    }
    if let Some(body) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if body.is_empty() {
            return Err(CandidateRejection::MalformedVariant(segment.to_string()));
        }
        return Ok(VariantToken::Arbitrary(unescape_arbitrary(body)));
    }
    if segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Ok(VariantToken::Named(segment.to_string()));
    }
    Err(CandidateRejection::MalformedVariant(segment.to_string()))
}

type UtilityParts = (String, Option<ValueToken>, Option<String>, bool, bool);

fn parse_utility_segment(segment: &str) -> Result<UtilityParts, CandidateRejection> {
    let mut rest = segment;

    let mut important = false;
    if let Some(stripped) = rest.strip_prefix('!') {
        important = true;
        rest = stripped;
    }
    if let Some(stripped) = rest.strip_suffix('!') {
        important = true;
        rest = stripped;
    }

    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    }

    let (rest, modifier) = split_modifier(rest);

    if rest.is_empty() {
        return Err(CandidateRejection::UnknownUtility(segment.to_string()));
    }

    // Arbitrary value: base-[...]
    if let Some(open) = rest.find("-[") {
        if !rest.ends_with(']') {
            return Err(CandidateRejection::UnbalancedBrackets(segment.to_string()));
        }
        let base = &rest[..open];
        let body = &rest[open + 2..rest.len() - 1];
        if base.is_empty() || body.is_empty() {
            return Err(CandidateRejection::UnknownUtility(segment.to_string()));
        }
        if !is_utility_root(base) {
            return Err(CandidateRejection::UnknownUtility(segment.to_string()));
        }
        return Ok((
            base.to_string(),
            Some(ValueToken::Arbitrary(unescape_arbitrary(body))),
            modifier,
            important,
            negative,
        ));
    }

    // Exact static base.
    if is_utility_root(rest) {
        return Ok((rest.to_string(), None, modifier, important, negative));
    }

    // Longest root prefix followed by `-value`.
    let mut best: Option<&str> = None;
    for root in UTILITY_ROOTS {
        if rest.len() > root.len()
            && rest.starts_with(root)
            && rest.as_bytes()[root.len()] == b'-'
            && best.map_or(true, |b| root.len() > b.len())
        {
            best = Some(root);
        }
    }
    let Some(root) = best else {
        return Err(CandidateRejection::UnknownUtility(segment.to_string()));
    };
    let value = &rest[root.len() + 1..];
    if value.is_empty() {
        return Err(CandidateRejection::UnknownUtility(segment.to_string()));
    }

    Ok((
        root.to_string(),
        Some(ValueToken::Named(value.to_string())),
        modifier,
        important,
        negative,
    ))
}

/// Split a trailing `/modifier` off the utility segment, ignoring slashes
/// inside brackets (`bg-[url(a/b)]` keeps its slash).
fn split_modifier(segment: &str) -> (&str, Option<String>) {
    let mut depth = 0usize;
    for (idx, ch) in segment.char_indices().rev() {
        match ch {
            ']' | ')' => depth += 1,
            '[' | '(' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                let modifier = &segment[idx + 1..];
                if modifier.is_empty() {
                    return (segment, None);
                }
                let modifier = modifier
                    .strip_prefix('[')
                    .and_then(|m| m.strip_suffix(']'))
                    .unwrap_or(modifier);
                return (&segment[..idx], Some(modifier.to_string()));
            }
            _ => {}
        }
    }
    (segment, None)
}

fn split_on_unnested(token: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in token.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&token[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&token[start..]);
    parts
}

fn brackets_balanced(token: &str) -> bool {
    let mut square = 0i32;
    let mut paren = 0i32;
    for ch in token.chars() {
        match ch {
            '[' => square += 1,
            ']' => square -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            _ => {}
        }
        if square < 0 || paren < 0 {
            return false;
        }
    }
    square == 0 && paren == 0
}

/// In arbitrary segments `_` stands in for a space; a literal underscore is
/// written `\_`.
fn unescape_arbitrary(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'_') => {
                chars.next();
                out.push('_');
            }
            '_' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_arbitrary(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for ch in body.chars() {
        match ch {
            ' ' => out.push('_'),
            '_' => out.push_str("\\_"),
            _ => out.push(ch),
        }
    }
    out
}
