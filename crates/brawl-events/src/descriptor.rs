//! Descriptor parser — turns `root;key=value;key2={a;b}` strings into an
//! ordered argument buffer.
//!
//! Splitting happens on the separator at nesting depth zero only, so a
//! separator inside a brace pair stays part of the value. A value wholly
//! wrapped in one brace pair is unwrapped one level; partial brace groups
//! are kept verbatim. The first segment may omit `=` and is bound to the
//! implicit key `root` (the action kind); any later keyless segment is an
//! error.

use std::collections::VecDeque;

use brawl_core::{BrawlError, Result};

/// Brace flavor used for value grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceStyle {
    Curly,
    Square,
}

impl BraceStyle {
    fn open(&self) -> char {
        match self {
            BraceStyle::Curly => '{',
            BraceStyle::Square => '[',
        }
    }

    fn close(&self) -> char {
        match self {
            BraceStyle::Curly => '}',
            BraceStyle::Square => ']',
        }
    }
}

/// One parsed `key=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub key: String,
    pub value: String,
}

/// Ordered queue of parsed arguments. Order matters: the first argument is
/// the `root` (action kind) and must be consumed first.
#[derive(Debug, Default)]
pub struct ArgumentBuffer {
    args: VecDeque<Argument>,
}

impl ArgumentBuffer {
    pub fn has_next(&self) -> bool {
        !self.args.is_empty()
    }

    pub fn pop(&mut self) -> Option<Argument> {
        self.args.pop_front()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.args.push_back(Argument {
            key: key.into(),
            value: value.into(),
        });
    }
}

impl IntoIterator for ArgumentBuffer {
    type Item = Argument;
    type IntoIter = std::collections::vec_deque::IntoIter<Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.into_iter()
    }
}

/// Parse a named descriptor string into an argument buffer.
pub fn parse_named(text: &str, braces: BraceStyle, separator: char) -> Result<ArgumentBuffer> {
    let segments = split_top_level(text, braces, separator)?;

    let mut buffer = ArgumentBuffer::default();
    for (index, segment) in segments.iter().enumerate() {
        match segment.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(malformed(text, "argument has an empty key"));
                }
                buffer.push(key, unwrap_braces(value.trim(), braces)?);
            }
            None => {
                if index != 0 {
                    return Err(malformed(
                        text,
                        &format!("argument `{segment}` has no key (only the first segment may omit one)"),
                    ));
                }
                buffer.push("root", unwrap_braces(segment.trim(), braces)?);
            }
        }
    }

    Ok(buffer)
}

/// Split on the separator, ignoring separators nested inside braces.
fn split_top_level(text: &str, braces: BraceStyle, separator: char) -> Result<Vec<String>> {
    let (open, close) = (braces.open(), braces.close());
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth: u32 = 0;

    for c in text.chars() {
        if c == open {
            depth += 1;
            current.push(c);
        } else if c == close {
            depth = depth
                .checked_sub(1)
                .ok_or_else(|| malformed(text, "closing brace without a matching opening brace"))?;
            current.push(c);
        } else if c == separator && depth == 0 {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    if depth != 0 {
        return Err(malformed(text, "unclosed brace before end of input"));
    }
    if !current.is_empty() || !segments.is_empty() {
        segments.push(current);
    }

    // Trailing separators produce empty segments; drop them, but an empty
    // descriptor overall is still an error for the caller to surface.
    segments.retain(|s| !s.trim().is_empty());
    if segments.is_empty() {
        return Err(malformed(text, "descriptor is empty"));
    }

    Ok(segments)
}

/// Strip one outer brace pair if the value is a single balanced group.
fn unwrap_braces(value: &str, braces: BraceStyle) -> Result<String> {
    let (open, close) = (braces.open(), braces.close());
    if !value.starts_with(open) {
        return Ok(value.to_string());
    }

    let mut depth = 0u32;
    for (i, c) in value.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                // Only unwrap when the group spans the whole value;
                // `{a},{b}` stays verbatim.
                return if i == value.len() - close.len_utf8() {
                    Ok(value[open.len_utf8()..i].to_string())
                } else {
                    Ok(value.to_string())
                };
            }
        }
    }

    Err(BrawlError::MalformedDescriptor {
        descriptor: value.to_string(),
        reason: "bracketed value is never closed".into(),
    })
}

fn malformed(descriptor: &str, reason: &str) -> BrawlError {
    BrawlError::MalformedDescriptor {
        descriptor: descriptor.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ArgumentBuffer {
        parse_named(text, BraceStyle::Curly, ';').unwrap()
    }

    #[test]
    fn test_broadcast_descriptor() {
        let mut buffer = parse("broadcast;message={Hello};delay=5s");
        let root = buffer.pop().unwrap();
        assert_eq!(root.key, "root");
        assert_eq!(root.value, "broadcast");

        let message = buffer.pop().unwrap();
        assert_eq!(message.key, "message");
        assert_eq!(message.value, "Hello");

        let delay = buffer.pop().unwrap();
        assert_eq!(delay.key, "delay");
        assert_eq!(delay.value, "5s");
        assert!(!buffer.has_next());
    }

    #[test]
    fn test_separator_inside_braces_is_value() {
        let mut buffer = parse("run-command;commands={say hi;say bye}");
        buffer.pop().unwrap(); // root
        let commands = buffer.pop().unwrap();
        assert_eq!(commands.value, "say hi;say bye");
    }

    #[test]
    fn test_nested_braces_unwrap_one_level() {
        let mut buffer = parse("give;items={{sword};{shield}}");
        buffer.pop().unwrap();
        assert_eq!(buffer.pop().unwrap().value, "{sword};{shield}");
    }

    #[test]
    fn test_partial_brace_group_kept_verbatim() {
        let mut buffer = parse("x;v={a},{b}");
        buffer.pop().unwrap();
        assert_eq!(buffer.pop().unwrap().value, "{a},{b}");
    }

    #[test]
    fn test_deterministic_order() {
        let collect = |text: &str| -> Vec<(String, String)> {
            parse(text)
                .into_iter()
                .map(|a| (a.key, a.value))
                .collect()
        };
        let text = "title;title={Go};stay=3s;fade-out=1s";
        assert_eq!(collect(text), collect(text));
    }

    #[test]
    fn test_unbalanced_braces() {
        let err = parse_named("broadcast;message={oops", BraceStyle::Curly, ';').unwrap_err();
        assert!(matches!(err, BrawlError::MalformedDescriptor { .. }));

        let err = parse_named("broadcast;message=oops}", BraceStyle::Curly, ';').unwrap_err();
        assert!(matches!(err, BrawlError::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_empty_key() {
        let err = parse_named("broadcast;=value", BraceStyle::Curly, ';').unwrap_err();
        assert!(matches!(err, BrawlError::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_keyless_non_first_segment() {
        let err = parse_named("broadcast;stray", BraceStyle::Curly, ';').unwrap_err();
        assert!(matches!(err, BrawlError::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_empty_descriptor() {
        assert!(parse_named("", BraceStyle::Curly, ';').is_err());
        assert!(parse_named(";;", BraceStyle::Curly, ';').is_err());
    }

    #[test]
    fn test_square_braces_and_custom_separator() {
        let mut buffer = parse_named("tp,dest=[1,2,3]", BraceStyle::Square, ',').unwrap();
        assert_eq!(buffer.pop().unwrap().value, "tp");
        assert_eq!(buffer.pop().unwrap().value, "1,2,3");
    }
}
