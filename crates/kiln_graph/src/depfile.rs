//! Parser for the make-rule output of a compiler's dependency-listing mode.
//!
//! `cc -MM src/main.cpp` prints a single rule:
//!
//! ```make
//! main.o: src/main.cpp include/util.hpp \
//!   include/detail/config.hpp
//! ```
//!
//! Escaping follows make:
//! - `\ ` (backslash space) is a literal space in a file name
//! - `\\` is a literal backslash
//! - `\#` is a literal hash
//! - `$$` is a literal dollar sign
//! - `\` at end of line is a line continuation
//!
//! The rule's target is discarded. The prerequisites come back in order with
//! duplicates removed; the caller strips the source itself.

use std::collections::HashSet;
use std::path::PathBuf;

/// Ways the dependency listing can deviate from a single make rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DepfileError {
    /// The tool printed nothing.
    #[error("dependency listing is empty")]
    Empty,

    /// No `target:` separator was found.
    #[error("dependency listing has no 'target:' separator")]
    MissingColon,

    /// The colon had no target in front of it.
    #[error("dependency listing has an empty target")]
    EmptyTarget,

    /// More than one rule was printed.
    #[error("dependency listing contains more than one rule")]
    MultipleRules,
}

/// Parses one make rule and returns its prerequisites.
pub fn parse_make_rule(content: &str) -> Result<Vec<PathBuf>, DepfileError> {
    let joined = join_continuations(content);
    let mut lines = joined.lines().filter(|l| !l.trim().is_empty());
    let line = lines.next().ok_or(DepfileError::Empty)?;
    if lines.next().is_some() {
        return Err(DepfileError::MultipleRules);
    }

    let split = find_rule_colon(line).ok_or(DepfileError::MissingColon)?;
    let (target, rest) = line.split_at(split);
    if target.trim().is_empty() {
        return Err(DepfileError::EmptyTarget);
    }

    let tokens = tokenize(&rest[1..]);
    if tokens.iter().any(|t| t.ends_with(':')) {
        return Err(DepfileError::MultipleRules);
    }

    let mut seen = HashSet::new();
    Ok(tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .map(PathBuf::from)
        .collect())
}

/// Replaces every backslash-newline (and the indentation after it) with a space.
fn join_continuations(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some('\n') => {
                    chars.next();
                    out.push(' ');
                    continue;
                }
                Some('\r') => {
                    chars.next();
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push(' ');
                    continue;
                }
                Some(&next) => {
                    // keep escapes intact for the tokenizer
                    out.push('\\');
                    out.push(next);
                    chars.next();
                    continue;
                }
                None => {}
            }
        }
        out.push(ch);
    }
    out
}

/// Finds the colon separating target from prerequisites.
///
/// The separator is a colon followed by whitespace or end of line, which
/// skips drive-letter colons such as `C:\src\main.cpp`.
fn find_rule_colon(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b':' => {
                let next = bytes.get(i + 1);
                if next.is_none() || next.is_some_and(|b| b.is_ascii_whitespace()) {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(' ') => {
                    chars.next();
                    current.push(' ');
                }
                Some('\\') => {
                    chars.next();
                    current.push('\\');
                }
                Some('#') => {
                    chars.next();
                    current.push('#');
                }
                _ => current.push('\\'),
            },
            '$' if chars.peek() == Some(&'$') => {
                chars.next();
                current.push('$');
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
