//! Surface preprocessing: whitespace, escapes, character classes.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::symbol::ESCAPE_MARKER;
use crate::{Error, Result};

/// Rewrites a raw pattern into the parser's input form. Unescaped whitespace
/// is dropped and `\c` escapes become marker pairs (`\+` turns into `§+`,
/// with `\n` and `\t` resolving to the control characters). Character
/// classes expand into alternation groups (`[0-3]` turns into `(0|1|2|3)`).
pub fn preprocess(pattern: &str) -> Result<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => continue,
            '\\' => {
                let (_, escaped) = chars
                    .next()
                    .ok_or_else(|| Error::syntax("dangling escape", offset))?;
                out.push(ESCAPE_MARKER);
                out.push(resolve_escape(escaped));
            }
            '[' => expand_class(&mut chars, offset, &mut out)?,
            c => out.push(c),
        }
    }
    Ok(out)
}

fn resolve_escape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        c => c,
    }
}

// [x-y] with alphanumeric endpoints, or a plain alphanumeric list [abc]
fn expand_class(
    chars: &mut Peekable<CharIndices<'_>>,
    start: usize,
    out: &mut String,
) -> Result<()> {
    let mut content = Vec::new();
    loop {
        match chars.next() {
            Some((_, ']')) => break,
            Some((_, c)) => content.push(c),
            None => return Err(Error::syntax("unterminated character class", start)),
        }
    }
    let members: Vec<char> = match content.as_slice() {
        [] => return Err(Error::syntax("empty character class", start)),
        &[lo, '-', hi] => {
            if !lo.is_ascii_alphanumeric() || !hi.is_ascii_alphanumeric() {
                return Err(Error::syntax(
                    format!("range endpoints '{lo}'..'{hi}' must be alphanumeric"),
                    start,
                ));
            }
            if hi < lo {
                return Err(Error::syntax(format!("empty range {lo}-{hi}"), start));
            }
            (lo..=hi).collect()
        }
        list => {
            if let Some(bad) = list.iter().find(|c| !c.is_ascii_alphanumeric()) {
                return Err(Error::syntax(
                    format!("unsupported character '{bad}' in class"),
                    start,
                ));
            }
            list.to_vec()
        }
    };
    out.push('(');
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        out.push(*member);
    }
    out.push(')');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_ranges() {
        assert_eq!(preprocess("[0-3]").unwrap(), "(0|1|2|3)");
        assert_eq!(preprocess("[a-c]*").unwrap(), "(a|b|c)*");
    }

    #[test]
    fn expands_lists() {
        assert_eq!(preprocess("[ae03]").unwrap(), "(a|e|0|3)");
        assert_eq!(preprocess("[x]").unwrap(), "(x)");
    }

    #[test]
    fn marks_escaped_literals() {
        assert_eq!(preprocess(r"\+").unwrap(), "§+");
        assert_eq!(preprocess(r"a\(b\)").unwrap(), "a§(b§)");
        assert_eq!(preprocess(r"\\").unwrap(), "§\\");
        assert_eq!(preprocess(r"\n").unwrap(), "§\n");
        assert_eq!(preprocess(r"\t").unwrap(), "§\t");
    }

    #[test]
    fn strips_unescaped_whitespace() {
        assert_eq!(preprocess("a b\tc\n").unwrap(), "abc");
        // an escaped space survives
        assert_eq!(preprocess(r"a\ b").unwrap(), "a§ b");
    }

    #[test]
    fn passes_operators_through() {
        assert_eq!(preprocess("(a|b)*abb").unwrap(), "(a|b)*abb");
        assert_eq!(preprocess("a+b?{cd}").unwrap(), "a+b?{cd}");
    }

    #[test]
    fn rejects_malformed_classes() {
        assert!(preprocess("[").is_err());
        assert!(preprocess("[]").is_err());
        assert!(preprocess("[a-!]").is_err());
        assert!(preprocess("[5-2]").is_err());
        assert!(preprocess("[a|b]").is_err());
    }

    #[test]
    fn rejects_dangling_escape() {
        assert!(preprocess("ab\\").is_err());
    }
}
