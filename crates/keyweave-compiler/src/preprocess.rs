//! Lexical preprocessing of macro source text.
//!
//! Everything here works on the raw string, before the parser sees it:
//! deciding whether a mapping output is a macro at all, expanding the
//! `a + b + c` shorthand, stripping whitespace, and bracket accounting.

use std::borrow::Cow;

use crate::error::CompileError;

/// Whether a mapping output should be treated as a macro rather than as a
/// plain symbol name.
///
/// True iff the text contains a call, or contains `+` with a non-empty token
/// on each side (the hold-modifier shorthand).
///
/// ```
/// use keyweave_compiler::is_macro;
/// assert!(is_macro("k(1)"));
/// assert!(is_macro("a + b"));
/// assert!(!is_macro("btn_left"));
/// assert!(!is_macro("a+"));
/// ```
pub fn is_macro(text: &str) -> bool {
    text.contains('(') || text.trim_matches('+').contains('+')
}

/// Expand the top-level plus shorthand: `a + b + c` becomes
/// `m(a,m(b,m(c,h())))`, i.e. hold every named key down until the trigger is
/// released.
///
/// The input is returned untouched when the shorthand does not apply: no `+`,
/// any bracket present (the `+` is then nested, not top-level), or an empty
/// token between two `+`. Malformed forms are left for the parser to reject.
pub fn expand_plus(text: &str) -> Cow<'_, str> {
    if !text.contains('+') || text.contains('(') || text.contains(')') {
        return Cow::Borrowed(text);
    }
    let chunks: Vec<&str> = text.split('+').map(str::trim).collect();
    if chunks.iter().any(|chunk| chunk.is_empty()) {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len() + chunks.len() * 3 + 4);
    for chunk in &chunks {
        output.push_str("m(");
        output.push_str(chunk);
        output.push(',');
    }
    output.push_str("h()");
    for _ in &chunks {
        output.push(')');
    }
    Cow::Owned(output)
}

/// Strip every whitespace character. The grammar is whitespace-insensitive
/// and quoted arguments with embedded spaces are not a supported form.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Length of the prefix that ends at the bracket matching the first `(`.
///
/// Returns `0` when the text contains no bracket. Used by the parser to split
/// `head(args).tail` at the right spot.
///
/// ```
/// use keyweave_compiler::count_brackets;
/// assert_eq!(count_brackets("a(b(c))d()").unwrap(), 7);
/// ```
pub fn count_brackets(text: &str) -> Result<usize, CompileError> {
    let opening = text.matches('(').count();
    let closing = text.matches(')').count();
    if opening != closing {
        return Err(CompileError::UnbalancedBrackets { opening, closing });
    }

    let mut depth = 0usize;
    for (position, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(CompileError::StrayClosingBracket);
                }
                depth -= 1;
                if depth == 0 {
                    return Ok(position + 1);
                }
            }
            _ => {}
        }
    }
    Ok(0)
}
