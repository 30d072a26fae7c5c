//! Macro argument parsing.
//!
//! Arguments are split on commas at the macro's own parenthesis depth only,
//! so nested calls (`func(a, b)`) and nested macros stay in one piece.
//! Quoted strings are opaque: commas and parentheses inside `'...'`, `"..."`
//! or `` `...` `` never split or close anything.

use tracing::trace;

use crate::error::{MacroError, MacroResult};

/// A macro occurrence located in SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInvocation {
    /// Macro name including the `$__` prefix.
    pub name: &'static str,
    /// Byte offset of the `$`.
    pub start: usize,
    /// Byte offset one past the closing `)`, or past the name without arguments.
    pub end: usize,
    /// Raw argument text, whitespace preserved.
    pub args: Vec<String>,
}

impl MacroInvocation {
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// The exact text this invocation spans.
    pub fn source<'a>(&self, sql: &'a str) -> &'a str {
        &sql[self.start..self.end]
    }

    /// Replace this invocation in `sql` with `replacement`.
    pub fn replace_in(&self, sql: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(sql.len() + replacement.len());
        out.push_str(&sql[..self.start]);
        out.push_str(replacement);
        out.push_str(&sql[self.end..]);
        out
    }

    /// Check the invocation has exactly `count` non-empty arguments and return them trimmed.
    pub fn require_args(&self, count: usize) -> MacroResult<Vec<&str>> {
        let trimmed: Vec<&str> = self.args.iter().map(|a| a.trim()).collect();
        if trimmed.len() != count || trimmed.iter().any(|a| a.is_empty()) {
            return Err(MacroError::arity(self.name, expected_args(count)));
        }
        Ok(trimmed)
    }
}

fn expected_args(count: usize) -> &'static str {
    match count {
        0 => "no arguments",
        1 => "1 non-empty argument",
        2 => "2 non-empty arguments",
        _ => "a different number of arguments",
    }
}

/// Result of scanning for an argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub args: Vec<String>,
    /// Byte offset one past the closing `)`; equal to the input offset when
    /// there is no (balanced) argument list.
    pub end: usize,
}

/// Parse the argument list starting at `offset` (the index right after a macro name).
///
/// Returns no arguments when no `(` immediately follows, when the parentheses
/// never balance, or when the list is blank (`()` / `(  )`).
pub fn parse_args(sql: &str, offset: usize) -> ParsedArgs {
    let none = ParsedArgs {
        args: Vec::new(),
        end: offset,
    };

    let rest = &sql[offset..];
    if !rest.starts_with('(') {
        return none;
    }

    let mut depth = 0usize;
    let mut arg_start = 1;
    let mut args = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                // A doubled quote closes and immediately reopens, which is equivalent.
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    args.push(rest[arg_start..i].to_string());
                    if args.len() == 1 && args[0].trim().is_empty() {
                        args.clear();
                    }
                    trace!(?args, "parsed macro arguments");
                    return ParsedArgs {
                        args,
                        end: offset + i + 1,
                    };
                }
            }
            ',' if depth == 1 => {
                args.push(rest[arg_start..i].to_string());
                arg_start = i + 1;
            }
            _ => {}
        }
    }

    trace!(offset, "unbalanced macro argument list");
    none
}
