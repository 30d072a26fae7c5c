//! The `MacroApplier` trait and its matching machinery.
//!
//! Every macro is matched with `\$__name\b`: the name must not be followed by
//! another identifier character. `$__timeFilter` therefore never matches
//! inside `$__timeFilter_ms`, regardless of the order appliers run in.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::args::{parse_args, MacroInvocation};
use crate::context::Context;
use crate::error::MacroResult;

/// Locates occurrences of one macro name.
#[derive(Debug, Clone)]
pub struct MacroMatcher {
    name: &'static str,
    regex: Regex,
}

impl MacroMatcher {
    pub fn new(name: &'static str) -> Self {
        let pattern = format!(r"{}\b", regex::escape(name));
        Self {
            name,
            regex: Regex::new(&pattern).expect("escaped macro name is a valid regex"),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_match(&self, sql: &str) -> bool {
        self.regex.is_match(sql)
    }

    /// Find the first occurrence and parse its arguments.
    pub fn find(&self, sql: &str) -> Option<MacroInvocation> {
        self.find_at(sql, 0)
    }

    /// Find the first occurrence starting at or after byte offset `start`.
    pub fn find_at(&self, sql: &str, start: usize) -> Option<MacroInvocation> {
        let m = self.regex.find_at(sql, start)?;
        let parsed = parse_args(sql, m.end());
        Some(MacroInvocation {
            name: self.name,
            start: m.start(),
            end: parsed.end,
            args: parsed.args,
        })
    }
}

/// Expansion logic for one macro.
///
/// Implementors provide [`matcher`](MacroApplier::matcher) and
/// [`expand`](MacroApplier::expand); the provided methods take care of
/// locating and rewriting occurrences.
#[async_trait]
pub trait MacroApplier: Send + Sync {
    fn matcher(&self) -> &MacroMatcher;

    /// Compute the replacement text for one invocation.
    ///
    /// `sql` is the full query as it stands when the invocation was found.
    async fn expand(
        &self,
        sql: &str,
        invocation: &MacroInvocation,
        ctx: &Context,
    ) -> MacroResult<String>;

    /// Canonical macro name, `$__xxx`.
    fn macro_name(&self) -> &'static str {
        self.matcher().name()
    }

    /// Expand the first occurrence at or after byte offset `from`.
    ///
    /// Occurrences nested in the invocation's arguments are expanded first.
    /// Returns the rewritten SQL and the offset just past the replacement, or
    /// `None` when no occurrence remains.
    async fn apply_at(
        &self,
        sql: &str,
        from: usize,
        ctx: &Context,
    ) -> MacroResult<Option<(String, usize)>> {
        let Some(mut invocation) = self.matcher().find_at(sql, from) else {
            return Ok(None);
        };

        let mut args = Vec::with_capacity(invocation.args.len());
        for arg in &invocation.args {
            args.push(self.apply_all(arg.clone(), ctx).await?);
        }
        invocation.args = args;

        let replacement = self.expand(sql, &invocation, ctx).await?;
        debug!(
            macro_name = invocation.name,
            source = invocation.source(sql),
            %replacement,
            "expanded macro"
        );
        let resume = invocation.start + replacement.len();
        Ok(Some((invocation.replace_in(sql, &replacement), resume)))
    }

    /// Expand the first occurrence of this macro.
    async fn apply_macro(&self, sql: &str, ctx: &Context) -> MacroResult<String> {
        Ok(match self.apply_at(sql, 0, ctx).await? {
            Some((expanded, _)) => expanded,
            None => sql.to_string(),
        })
    }

    /// Expand every occurrence of this macro.
    ///
    /// Scanning resumes after each replacement, so text produced by an
    /// expansion (a filter value, a kept expression) is never expanded again.
    async fn apply_all(&self, mut sql: String, ctx: &Context) -> MacroResult<String> {
        let mut from = 0;
        while let Some((expanded, resume)) = self.apply_at(&sql, from, ctx).await? {
            sql = expanded;
            from = resume;
        }
        Ok(sql)
    }
}
