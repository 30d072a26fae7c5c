//! `$__conditionalAll(expr, $var)`.
//!
//! Keeps `expr` only when the template variable has a concrete selection.
//! An empty value or the "all" sentinel means the condition would not narrow
//! anything, so it collapses to `1=1`.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::applier::{MacroApplier, MacroMatcher};
use super::args::MacroInvocation;
use crate::context::Context;
use crate::error::{MacroError, MacroResult};
use crate::sql::TRUE_CONDITION;

/// `$name`, `${name}`, `${name:format}` or `[[name]]`.
static VARIABLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\$\{(\w+)(?::\w+)?\}|\$(\w+)|\[\[(\w+)(?::\w+)?\]\])$")
        .expect("valid variable token regex")
});

/// Extract the variable name from a reference token.
pub fn variable_name(token: &str) -> Option<&str> {
    let caps = VARIABLE_TOKEN.captures(token.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

pub struct ConditionalAllApplier {
    matcher: MacroMatcher,
}

impl ConditionalAllApplier {
    pub fn new() -> Self {
        Self {
            matcher: MacroMatcher::new("$__conditionalAll"),
        }
    }

    /// Whether the variable referenced by `token` narrows the query.
    fn is_selective(&self, token: &str, name: &str, ctx: &Context) -> bool {
        if let Some(variable) = ctx.variable(name) {
            let value = &variable.current.value;
            return !value.is_empty() && !value.is_all(&ctx.all_value);
        }

        // Unknown to the context: let the caller's substitution decide.
        let replaced = ctx.replace(token);
        replaced != token && !replaced.is_empty() && replaced != ctx.all_value
    }
}

impl Default for ConditionalAllApplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MacroApplier for ConditionalAllApplier {
    fn matcher(&self) -> &MacroMatcher {
        &self.matcher
    }

    async fn expand(
        &self,
        _sql: &str,
        invocation: &MacroInvocation,
        ctx: &Context,
    ) -> MacroResult<String> {
        let args = invocation.require_args(2)?;
        let (expr, token) = (args[0], args[1]);

        let name = variable_name(token).ok_or_else(|| MacroError::InvalidArgument {
            macro_name: invocation.name,
            message: format!("{} is not a template variable reference", token),
        })?;

        if self.is_selective(token, name, ctx) {
            Ok(expr.to_string())
        } else {
            debug!(variable = name, "variable selects all values, dropping condition");
            Ok(TRUE_CONDITION.to_string())
        }
    }
}
