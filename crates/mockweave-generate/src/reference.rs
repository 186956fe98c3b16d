//! Parsing and local traversal of `ref:` expressions.
//!
//! Resolution against scopes and the value pool lives in the evaluator,
//! which owns both.

use rand::RngCore;
use rand::seq::IndexedRandom;
use serde_json::Value;

use mockweave_core::REF_PREFIX;

/// A parsed reference expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefExpr<'a> {
    /// `ref:./a.b` (`up == 0`) or `ref:../a` (`up` = number of `../`).
    Local { up: usize, path: &'a str },
    /// `ref:a.b`: pooled values under the normalized path.
    Global { path: &'a str },
}

impl<'a> RefExpr<'a> {
    /// Parse a `ref:` string; returns `None` for plain strings.
    pub fn parse(input: &'a str) -> Option<Self> {
        let body = input.strip_prefix(REF_PREFIX)?;

        if let Some(path) = body.strip_prefix("./") {
            return Some(RefExpr::Local { up: 0, path });
        }

        let mut rest = body;
        let mut up = 0;
        while let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
            up += 1;
        }

        if up > 0 {
            Some(RefExpr::Local { up, path: rest })
        } else {
            Some(RefExpr::Global { path: body })
        }
    }
}

/// Walk `root` by dotted segments.
///
/// Numeric segments index arrays; a non-numeric segment applied to an array
/// picks a random element and reads the property from it. `null` counts as
/// unreachable.
pub fn walk_local(root: &Value, path: &str, rng: &mut dyn RngCore) -> Option<Value> {
    if path.is_empty() {
        return Some(root.clone()).filter(|value| !value.is_null());
    }

    let mut current = root;
    for part in path.split('.') {
        current = match current {
            Value::Array(items) => match part.parse::<usize>() {
                Ok(index) => items.get(index)?,
                Err(_) => items.choose(rng)?.get(part)?,
            },
            Value::Object(map) => map.get(part)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }

    Some(current.clone())
}
