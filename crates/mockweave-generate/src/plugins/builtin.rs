//! Plugins shipped with the engine and the loader that resolves them by name.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{Plugin, PluginError, PluginLoader};
use crate::generators::display_value;

/// Names resolvable through [`BuiltinPlugins`].
pub const BUILTIN_PLUGINS: &[&str] = &[
    "casing",
    "truncate",
    "prefix_suffix",
    "template",
    "mask",
    "to_string",
    "sort",
    "regex_filter",
    "counter",
    "jsonl",
];

/// Default loader: resolves the built-in plugin names.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPlugins;

impl PluginLoader for BuiltinPlugins {
    fn load(&self, name: &str) -> Option<Box<dyn Plugin>> {
        let plugin: Box<dyn Plugin> = match name {
            "casing" => Box::new(CasingPlugin),
            "truncate" => Box::new(TruncatePlugin),
            "prefix_suffix" => Box::new(PrefixSuffixPlugin),
            "template" => Box::new(TemplatePlugin),
            "mask" => Box::new(MaskPlugin),
            "to_string" => Box::new(ToStringPlugin),
            "sort" => Box::new(SortPlugin),
            "regex_filter" => Box::new(RegexFilterPlugin),
            "counter" => Box::new(CounterPlugin::default()),
            "jsonl" => Box::new(JsonLinesPlugin),
            _ => return None,
        };
        Some(plugin)
    }
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn text_input(value: Value, plugin: &str) -> Result<Option<String>, PluginError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        _ => Err(PluginError::InvalidArgs(format!(
            "{plugin} supports text values only"
        ))),
    }
}

struct CasingPlugin;

#[async_trait]
impl Plugin for CasingPlugin {
    fn name(&self) -> &str {
        "casing"
    }

    async fn transform(&self, value: Value, args: &Value) -> Result<Value, PluginError> {
        let mode = arg_str(args, "mode")
            .ok_or_else(|| PluginError::InvalidArgs("casing requires mode".to_string()))?;
        let Some(text) = text_input(value, "casing")? else {
            return Ok(Value::Null);
        };

        let transformed = match mode {
            "upper" => text.to_uppercase(),
            "lower" => text.to_lowercase(),
            "title" => to_title_case(&text),
            _ => {
                return Err(PluginError::InvalidArgs(
                    "casing mode must be upper, lower, or title".to_string(),
                ));
            }
        };
        Ok(Value::String(transformed))
    }
}

struct TruncatePlugin;

#[async_trait]
impl Plugin for TruncatePlugin {
    fn name(&self) -> &str {
        "truncate"
    }

    async fn transform(&self, value: Value, args: &Value) -> Result<Value, PluginError> {
        let max_len = args
            .get("maxLen")
            .and_then(Value::as_u64)
            .ok_or_else(|| PluginError::InvalidArgs("truncate requires maxLen".to_string()))?;
        let max_len = usize::try_from(max_len)
            .map_err(|_| PluginError::InvalidArgs("truncate maxLen invalid".to_string()))?;
        let Some(text) = text_input(value, "truncate")? else {
            return Ok(Value::Null);
        };
        Ok(Value::String(text.chars().take(max_len).collect()))
    }
}

struct PrefixSuffixPlugin;

#[async_trait]
impl Plugin for PrefixSuffixPlugin {
    fn name(&self) -> &str {
        "prefix_suffix"
    }

    async fn transform(&self, value: Value, args: &Value) -> Result<Value, PluginError> {
        let prefix = arg_str(args, "prefix").unwrap_or("");
        let suffix = arg_str(args, "suffix").unwrap_or("");
        let Some(text) = text_input(value, "prefix_suffix")? else {
            return Ok(Value::Null);
        };
        Ok(Value::String(format!("{prefix}{text}{suffix}")))
    }
}

struct TemplatePlugin;

#[async_trait]
impl Plugin for TemplatePlugin {
    fn name(&self) -> &str {
        "template"
    }

    async fn transform(&self, value: Value, args: &Value) -> Result<Value, PluginError> {
        let template = arg_str(args, "template")
            .ok_or_else(|| PluginError::InvalidArgs("template requires template".to_string()))?;
        if value.is_null() {
            return Ok(value);
        }
        Ok(Value::String(
            template.replace("{value}", &display_value(&value)),
        ))
    }
}

struct MaskPlugin;

#[async_trait]
impl Plugin for MaskPlugin {
    fn name(&self) -> &str {
        "mask"
    }

    async fn transform(&self, value: Value, args: &Value) -> Result<Value, PluginError> {
        if value.is_null() {
            return Ok(value);
        }
        let mode = arg_str(args, "mode")
            .ok_or_else(|| PluginError::InvalidArgs("mask requires mode".to_string()))?;
        let mask_char = arg_str(args, "maskChar")
            .and_then(|value| value.chars().next())
            .unwrap_or('*');
        let text = display_value(&value);

        let masked = match mode {
            "hash" => {
                let mut hasher = Sha256::new();
                hasher.update(text.as_bytes());
                hex::encode(hasher.finalize())
            }
            "redact" => "***".to_string(),
            "format_preserving" => format_preserving(&text, mask_char),
            _ => {
                return Err(PluginError::InvalidArgs(
                    "mask mode must be hash, redact, or format_preserving".to_string(),
                ));
            }
        };
        Ok(Value::String(masked))
    }
}

struct ToStringPlugin;

#[async_trait]
impl Plugin for ToStringPlugin {
    fn name(&self) -> &str {
        "to_string"
    }

    async fn transform(&self, value: Value, _args: &Value) -> Result<Value, PluginError> {
        match value {
            Value::Null | Value::String(_) => Ok(value),
            other => Ok(Value::String(other.to_string())),
        }
    }
}

struct SortPlugin;

#[async_trait]
impl Plugin for SortPlugin {
    fn name(&self) -> &str {
        "sort"
    }

    /// Sorts an array, by element field `by` when given. `reverse` flips the order.
    async fn transform(&self, value: Value, args: &Value) -> Result<Value, PluginError> {
        let Value::Array(mut items) = value else {
            return Err(PluginError::InvalidArgs(
                "sort supports array values only".to_string(),
            ));
        };
        let by = arg_str(args, "by");
        let reverse = args.get("reverse").and_then(Value::as_bool).unwrap_or(false);

        items.sort_by(|left, right| {
            let (left, right) = match by {
                Some(key) => (
                    left.get(key).unwrap_or(&Value::Null),
                    right.get(key).unwrap_or(&Value::Null),
                ),
                None => (left, right),
            };
            compare_values(left, right)
        });
        if reverse {
            items.reverse();
        }
        Ok(Value::Array(items))
    }
}

struct RegexFilterPlugin;

#[async_trait]
impl Plugin for RegexFilterPlugin {
    fn name(&self) -> &str {
        "regex_filter"
    }

    /// Keeps array elements whose text form matches `pattern` (or does not,
    /// with `invert`).
    async fn transform(&self, value: Value, args: &Value) -> Result<Value, PluginError> {
        let pattern = arg_str(args, "pattern")
            .ok_or_else(|| PluginError::InvalidArgs("regex_filter requires pattern".to_string()))?;
        let regex = Regex::new(pattern)
            .map_err(|err| PluginError::InvalidArgs(format!("regex_filter pattern: {err}")))?;
        let invert = args.get("invert").and_then(Value::as_bool).unwrap_or(false);

        let Value::Array(items) = value else {
            return Err(PluginError::InvalidArgs(
                "regex_filter supports array values only".to_string(),
            ));
        };
        Ok(Value::Array(
            items
                .into_iter()
                .filter(|item| regex.is_match(&display_value(item)) != invert)
                .collect(),
        ))
    }
}

/// Monotonic counter; `init` accepts `{start, step}` (defaults 1 and 1).
struct CounterPlugin {
    next: AtomicI64,
    step: i64,
}

impl Default for CounterPlugin {
    fn default() -> Self {
        Self {
            next: AtomicI64::new(1),
            step: 1,
        }
    }
}

#[async_trait]
impl Plugin for CounterPlugin {
    fn name(&self) -> &str {
        "counter"
    }

    async fn init(&mut self, args: &Value) -> Result<(), PluginError> {
        if let Some(start) = args.get("start") {
            let start = start
                .as_i64()
                .ok_or_else(|| PluginError::InvalidArgs("counter start must be an integer".to_string()))?;
            self.next = AtomicI64::new(start);
        }
        if let Some(step) = args.get("step") {
            self.step = step
                .as_i64()
                .ok_or_else(|| PluginError::InvalidArgs("counter step must be an integer".to_string()))?;
        }
        Ok(())
    }

    async fn generate(&self, _args: &Value) -> Result<Value, PluginError> {
        Ok(Value::from(
            self.next.fetch_add(self.step, AtomicOrdering::SeqCst),
        ))
    }
}

/// One JSON document per line; arrays contribute one line per element.
struct JsonLinesPlugin;

#[async_trait]
impl Plugin for JsonLinesPlugin {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn serialize(&self, value: &Value, _args: &Value) -> Result<String, PluginError> {
        let rows: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        let mut out = String::new();
        for row in rows {
            let line = serde_json::to_string(row).map_err(|err| PluginError::Failed(err.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (a, b) => display_value(a).cmp(&display_value(b)),
    }
}

fn to_title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut next_upper = true;
    for ch in value.chars() {
        if ch.is_whitespace() {
            next_upper = true;
            out.push(ch);
        } else if next_upper {
            out.extend(ch.to_uppercase());
            next_upper = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

fn format_preserving(value: &str, mask_char: char) -> String {
    if let Some((user, domain)) = value.split_once('@') {
        return format!("{}@{domain}", mask_keep_edges(user, mask_char));
    }
    // Keep separators, mask every digit but the last two.
    let digit_count = value.chars().filter(char::is_ascii_digit).count();
    if digit_count >= 6 {
        let mut seen = 0;
        return value
            .chars()
            .map(|ch| {
                if ch.is_ascii_digit() {
                    seen += 1;
                    if seen > digit_count - 2 { ch } else { mask_char }
                } else {
                    ch
                }
            })
            .collect();
    }
    mask_keep_edges(value, mask_char)
}

fn mask_keep_edges(value: &str, mask_char: char) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 2 {
        return chars.iter().map(|_| mask_char).collect();
    }
    let mut out = String::with_capacity(chars.len());
    out.push(chars[0]);
    for _ in 1..(chars.len() - 1) {
        out.push(mask_char);
    }
    out.push(chars[chars.len() - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(name: &str) -> Box<dyn Plugin> {
        BuiltinPlugins.load(name).expect("builtin plugin")
    }

    #[test]
    fn every_listed_builtin_loads() {
        for name in BUILTIN_PLUGINS {
            let plugin = load(name);
            assert_eq!(plugin.name(), *name);
        }
        assert!(BuiltinPlugins.load("nope").is_none());
    }

    #[tokio::test]
    async fn casing_and_truncate() {
        let upper = load("casing")
            .transform(json!("ana maria"), &json!({"mode": "title"}))
            .await
            .expect("casing");
        assert_eq!(upper, json!("Ana Maria"));

        let short = load("truncate")
            .transform(json!("abcdef"), &json!({"maxLen": 3}))
            .await
            .expect("truncate");
        assert_eq!(short, json!("abc"));

        let err = load("casing")
            .transform(json!(3), &json!({"mode": "upper"}))
            .await
            .expect_err("numbers are rejected");
        assert!(matches!(err, PluginError::InvalidArgs(_)));
    }

    #[tokio::test]
    async fn mask_modes() {
        let mask = load("mask");
        let hashed = mask
            .transform(json!("secret"), &json!({"mode": "hash"}))
            .await
            .expect("hash");
        assert_eq!(hashed.as_str().map(str::len), Some(64));

        let email = mask
            .transform(json!("john@example.org"), &json!({"mode": "format_preserving"}))
            .await
            .expect("email");
        assert_eq!(email, json!("j**n@example.org"));

        let phone = mask
            .transform(json!("555-123-4567"), &json!({"mode": "format_preserving", "maskChar": "#"}))
            .await
            .expect("phone");
        assert_eq!(phone, json!("###-###-##67"));
    }

    #[tokio::test]
    async fn sort_by_field_and_filter() {
        let sorted = load("sort")
            .transform(
                json!([{"n": 3}, {"n": 1}, {"n": 2}]),
                &json!({"by": "n", "reverse": true}),
            )
            .await
            .expect("sort");
        assert_eq!(sorted, json!([{"n": 3}, {"n": 2}, {"n": 1}]));

        let filtered = load("regex_filter")
            .transform(json!(["apple", "banana", "avocado"]), &json!({"pattern": "^a"}))
            .await
            .expect("filter");
        assert_eq!(filtered, json!(["apple", "avocado"]));
    }

    #[tokio::test]
    async fn counter_honors_init_args() {
        let mut counter = load("counter");
        counter
            .init(&json!({"start": 10, "step": 5}))
            .await
            .expect("init");
        assert_eq!(counter.generate(&Value::Null).await.expect("first"), json!(10));
        assert_eq!(counter.generate(&Value::Null).await.expect("second"), json!(15));
    }

    #[tokio::test]
    async fn jsonl_writes_one_line_per_element() {
        let text = load("jsonl")
            .serialize(&json!([{"a": 1}, {"a": 2}]), &Value::Null)
            .await
            .expect("serialize");
        assert_eq!(text, "{\"a\":1}\n{\"a\":2}\n");
    }

    #[tokio::test]
    async fn transforms_are_the_only_capability_of_casing() {
        let err = load("casing")
            .generate(&Value::Null)
            .await
            .expect_err("unsupported");
        assert!(matches!(err, PluginError::Unsupported));
    }
}
