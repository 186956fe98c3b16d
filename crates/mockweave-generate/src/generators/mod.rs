//! Value producers for the leaf node kinds.
//!
//! Generators only draw values; scoping, references and registration are the
//! evaluator's concern.

pub mod format;
pub mod primitives;
pub mod semantic;

use rand::RngCore;
use serde_json::Value;

pub use format::{FormatPiece, FormatTemplate};
pub use primitives::{
    MAX_SAFE_INTEGER, chance_hit, draw_number, format_instant, generate_boolean, generate_date,
    generate_number, parse_instant, resolve_array_length,
};
pub use semantic::{email, generate_simple, username};

/// Emit integral floats as JSON integers and everything else as floats.
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Uniform index into a non-empty collection.
pub fn pick_index(len: usize, rng: &mut dyn RngCore) -> Option<usize> {
    use rand::Rng;

    if len == 0 {
        None
    } else {
        Some(rng.random_range(0..len))
    }
}

/// Text form used when a value is spliced into a string.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
