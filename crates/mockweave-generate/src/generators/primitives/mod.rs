use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rand::{Rng, RngCore};
use serde_json::Value;

use mockweave_core::{ArrayLength, BooleanNode, DateNode, NumberNode, SchemaPath};

use crate::errors::GenerationError;
use crate::generators::number_value;

/// Largest integer exactly representable as an `f64`; the default numeric domain.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub fn generate_number(
    node: &NumberNode,
    path: &SchemaPath,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    if let Some(value) = &node.value {
        return Ok(Value::Number(value.clone()));
    }
    let drawn = draw_number(
        "number",
        path,
        node.min,
        node.max,
        node.step,
        node.decimal_places,
        rng,
    )?;
    Ok(number_value(drawn))
}

/// Draw a number in `[min, max]`, optionally snapped to `min + k * step`.
pub fn draw_number(
    kind: &'static str,
    path: &SchemaPath,
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
    decimal_places: Option<u32>,
    rng: &mut dyn RngCore,
) -> Result<f64, GenerationError> {
    let lo = min.unwrap_or(-MAX_SAFE_INTEGER);
    let hi = max.unwrap_or(MAX_SAFE_INTEGER);
    if lo > hi {
        return Err(GenerationError::invalid_schema(
            kind,
            path,
            format!("min ({lo}) must be less than or equal to max ({hi})"),
        ));
    }

    let value = match step {
        Some(step) if !(step.is_finite() && step > 0.0) => {
            return Err(GenerationError::invalid_schema(
                kind,
                path,
                format!("step must be greater than 0, got {step}"),
            ));
        }
        Some(step) => {
            let slots = ((hi - lo) / step).floor();
            let k = if slots >= 1.0 {
                rng.random_range(0..=slots as u64)
            } else {
                0
            };
            lo + k as f64 * step
        }
        None => lo + rng.random::<f64>() * (hi - lo),
    };

    Ok(match decimal_places {
        Some(places) => {
            let factor = 10_f64.powi(places as i32);
            (value * factor).round() / factor
        }
        None => value,
    })
}

pub fn generate_boolean(
    node: &BooleanNode,
    path: &SchemaPath,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    if let Some(chance) = node.chance {
        return chance_hit(chance, &path.append("chance"), rng).map(Value::Bool);
    }
    if let Some(value) = node.value {
        return Ok(Value::Bool(value));
    }
    Err(GenerationError::invalid_schema(
        "boolean",
        path,
        "Expected either 'chance' or 'value' to be defined",
    ))
}

/// Bernoulli trial; `chance` must lie in `[0, 1]`.
pub fn chance_hit(
    chance: f64,
    path: &SchemaPath,
    rng: &mut dyn RngCore,
) -> Result<bool, GenerationError> {
    if !(0.0..=1.0).contains(&chance) {
        return Err(GenerationError::invalid_schema(
            "chance",
            path,
            format!("chance must be between 0 and 1, got {chance}"),
        ));
    }
    Ok(rng.random::<f64>() < chance)
}

pub fn generate_date(
    node: &DateNode,
    path: &SchemaPath,
    now: DateTime<Utc>,
    rng: &mut dyn RngCore,
) -> Result<Value, GenerationError> {
    if let Some(value) = &node.value {
        let instant = parse_bound(value, path, "value")?;
        return Ok(Value::String(format_instant(instant)));
    }

    let min = node
        .min
        .as_deref()
        .map(|value| parse_bound(value, path, "min"))
        .transpose()?;
    let max = node
        .max
        .as_deref()
        .map(|value| parse_bound(value, path, "max"))
        .transpose()?;

    let (lo, hi) = match (min, max) {
        (Some(min), Some(max)) => {
            if min > max {
                return Err(GenerationError::invalid_schema(
                    "date",
                    path,
                    "min must be less than or equal to max",
                ));
            }
            (min, max)
        }
        (Some(bound), None) | (None, Some(bound)) => {
            if bound <= now {
                (bound, now)
            } else {
                (now, bound)
            }
        }
        (None, None) => (DateTime::<Utc>::default(), now),
    };

    let span = (hi - lo).num_milliseconds();
    let offset = if span > 0 {
        rng.random_range(0..=span)
    } else {
        0
    };
    Ok(Value::String(format_instant(
        lo + Duration::milliseconds(offset),
    )))
}

fn parse_bound(
    value: &str,
    path: &SchemaPath,
    field: &str,
) -> Result<DateTime<Utc>, GenerationError> {
    parse_instant(value).ok_or_else(|| {
        GenerationError::invalid_schema(
            "date",
            path,
            format!("{field} '{value}' is not a valid date"),
        )
    })
}

/// Parse RFC3339, naive timestamps (taken as UTC) or plain dates.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// RFC3339 with millisecond precision and a `Z` suffix.
pub fn format_instant(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Element count for an array node. Negative lengths are rejected at the
/// array's own path.
pub fn resolve_array_length(
    length: &ArrayLength,
    path: &SchemaPath,
    rng: &mut dyn RngCore,
) -> Result<usize, GenerationError> {
    let count = match length {
        ArrayLength::Fixed(value) => *value,
        ArrayLength::Constant(constant) => constant.value,
        ArrayLength::Random(random) => draw_number(
            "array",
            &path.append("length"),
            random.min,
            random.max,
            random.step,
            None,
            rng,
        )?
        .round() as i64,
    };

    if count < 0 {
        return Err(GenerationError::invalid_schema(
            "array",
            path,
            format!("Length must be greater than or equal to 0, got {count}"),
        ));
    }
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockweave_core::{ConstantLength, RandomLength};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn number_stays_within_bounds() {
        let mut rng = rng();
        let path = SchemaPath::root().append("age");
        for _ in 0..200 {
            let value = draw_number("number", &path, Some(18.0), Some(65.0), None, None, &mut rng)
                .expect("draw");
            assert!((18.0..=65.0).contains(&value));
        }
    }

    #[test]
    fn number_rejects_inverted_bounds() {
        let mut rng = rng();
        let path = SchemaPath::root().append("age");
        let err = draw_number("number", &path, Some(5.0), Some(1.0), None, None, &mut rng)
            .expect_err("inverted bounds");
        match err {
            GenerationError::InvalidSchema { kind, path, .. } => {
                assert_eq!(kind, "number");
                assert_eq!(path, "age");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn step_snaps_to_grid() {
        let mut rng = rng();
        let path = SchemaPath::root();
        for _ in 0..100 {
            let value = draw_number("number", &path, Some(10.0), Some(20.0), Some(2.5), None, &mut rng)
                .expect("draw");
            assert!([10.0, 12.5, 15.0, 17.5, 20.0].contains(&value));
        }
    }

    #[test]
    fn decimal_places_round() {
        let mut rng = rng();
        let value = draw_number(
            "number",
            &SchemaPath::root(),
            Some(0.0),
            Some(1.0),
            None,
            Some(2),
            &mut rng,
        )
        .expect("draw");
        assert_eq!((value * 100.0).round() / 100.0, value);
    }

    #[test]
    fn chance_outside_unit_interval_is_invalid() {
        let mut rng = rng();
        assert!(chance_hit(1.5, &SchemaPath::root(), &mut rng).is_err());
        assert!(chance_hit(1.0, &SchemaPath::root(), &mut rng).expect("valid"));
        assert!(!chance_hit(0.0, &SchemaPath::root(), &mut rng).expect("valid"));
    }

    #[test]
    fn date_between_bounds() {
        let mut rng = rng();
        let node = DateNode {
            min: Some("2020-01-01".to_string()),
            max: Some("2020-12-31T23:59:59Z".to_string()),
            ..DateNode::default()
        };
        let lo = parse_instant("2020-01-01").expect("lo");
        let hi = parse_instant("2020-12-31T23:59:59Z").expect("hi");
        for _ in 0..50 {
            let value = generate_date(&node, &SchemaPath::root(), Utc::now(), &mut rng)
                .expect("date");
            let parsed = parse_instant(value.as_str().expect("text")).expect("parse");
            assert!(parsed >= lo && parsed <= hi);
        }
    }

    #[test]
    fn date_constant_is_normalized() {
        let mut rng = rng();
        let node = DateNode {
            value: Some("2024-02-29".to_string()),
            ..DateNode::default()
        };
        let value = generate_date(&node, &SchemaPath::root(), Utc::now(), &mut rng).expect("date");
        assert_eq!(value, Value::String("2024-02-29T00:00:00.000Z".to_string()));
    }

    #[test]
    fn array_length_variants() {
        let mut rng = rng();
        let path = SchemaPath::root().append("items");
        assert_eq!(
            resolve_array_length(&ArrayLength::Fixed(3), &path, &mut rng).expect("fixed"),
            3
        );
        assert_eq!(
            resolve_array_length(
                &ArrayLength::Constant(ConstantLength { value: 2 }),
                &path,
                &mut rng
            )
            .expect("constant"),
            2
        );
        let random = ArrayLength::Random(RandomLength {
            min: Some(1.0),
            max: Some(4.0),
            step: None,
        });
        let count = resolve_array_length(&random, &path, &mut rng).expect("random");
        assert!((1..=4).contains(&count));
    }

    #[test]
    fn negative_array_length_names_array_path() {
        let mut rng = rng();
        let path = SchemaPath::root().append("items");
        let err = resolve_array_length(&ArrayLength::Fixed(-1), &path, &mut rng)
            .expect_err("negative");
        match err {
            GenerationError::InvalidSchema { kind, path, .. } => {
                assert_eq!(kind, "array");
                assert_eq!(path, "items");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
