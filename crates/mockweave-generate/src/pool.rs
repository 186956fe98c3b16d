use std::collections::HashMap;

use serde_json::Value;

/// Values produced so far, bucketed by normalized path.
///
/// One pool exists per top-level generation call. It backs global
/// references and uniqueness checks.
#[derive(Debug, Default)]
pub struct ValuePool {
    buckets: HashMap<String, Vec<Value>>,
}

impl ValuePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bucket: &str, value: Value) {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .push(value);
    }

    pub fn get(&self, bucket: &str) -> Option<&[Value]> {
        self.buckets.get(bucket).map(Vec::as_slice)
    }

    pub fn contains(&self, bucket: &str, value: &Value) -> bool {
        self.buckets
            .get(bucket)
            .is_some_and(|values| values.contains(value))
    }

    pub fn value_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_insertion_order_and_duplicates() {
        let mut pool = ValuePool::new();
        pool.insert("items.id", json!(1));
        pool.insert("items.id", json!(2));
        pool.insert("items.id", json!(1));

        assert_eq!(pool.get("items.id"), Some(&[json!(1), json!(2), json!(1)][..]));
        assert!(pool.contains("items.id", &json!(2)));
        assert!(!pool.contains("items.id", &json!(3)));
        assert!(pool.get("items.name").is_none());
        assert_eq!(pool.value_count(), 3);
    }
}
