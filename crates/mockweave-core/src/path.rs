use std::fmt;

/// Location of a node inside the schema tree.
///
/// Paths are immutable: `append` and `parent` return new values. Array
/// indices are ordinary segments (`items.0.id`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SchemaPath {
    segments: Vec<String>,
}

impl SchemaPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Drops the last segment; the parent of the root is the root.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn parent_string(&self) -> String {
        self.parent().to_string()
    }

    /// Pooling key: `items.0.id` and `items.7.id` share the bucket
    /// `items.id`, while the elements `items.0` and `items.7` share
    /// `items[]`. See [`normalize_path`].
    pub fn normalized(&self) -> String {
        normalize_path(&self.to_string())
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            f.write_str(".")
        } else {
            f.write_str(&self.segments.join("."))
        }
    }
}

/// Normalize a dotted path string into a pooling key.
///
/// Index segments (`0`, `[3]`) between named segments are dropped, so every
/// element of an array shares the bucket of its fields. A run of trailing
/// indices is kept as one `[]` per index, which keeps array elements out of
/// the array's own bucket: `nums` holds whole arrays, `nums[]` their elements.
/// Returns `"."` when nothing remains.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('.')
        .flat_map(split_index_tokens)
        .filter(|segment| !segment.is_empty())
        .collect();

    let trailing = segments.iter().rev().take_while(|segment| is_index(segment)).count();
    let named: Vec<&str> = segments[..segments.len() - trailing]
        .iter()
        .copied()
        .filter(|segment| !is_index(segment))
        .collect();

    let mut key = named.join(".");
    for _ in 0..trailing {
        key.push_str("[]");
    }
    if key.is_empty() { ".".to_string() } else { key }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_digit())
}

/// Split `matrix[0][12]` into `matrix`, `0`, `12`. Brackets that do not hold
/// digits stay part of the name.
fn split_index_tokens(segment: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut name_start = 0;
    let mut cursor = 0;
    while let Some(offset) = segment[cursor..].find('[') {
        let open = cursor + offset;
        let after = &segment[open + 1..];
        let digits = after.chars().take_while(|ch| ch.is_ascii_digit()).count();
        if digits > 0 && after[digits..].starts_with(']') {
            parts.push(&segment[name_start..open]);
            parts.push(&after[..digits]);
            cursor = open + digits + 2;
            name_start = cursor;
        } else {
            cursor = open + 1;
        }
    }
    parts.push(&segment[name_start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_dot() {
        let root = SchemaPath::root();
        assert_eq!(root.to_string(), ".");
        assert_eq!(root.parent_string(), ".");
        assert!(root.parent().is_root());
    }

    #[test]
    fn append_does_not_mutate_original() {
        let base = SchemaPath::root().append("users");
        let child = base.append("0").append("email");
        assert_eq!(base.to_string(), "users");
        assert_eq!(child.to_string(), "users.0.email");
        assert_eq!(child.parent_string(), "users.0");
    }

    #[test]
    fn normalized_collapses_array_indices() {
        let first = SchemaPath::root().append("items").append("0").append("id");
        let eighth = SchemaPath::root().append("items").append("7").append("id");
        assert_eq!(first.normalized(), "items.id");
        assert_eq!(first.normalized(), eighth.normalized());
    }

    #[test]
    fn normalize_strips_bracket_indices() {
        assert_eq!(normalize_path("items[3].id"), "items.id");
        assert_eq!(normalize_path("matrix[0][12].cell"), "matrix.cell");
        assert_eq!(normalize_path("tags[x]"), "tags[x]");
        assert_eq!(normalize_path("."), ".");
    }

    #[test]
    fn trailing_indices_stay_apart_from_the_array() {
        let array = SchemaPath::root().append("nums");
        let element = array.append("0");
        assert_eq!(array.normalized(), "nums");
        assert_eq!(element.normalized(), "nums[]");
        assert_eq!(normalize_path("items[3]"), "items[]");
        assert_eq!(normalize_path("matrix.0.1"), "matrix[][]");
        assert_eq!(normalize_path("matrix.0"), "matrix[]");
        assert_eq!(normalize_path("0"), "[]");
        assert_eq!(normalize_path("0.code"), "code");
    }
}
