use std::sync::LazyLock;

use regex::Regex;

use mockweave_core::SchemaPath;

use crate::errors::GenerationError;

static PLACEHOLDER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}"));

/// Piece of a parsed `format` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatPiece {
    Text(String),
    /// Zero-based argument index (`{1}` in the template is `Arg(0)`).
    Arg(usize),
}

/// Template with 1-based `{n}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTemplate {
    pieces: Vec<FormatPiece>,
}

impl FormatTemplate {
    /// Parse `template`, checking every placeholder against `arg_count`.
    ///
    /// A template without placeholders is invalid.
    pub fn parse(
        template: &str,
        arg_count: usize,
        path: &SchemaPath,
    ) -> Result<Self, GenerationError> {
        let placeholder = PLACEHOLDER.as_ref().map_err(|err| {
            GenerationError::invalid_schema("string", path, format!("format pattern: {err}"))
        })?;

        let mut pieces = Vec::new();
        let mut cursor = 0;
        for captures in placeholder.captures_iter(template) {
            let (Some(whole), Some(digits)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let index = digits.as_str().parse::<usize>().unwrap_or(0);
            if index == 0 || index > arg_count {
                return Err(GenerationError::invalid_schema(
                    "string",
                    path,
                    format!("Index out of bounds: {{{index}}} with {arg_count} argument(s)"),
                ));
            }
            if whole.start() > cursor {
                pieces.push(FormatPiece::Text(template[cursor..whole.start()].to_string()));
            }
            pieces.push(FormatPiece::Arg(index - 1));
            cursor = whole.end();
        }

        if !pieces.iter().any(|piece| matches!(piece, FormatPiece::Arg(_))) {
            return Err(GenerationError::invalid_schema(
                "string",
                path,
                format!("Invalid format: {template}"),
            ));
        }
        if cursor < template.len() {
            pieces.push(FormatPiece::Text(template[cursor..].to_string()));
        }

        Ok(Self { pieces })
    }

    pub fn pieces(&self) -> &[FormatPiece] {
        &self.pieces
    }
}
