//! Recursive evaluation of a schema tree.
//!
//! Composites under construction live on `frames`; a child only becomes
//! visible to local references once it has completed and its parent appended
//! it. Every top-level call gets its own evaluator, so pools never leak
//! between calls.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};
use tracing::trace;

use mockweave_core::{
    ArrayNode, FormatGenerator, Literal, ObjectNode, OneOfNode, REF_PREFIX, ReferenceNode, Schema,
    SchemaNode, SchemaOptions, SchemaPath, StringGenerator, StringNode, normalize_path,
};

use crate::errors::GenerationError;
use crate::generators::{
    FormatPiece, FormatTemplate, chance_hit, display_value, email, generate_boolean,
    generate_date, generate_number, generate_simple, pick_index, resolve_array_length, username,
};
use crate::model::Progress;
use crate::plugins::PluginRegistry;
use crate::pool::ValuePool;
use crate::reference::{RefExpr, walk_local};

type EvalFuture<'s> = Pin<Box<dyn Future<Output = Result<Outcome, GenerationError>> + Send + 's>>;

/// Progress sink for the root composite.
pub type ProgressFn<'p> = Box<dyn FnMut(Progress) + Send + 'p>;

/// Result of evaluating one position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    Value(Value),
    /// An optional node that was left unset.
    Unset,
}

impl Outcome {
    fn into_value(self) -> Value {
        match self {
            Outcome::Value(value) => value,
            Outcome::Unset => Value::Null,
        }
    }
}

pub(crate) struct Evaluator<'a> {
    plugins: &'a PluginRegistry,
    pool: ValuePool,
    frames: Vec<Value>,
    scopes: Vec<SchemaOptions>,
    base_options: SchemaOptions,
    rng: ChaCha8Rng,
    now: DateTime<Utc>,
    max_unique_attempts: u32,
    unique_retries: u64,
    progress: Option<ProgressFn<'a>>,
    progress_started: bool,
    progress_total: u64,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        plugins: &'a PluginRegistry,
        rng: ChaCha8Rng,
        max_unique_attempts: u32,
        progress: Option<ProgressFn<'a>>,
    ) -> Self {
        Self {
            plugins,
            pool: ValuePool::new(),
            frames: Vec::new(),
            scopes: Vec::new(),
            base_options: SchemaOptions::default(),
            rng,
            now: Utc::now(),
            max_unique_attempts: max_unique_attempts.max(1),
            unique_retries: 0,
            progress,
            progress_started: false,
            progress_total: 1,
        }
    }

    /// Evaluate the document root. An unset optional root yields `null`.
    /// The completion snapshot is the only one that reaches `total`.
    pub(crate) async fn run(&mut self, root: &Schema) -> Result<Value, GenerationError> {
        let outcome = self.evaluate(root, SchemaPath::root(), true).await?;
        let total = self.progress_total;
        self.emit_progress(total);
        Ok(outcome.into_value())
    }

    pub(crate) fn unique_retries(&self) -> u64 {
        self.unique_retries
    }

    pub(crate) fn pool(&self) -> &ValuePool {
        &self.pool
    }

    fn evaluate<'s>(&'s mut self, schema: &'s Schema, path: SchemaPath, register: bool) -> EvalFuture<'s> {
        Box::pin(async move {
            match schema {
                Schema::Literal(literal) => self.resolve_literal(literal, &path).map(Outcome::Value),
                Schema::Node(node) => {
                    let scoped = match &node.common().options {
                        Some(options) => {
                            let merged = options.merged_over(self.current_options());
                            self.scopes.push(merged);
                            true
                        }
                        None => false,
                    };
                    let outcome = self.evaluate_node(node, &path, register).await;
                    if scoped {
                        self.scopes.pop();
                    }
                    outcome
                }
            }
        })
    }

    /// Generate → optional check → transform → uniqueness → registration.
    async fn evaluate_node(
        &mut self,
        node: &SchemaNode,
        path: &SchemaPath,
        register: bool,
    ) -> Result<Outcome, GenerationError> {
        let common = node.common();
        let bucket = path.normalized();
        let mut attempts: u32 = 0;

        loop {
            let raw = match self.generate_raw(node, path).await? {
                Outcome::Value(value) => value,
                Outcome::Unset => return Ok(Outcome::Unset),
            };

            if common.optional
                && chance_hit(common.chance_unset(), &path.append("chanceUnset"), &mut self.rng)?
            {
                return Ok(Outcome::Unset);
            }

            let value = match &common.transform {
                Some(plugin) => {
                    let args = common.transform_args.clone().unwrap_or(Value::Null);
                    self.plugins.transform(plugin, raw, &args).await?
                }
                None => raw,
            };

            if common.unique && self.pool.contains(&bucket, &value) {
                attempts += 1;
                self.unique_retries += 1;
                if attempts >= self.max_unique_attempts {
                    return Err(GenerationError::UniquenessExhausted {
                        path: path.to_string(),
                        attempts,
                    });
                }
                trace!(path = %path, attempts, "unique value collision, regenerating");
                continue;
            }

            if register {
                self.pool.insert(&bucket, value.clone());
            }
            return Ok(Outcome::Value(value));
        }
    }

    async fn generate_raw(
        &mut self,
        node: &SchemaNode,
        path: &SchemaPath,
    ) -> Result<Outcome, GenerationError> {
        let value = match node {
            SchemaNode::Number(number) => generate_number(number, path, &mut self.rng)?,
            SchemaNode::Boolean(boolean) => generate_boolean(boolean, path, &mut self.rng)?,
            SchemaNode::Date(date) => generate_date(date, path, self.now, &mut self.rng)?,
            SchemaNode::String(string) => self.generate_string(string, path).await?,
            SchemaNode::Array(array) => self.generate_array(array, path).await?,
            SchemaNode::Object(object) => self.generate_object(object, path).await?,
            SchemaNode::OneOf(choice) => return self.generate_choice(choice, path).await,
            SchemaNode::Reference(reference) => self.generate_reference(reference, path)?,
            SchemaNode::Plugin(plugin) => {
                let args = plugin.args.clone().unwrap_or(Value::Null);
                self.plugins.generate(&plugin.plugin_name, &args).await?
            }
        };
        Ok(Outcome::Value(value))
    }

    async fn generate_array(
        &mut self,
        node: &ArrayNode,
        path: &SchemaPath,
    ) -> Result<Value, GenerationError> {
        let length = resolve_array_length(&node.length, path, &mut self.rng)?;

        self.frames.push(Value::Array(Vec::new()));
        self.start_root_progress(length);
        let filled = self.fill_array(node, path, length).await;
        let frame = self.frames.pop().unwrap_or(Value::Null);
        filled.map(|_| frame)
    }

    async fn fill_array(
        &mut self,
        node: &ArrayNode,
        path: &SchemaPath,
        length: usize,
    ) -> Result<(), GenerationError> {
        for index in 0..length {
            let outcome = self
                .evaluate(&node.items, path.append(index.to_string()), true)
                .await?;
            // Unset elements stay as null so indices are stable.
            if let Some(Value::Array(items)) = self.frames.last_mut() {
                items.push(outcome.into_value());
            }
            self.root_element_done(index);
        }
        Ok(())
    }

    async fn generate_object(
        &mut self,
        node: &ObjectNode,
        path: &SchemaPath,
    ) -> Result<Value, GenerationError> {
        self.frames.push(Value::Object(Map::new()));
        self.start_root_progress(node.properties.len());
        let filled = self.fill_object(node, path).await;
        let frame = self.frames.pop().unwrap_or(Value::Null);
        filled.map(|_| frame)
    }

    async fn fill_object(
        &mut self,
        node: &ObjectNode,
        path: &SchemaPath,
    ) -> Result<(), GenerationError> {
        for (index, (key, property)) in node.properties.iter().enumerate() {
            let outcome = self.evaluate(property, path.append(key.as_str()), true).await?;
            if let (Some(Value::Object(map)), Outcome::Value(value)) =
                (self.frames.last_mut(), outcome)
            {
                map.insert(key.clone(), value);
            }
            self.root_element_done(index);
        }
        Ok(())
    }

    /// The chosen element is evaluated at the choice's own path and is not
    /// registered separately; the choice registers the final value.
    async fn generate_choice(
        &mut self,
        node: &OneOfNode,
        path: &SchemaPath,
    ) -> Result<Outcome, GenerationError> {
        let index = pick_index(node.elements.len(), &mut self.rng).ok_or_else(|| {
            GenerationError::invalid_schema("oneOf", path, "elements must not be empty")
        })?;
        self.evaluate(&node.elements[index], path.clone(), false).await
    }

    async fn generate_string(
        &mut self,
        node: &StringNode,
        path: &SchemaPath,
    ) -> Result<Value, GenerationError> {
        if let Some(value) = &node.value {
            return self.resolve_str(value, path);
        }
        let Some(generator) = &node.generator else {
            return Err(GenerationError::invalid_schema(
                "string",
                path,
                "Expected either 'value' or 'generator' to be defined",
            ));
        };

        let text = match generator {
            StringGenerator::Format(format) => self.generate_format(format, path).await?,
            StringGenerator::Email(params) => {
                let first = self.resolve_hint(params.first_name.as_deref(), path)?;
                let last = self.resolve_hint(params.last_name.as_deref(), path)?;
                let domain = self.resolve_hint(params.domain.as_deref(), path)?;
                email(
                    first.as_deref(),
                    last.as_deref(),
                    domain.as_deref(),
                    &mut self.rng,
                )
            }
            StringGenerator::Username(params) => {
                let first = self.resolve_hint(params.first_name.as_deref(), path)?;
                let last = self.resolve_hint(params.last_name.as_deref(), path)?;
                username(first.as_deref(), last.as_deref(), &mut self.rng)
            }
            other => generate_simple(other, &mut self.rng).ok_or_else(|| {
                GenerationError::invalid_schema(
                    "string",
                    path,
                    format!("Unknown generator type: {}", other.kind()),
                )
            })?,
        };
        Ok(Value::String(text))
    }

    /// Arguments are evaluated lazily, once each, in the enclosing scope. They
    /// live under `args` so their pool bucket stays apart from the string's.
    async fn generate_format(
        &mut self,
        format: &FormatGenerator,
        path: &SchemaPath,
    ) -> Result<String, GenerationError> {
        let template = FormatTemplate::parse(&format.format, format.args.len(), path)?;
        let mut rendered: Vec<Option<String>> = vec![None; format.args.len()];
        let mut out = String::new();

        for piece in template.pieces() {
            match piece {
                FormatPiece::Text(text) => out.push_str(text),
                FormatPiece::Arg(index) => {
                    let index = *index;
                    if rendered[index].is_none() {
                        let outcome = self
                            .evaluate(
                                &format.args[index],
                                path.append("args").append(index.to_string()),
                                true,
                            )
                            .await?;
                        rendered[index] = Some(match outcome {
                            Outcome::Value(value) => display_value(&value),
                            Outcome::Unset => String::new(),
                        });
                    }
                    if let Some(text) = &rendered[index] {
                        out.push_str(text);
                    }
                }
            }
        }
        Ok(out)
    }

    fn generate_reference(
        &mut self,
        node: &ReferenceNode,
        path: &SchemaPath,
    ) -> Result<Value, GenerationError> {
        let raw = if node.reference.starts_with(REF_PREFIX) {
            node.reference.clone()
        } else {
            format!("{REF_PREFIX}{}", node.reference)
        };
        let expr = RefExpr::parse(&raw).ok_or_else(|| {
            GenerationError::invalid_schema("reference", path, "ref must not be empty")
        })?;
        let candidates = self.resolve_all(&expr, &raw, path)?;

        let mut excluded = Vec::new();
        for entry in node.except.iter().flatten() {
            match entry.as_str().and_then(|text| RefExpr::parse(text).map(|expr| (text, expr))) {
                Some((text, expr)) => excluded.extend(self.resolve_all(&expr, text, path)?),
                None => excluded.push(entry.to_value()),
            }
        }

        let survivors: Vec<&Value> = candidates
            .iter()
            .filter(|candidate| !excluded.contains(candidate))
            .collect();
        match survivors.choose(&mut self.rng) {
            Some(value) => Ok((*value).clone()),
            None => Ok(self.current_options().not_found_value()),
        }
    }

    fn current_options(&self) -> &SchemaOptions {
        self.scopes.last().unwrap_or(&self.base_options)
    }

    fn resolve_literal(&mut self, literal: &Literal, path: &SchemaPath) -> Result<Value, GenerationError> {
        match literal {
            Literal::String(text) => self.resolve_str(text, path),
            other => Ok(other.to_value()),
        }
    }

    fn resolve_str(&mut self, text: &str, path: &SchemaPath) -> Result<Value, GenerationError> {
        match RefExpr::parse(text) {
            Some(expr) => self.resolve_one(&expr, text, path),
            None => Ok(Value::String(text.to_string())),
        }
    }

    /// Resolve an optional parameter to text; `null` counts as absent.
    fn resolve_hint(
        &mut self,
        text: Option<&str>,
        path: &SchemaPath,
    ) -> Result<Option<String>, GenerationError> {
        let Some(text) = text else {
            return Ok(None);
        };
        Ok(match self.resolve_str(text, path)? {
            Value::Null => None,
            value => Some(display_value(&value)),
        })
    }

    /// Find the composite a local reference walks from. `Ok(None)` means the
    /// scope exists but has no value yet.
    fn local_scope(
        &self,
        up: usize,
        raw: &str,
        path: &SchemaPath,
    ) -> Result<Option<usize>, GenerationError> {
        let depth = self.frames.len();
        if up > depth {
            return Err(GenerationError::unresolved(
                raw,
                path,
                "reference climbs above the document root",
            ));
        }
        Ok((up < depth).then(|| depth - 1 - up))
    }

    fn resolve_one(
        &mut self,
        expr: &RefExpr<'_>,
        raw: &str,
        path: &SchemaPath,
    ) -> Result<Value, GenerationError> {
        match *expr {
            RefExpr::Local { up, path: local } => {
                let found = match self.local_scope(up, raw, path)? {
                    Some(frame) => walk_local(&self.frames[frame], local, &mut self.rng),
                    None => None,
                };
                match found {
                    Some(value) => Ok(value),
                    None if self.current_options().ignores_local_refs() => {
                        Ok(self.current_options().not_found_value())
                    }
                    None => Err(GenerationError::unresolved(
                        raw,
                        path,
                        "path is not reachable from the current scope",
                    )),
                }
            }
            RefExpr::Global { path: global } => {
                let bucket = normalize_path(global);
                let options = self.current_options();
                let ignore_missing = options.ignores_global_refs();
                let exclude_self = options.excludes_self();
                let fallback = options.not_found_value();

                let Some(values) = self.pool.get(&bucket) else {
                    return if ignore_missing {
                        Ok(fallback)
                    } else {
                        Err(GenerationError::unresolved(
                            raw,
                            path,
                            format!("no values have been generated for '{bucket}'"),
                        ))
                    };
                };

                let own = if exclude_self {
                    global
                        .rsplit('.')
                        .next()
                        .and_then(|key| self.frames.last().and_then(|frame| frame.get(key)))
                } else {
                    None
                };
                let candidates: Vec<&Value> = values
                    .iter()
                    .filter(|value| Some(*value) != own)
                    .collect();

                match candidates.choose(&mut self.rng) {
                    Some(value) => Ok((*value).clone()),
                    None => Ok(fallback),
                }
            }
        }
    }

    fn resolve_all(
        &mut self,
        expr: &RefExpr<'_>,
        raw: &str,
        path: &SchemaPath,
    ) -> Result<Vec<Value>, GenerationError> {
        match *expr {
            RefExpr::Local { up, path: local } => {
                let found = match self.local_scope(up, raw, path)? {
                    Some(frame) => walk_local(&self.frames[frame], local, &mut self.rng),
                    None => None,
                };
                match found {
                    Some(Value::Array(items)) => Ok(items),
                    Some(value) => Ok(vec![value]),
                    None if self.current_options().ignores_local_refs() => Ok(Vec::new()),
                    None => Err(GenerationError::unresolved(
                        raw,
                        path,
                        "path is not reachable from the current scope",
                    )),
                }
            }
            RefExpr::Global { path: global } => {
                let bucket = normalize_path(global);
                match self.pool.get(&bucket) {
                    Some(values) => Ok(values.to_vec()),
                    None if self.current_options().ignores_global_refs() => Ok(Vec::new()),
                    None => Err(GenerationError::unresolved(
                        raw,
                        path,
                        format!("no values have been generated for '{bucket}'"),
                    )),
                }
            }
        }
    }

    fn start_root_progress(&mut self, elements: usize) {
        if self.frames.len() == 1 && !self.progress_started {
            self.progress_started = true;
            // One tick per element plus one for the wrapping node.
            self.progress_total = elements as u64 + 1;
        }
    }

    fn root_element_done(&mut self, index: usize) {
        if self.frames.len() == 1 {
            self.emit_progress(index as u64 + 1);
        }
    }

    fn emit_progress(&mut self, current: u64) {
        let total = self.progress_total;
        if let Some(progress) = self.progress.as_mut() {
            progress(Progress { current, total });
        }
    }
}
