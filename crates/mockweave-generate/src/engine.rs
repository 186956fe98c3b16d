use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::{info, warn};

use mockweave_core::{Schema, SerializerOptions};
use mockweave_schema::validate_document;

use crate::errors::GenerationError;
use crate::evaluator::{Evaluator, ProgressFn};
use crate::model::{GenerateOptions, GenerationReport, GenerationResult, Progress, RenderedOutput};
use crate::plugins::{BuiltinPlugins, Plugin, PluginLoader, PluginRegistry};
use crate::serialize::serialize_value;

/// Entry point for generating value trees from schema documents.
///
/// The engine itself is stateless between calls: every call validates the
/// document, builds its own plugin registry, pool and random source, and
/// drops them when it returns.
#[derive(Debug, Clone, Default)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate a value tree using the built-in plugin loader.
    pub async fn generate(
        &self,
        document: &Value,
        bindings: Vec<Box<dyn Plugin>>,
    ) -> Result<Value, GenerationError> {
        self.generate_with_progress(document, bindings, &BuiltinPlugins, None)
            .await
            .map(|result| result.value)
    }

    /// Generate a value tree, reporting progress after each root element.
    pub async fn generate_with_progress<'p>(
        &self,
        document: &Value,
        bindings: Vec<Box<dyn Plugin>>,
        loader: &dyn PluginLoader,
        progress: Option<ProgressFn<'p>>,
    ) -> Result<GenerationResult, GenerationError> {
        let mut run = RunState::start(&self.options);
        let outcome = self
            .execute(document, bindings, loader, progress, &mut run, None)
            .await;
        run.finish(outcome)
            .map(|(value, _, report)| GenerationResult { value, report })
    }

    /// Generate and serialize in one call, so plugin serializers run against
    /// the same registry that produced the value.
    ///
    /// `serializer` overrides the document's root `serializer` option.
    pub async fn render<'p>(
        &self,
        document: &Value,
        bindings: Vec<Box<dyn Plugin>>,
        loader: &dyn PluginLoader,
        progress: Option<ProgressFn<'p>>,
        serializer: Option<SerializerOptions>,
    ) -> Result<RenderedOutput, GenerationError> {
        let mut run = RunState::start(&self.options);
        let outcome = self
            .execute(document, bindings, loader, progress, &mut run, Some(serializer))
            .await;
        run.finish(outcome).map(|(_, text, report)| RenderedOutput {
            text: text.unwrap_or_default(),
            report,
        })
    }

    async fn execute(
        &self,
        document: &Value,
        bindings: Vec<Box<dyn Plugin>>,
        loader: &dyn PluginLoader,
        progress: Option<ProgressFn<'_>>,
        run: &mut RunState,
        serializer: Option<Option<SerializerOptions>>,
    ) -> Result<(Value, Option<String>), GenerationError> {
        let validated = validate_document(document).map_err(GenerationError::SchemaValidation)?;
        run.report.warnings = validated
            .warnings
            .iter()
            .map(ToString::to_string)
            .collect();
        let root: &Schema = &validated.document;

        let registry = PluginRegistry::initialize(root, bindings, loader).await?;
        run.report.plugins = registry.names();

        let rng = ChaCha8Rng::seed_from_u64(run.report.seed);
        let mut evaluator = Evaluator::new(
            &registry,
            rng,
            self.options.max_unique_attempts,
            progress,
        );
        let value = evaluator.run(root).await?;
        run.report.unique_retries = evaluator.unique_retries();
        run.report.pooled_values = evaluator.pool().value_count();
        drop(evaluator);

        let text = match serializer {
            Some(explicit) => {
                let chosen = explicit
                    .or_else(|| root.options().and_then(|options| options.serializer.clone()))
                    .unwrap_or_default();
                Some(serialize_value(&value, &chosen, &registry).await?)
            }
            None => None,
        };
        Ok((value, text))
    }
}

struct RunState {
    start: Instant,
    report: GenerationReport,
}

impl RunState {
    fn start(options: &GenerateOptions) -> Self {
        let run_id = uuid::Uuid::new_v4().to_string();
        let seed = options.seed.unwrap_or_else(|| rand::rng().random());
        info!(run_id = %run_id, seed, "generation started");
        Self {
            start: Instant::now(),
            report: GenerationReport::new(run_id, seed),
        }
    }

    fn finish(
        mut self,
        outcome: Result<(Value, Option<String>), GenerationError>,
    ) -> Result<(Value, Option<String>, GenerationReport), GenerationError> {
        self.report.duration_ms = self.start.elapsed().as_millis() as u64;
        match outcome {
            Ok((value, text)) => {
                info!(
                    run_id = %self.report.run_id,
                    duration_ms = self.report.duration_ms,
                    plugins = self.report.plugins.len(),
                    pooled_values = self.report.pooled_values,
                    unique_retries = self.report.unique_retries,
                    "generation completed"
                );
                Ok((value, text, self.report))
            }
            Err(err) => {
                warn!(
                    run_id = %self.report.run_id,
                    duration_ms = self.report.duration_ms,
                    error = %err,
                    "generation failed"
                );
                Err(err)
            }
        }
    }
}

/// Progress callback that forwards to `sink` only when `throttle` allows it.
pub fn throttled_progress<'p>(
    mut throttle: crate::model::ProgressThrottle,
    mut sink: impl FnMut(Progress) + Send + 'p,
) -> ProgressFn<'p> {
    Box::new(move |progress: Progress| {
        if throttle.should_emit(&progress) {
            sink(progress);
        }
    })
}
