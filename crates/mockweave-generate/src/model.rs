use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Default cap on regeneration attempts for a `unique` node.
pub const DEFAULT_MAX_UNIQUE_ATTEMPTS: u32 = 10_000;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Seed for the run's random source. A random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Maximum attempts to find a value not already pooled for a unique node.
    pub max_unique_attempts: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_unique_attempts: DEFAULT_MAX_UNIQUE_ATTEMPTS,
        }
    }
}

/// Generation progress after each completed root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Rate limiter for progress consumers.
///
/// The first and final updates always pass.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn should_emit(&mut self, progress: &Progress) -> bool {
        let now = Instant::now();
        let due = match self.last {
            None => true,
            Some(last) => progress.is_complete() || now.duration_since(last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub duration_ms: u64,
    pub plugins: Vec<String>,
    pub unique_retries: u64,
    pub pooled_values: usize,
    pub warnings: Vec<String>,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64) -> Self {
        Self {
            run_id,
            seed,
            duration_ms: 0,
            plugins: Vec::new(),
            unique_retries: 0,
            pooled_values: 0,
            warnings: Vec::new(),
        }
    }
}

/// Generated value together with its run report.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub value: serde_json::Value,
    pub report: GenerationReport,
}

/// Serialized output together with its run report.
#[derive(Debug, Clone)]
pub struct RenderedOutput {
    pub text: String,
    pub report: GenerationReport,
}
