use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::gemini::TextGenerator;
use crate::models::{ContentBasis, Example, PipelineSnapshot};
use crate::pipeline::{Outcome, PipelineOrchestrator, RunClock};
use crate::video::{validate_video_url, ValidationError};

/// Owns the current content basis and starts a fresh orchestrator per basis.
pub struct SessionController {
    generator: Arc<dyn TextGenerator>,
    model: String,
    clock: Arc<RunClock>,
    current: RwLock<Option<Arc<PipelineOrchestrator>>>,
}

impl SessionController {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
            clock: RunClock::new(),
            current: RwLock::new(None),
        }
    }

    /// Assign a new basis. Any earlier run keeps going but can no longer commit.
    pub fn assign(&self, basis: ContentBasis) -> Arc<PipelineOrchestrator> {
        let mut current = self.current.write();
        let run = self.clock.advance();
        let orchestrator = Arc::new(PipelineOrchestrator::new(
            run,
            basis,
            self.model.clone(),
            self.generator.clone(),
            self.clock.clone(),
        ));
        info!(run, phase = ?orchestrator.phase(), "🚀 Started run");
        *current = Some(orchestrator.clone());
        orchestrator
    }

    /// Validate a submitted URL and start a generation run for it.
    pub fn submit_url(&self, url: &str) -> Result<Arc<PipelineOrchestrator>, ValidationError> {
        let url = validate_video_url(url)?;
        Ok(self.assign(ContentBasis::Video { url }))
    }

    pub fn select_example(&self, example: &Example) -> Arc<PipelineOrchestrator> {
        info!("📚 Selected example '{}'", example.title);
        self.assign(example.to_basis())
    }

    /// Run the orchestrator's stages on the tokio runtime.
    pub fn launch(orchestrator: Arc<PipelineOrchestrator>) -> JoinHandle<Outcome> {
        tokio::spawn(async move { orchestrator.run().await })
    }

    pub fn current(&self) -> Option<Arc<PipelineOrchestrator>> {
        self.current.read().clone()
    }

    pub fn run_count(&self) -> u64 {
        self.clock.current()
    }

    pub fn is_busy(&self) -> bool {
        self.current().map_or(false, |o| o.is_busy())
    }

    pub fn snapshot(&self) -> Option<PipelineSnapshot> {
        self.current().map(|o| o.snapshot())
    }
}
