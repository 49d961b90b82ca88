//! Two-stage generation for one content basis: video → spec → code.
//!
//! Each basis assignment gets its own [`PipelineOrchestrator`] tagged with a
//! run number from the shared [`RunClock`]. Results are committed only while
//! that run number is still current; completions from superseded runs are
//! dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::extract::{extract_html_document, extract_json, has_html_document, ExtractError};
use crate::gemini::{GeminiError, TextGenerator};
use crate::models::{ContentBasis, GenerationRequest, Phase, PipelineSnapshot};
use crate::prompts::{
    CODE_REGION_CLOSER, CODE_REGION_OPENER, HTML_DOCUMENT_MARKER, SPEC_ADDENDUM, SPEC_FROM_VIDEO_PROMPT,
};
use crate::video::url_scheme_hint;

pub const CODE_UPDATED_WINDOW: Duration = Duration::from_secs(2);

const UNKNOWN_ERROR: &str = "An unknown error occurred.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)] Gemini(#[from] GeminiError),
    #[error(transparent)] Extract(#[from] ExtractError),
}

impl PipelineError {
    /// Plain message shown in the error state.
    pub fn message(&self) -> String {
        let msg = self.to_string();
        if msg.trim().is_empty() { UNKNOWN_ERROR.to_string() } else { msg }
    }
}

/// Monotonic run counter shared by the session and every orchestrator it starts.
#[derive(Debug, Default)]
pub struct RunClock(AtomicU64);

impl RunClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Allocate the next run number and make it current.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, run: u64) -> bool {
        self.current() == run
    }
}

/// Result of an asynchronous step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed(Phase),
    /// A newer run started; nothing was written.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecEdit {
    /// Same text as the current spec; nothing to do.
    Unchanged,
    /// A generation is already in flight for this run.
    Busy,
    /// Spec stored and phase moved to loading-code; regenerate with this text.
    Accepted(String),
}

#[derive(Debug)]
struct RunState {
    phase: Phase,
    spec: String,
    code: String,
    error: Option<String>,
    code_updated_at: Option<Instant>,
    updated_at: DateTime<Utc>,
}

pub struct PipelineOrchestrator {
    run: u64,
    basis: ContentBasis,
    model: String,
    generator: Arc<dyn TextGenerator>,
    clock: Arc<RunClock>,
    state: Mutex<RunState>,
    started_at: DateTime<Utc>,
}

impl PipelineOrchestrator {
    pub fn new(
        run: u64,
        basis: ContentBasis,
        model: impl Into<String>,
        generator: Arc<dyn TextGenerator>,
        clock: Arc<RunClock>,
    ) -> Self {
        let now = Utc::now();
        let state = match &basis {
            ContentBasis::Preseeded { spec, code, .. } => RunState {
                phase: Phase::Ready,
                spec: spec.clone(),
                code: code.clone(),
                error: None,
                code_updated_at: None,
                updated_at: now,
            },
            ContentBasis::Video { .. } => RunState {
                phase: Phase::LoadingSpec,
                spec: String::new(),
                code: String::new(),
                error: None,
                code_updated_at: None,
                updated_at: now,
            },
        };
        Self {
            run,
            basis,
            model: model.into(),
            generator,
            clock,
            state: Mutex::new(state),
            started_at: now,
        }
    }

    pub fn run_number(&self) -> u64 { self.run }

    pub fn basis(&self) -> &ContentBasis { &self.basis }

    pub fn phase(&self) -> Phase { self.state.lock().phase }

    pub fn spec(&self) -> String { self.state.lock().spec.clone() }

    pub fn code(&self) -> String { self.state.lock().code.clone() }

    pub fn error(&self) -> Option<String> { self.state.lock().error.clone() }

    pub fn is_busy(&self) -> bool { self.phase().is_loading() }

    /// True for [`CODE_UPDATED_WINDOW`] after the last manual code edit.
    pub fn code_updated(&self) -> bool {
        self.state.lock().code_updated_at
            .map_or(false, |at| at.elapsed() < CODE_UPDATED_WINDOW)
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        let s = self.state.lock();
        let url_hint = match s.phase {
            Phase::Error => self.basis.url().and_then(url_scheme_hint),
            _ => None,
        };
        PipelineSnapshot {
            run: self.run,
            basis: self.basis.clone(),
            phase: s.phase,
            spec: s.spec.clone(),
            code: s.code.clone(),
            error: s.error.clone(),
            url_hint,
            busy: s.phase.is_loading(),
            code_updated: s.code_updated_at.map_or(false, |at| at.elapsed() < CODE_UPDATED_WINDOW),
            started_at: self.started_at,
            updated_at: s.updated_at,
        }
    }

    /// Drive the run to `ready` or `error`. Pre-seeded runs return at once.
    pub async fn run(&self) -> Outcome {
        let url = match &self.basis {
            ContentBasis::Preseeded { .. } => return Outcome::Committed(self.phase()),
            ContentBasis::Video { url } => url.clone(),
        };

        info!(run = self.run, "🎬 Generating spec from video {}", url);
        let spec = match self.generate_spec(&url).await {
            Ok(spec) => spec,
            Err(e) => return self.fail("spec", e),
        };

        let committed = self.commit(|s| {
            s.spec = spec.clone();
            s.phase = Phase::LoadingCode;
        });
        if !committed {
            return Outcome::Superseded;
        }
        info!(run = self.run, "📝 Spec ready ({} chars), generating code", spec.len());

        self.regenerate_code(spec).await
    }

    /// First half of a spec save: compare, store, and move to loading-code.
    pub fn begin_spec_edit(&self, edited: &str) -> SpecEdit {
        let edited = edited.trim();
        let mut s = self.state.lock();
        if edited == s.spec {
            return SpecEdit::Unchanged;
        }
        if s.phase.is_loading() {
            return SpecEdit::Busy;
        }
        if !self.clock.is_current(self.run) {
            warn!(run = self.run, "Ignoring spec edit for a superseded run");
            return SpecEdit::Busy;
        }
        s.spec = edited.to_string();
        s.code.clear();
        s.error = None;
        s.phase = Phase::LoadingCode;
        s.updated_at = Utc::now();
        info!(run = self.run, "✏️ Spec edited ({} chars), regenerating code", edited.len());
        SpecEdit::Accepted(edited.to_string())
    }

    /// Stage two: the spec text is the prompt verbatim.
    pub async fn regenerate_code(&self, spec: String) -> Outcome {
        match self.generate_code(spec).await {
            Ok(code) => {
                let committed = self.commit(|s| {
                    s.code = code;
                    s.phase = Phase::Ready;
                });
                if committed {
                    info!(run = self.run, "✅ Code ready");
                    Outcome::Committed(Phase::Ready)
                } else {
                    Outcome::Superseded
                }
            }
            Err(e) => self.fail("code", e),
        }
    }

    /// Overwrite the code directly. Phase and spec are left alone.
    pub fn edit_code(&self, code: String) {
        let mut s = self.state.lock();
        s.code = code;
        s.code_updated_at = Some(Instant::now());
        s.updated_at = Utc::now();
        info!(run = self.run, "🛠️ Code edited manually ({} chars)", s.code.len());
    }

    async fn generate_spec(&self, url: &str) -> Result<String, PipelineError> {
        let request = GenerationRequest::new(SPEC_FROM_VIDEO_PROMPT)
            .with_model(self.model.clone())
            .with_video(url);
        let raw = self.generator.generate(request).await?;
        let payload = extract_json(&raw)?;
        let spec = payload.get("spec").and_then(|v| v.as_str()).ok_or_else(|| {
            ExtractError::Malformed("response has no string `spec` field".into())
        })?;
        Ok(format!("{}{}", spec, SPEC_ADDENDUM))
    }

    async fn generate_code(&self, spec: String) -> Result<String, PipelineError> {
        let request = GenerationRequest::new(spec).with_model(self.model.clone());
        let raw = self.generator.generate(request).await?;
        if !has_html_document(&raw) {
            return Err(ExtractError::Malformed("no HTML document found in response".into()).into());
        }
        let code = extract_html_document(&raw, CODE_REGION_OPENER, CODE_REGION_CLOSER);
        // A missing or misplaced closer swaps the bounds and drops the doctype.
        if !code.starts_with(HTML_DOCUMENT_MARKER) {
            return Err(ExtractError::Malformed("HTML document is not closed by the code delimiter".into()).into());
        }
        Ok(code)
    }

    fn fail(&self, stage: &str, e: PipelineError) -> Outcome {
        let message = e.message();
        let committed = self.commit(|s| {
            s.error = Some(message.clone());
            s.phase = Phase::Error;
        });
        if committed {
            error!(run = self.run, "❌ {} generation failed: {}", stage, message);
            Outcome::Committed(Phase::Error)
        } else {
            Outcome::Superseded
        }
    }

    fn commit(&self, apply: impl FnOnce(&mut RunState)) -> bool {
        if !self.clock.is_current(self.run) {
            warn!(run = self.run, current = self.clock.current(), "Discarding result of superseded run");
            return false;
        }
        let mut s = self.state.lock();
        apply(&mut s);
        s.updated_at = Utc::now();
        true
    }
}
