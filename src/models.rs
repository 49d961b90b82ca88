use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

use crate::prompts::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};

/// What a single pipeline run is built from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBasis {
    Video { url: String },
    Preseeded { url: Option<String>, spec: String, code: String },
}

impl ContentBasis {
    pub fn url(&self) -> Option<&str> {
        match self {
            ContentBasis::Video { url } => Some(url),
            ContentBasis::Preseeded { url, .. } => url.as_deref(),
        }
    }
}

/// One catalog record, usable as a pre-seeded basis.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Example {
    pub title: String,
    pub url: String,
    pub spec: String,
    pub code: String,
}

impl Example {
    pub fn to_basis(&self) -> ContentBasis {
        ContentBasis::Preseeded {
            url: Some(self.url.clone()),
            spec: self.spec.clone(),
            code: self.code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub video_url: Option<String>,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt: prompt.into(),
            video_url: None,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_video(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }

    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    LoadingSpec,
    LoadingCode,
    Ready,
    Error,
}

impl Phase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::LoadingSpec | Self::LoadingCode)
    }
}

/// Externally observed state of one run.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineSnapshot {
    pub run: u64,
    pub basis: ContentBasis,
    pub phase: Phase,
    pub spec: String,
    pub code: String,
    pub error: Option<String>,
    pub url_hint: Option<String>,
    pub busy: bool,
    pub code_updated: bool,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubmitVideoRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SelectExampleRequest {
    pub index: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditSpecRequest {
    pub spec: String,
}

/// Reply to a spec save: whether stage two was started, plus the new state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpecSaveResponse {
    pub regenerating: bool,
    #[serde(flatten)]
    pub snapshot: PipelineSnapshot,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditCodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmbedQuery {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmbedResponse {
    pub video_id: String,
    pub embed_url: String,
}
