//! Scripted in-memory backend for tests; replies are consumed in call order.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::gemini::{GeminiError, TextGenerator};
use crate::models::GenerationRequest;

type Reply = Result<String, GeminiError>;

enum Scripted {
    Now(Reply),
    Pending(oneshot::Receiver<Reply>),
}

#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, text: impl Into<String>) {
        self.replies.lock().push_back(Scripted::Now(Ok(text.into())));
    }

    pub fn fail(&self, err: GeminiError) {
        self.replies.lock().push_back(Scripted::Now(Err(err)));
    }

    /// Queue a reply that resolves only when the returned sender fires.
    pub fn pending(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Scripted::Pending(rx));
        tx
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeminiError> {
        self.requests.lock().push(request);
        let next = self.replies.lock().pop_front();
        match next {
            Some(Scripted::Now(reply)) => reply,
            Some(Scripted::Pending(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(GeminiError::Http("scripted reply dropped".into()))),
            None => Err(GeminiError::Http("no scripted reply".into())),
        }
    }
}

pub fn spec_reply(spec: &str) -> String {
    format!("Here you go:\n{}\n", serde_json::json!({ "spec": spec }))
}

pub fn code_reply(body: &str) -> String {
    format!("```html\n<!DOCTYPE html>{}```\nLet me know if you need changes.", body)
}
