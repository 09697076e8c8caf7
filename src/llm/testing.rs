//! Scripted backend for unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ChatRequest, CompletionBackend};
use crate::error::{Result, UpstreamError};

/// Replays canned upstream outcomes and records every user prompt
pub(crate) struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<Value>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub(crate) fn new(replies: Vec<Result<Value>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn replying(content: Value) -> Arc<Self> {
        Self::new(vec![Ok(content)])
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub(crate) fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<Value> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.user_prompt().unwrap_or_default().to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Network("script exhausted".into()).into()))
    }

    fn model(&self) -> &str {
        "scripted/model"
    }
}

/// A string-encoded `{selected, confidence}` reply, the way OpenRouter delivers it
pub(crate) fn reply(selected: &[&str], confidence: f64) -> Value {
    Value::String(json!({ "selected": selected, "confidence": confidence }).to_string())
}
