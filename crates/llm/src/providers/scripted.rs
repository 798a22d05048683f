//! Scripted in-memory LLM client.
//!
//! Replays a fixed sequence of replies and records every prompt it receives.
//! Exercises the generation and metric stages without network access.
//! Compiled for this crate's tests and behind the `testing` feature.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use protoqa_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// LLM client that answers from a queue of canned replies.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    /// Create a client that returns `replies` in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Reply::Text(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.push(Reply::Text(text.into()));
        self
    }

    /// Queue a failing call.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Reply::Fail(message.into()));
        self
    }

    fn push(&self, reply: Reply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Replies not consumed yet.
    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts
            .lock()
            .map_err(|_| AppError::Llm("Scripted client state poisoned".to_string()))?
            .push(request.prompt.clone());

        let reply = self
            .replies
            .lock()
            .map_err(|_| AppError::Llm("Scripted client state poisoned".to_string()))?
            .pop_front();

        match reply {
            Some(Reply::Text(content)) => Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
                done: true,
            }),
            Some(Reply::Fail(message)) => Err(AppError::Llm(message)),
            None => Err(AppError::Llm("Scripted client has no replies left".to_string())),
        }
    }
}
