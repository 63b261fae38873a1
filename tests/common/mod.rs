#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tool_agents::email::{EmailSender, OutgoingEmail};
use tool_agents::llm::{Completion, LlmDriver, LlmRequest};
use tool_agents::vector::Embedder;
use tool_agents::{Error, Result};

/// Driver that replays queued completions and records every request.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    responses: Mutex<VecDeque<Completion>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedDriver {
    pub fn new(responses: Vec<Completion>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmDriver for ScriptedDriver {
    async fn complete(&self, req: LlmRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(req);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::MalformedResponse("script exhausted".to_string()))
    }
}

/// Driver whose requests never complete.
#[derive(Debug, Default)]
pub struct StalledDriver;

#[async_trait]
impl LlmDriver for StalledDriver {
    async fn complete(&self, _req: LlmRequest) -> Result<Completion> {
        std::future::pending().await
    }
}

/// Bag-of-words embedder: each lowercase word is hashed into one of 64 buckets.
#[derive(Debug, Default)]
pub struct HashEmbedder;

impl HashEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; 64];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7_usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize))
                % 64;
            v[bucket] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Email sender that records what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Email sender whose every send fails.
#[derive(Debug)]
pub struct FailingSender;

#[async_trait]
impl EmailSender for FailingSender {
    async fn send(&self, _email: &OutgoingEmail) -> Result<()> {
        Err(Error::Api {
            status: 401,
            message: "The provided authorization grant is invalid".to_string(),
        })
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
