// Scripted collaborators for pipeline tests: no network, no model.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use trend_extractor::inference::traits::InferenceClient;
use trend_extractor::pipeline::error::RawPayloadError;
use trend_extractor::pipeline::retry::RetryPolicy;
use trend_extractor::pipeline::trends::{PipelineSettings, TrendPipeline};
use trend_extractor::report::schema::ReportSchema;
use trend_extractor::source::traits::{DocumentSource, RawDocument};

pub fn doc(title: &str, body: &str) -> RawDocument {
    RawDocument {
        title: title.to_string(),
        body: body.to_string(),
    }
}

/// Source that returns a fixed batch, fails, or hangs.
pub enum ScriptedSource {
    Documents(Vec<RawDocument>),
    Fails(&'static str),
    /// Fails the way an HTTP adapter does on an error status: message plus raw body.
    Rejects(&'static str, &'static str),
    Hangs,
}

#[async_trait]
impl DocumentSource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<RawDocument>> {
        match self {
            ScriptedSource::Documents(docs) => Ok(docs.clone()),
            ScriptedSource::Fails(msg) => anyhow::bail!("{msg}"),
            ScriptedSource::Rejects(msg, body) => Err(RawPayloadError::new(*msg, *body).into()),
            ScriptedSource::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

/// One scripted inference outcome.
pub enum Reply {
    Candidate(Value),
    Error(&'static str),
    /// Model text that is not JSON at all.
    Prose(&'static str),
    Hang,
}

/// Inference double that plays back replies in order and counts calls.
/// Once the script runs out, every call fails.
pub struct ScriptedInference {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedInference {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl InferenceClient for ScriptedInference {
    async fn infer(&self, prompt: &str, _schema: &ReportSchema) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Candidate(value)) => Ok(value),
            Some(Reply::Error(msg)) => anyhow::bail!("{msg}"),
            Some(Reply::Prose(text)) => {
                Err(RawPayloadError::new("Gemini output is not valid JSON", text).into())
            }
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                anyhow::bail!("woke from hang")
            }
            None => anyhow::bail!("script exhausted"),
        }
    }
}

/// A candidate that satisfies the schema.
pub fn good_candidate() -> Value {
    json!({
        "emerging_topics": ["Rust 2024", "Mars rover", "Playoffs", "Rent prices", "Heat wave"],
        "sentiment_clusters": [
            {"sentiment": "Positive", "percentage": 42.5},
            {"sentiment": "Negative", "percentage": 27.5},
            {"sentiment": "Neutral", "percentage": 30.0}
        ],
        "most_mentioned_entities": ["NASA", "NBA", "Ferris"],
        "summary": "Posts mix excitement about space and sports with worry about housing."
    })
}

pub fn hot_posts() -> Vec<RawDocument> {
    vec![
        doc("Mars rover finds   water", "Details at https://nasa.gov/mars today"),
        doc("Playoff game tonight", ""),
        doc("Rent went up again", "Anyone else?\n\nIt is brutal."),
    ]
}

/// Settings with no real waiting: tiny retry delay, short timeouts.
pub fn fast_settings(attempts: u32) -> PipelineSettings {
    PipelineSettings {
        max_chars: 40_000,
        fetch_timeout: Some(Duration::from_millis(200)),
        inference_timeout: Some(Duration::from_millis(200)),
        retry: RetryPolicy::new(attempts).base_delay(Duration::from_millis(1)),
    }
}

pub fn pipeline(
    source: ScriptedSource,
    inference: Arc<ScriptedInference>,
    settings: PipelineSettings,
) -> TrendPipeline {
    TrendPipeline::new(Arc::new(source), inference, settings)
}
