// Trend pipeline: fetch -> build corpus -> infer -> validate.
//
// One invocation walks the stages in order and stops at the first failure:
//   Fetching -> Building -> Inferring -> Validating -> Done | Failed
// There is no shared mutable state between invocations. The only stage that
// repeats is inference, under the bounded RetryPolicy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use super::error::{payload_of, PipelineError};
use super::retry::RetryPolicy;
use crate::corpus::builder::{build_corpus, DEFAULT_MAX_CHARS};
use crate::inference::prompt::build_prompt;
use crate::inference::traits::InferenceClient;
use crate::output::truncate_chars;
use crate::report::schema::{ReportSchema, TrendReport};
use crate::source::traits::DocumentSource;

/// Stages of one pipeline invocation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetching,
    Building,
    Inferring,
    Validating,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Fetching => "fetching",
            PipelineStage::Building => "building",
            PipelineStage::Inferring => "inferring",
            PipelineStage::Validating => "validating",
        };
        f.write_str(name)
    }
}

/// Tunables for a pipeline. Fixed at construction time.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Character budget for the corpus.
    pub max_chars: usize,
    /// Upper bound on the upstream fetch. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
    /// Upper bound on each inference attempt. `None` waits indefinitely.
    pub inference_timeout: Option<Duration>,
    /// Retry policy for inference failures.
    pub retry: RetryPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            fetch_timeout: Some(Duration::from_secs(15)),
            inference_timeout: Some(Duration::from_secs(60)),
            retry: RetryPolicy::default(),
        }
    }
}

/// The trend-report orchestrator.
///
/// Holds its collaborators behind traits so tests can script both the
/// upstream feed and the model.
#[derive(Clone)]
pub struct TrendPipeline {
    source: Arc<dyn DocumentSource>,
    inference: Arc<dyn InferenceClient>,
    schema: ReportSchema,
    settings: PipelineSettings,
}

/// Why a guarded call did not produce a value.
enum Interrupted {
    TimedOut(Duration),
    Cancelled,
}

impl TrendPipeline {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        inference: Arc<dyn InferenceClient>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            inference,
            schema: ReportSchema::trend_report(),
            settings,
        }
    }

    /// Run one invocation with no external cancellation.
    pub async fn produce_trend_report(&self) -> Result<TrendReport, PipelineError> {
        self.produce_trend_report_with(&CancelToken::new()).await
    }

    /// Run one invocation, aborting the in-flight stage if `cancel` fires.
    pub async fn produce_trend_report_with(
        &self,
        cancel: &CancelToken,
    ) -> Result<TrendReport, PipelineError> {
        info!(stage = %PipelineStage::Fetching, "Trend pipeline started");
        let documents = match guarded(self.source.fetch(), self.settings.fetch_timeout, cancel).await
        {
            Ok(Ok(documents)) => documents,
            Ok(Err(e)) => {
                return Err(PipelineError::UpstreamFetch {
                    message: format!("Failed to fetch posts: {e:#}"),
                    payload: payload_of(&e),
                })
            }
            Err(interrupted) => {
                return Err(PipelineError::UpstreamFetch {
                    message: interrupted.describe("Fetching posts"),
                    payload: None,
                })
            }
        };

        info!(
            stage = %PipelineStage::Building,
            documents = documents.len(),
            "Building corpus"
        );
        let corpus = build_corpus(&documents, self.settings.max_chars);
        if corpus.trim().is_empty() {
            return Err(PipelineError::EmptyCorpus {
                message: format!(
                    "No usable text content in {} fetched posts.",
                    documents.len()
                ),
            });
        }
        debug!(corpus_preview = %truncate_chars(&corpus, 200), "Corpus ready");

        info!(
            stage = %PipelineStage::Inferring,
            corpus_chars = corpus.chars().count(),
            "Requesting structured analysis"
        );
        let candidate = self.infer_with_retry(&build_prompt(&corpus), cancel).await?;
        debug!(candidate = %candidate, "Inference returned candidate");

        info!(stage = %PipelineStage::Validating, "Validating report");
        let report = self
            .schema
            .validate(&candidate)
            .map_err(|violation| PipelineError::SchemaValidation {
                message: "AI response failed validation schema.".to_string(),
                details: violation.to_string(),
                payload: candidate,
            })?;

        for warning in report.soft_warnings() {
            warn!(warning = %warning, "Report deviates from prompt guidance");
        }

        info!(
            topics = report.emerging_topics.len(),
            entities = report.most_mentioned_entities.len(),
            "Trend report ready"
        );
        Ok(report)
    }

    /// Call the inference client, retrying failures and timeouts per the
    /// policy. Cancellation ends the loop immediately. A final failure
    /// carries the raw output of the last attempt, if it produced any.
    async fn infer_with_retry(
        &self,
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<serde_json::Value, PipelineError> {
        let policy = &self.settings.retry;
        let mut attempt = 0u32;

        loop {
            attempt = attempt.saturating_add(1);

            let (failure, payload) = match guarded(
                self.inference.infer(prompt, &self.schema),
                self.settings.inference_timeout,
                cancel,
            )
            .await
            {
                Ok(Ok(candidate)) => return Ok(candidate),
                Ok(Err(e)) => (format!("{e:#}"), payload_of(&e)),
                Err(Interrupted::Cancelled) => {
                    return Err(PipelineError::Inference {
                        message: Interrupted::Cancelled.describe("Trend analysis"),
                        payload: None,
                    })
                }
                Err(timed_out) => (timed_out.describe("Trend analysis"), None),
            };

            if !policy.allows_retry_after(attempt) {
                return Err(PipelineError::Inference {
                    message: format!(
                        "Failed to generate trend analysis after {attempt} attempt(s): {failure}"
                    ),
                    payload,
                });
            }

            let delay = policy.backoff_delay(attempt);
            warn!(
                attempt,
                max_attempts = policy.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Inference failed, retrying"
            );

            if guarded(tokio::time::sleep(delay), None, cancel).await.is_err() {
                return Err(PipelineError::Inference {
                    message: Interrupted::Cancelled.describe("Trend analysis"),
                    payload: None,
                });
            }
        }
    }
}

impl Interrupted {
    fn describe(&self, what: &str) -> String {
        match self {
            Interrupted::TimedOut(limit) => {
                format!("{what} timed out after {}s", limit.as_secs_f64())
            }
            Interrupted::Cancelled => format!("{what} was cancelled"),
        }
    }
}

/// Drive `fut` to completion unless it outlives `limit` or `cancel` fires.
/// Either way the in-flight future is dropped.
async fn guarded<F: Future>(
    fut: F,
    limit: Option<Duration>,
    cancel: &CancelToken,
) -> Result<F::Output, Interrupted> {
    let bounded = async {
        match limit {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Interrupted::TimedOut(limit)),
            None => Ok(fut.await),
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        result = bounded => result,
    }
}
