// Inference client trait: prompt plus schema in, candidate object out.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::report::schema::ReportSchema;

/// Trait for calling a generative model with a structured-output constraint.
///
/// Implementations constrain the model to `schema` however their provider
/// allows, and return the parsed object. The object is only a candidate:
/// it may be well-formed JSON that still breaks the schema, and the caller
/// always validates it.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(&self, prompt: &str, schema: &ReportSchema) -> Result<Value>;
}
