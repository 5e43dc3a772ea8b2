// Inference: structured-output model calls behind a swappable trait.
//
// The InferenceClient trait is the only thing the pipeline sees. GeminiClient
// implements it against Google's Generative Language API; tests use scripted
// doubles.

pub mod gemini;
pub mod prompt;
pub mod traits;
