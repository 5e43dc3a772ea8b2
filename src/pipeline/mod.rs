// Trend pipeline: orchestration, failure taxonomy, retry, and cancellation.

pub mod cancel;
pub mod error;
pub mod retry;
pub mod trends;
