// Trend extractor: structured trend reports from social-media posts.
//
// This is the library root. Each module corresponds to one stage of the
// fetch -> normalize -> budget -> infer -> validate pipeline, plus the
// outer surfaces that call it.

pub mod config;
pub mod corpus;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod source;

#[cfg(feature = "web")]
pub mod web;
