// End-to-end pipeline tests against scripted collaborators.
//
// Fetch -> build -> infer -> validate, without network or model access.
// Call counts on the inference double show which stages actually ran.

mod common;

use std::time::Duration;

use serde_json::json;

use common::*;
use trend_extractor::pipeline::cancel::CancelToken;
use trend_extractor::pipeline::error::{ErrorKind, PipelineError};
use trend_extractor::report::schema::Sentiment;

// ============================================================
// Happy path
// ============================================================

#[tokio::test]
async fn well_formed_candidate_is_returned_unchanged() {
    let inference = ScriptedInference::new(vec![Reply::Candidate(good_candidate())]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(1),
    );

    let report = pipeline.produce_trend_report().await.unwrap();

    assert_eq!(inference.calls(), 1);
    assert_eq!(serde_json::to_value(&report).unwrap(), good_candidate());
    assert_eq!(
        report.dominant_sentiment().map(|c| c.sentiment),
        Some(Sentiment::Positive)
    );
}

#[tokio::test]
async fn prompt_embeds_the_cleaned_corpus() {
    let inference = ScriptedInference::new(vec![Reply::Candidate(good_candidate())]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(1),
    );

    pipeline.produce_trend_report().await.unwrap();

    let prompt = inference.last_prompt().unwrap();
    assert!(prompt.contains(
        "Mars rover finds water Details at today\nPlayoff game tonight \nRent went up again Anyone else? It is brutal."
    ));
    assert!(!prompt.contains("https://nasa.gov"));
}

#[tokio::test]
async fn corpus_budget_is_applied_before_inference() {
    let inference = ScriptedInference::new(vec![Reply::Candidate(good_candidate())]);
    let mut settings = fast_settings(1);
    settings.max_chars = 10;
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        settings,
    );

    pipeline.produce_trend_report().await.unwrap();

    let prompt = inference.last_prompt().unwrap();
    assert!(prompt.contains("---\nMars rover\n---"));
}

// ============================================================
// Failure classification
// ============================================================

#[tokio::test]
async fn upstream_failure_is_classified_and_skips_inference() {
    let inference = ScriptedInference::new(vec![Reply::Candidate(good_candidate())]);
    let pipeline = pipeline(
        ScriptedSource::Fails("Reddit API error: 503 Service Unavailable"),
        inference.clone(),
        fast_settings(2),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamFetch);
    assert!(err.message().contains("503"));
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn upstream_rejection_keeps_the_response_body() {
    let inference = ScriptedInference::new(vec![]);
    let pipeline = pipeline(
        ScriptedSource::Rejects(
            "Reddit API error: 429 Too Many Requests",
            r#"{"message": "Too Many Requests", "error": 429}"#,
        ),
        inference.clone(),
        fast_settings(1),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamFetch);
    assert!(err.message().contains("429"));
    assert_eq!(
        err.payload(),
        Some(&json!({"message": "Too Many Requests", "error": 429}))
    );
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn all_empty_documents_fail_without_calling_inference() {
    let inference = ScriptedInference::new(vec![Reply::Candidate(good_candidate())]);
    let pipeline = pipeline(
        ScriptedSource::Documents(vec![
            doc("", ""),
            doc("https://i.redd.it/abc.jpg", "   "),
            doc("\n\t", "http://youtu.be/xyz"),
        ]),
        inference.clone(),
        fast_settings(2),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert!(matches!(err, PipelineError::EmptyCorpus { .. }));
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn empty_listing_is_an_empty_corpus() {
    let inference = ScriptedInference::new(vec![]);
    let pipeline = pipeline(
        ScriptedSource::Documents(vec![]),
        inference.clone(),
        fast_settings(1),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyCorpus);
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn out_of_range_percentage_is_a_schema_failure() {
    let mut candidate = good_candidate();
    candidate["sentiment_clusters"][0]["percentage"] = json!(150);
    let inference = ScriptedInference::new(vec![Reply::Candidate(candidate.clone())]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(2),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaValidation);
    assert_eq!(err.payload(), Some(&candidate));
    assert!(err.details().unwrap().contains("percentage"));
    // Schema failures are not retried
    assert_eq!(inference.calls(), 1);
}

#[tokio::test]
async fn lowercase_label_from_model_is_a_schema_failure() {
    let mut candidate = good_candidate();
    candidate["sentiment_clusters"][1]["sentiment"] = json!("negative");
    let inference = ScriptedInference::new(vec![Reply::Candidate(candidate)]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference,
        fast_settings(1),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaValidation);
}

#[tokio::test]
async fn unenforced_conventions_do_not_fail_the_run() {
    let mut candidate = good_candidate();
    candidate["emerging_topics"] = json!(["just one"]);
    candidate["sentiment_clusters"] = json!([{"sentiment": "Neutral", "percentage": 60.0}]);
    let inference = ScriptedInference::new(vec![Reply::Candidate(candidate)]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference,
        fast_settings(1),
    );

    let report = pipeline.produce_trend_report().await.unwrap();
    assert_eq!(report.soft_warnings().len(), 2);
}

// ============================================================
// Retry
// ============================================================

#[tokio::test]
async fn transient_inference_failure_is_retried_once() {
    let inference = ScriptedInference::new(vec![
        Reply::Error("503 overloaded"),
        Reply::Candidate(good_candidate()),
    ]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(2),
    );

    let report = pipeline.produce_trend_report().await.unwrap();

    assert_eq!(inference.calls(), 2);
    assert_eq!(report.emerging_topics.len(), 5);
}

#[tokio::test]
async fn retry_budget_is_bounded() {
    let inference = ScriptedInference::new(vec![
        Reply::Error("first failure"),
        Reply::Error("second failure"),
        Reply::Candidate(good_candidate()),
    ]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(2),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Inference);
    assert!(err.message().contains("second failure"));
    assert_eq!(inference.calls(), 2);
}

#[tokio::test]
async fn final_failure_keeps_the_last_unparseable_output() {
    let inference = ScriptedInference::new(vec![
        Reply::Error("503 overloaded"),
        Reply::Prose("Sure! Here is the report: {oops"),
    ]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(2),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Inference);
    assert!(err.message().contains("not valid JSON"));
    assert_eq!(
        err.payload(),
        Some(&json!("Sure! Here is the report: {oops"))
    );
    assert_eq!(inference.calls(), 2);
}

#[tokio::test]
async fn earlier_output_is_not_reported_for_a_later_failure() {
    let inference = ScriptedInference::new(vec![
        Reply::Prose("Sure! Here is the report: {oops"),
        Reply::Error("quota exceeded"),
    ]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(2),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert!(err.message().contains("quota exceeded"));
    assert!(err.payload().is_none());
}

#[tokio::test]
async fn single_attempt_policy_does_not_retry() {
    let inference = ScriptedInference::new(vec![
        Reply::Error("boom"),
        Reply::Candidate(good_candidate()),
    ]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(1),
    );

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Inference);
    assert_eq!(inference.calls(), 1);
}

// ============================================================
// Timeouts and cancellation
// ============================================================

#[tokio::test]
async fn hung_fetch_times_out_as_upstream_failure() {
    let inference = ScriptedInference::new(vec![Reply::Candidate(good_candidate())]);
    let pipeline = pipeline(ScriptedSource::Hangs, inference.clone(), fast_settings(1));

    let err = pipeline.produce_trend_report().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamFetch);
    assert!(err.message().contains("timed out"));
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn hung_inference_times_out_then_retries() {
    let inference = ScriptedInference::new(vec![Reply::Hang, Reply::Candidate(good_candidate())]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(2),
    );

    let report = pipeline.produce_trend_report().await;

    assert!(report.is_ok());
    assert_eq!(inference.calls(), 2);
}

#[tokio::test]
async fn cancellation_aborts_inference_without_retry() {
    let inference = ScriptedInference::new(vec![Reply::Hang, Reply::Candidate(good_candidate())]);
    let mut settings = fast_settings(3);
    settings.inference_timeout = None;
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        settings,
    );

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let err = pipeline.produce_trend_report_with(&cancel).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Inference);
    assert!(err.message().contains("cancelled"));
    assert_eq!(inference.calls(), 1);
}

#[tokio::test]
async fn cancelled_before_start_never_fetches_to_completion() {
    let inference = ScriptedInference::new(vec![Reply::Candidate(good_candidate())]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(1),
    );

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = pipeline.produce_trend_report_with(&cancel).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamFetch);
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn concurrent_invocations_are_independent() {
    let inference = ScriptedInference::new(vec![
        Reply::Candidate(good_candidate()),
        Reply::Candidate(good_candidate()),
    ]);
    let pipeline = pipeline(
        ScriptedSource::Documents(hot_posts()),
        inference.clone(),
        fast_settings(1),
    );

    let (a, b) = tokio::join!(pipeline.produce_trend_report(), pipeline.produce_trend_report());

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(inference.calls(), 2);
}
