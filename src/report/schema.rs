// Report schema: the contract every trend report must satisfy.
//
// The same schema object is handed to the inference provider (as a
// structured-output constraint) and used to validate whatever comes back.
// Validation rejects; it never repairs or coerces a candidate.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Minimum summary length, in characters.
pub const MIN_SUMMARY_CHARS: usize = 10;
/// Inclusive bounds for a sentiment percentage.
pub const PERCENTAGE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// Sentiment label. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sentiment bucket and its share of the posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentimentCluster {
    pub sentiment: Sentiment,
    pub percentage: f64,
}

/// A validated trend report.
///
/// Only `ReportSchema::validate` hands these out to pipeline callers, so a
/// report in hand always satisfies the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrendReport {
    pub emerging_topics: Vec<String>,
    pub sentiment_clusters: Vec<SentimentCluster>,
    pub most_mentioned_entities: Vec<String>,
    pub summary: String,
}

impl TrendReport {
    /// The cluster with the largest share. Ties go to the later cluster.
    pub fn dominant_sentiment(&self) -> Option<&SentimentCluster> {
        self.sentiment_clusters
            .iter()
            .reduce(|a, b| if a.percentage > b.percentage { a } else { b })
    }

    /// Sum of all cluster percentages.
    pub fn sentiment_total(&self) -> f64 {
        self.sentiment_clusters.iter().map(|c| c.percentage).sum()
    }

    /// Deviations from what the prompt asks for that the schema does not
    /// enforce. These are reported, never rejected.
    pub fn soft_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let topics = self.emerging_topics.len();
        if !(5..=10).contains(&topics) {
            warnings.push(format!("expected 5-10 emerging topics, got {topics}"));
        }

        let entities = self.most_mentioned_entities.len();
        if entities > 10 {
            warnings.push(format!("expected at most 10 entities, got {entities}"));
        }

        let total = self.sentiment_total();
        if !(99.0..=101.0).contains(&total) {
            warnings.push(format!("sentiment percentages sum to {total}, not 100"));
        }

        for label in Sentiment::ALL {
            let count = self
                .sentiment_clusters
                .iter()
                .filter(|c| c.sentiment == label)
                .count();
            if count > 1 {
                warnings.push(format!("sentiment {label} appears {count} times"));
            }
        }

        warnings
    }
}

/// Why a candidate was rejected. `issues` lists every rule that failed.
#[derive(Debug, Clone, Error)]
#[error("{}", .issues.join("; "))]
pub struct SchemaViolation {
    pub issues: Vec<String>,
}

/// The report contract: a JSON-schema description for the model plus the
/// exact rejection rules applied to its output.
#[derive(Debug, Clone)]
pub struct ReportSchema {
    name: &'static str,
    json_schema: Value,
}

impl Default for ReportSchema {
    fn default() -> Self {
        Self::trend_report()
    }
}

impl ReportSchema {
    /// The trend report schema.
    pub fn trend_report() -> Self {
        Self {
            name: "trend_report",
            json_schema: report_json_schema(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Schema in the OpenAPI subset accepted by structured-output APIs.
    pub fn json_schema(&self) -> &Value {
        &self.json_schema
    }

    /// Check a candidate object against the schema.
    ///
    /// Structure is checked first (exactly the four fields, exact sentiment
    /// labels, numbers where numbers belong); if that passes, every bound is
    /// checked and all failures are reported together.
    pub fn validate(&self, candidate: &Value) -> Result<TrendReport, SchemaViolation> {
        if !candidate.is_object() {
            return Err(SchemaViolation {
                issues: vec![format!("expected an object, got {}", json_type(candidate))],
            });
        }

        let report: TrendReport =
            serde_json::from_value(candidate.clone()).map_err(|e| SchemaViolation {
                issues: vec![e.to_string()],
            })?;

        let mut issues = Vec::new();

        for (i, cluster) in report.sentiment_clusters.iter().enumerate() {
            if !PERCENTAGE_RANGE.contains(&cluster.percentage) {
                issues.push(format!(
                    "sentiment_clusters[{i}].percentage must be between 0 and 100, got {}",
                    cluster.percentage
                ));
            }
        }

        let summary_chars = report.summary.chars().count();
        if summary_chars < MIN_SUMMARY_CHARS {
            issues.push(format!(
                "summary must be at least {MIN_SUMMARY_CHARS} characters, got {summary_chars}"
            ));
        }

        if issues.is_empty() {
            Ok(report)
        } else {
            Err(SchemaViolation { issues })
        }
    }
}

/// Free-function form of `ReportSchema::trend_report().validate(..)`.
pub fn validate(candidate: &Value) -> Result<TrendReport, SchemaViolation> {
    ReportSchema::trend_report().validate(candidate)
}

/// Build the structured-output schema for a trend report.
pub fn report_json_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "emerging_topics": {
                "type": "ARRAY",
                "description": "List of emerging topics from the posts",
                "items": { "type": "STRING" }
            },
            "sentiment_clusters": {
                "type": "ARRAY",
                "description": "Sentiment distribution across posts",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "sentiment": {
                            "type": "STRING",
                            "format": "enum",
                            "enum": ["Positive", "Negative", "Neutral"]
                        },
                        "percentage": {
                            "type": "NUMBER",
                            "description": "Percentage of posts with this sentiment",
                            "minimum": 0,
                            "maximum": 100
                        }
                    },
                    "required": ["sentiment", "percentage"],
                    "propertyOrdering": ["sentiment", "percentage"]
                }
            },
            "most_mentioned_entities": {
                "type": "ARRAY",
                "description": "Most frequently mentioned people, places, or organizations",
                "items": { "type": "STRING" }
            },
            "summary": {
                "type": "STRING",
                "description": "A concise summary of the main discussion themes"
            }
        },
        "required": ["emerging_topics", "sentiment_clusters", "most_mentioned_entities", "summary"],
        "propertyOrdering": ["emerging_topics", "sentiment_clusters", "most_mentioned_entities", "summary"]
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
