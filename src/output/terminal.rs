// Colored terminal output for trend reports.
//
// Mirrors the dashboard layout: headline numbers, sentiment bars, topics,
// entities, then the summary.

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};

use super::truncate_chars;
use crate::pipeline::error::PipelineError;
use crate::report::schema::{Sentiment, SentimentCluster, TrendReport};

/// Width of a 100% sentiment bar, in terminal cells.
const BAR_WIDTH: usize = 40;

/// Display a validated report in the terminal.
pub fn display_report(report: &TrendReport, generated_at: DateTime<Local>) {
    println!("\n{}", "=== Global Trend Analysis ===".bold());
    println!(
        "{}",
        format!("Generated {}", generated_at.format("%Y-%m-%d %H:%M:%S")).dimmed()
    );
    println!();

    // Headline numbers
    let dominant = report.dominant_sentiment();
    let mood = dominant
        .map(|c| colorize_sentiment(c.sentiment, c.sentiment.as_str()).to_string())
        .unwrap_or_else(|| "n/a".dimmed().to_string());
    println!(
        "  Topics: {}   Entities: {}   Dominant mood: {}",
        report.emerging_topics.len().to_string().bold(),
        report.most_mentioned_entities.len().to_string().bold(),
        mood,
    );

    println!("\n{}", "Sentiment".bold());
    for cluster in clusters_by_share(report) {
        let tag = if dominant.is_some_and(|d| std::ptr::eq(d, cluster)) {
            " dominant".bold().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<9} {} {:>5.1}%{}",
            colorize_sentiment(cluster.sentiment, cluster.sentiment.as_str()),
            colorize_sentiment(cluster.sentiment, &sentiment_bar(cluster.percentage)),
            cluster.percentage,
            tag,
        );
    }

    println!("\n{}", "Emerging topics".bold());
    for (i, topic) in report.emerging_topics.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, topic);
    }

    println!("\n{}", "Most mentioned".bold());
    if report.most_mentioned_entities.is_empty() {
        println!("  {}", "none".dimmed());
    } else {
        println!("  {}", report.most_mentioned_entities.join(", "));
    }

    println!("\n{}", "Summary".bold());
    println!("  {}", report.summary);
    println!();
}

/// Display a pipeline failure with its category.
pub fn display_error(error: &PipelineError) {
    eprintln!(
        "{} [{}] {}",
        "Error:".red().bold(),
        error.kind().as_str(),
        error.message()
    );
    if let Some(details) = error.details() {
        eprintln!("  {}", details.dimmed());
    }
    if let Some(payload) = error.payload() {
        let raw = match payload {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        eprintln!("  {} {}", "Raw response:".dimmed(), truncate_chars(&raw, 500));
    }
}

/// Sentiment clusters ordered largest share first. Equal shares keep
/// their original order.
pub fn clusters_by_share(report: &TrendReport) -> Vec<&SentimentCluster> {
    let mut clusters: Vec<&SentimentCluster> = report.sentiment_clusters.iter().collect();
    clusters.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    clusters
}

/// Block-character bar proportional to `percentage` (clamped to 0..=100).
pub fn sentiment_bar(percentage: f64) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled)
}

fn colorize_sentiment(sentiment: Sentiment, text: &str) -> ColoredString {
    match sentiment {
        Sentiment::Positive => text.green(),
        Sentiment::Negative => text.red(),
        Sentiment::Neutral => text.bright_black(),
    }
}
