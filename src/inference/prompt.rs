// Analysis prompt template.

/// Embed `corpus` into the trend-analysis instructions.
pub fn build_prompt(corpus: &str) -> String {
    format!(
        "Analyze the following collection of Reddit post titles and text snippets.\n\
         Extract trending insights in the following structured format:\n\
         - emerging_topics: 5–10 high-level topics gaining traction\n\
         - sentiment_clusters: breakdown of Positive, Negative, and Neutral sentiment with percentages that sum to 100\n\
         - most_mentioned_entities: up to 10 notable people, brands, places, or organizations mentioned\n\
         - summary: 2–3 sentence summary of the key themes in the discussions\n\
         \n\
         Reddit posts:\n\
         ---\n\
         {corpus}\n\
         ---"
    )
}
