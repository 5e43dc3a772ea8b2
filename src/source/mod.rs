// Document sources: where the raw posts come from.
//
// The DocumentSource trait is what the pipeline depends on. RedditClient
// implements it against the public Reddit listing JSON.

pub mod reddit;
pub mod traits;
