// Trend report: the typed result and the schema that gates it.

pub mod schema;
