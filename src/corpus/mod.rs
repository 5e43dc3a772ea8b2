// Corpus preparation: text normalization and budgeted concatenation.
//
// Raw posts come in noisy (links, runs of blank lines, tabs). This module
// turns a batch of them into the single bounded string the prompt embeds.

pub mod builder;
pub mod normalize;
