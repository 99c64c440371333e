//! corpdiff - find the vocabulary that sets one corpus apart from another
//!
//! Two chained stages do the real work:
//! 1. [`compare`] merges the document frequencies of two corpora and runs a
//!    two-sample significance test per token.
//! 2. [`ngram`] rebuilds each document's surviving tokens into unigrams,
//!    bigrams and skip-grams, respecting the gaps left by removed tokens.
//!
//! [`driver`] glues them together over a raw corpus file.

pub mod compare;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod error;
pub mod models;
pub mod ngram;
pub mod stats;
pub mod vocab;

pub use error::{CorpdiffError, Result};
