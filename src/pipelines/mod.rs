//! # Tokenization collaborators of the feature encoders
//!
//! `common` holds the `TokenEncoder` seam and the `TokenizerOption` wrapper around the
//! `rust_tokenizers` tokenizers, together with the pretrained vocabulary resources.

pub mod common;
