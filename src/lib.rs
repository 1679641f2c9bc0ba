//! # BERT fine-tuning for sentence classification and multiple choice
//!
//! Prepares GLUE (CoLA, MNLI, MRPC) and abductive NLI datasets for fine-tuning BERT-style
//! encoders, and drives the fine-tuning of a `tch` model on the encoded features.
//!
//! The crate is organized around the encoding pipeline:
//! - `processors`: dataset readers and per-task example extraction
//! - `features`: example data model, label vocabularies, truncation and the feature encoders
//! - `pipelines::common`: tokenizer seam over the `rust_tokenizers` BERT and ALBERT tokenizers
//! - `finetune`: tensor batching, training loop, evaluation, prediction export and
//!   hyper-parameter grid
//!
//! ```no_run
//! # fn main() -> Result<(), bert_finetune::FinetuneError> {
//! use bert_finetune::features::FeatureEncoder;
//! use bert_finetune::pipelines::common::{ModelType, TokenizerOption};
//! use bert_finetune::processors::{DataProcessor, TaskExamples};
//!
//! let processor = DataProcessor::from_task_name("anli")?;
//! let labels = processor.label_vocabulary()?;
//! let tokenizer = TokenizerOption::from_file(ModelType::Bert, "path/to/vocab.txt", true, None)?;
//! let encoder = FeatureEncoder::new(&tokenizer, &labels, 128)?;
//!
//! if let TaskExamples::MultipleChoice(examples) = processor.get_train_examples("path/to/anli")? {
//!     let features = encoder.convert_multiple_choice_examples_to_features(&examples, ())?;
//!     println!("{} training features", features.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The crate emits `tracing` events (dataset locations, the encoding of the first examples of
//! each dataset, training and evaluation progress). Install a subscriber such as
//! `tracing_subscriber::fmt` to display them.

pub mod common;
pub mod features;
pub mod finetune;
pub mod pipelines;
pub mod processors;

pub use common::error::FinetuneError;
pub use common::{resources, Config};
