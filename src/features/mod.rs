//! # Feature encoding for sequence classification and multiple choice fine-tuning
//!
//! Converts labeled text examples into the fixed-length integer sequences consumed by BERT-style
//! encoders: token ids, attention mask and segment ids, together with a label id.
//!
//! - `InputExample` holds one sequence or sequence pair, encoded as `[CLS] a [SEP] (b [SEP])`
//! - `MultipleChoiceExample` holds up to four parallel text fields with one entry per option,
//!   each option being encoded as its own sequence
//!
//! Tokenization is delegated to any `TokenEncoder`, such as the `TokenizerOption` wrapper
//! around the `rust_tokenizers` BERT and ALBERT tokenizers.
//!
//! ```no_run
//! # fn main() -> Result<(), bert_finetune::FinetuneError> {
//! use bert_finetune::features::{convert_examples_to_features, InputExample, LabelVocabulary};
//! use bert_finetune::pipelines::common::{ModelType, TokenizerOption};
//!
//! let tokenizer = TokenizerOption::from_file(ModelType::Bert, "path/to/vocab.txt", true, None)?;
//! let labels = LabelVocabulary::new(&["0", "1"])?;
//! let examples = vec![
//!     InputExample::new("dev-0", "The movie was great.", None::<String>, Some("1")),
//!     InputExample::new("dev-1", "The movie was terrible.", None::<String>, Some("0")),
//! ];
//! let features = convert_examples_to_features(&examples, &labels, 128, &tokenizer)?;
//! # Ok(())
//! # }
//! ```

mod encoder;
mod examples;
mod labels;
mod trace;
mod truncation;

pub use encoder::{
    convert_examples_to_features, convert_multiple_choice_examples_to_features, FeatureEncoder,
    InputFeatures, MultipleChoiceFeatures,
};
pub use examples::{InputExample, MultipleChoiceExample};
pub use labels::LabelVocabulary;
pub use trace::{FeatureTrace, LoggingRecorder, OptionTrace, TraceRecorder, DEFAULT_TRACE_LIMIT};
pub use truncation::{
    truncate_longest_first, truncate_seq_pair, truncate_single, MultiFieldTruncation,
};
