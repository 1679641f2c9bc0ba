// Copyright 2019-present, the HuggingFace Inc. team, The Google AI Language Team and Facebook, Inc.
// Copyright 2019-2020 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Tokenization seam shared by the feature encoders
//! The feature encoders only need two operations from a tokenizer: splitting a text into sub-word
//! tokens and mapping tokens to vocabulary ids. These are captured by the `TokenEncoder` trait.
//! `TokenizerOption` implements it for the WordPiece/SentencePiece tokenizers of `rust_tokenizers`
//! that share the `[CLS]`/`[SEP]` convention.
use crate::common::error::FinetuneError;
use crate::resources::ResourceProvider;
use rust_tokenizers::tokenizer::{AlbertTokenizer, BertTokenizer, Tokenizer};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// # BERT pretrained vocabulary files
pub struct BertVocabResources;

impl BertVocabResources {
    /// Shared under Apache 2.0 license by the Google team at <https://github.com/google-research/bert>.
    pub const BERT: (&'static str, &'static str) = (
        "bert/vocab",
        "https://huggingface.co/bert-base-uncased/resolve/main/vocab.txt",
    );
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
/// # Identifies the type of model (and therefore of tokenizer) to fine-tune
pub enum ModelType {
    Bert,
    Albert,
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Bert
    }
}

/// # Tokenizer collaborator used by the feature encoders
///
/// Both operations are expected to be deterministic functions of their input and of the
/// tokenizer's fixed vocabulary.
pub trait TokenEncoder {
    /// Splits a text into sub-word tokens
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Maps tokens to their vocabulary ids
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64>;

    /// Start-of-sequence marker
    fn cls_token(&self) -> &str {
        "[CLS]"
    }

    /// Separator marker
    fn sep_token(&self) -> &str {
        "[SEP]"
    }
}

impl<T: TokenEncoder + ?Sized> TokenEncoder for &T {
    fn tokenize(&self, text: &str) -> Vec<String> {
        T::tokenize(self, text)
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64> {
        T::convert_tokens_to_ids(self, tokens)
    }

    fn cls_token(&self) -> &str {
        T::cls_token(self)
    }

    fn sep_token(&self) -> &str {
        T::sep_token(self)
    }
}

/// # Abstraction that holds a particular tokenizer, can be of any of the supported models
pub enum TokenizerOption {
    /// Bert Tokenizer
    Bert(BertTokenizer),
    /// Albert Tokenizer
    Albert(AlbertTokenizer),
}

impl TokenizerOption {
    /// Interface method to load a tokenizer from file
    ///
    /// # Arguments
    ///
    /// * `model_type` - `ModelType` selecting the tokenizer implementation
    /// * `vocab_path` - path to the vocabulary file (`vocab.txt` for BERT, `spiece.model` for ALBERT)
    /// * `lower_case` - lower case all input upon tokenization (assumes a lower-cased model)
    /// * `strip_accents` - optional accent stripping, defaults to the value of `lower_case`
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), bert_finetune::FinetuneError> {
    /// use bert_finetune::pipelines::common::{ModelType, TokenizerOption};
    /// let tokenizer = TokenizerOption::from_file(ModelType::Bert, "path/to/vocab.txt", true, None)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(
        model_type: ModelType,
        vocab_path: P,
        lower_case: bool,
        strip_accents: Option<bool>,
    ) -> Result<Self, FinetuneError> {
        let vocab_path = vocab_path.as_ref();
        if !vocab_path.is_file() {
            return Err(FinetuneError::FileNotFound(vocab_path.display().to_string()));
        }
        let vocab_path = vocab_path.to_str().ok_or_else(|| {
            FinetuneError::InvalidConfigurationError(format!(
                "Vocabulary path {} is not valid UTF-8",
                vocab_path.display()
            ))
        })?;
        let strip_accents = strip_accents.unwrap_or(lower_case);
        let tokenizer = match model_type {
            ModelType::Bert => TokenizerOption::Bert(BertTokenizer::from_file(
                vocab_path,
                lower_case,
                strip_accents,
            )?),
            ModelType::Albert => TokenizerOption::Albert(AlbertTokenizer::from_file(
                vocab_path,
                lower_case,
                strip_accents,
            )?),
        };
        Ok(tokenizer)
    }

    /// Loads a tokenizer from a (local or remote) vocabulary resource
    pub fn from_resource(
        model_type: ModelType,
        vocab_resource: &dyn ResourceProvider,
        lower_case: bool,
        strip_accents: Option<bool>,
    ) -> Result<Self, FinetuneError> {
        let vocab_path = vocab_resource.get_local_path()?;
        Self::from_file(model_type, vocab_path, lower_case, strip_accents)
    }
}

impl TokenEncoder for TokenizerOption {
    fn tokenize(&self, text: &str) -> Vec<String> {
        match *self {
            Self::Bert(ref tokenizer) => tokenizer.tokenize(text),
            Self::Albert(ref tokenizer) => tokenizer.tokenize(text),
        }
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64> {
        match *self {
            Self::Bert(ref tokenizer) => tokenizer.convert_tokens_to_ids(tokens),
            Self::Albert(ref tokenizer) => tokenizer.convert_tokens_to_ids(tokens),
        }
    }
}
