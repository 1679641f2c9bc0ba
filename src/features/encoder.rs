// Copyright 2018 The Google AI Language Team Authors and The HuggingFace Inc. team.
// Copyright 2019 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::common::error::FinetuneError;
use crate::features::examples::{InputExample, MultipleChoiceExample};
use crate::features::labels::LabelVocabulary;
use crate::features::trace::{
    FeatureTrace, LoggingRecorder, OptionTrace, TraceRecorder, DEFAULT_TRACE_LIMIT,
};
use crate::features::truncation::{truncate_seq_pair, truncate_single, MultiFieldTruncation};
use crate::pipelines::common::TokenEncoder;
use serde::{Deserialize, Serialize};

/// # Fixed-length features for sequence (pair) classification
///
/// The three sequences have exactly `max_seq_length` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFeatures {
    /// Token ids, right-padded with 0
    pub input_ids: Vec<i64>,
    /// 1 for real tokens, 0 for padding
    pub input_mask: Vec<i64>,
    /// 0 up to and including the first separator, 1 for the second sequence and its separator
    pub segment_ids: Vec<i64>,
    /// Index of the example label in the task label vocabulary
    pub label_id: i64,
}

/// # Fixed-length features for multiple choice classification
///
/// Each sequence field holds one `max_seq_length` long entry per option, in option order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoiceFeatures {
    pub input_ids: Vec<Vec<i64>>,
    pub input_mask: Vec<Vec<i64>>,
    pub segment_ids: Vec<Vec<i64>>,
    /// Index of the correct option
    pub label_id: i64,
}

impl MultipleChoiceFeatures {
    pub fn num_options(&self) -> usize {
        self.input_ids.len()
    }
}

struct EncodedSequence {
    tokens: Vec<String>,
    input_ids: Vec<i64>,
    input_mask: Vec<i64>,
    segment_ids: Vec<i64>,
}

impl EncodedSequence {
    fn into_trace(self) -> OptionTrace {
        OptionTrace {
            tokens: self.tokens,
            input_ids: self.input_ids,
            input_mask: self.input_mask,
            segment_ids: self.segment_ids,
        }
    }
}

/// # Converts examples into fixed-length model inputs
///
/// Sequences are laid out as `[CLS] field_0 [SEP] field_1 [SEP] ...`, where every token of a
/// field and its trailing separator get the field index as segment id. Fields are truncated
/// to fit `max_seq_length` and the result is right-padded with zeros.
///
/// The encoder only borrows the tokenizer and the label vocabulary: converting an example
/// is a pure function of the example and of these collaborators.
pub struct FeatureEncoder<'a, T: TokenEncoder + ?Sized> {
    tokenizer: &'a T,
    label_vocabulary: &'a LabelVocabulary,
    max_seq_length: usize,
    multi_field_truncation: MultiFieldTruncation,
    trace_limit: usize,
}

impl<'a, T: TokenEncoder + ?Sized> FeatureEncoder<'a, T> {
    /// Builds a new `FeatureEncoder`
    ///
    /// # Arguments
    ///
    /// * `tokenizer` - tokenizer implementing `TokenEncoder`
    /// * `label_vocabulary` - ordered task labels, mapping label strings to label ids
    /// * `max_seq_length` - length of every encoded sequence, markers included (at least 3)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), bert_finetune::FinetuneError> {
    /// use bert_finetune::features::{FeatureEncoder, InputExample, LabelVocabulary};
    /// use bert_finetune::pipelines::common::{ModelType, TokenizerOption};
    ///
    /// let tokenizer = TokenizerOption::from_file(ModelType::Bert, "path/to/vocab.txt", true, None)?;
    /// let labels = LabelVocabulary::new(&["0", "1"])?;
    /// let encoder = FeatureEncoder::new(&tokenizer, &labels, 128)?;
    /// let example = InputExample::new("dev-1", "the cat sat", Some("on the mat"), Some("1"));
    /// let features = encoder.encode(&example)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        tokenizer: &'a T,
        label_vocabulary: &'a LabelVocabulary,
        max_seq_length: usize,
    ) -> Result<Self, FinetuneError> {
        if max_seq_length < 3 {
            return Err(FinetuneError::InvalidConfigurationError(format!(
                "max_seq_length must leave room for [CLS], [SEP], [SEP] (got {})",
                max_seq_length
            )));
        }
        Ok(FeatureEncoder {
            tokenizer,
            label_vocabulary,
            max_seq_length,
            multi_field_truncation: MultiFieldTruncation::default(),
            trace_limit: DEFAULT_TRACE_LIMIT,
        })
    }

    /// Sets the truncation applied to the fields of multiple choice options
    pub fn with_multi_field_truncation(mut self, truncation: MultiFieldTruncation) -> Self {
        self.multi_field_truncation = truncation;
        self
    }

    /// Sets the number of leading examples handed to the trace recorder
    pub fn with_trace_limit(mut self, trace_limit: usize) -> Self {
        self.trace_limit = trace_limit;
        self
    }

    pub fn max_seq_length(&self) -> usize {
        self.max_seq_length
    }

    fn build_sequence(&self, fields: &[&[String]]) -> Result<EncodedSequence, FinetuneError> {
        let mut tokens = Vec::with_capacity(self.max_seq_length);
        let mut segment_ids = Vec::with_capacity(self.max_seq_length);
        tokens.push(self.tokenizer.cls_token().to_string());
        segment_ids.push(0);
        for (segment_id, field) in fields.iter().enumerate() {
            for token in field.iter() {
                tokens.push(token.clone());
                segment_ids.push(segment_id as i64);
            }
            tokens.push(self.tokenizer.sep_token().to_string());
            segment_ids.push(segment_id as i64);
        }
        if tokens.len() > self.max_seq_length {
            return Err(FinetuneError::SequenceLengthError(format!(
                "{} tokens do not fit in max_seq_length {}",
                tokens.len(),
                self.max_seq_length
            )));
        }

        let mut input_ids = self.tokenizer.convert_tokens_to_ids(&tokens);
        if input_ids.len() != tokens.len() {
            return Err(FinetuneError::SequenceLengthError(format!(
                "tokenizer mapped {} tokens to {} ids",
                tokens.len(),
                input_ids.len()
            )));
        }
        let mut input_mask = vec![1; input_ids.len()];

        input_ids.resize(self.max_seq_length, 0);
        input_mask.resize(self.max_seq_length, 0);
        segment_ids.resize(self.max_seq_length, 0);

        Ok(EncodedSequence {
            tokens,
            input_ids,
            input_mask,
            segment_ids,
        })
    }

    fn label_id(&self, guid: &str, label: Option<&str>) -> Result<(String, i64), FinetuneError> {
        let label = label.ok_or_else(|| {
            FinetuneError::LabelError(format!("example {} has no label", guid))
        })?;
        Ok((label.to_string(), self.label_vocabulary.id(label)?))
    }

    fn encode_with_trace(
        &self,
        example: &InputExample,
    ) -> Result<(InputFeatures, EncodedSequence, String), FinetuneError> {
        let tokens_a = self.tokenizer.tokenize(&example.text_a);
        let tokens_b = example
            .text_b
            .as_deref()
            .filter(|text_b| !text_b.is_empty())
            .map(|text_b| self.tokenizer.tokenize(text_b))
            .filter(|tokens_b| !tokens_b.is_empty());

        let fields = match tokens_b {
            // Account for [CLS], [SEP], [SEP]
            Some(ref tokens_b) => {
                let (tokens_a, tokens_b) =
                    truncate_seq_pair(&tokens_a, tokens_b, self.max_seq_length - 3);
                vec![tokens_a, tokens_b]
            }
            // Account for [CLS], [SEP]
            None => vec![truncate_single(&tokens_a, self.max_seq_length - 2)],
        };

        let sequence = self.build_sequence(&fields)?;
        let (label, label_id) = self.label_id(&example.guid, example.label.as_deref())?;
        let features = InputFeatures {
            input_ids: sequence.input_ids.clone(),
            input_mask: sequence.input_mask.clone(),
            segment_ids: sequence.segment_ids.clone(),
            label_id,
        };
        Ok((features, sequence, label))
    }

    fn encode_multiple_choice_with_trace(
        &self,
        example: &MultipleChoiceExample,
    ) -> Result<(MultipleChoiceFeatures, Vec<EncodedSequence>, String), FinetuneError> {
        let fields = example.fields();
        let num_options = example.num_options();
        let tokenized_fields: Vec<Vec<Vec<String>>> = fields
            .iter()
            .map(|field| {
                field
                    .iter()
                    .map(|text| self.tokenizer.tokenize(text))
                    .collect()
            })
            .collect();
        // Account for [CLS] and one [SEP] per field
        let max_length = self.max_seq_length.saturating_sub(fields.len() + 1);

        let mut sequences = Vec::with_capacity(num_options);
        for option_index in 0..num_options {
            let option_fields: Vec<&[String]> = tokenized_fields
                .iter()
                .map(|field| field[option_index].as_slice())
                .collect();
            let option_fields = self
                .multi_field_truncation
                .truncate(&option_fields, max_length);
            sequences.push(self.build_sequence(&option_fields)?);
        }

        let (label, label_id) = self.label_id(example.guid(), example.label())?;
        if label_id < 0 || label_id as usize >= num_options {
            return Err(FinetuneError::LabelError(format!(
                "example {}: label id {} is not a valid option index for {} options",
                example.guid(),
                label_id,
                num_options
            )));
        }

        let features = MultipleChoiceFeatures {
            input_ids: sequences.iter().map(|s| s.input_ids.clone()).collect(),
            input_mask: sequences.iter().map(|s| s.input_mask.clone()).collect(),
            segment_ids: sequences.iter().map(|s| s.segment_ids.clone()).collect(),
            label_id,
        };
        Ok((features, sequences, label))
    }

    /// Encodes a single sequence classification example
    pub fn encode(&self, example: &InputExample) -> Result<InputFeatures, FinetuneError> {
        Ok(self.encode_with_trace(example)?.0)
    }

    /// Encodes a single multiple choice example
    pub fn encode_multiple_choice(
        &self,
        example: &MultipleChoiceExample,
    ) -> Result<MultipleChoiceFeatures, FinetuneError> {
        Ok(self.encode_multiple_choice_with_trace(example)?.0)
    }

    /// Encodes sequence classification examples, preserving their order. The first examples
    /// (up to the trace limit) are reported to `recorder`.
    pub fn convert_examples_to_features<R: TraceRecorder>(
        &self,
        examples: &[InputExample],
        mut recorder: R,
    ) -> Result<Vec<InputFeatures>, FinetuneError> {
        let mut features = Vec::with_capacity(examples.len());
        for (example_index, example) in examples.iter().enumerate() {
            let (feature, sequence, label) = self.encode_with_trace(example)?;
            if example_index < self.trace_limit {
                recorder.record(FeatureTrace {
                    example_index,
                    guid: example.guid.clone(),
                    options: vec![sequence.into_trace()],
                    label,
                    label_id: feature.label_id,
                });
            }
            features.push(feature);
        }
        Ok(features)
    }

    /// Encodes multiple choice examples, preserving their order. The first examples
    /// (up to the trace limit) are reported to `recorder`.
    pub fn convert_multiple_choice_examples_to_features<R: TraceRecorder>(
        &self,
        examples: &[MultipleChoiceExample],
        mut recorder: R,
    ) -> Result<Vec<MultipleChoiceFeatures>, FinetuneError> {
        let mut features = Vec::with_capacity(examples.len());
        for (example_index, example) in examples.iter().enumerate() {
            let (feature, sequences, label) = self.encode_multiple_choice_with_trace(example)?;
            if example_index < self.trace_limit {
                recorder.record(FeatureTrace {
                    example_index,
                    guid: example.guid().to_string(),
                    options: sequences.into_iter().map(EncodedSequence::into_trace).collect(),
                    label,
                    label_id: feature.label_id,
                });
            }
            features.push(feature);
        }
        Ok(features)
    }
}

/// Encodes sequence classification examples, logging the first ones through `tracing`
pub fn convert_examples_to_features<T: TokenEncoder + ?Sized>(
    examples: &[InputExample],
    label_vocabulary: &LabelVocabulary,
    max_seq_length: usize,
    tokenizer: &T,
) -> Result<Vec<InputFeatures>, FinetuneError> {
    FeatureEncoder::new(tokenizer, label_vocabulary, max_seq_length)?
        .convert_examples_to_features(examples, LoggingRecorder)
}

/// Encodes multiple choice examples, logging the first ones through `tracing`
pub fn convert_multiple_choice_examples_to_features<T: TokenEncoder + ?Sized>(
    examples: &[MultipleChoiceExample],
    label_vocabulary: &LabelVocabulary,
    max_seq_length: usize,
    tokenizer: &T,
) -> Result<Vec<MultipleChoiceFeatures>, FinetuneError> {
    FeatureEncoder::new(tokenizer, label_vocabulary, max_seq_length)?
        .convert_multiple_choice_examples_to_features(examples, LoggingRecorder)
}
