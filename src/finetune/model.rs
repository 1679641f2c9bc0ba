// Copyright 2019-present, the HuggingFace Inc. team, The Google AI Language Team and Facebook, Inc.
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
use std::borrow::Borrow;
use tch::{nn, Kind, Tensor};

/// # Output layout expected from a classification model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierShape {
    /// Number of labels of the task
    pub num_labels: i64,
    /// Inputs are `[batch, options, sequence]` and the model scores each option
    pub multiple_choice: bool,
}

impl ClassifierShape {
    /// Number of logits the model produces for each encoded sequence: one score per option
    /// for multiple choice, one logit per label otherwise.
    pub fn outputs_per_sequence(&self) -> i64 {
        if self.multiple_choice {
            1
        } else {
            self.num_labels
        }
    }
}

/// # Model fine-tuned by the training loop
///
/// Implementations receive padded token ids, attention mask and segment ids, all `Int64`.
/// Sequence classification inputs have shape `[batch, sequence]` and the model returns logits
/// of shape `[batch, num_labels]`. Multiple choice inputs have shape `[batch, options, sequence]`
/// and the model returns one logit per option, `[batch, options]`.
pub trait ClassificationModel {
    fn forward_t(
        &self,
        input_ids: &Tensor,
        input_mask: &Tensor,
        segment_ids: &Tensor,
        train: bool,
    ) -> Result<Tensor, FinetuneError>;
}

/// # Mean-pooled embedding classifier
///
/// Masked mean of token and segment embeddings followed by a linear layer. It is a light
/// baseline and the reference implementation of `ClassificationModel` for both input layouts.
pub struct BagOfWordsClassifier {
    word_embeddings: nn::Embedding,
    token_type_embeddings: nn::Embedding,
    dropout_prob: f64,
    classifier: nn::Linear,
    shape: ClassifierShape,
}

impl BagOfWordsClassifier {
    /// Build a new `BagOfWordsClassifier`
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the root of the model
    /// * `vocab_size` - size of the token vocabulary
    /// * `hidden_size` - embedding dimension
    /// * `shape` - task output layout
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bert_finetune::finetune::{BagOfWordsClassifier, ClassifierShape};
    /// use tch::{nn, Device};
    ///
    /// let vs = nn::VarStore::new(Device::Cpu);
    /// let shape = ClassifierShape {
    ///     num_labels: 2,
    ///     multiple_choice: true,
    /// };
    /// let model = BagOfWordsClassifier::new(&vs.root() / "classifier", 30522, 64, shape);
    /// ```
    pub fn new<'p, P>(
        p: P,
        vocab_size: i64,
        hidden_size: i64,
        shape: ClassifierShape,
    ) -> BagOfWordsClassifier
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();

        let word_embeddings_config = nn::EmbeddingConfig {
            padding_idx: 0,
            ..Default::default()
        };
        let word_embeddings = nn::embedding(
            p / "word_embeddings",
            vocab_size,
            hidden_size,
            word_embeddings_config,
        );
        let token_type_embeddings = nn::embedding(
            p / "token_type_embeddings",
            4,
            hidden_size,
            Default::default(),
        );
        let classifier = nn::linear(
            p / "classifier",
            hidden_size,
            shape.outputs_per_sequence(),
            Default::default(),
        );

        BagOfWordsClassifier {
            word_embeddings,
            token_type_embeddings,
            dropout_prob: 0.1,
            classifier,
            shape,
        }
    }
}

impl ClassificationModel for BagOfWordsClassifier {
    fn forward_t(
        &self,
        input_ids: &Tensor,
        input_mask: &Tensor,
        segment_ids: &Tensor,
        train: bool,
    ) -> Result<Tensor, FinetuneError> {
        let input_shape = input_ids.size();
        let expected_dims = if self.shape.multiple_choice { 3 } else { 2 };
        if input_shape.len() != expected_dims {
            return Err(FinetuneError::ShapeError(format!(
                "expected {} input dimensions, got shape {:?}",
                expected_dims, input_shape
            )));
        }
        let sequence_length = input_shape[input_shape.len() - 1];

        let flat_ids = input_ids.view([-1, sequence_length]);
        let flat_mask = input_mask.view([-1, sequence_length]);
        let flat_segments = segment_ids.view([-1, sequence_length]);

        let token_embeddings = flat_ids.apply(&self.word_embeddings)
            + flat_segments.apply(&self.token_type_embeddings);
        let input_mask_expanded = flat_mask
            .unsqueeze(-1)
            .to_kind(Kind::Float)
            .expand_as(&token_embeddings);
        let sum_embeddings = (token_embeddings * &input_mask_expanded).sum_dim_intlist(
            [1].as_slice(),
            false,
            Kind::Float,
        );
        let sum_mask = input_mask_expanded
            .sum_dim_intlist([1].as_slice(), false, Kind::Float)
            .clamp_min(10e-9);

        let logits = (sum_embeddings / sum_mask)
            .dropout(self.dropout_prob, train)
            .apply(&self.classifier);

        Ok(if self.shape.multiple_choice {
            logits.view([input_shape[0], input_shape[1]])
        } else {
            logits
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::Device;

    #[test]
    fn output_shapes() -> anyhow::Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let pair = BagOfWordsClassifier::new(
            &vs.root() / "pair",
            20,
            8,
            ClassifierShape {
                num_labels: 3,
                multiple_choice: false,
            },
        );
        let input_ids = Tensor::from_slice(&[2i64, 5, 3, 0, 2, 6, 7, 3]).view([2, 4]);
        let input_mask = Tensor::from_slice(&[1i64, 1, 1, 0, 1, 1, 1, 1]).view([2, 4]);
        let segment_ids = Tensor::zeros([2, 4], (Kind::Int64, Device::Cpu));
        let logits = pair.forward_t(&input_ids, &input_mask, &segment_ids, false)?;
        assert_eq!(logits.size(), vec![2, 3]);

        let multiple_choice = BagOfWordsClassifier::new(
            &vs.root() / "multiple_choice",
            20,
            8,
            ClassifierShape {
                num_labels: 2,
                multiple_choice: true,
            },
        );
        let logits = multiple_choice.forward_t(
            &input_ids.view([1, 2, 4]),
            &input_mask.view([1, 2, 4]),
            &segment_ids.view([1, 2, 4]),
            false,
        )?;
        assert_eq!(logits.size(), vec![1, 2]);

        assert!(matches!(
            multiple_choice.forward_t(&input_ids, &input_mask, &segment_ids, false),
            Err(FinetuneError::ShapeError(_))
        ));
        Ok(())
    }
}
