use crate::common::error::FinetuneError;
use crate::features::{FeatureEncoder, InputFeatures, LoggingRecorder, MultipleChoiceFeatures};
use crate::pipelines::common::TokenEncoder;
use crate::processors::TaskExamples;
use tch::{Device, Kind, Tensor};

/// Encoded features of a task, in example order
#[derive(Debug, Clone, PartialEq)]
pub enum TaskFeatures {
    Pair(Vec<InputFeatures>),
    MultipleChoice(Vec<MultipleChoiceFeatures>),
}

impl TaskFeatures {
    /// Encodes task examples, logging the first ones
    pub fn from_examples<T: TokenEncoder + ?Sized>(
        examples: &TaskExamples,
        encoder: &FeatureEncoder<T>,
    ) -> Result<TaskFeatures, FinetuneError> {
        Ok(match examples {
            TaskExamples::Pair(examples) => TaskFeatures::Pair(
                encoder.convert_examples_to_features(examples, LoggingRecorder)?,
            ),
            TaskExamples::MultipleChoice(examples) => TaskFeatures::MultipleChoice(
                encoder.convert_multiple_choice_examples_to_features(examples, LoggingRecorder)?,
            ),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            TaskFeatures::Pair(features) => features.len(),
            TaskFeatures::MultipleChoice(features) => features.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_tensors(&self, device: Device) -> Result<FeatureTensors, FinetuneError> {
        match self {
            TaskFeatures::Pair(features) => FeatureTensors::from_features(features, device),
            TaskFeatures::MultipleChoice(features) => {
                FeatureTensors::from_multiple_choice_features(features, device)
            }
        }
    }
}

/// # Stacked feature tensors
///
/// `input_ids`, `input_mask` and `segment_ids` have shape `[N, L]` for sequence classification
/// and `[N, K, L]` for multiple choice. `label_ids` has shape `[N]`. All tensors are `Int64`.
#[derive(Debug)]
pub struct FeatureTensors {
    pub input_ids: Tensor,
    pub input_mask: Tensor,
    pub segment_ids: Tensor,
    pub label_ids: Tensor,
}

fn stack<'a, I>(values: I, shape: &[i64], device: Device) -> Tensor
where
    I: Iterator<Item = &'a i64>,
{
    let values: Vec<i64> = values.copied().collect();
    Tensor::from_slice(&values).view(shape).to(device)
}

impl FeatureTensors {
    pub fn from_features(
        features: &[InputFeatures],
        device: Device,
    ) -> Result<FeatureTensors, FinetuneError> {
        let num_features = features.len() as i64;
        let sequence_length = features.first().map_or(0, |f| f.input_ids.len());
        for feature in features {
            if feature.input_ids.len() != sequence_length
                || feature.input_mask.len() != sequence_length
                || feature.segment_ids.len() != sequence_length
            {
                return Err(FinetuneError::ShapeError(format!(
                    "features have inconsistent sequence lengths (expected {})",
                    sequence_length
                )));
            }
        }
        let shape = [num_features, sequence_length as i64];

        Ok(FeatureTensors {
            input_ids: stack(features.iter().flat_map(|f| f.input_ids.iter()), &shape, device),
            input_mask: stack(features.iter().flat_map(|f| f.input_mask.iter()), &shape, device),
            segment_ids: stack(
                features.iter().flat_map(|f| f.segment_ids.iter()),
                &shape,
                device,
            ),
            label_ids: stack(features.iter().map(|f| &f.label_id), &[num_features], device),
        })
    }

    pub fn from_multiple_choice_features(
        features: &[MultipleChoiceFeatures],
        device: Device,
    ) -> Result<FeatureTensors, FinetuneError> {
        let num_features = features.len() as i64;
        let num_options = features.first().map_or(0, MultipleChoiceFeatures::num_options);
        let sequence_length = features
            .first()
            .and_then(|f| f.input_ids.first())
            .map_or(0, Vec::len);
        for feature in features {
            let consistent = [&feature.input_ids, &feature.input_mask, &feature.segment_ids]
                .iter()
                .all(|sequences| {
                    sequences.len() == num_options
                        && sequences.iter().all(|s| s.len() == sequence_length)
                });
            if !consistent {
                return Err(FinetuneError::ShapeError(format!(
                    "multiple choice features must all have {} options of length {}",
                    num_options, sequence_length
                )));
            }
        }
        let shape = [num_features, num_options as i64, sequence_length as i64];

        Ok(FeatureTensors {
            input_ids: stack(
                features.iter().flat_map(|f| f.input_ids.iter().flatten()),
                &shape,
                device,
            ),
            input_mask: stack(
                features.iter().flat_map(|f| f.input_mask.iter().flatten()),
                &shape,
                device,
            ),
            segment_ids: stack(
                features.iter().flat_map(|f| f.segment_ids.iter().flatten()),
                &shape,
                device,
            ),
            label_ids: stack(features.iter().map(|f| &f.label_id), &[num_features], device),
        })
    }

    /// Number of examples
    pub fn len(&self) -> i64 {
        self.label_ids.size()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn device(&self) -> Device {
        self.input_ids.device()
    }

    /// Examples at the given positions (`Int64` tensor of indices), in that order
    pub fn select(&self, indices: &Tensor) -> FeatureTensors {
        let indices = indices.to(self.device());
        FeatureTensors {
            input_ids: self.input_ids.index_select(0, &indices),
            input_mask: self.input_mask.index_select(0, &indices),
            segment_ids: self.segment_ids.index_select(0, &indices),
            label_ids: self.label_ids.index_select(0, &indices),
        }
    }

    /// Splits the examples into batches of at most `batch_size` examples, either in order or
    /// following a random permutation drawn from the `tch` generator.
    pub fn batches(&self, batch_size: usize, shuffle: bool) -> Vec<FeatureTensors> {
        let num_examples = self.len();
        if num_examples == 0 || batch_size == 0 {
            return vec![];
        }
        let indices = if shuffle {
            Tensor::randperm(num_examples, (Kind::Int64, Device::Cpu))
        } else {
            Tensor::arange(num_examples, (Kind::Int64, Device::Cpu))
        };
        indices
            .split(batch_size as i64, 0)
            .iter()
            .map(|batch_indices| self.select(batch_indices))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryFrom;

    fn feature(ids: &[i64], label_id: i64) -> InputFeatures {
        InputFeatures {
            input_ids: ids.to_vec(),
            input_mask: ids.iter().map(|id| (*id != 0) as i64).collect(),
            segment_ids: vec![0; ids.len()],
            label_id,
        }
    }

    #[test]
    fn pair_tensors_shape() -> anyhow::Result<()> {
        let features = vec![feature(&[2, 5, 3, 0], 1), feature(&[2, 6, 3, 0], 0), feature(&[2, 7, 3, 0], 1)];
        let tensors = FeatureTensors::from_features(&features, Device::Cpu)?;
        assert_eq!(tensors.input_ids.size(), vec![3, 4]);
        assert_eq!(tensors.label_ids.size(), vec![3]);
        assert_eq!(tensors.input_ids.int64_value(&[1, 1]), 6);
        assert_eq!(tensors.input_mask.int64_value(&[2, 3]), 0);

        let batches = tensors.batches(2, false);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].len(), 1);
        assert_eq!(batches[1].input_ids.int64_value(&[0, 1]), 7);
        Ok(())
    }

    #[test]
    fn multiple_choice_tensors_shape() -> anyhow::Result<()> {
        let features = vec![MultipleChoiceFeatures {
            input_ids: vec![vec![2, 5, 3], vec![2, 6, 3]],
            input_mask: vec![vec![1, 1, 1], vec![1, 1, 1]],
            segment_ids: vec![vec![0, 0, 0], vec![0, 0, 0]],
            label_id: 1,
        }];
        let tensors = FeatureTensors::from_multiple_choice_features(&features, Device::Cpu)?;
        assert_eq!(tensors.input_ids.size(), vec![1, 2, 3]);
        assert_eq!(tensors.input_ids.int64_value(&[0, 1, 1]), 6);
        assert_eq!(tensors.label_ids.int64_value(&[0]), 1);
        Ok(())
    }

    #[test]
    fn inconsistent_lengths_are_rejected() {
        let features = vec![feature(&[2, 5, 3, 0], 1), feature(&[2, 6, 3], 0)];
        assert!(matches!(
            FeatureTensors::from_features(&features, Device::Cpu),
            Err(FinetuneError::ShapeError(_))
        ));
    }

    #[test]
    fn shuffled_batches_cover_all_examples() -> anyhow::Result<()> {
        let features: Vec<InputFeatures> = (0..10).map(|idx| feature(&[2, idx + 4, 3], idx)).collect();
        let tensors = FeatureTensors::from_features(&features, Device::Cpu)?;
        tch::manual_seed(42);
        let mut labels: Vec<i64> = vec![];
        for batch in tensors.batches(3, true) {
            labels.extend(Vec::<i64>::try_from(&batch.label_ids)?);
        }
        labels.sort_unstable();
        assert_eq!(labels, (0..10).collect::<Vec<i64>>());
        Ok(())
    }
}
