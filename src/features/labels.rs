use crate::common::error::FinetuneError;
use std::collections::HashMap;

/// # Ordered, index-significant set of label strings for a task
///
/// The position of a label in the vocabulary is its label id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
    label_to_id: HashMap<String, i64>,
}

impl LabelVocabulary {
    /// Builds a vocabulary from an ordered list of labels. Duplicated labels are rejected as
    /// they would make the label to id mapping ambiguous.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), bert_finetune::FinetuneError> {
    /// use bert_finetune::features::LabelVocabulary;
    /// let labels = LabelVocabulary::new(&["contradiction", "entailment", "neutral"])?;
    /// assert_eq!(labels.id("neutral")?, 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Result<LabelVocabulary, FinetuneError> {
        let labels: Vec<String> = labels.iter().map(|label| label.as_ref().to_string()).collect();
        let mut label_to_id = HashMap::with_capacity(labels.len());
        for (id, label) in labels.iter().enumerate() {
            if label_to_id.insert(label.clone(), id as i64).is_some() {
                return Err(FinetuneError::LabelError(format!(
                    "label {} appears more than once in the vocabulary",
                    label
                )));
            }
        }
        Ok(LabelVocabulary {
            labels,
            label_to_id,
        })
    }

    /// Vocabulary made of the string forms of `0..num_labels`, used by option-index labels
    pub fn from_range(num_labels: usize) -> LabelVocabulary {
        let labels: Vec<String> = (0..num_labels).map(|idx| idx.to_string()).collect();
        let label_to_id = labels
            .iter()
            .enumerate()
            .map(|(id, label)| (label.clone(), id as i64))
            .collect();
        LabelVocabulary {
            labels,
            label_to_id,
        }
    }

    /// Label id of a label string. Fails with a `LabelError` if the label is not part of the vocabulary.
    pub fn id(&self, label: &str) -> Result<i64, FinetuneError> {
        self.label_to_id.get(label).copied().ok_or_else(|| {
            FinetuneError::LabelError(format!(
                "label {} not found in vocabulary {:?}",
                label, self.labels
            ))
        })
    }

    /// Label string for a label id
    pub fn label(&self, id: i64) -> Option<&str> {
        if id < 0 {
            return None;
        }
        self.labels.get(id as usize).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
