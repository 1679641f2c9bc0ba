use crate::common::error::FinetuneError;
use serde::{Deserialize, Serialize};

/// # Single training/test example for sequence (pair) classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputExample {
    /// Unique id for the example, used for traceability only
    pub guid: String,
    /// Untokenized text of the first sequence
    pub text_a: String,
    /// Untokenized text of the second sequence, only for sequence pair tasks
    pub text_b: Option<String>,
    /// Label of the example. Present for train and dev examples, absent for inference inputs
    pub label: Option<String>,
}

impl InputExample {
    /// Builds a new `InputExample`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bert_finetune::features::InputExample;
    /// let example = InputExample::new("train-1", "the cat sat", Some("on the mat"), Some("1"));
    /// ```
    pub fn new(
        guid: impl Into<String>,
        text_a: impl Into<String>,
        text_b: Option<impl Into<String>>,
        label: Option<impl Into<String>>,
    ) -> InputExample {
        InputExample {
            guid: guid.into(),
            text_a: text_a.into(),
            text_b: text_b.map(Into::into),
            label: label.map(Into::into),
        }
    }
}

/// # Single training/test example for multiple choice classification
///
/// Every present `text_*` field holds one entry per option slot. All of them have the same
/// length K, which is checked at construction. The label is the string form of the 0-based
/// index of the correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultipleChoiceExample {
    guid: String,
    text_a: Vec<String>,
    text_b: Vec<String>,
    text_c: Option<Vec<String>>,
    text_d: Option<Vec<String>>,
    label: Option<String>,
}

impl MultipleChoiceExample {
    /// Builds a new `MultipleChoiceExample`, failing with a `ShapeError` if the option fields
    /// do not all have the same number of entries.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), bert_finetune::FinetuneError> {
    /// use bert_finetune::features::MultipleChoiceExample;
    /// let example = MultipleChoiceExample::new(
    ///     "dev-42",
    ///     vec!["She went out. It rained.".into(), "She went out. It was sunny.".into()],
    ///     vec!["She came back wet.".into(), "She came back wet.".into()],
    ///     None,
    ///     None,
    ///     Some("0".into()),
    /// )?;
    /// assert_eq!(example.num_options(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        guid: impl Into<String>,
        text_a: Vec<String>,
        text_b: Vec<String>,
        text_c: Option<Vec<String>>,
        text_d: Option<Vec<String>>,
        label: Option<String>,
    ) -> Result<MultipleChoiceExample, FinetuneError> {
        let guid = guid.into();
        let num_options = text_a.len();
        let fields = [
            ("text_b", Some(&text_b)),
            ("text_c", text_c.as_ref()),
            ("text_d", text_d.as_ref()),
        ];
        for (name, field) in fields.iter() {
            if let Some(field) = field {
                if field.len() != num_options {
                    return Err(FinetuneError::ShapeError(format!(
                        "example {}: text_a has {} options but {} has {}",
                        guid,
                        num_options,
                        name,
                        field.len()
                    )));
                }
            }
        }
        Ok(MultipleChoiceExample {
            guid,
            text_a,
            text_b,
            text_c,
            text_d,
            label,
        })
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn text_a(&self) -> &[String] {
        &self.text_a
    }

    pub fn text_b(&self) -> &[String] {
        &self.text_b
    }

    pub fn text_c(&self) -> Option<&[String]> {
        self.text_c.as_deref()
    }

    pub fn text_d(&self) -> Option<&[String]> {
        self.text_d.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of option slots (K)
    pub fn num_options(&self) -> usize {
        self.text_a.len()
    }

    /// Present text fields in order (a, b, then c and d when set). Empty fields are skipped,
    /// as they carry no text for any option.
    pub fn fields(&self) -> Vec<&[String]> {
        let mut fields = vec![self.text_a.as_slice()];
        let optional_fields = [
            Some(self.text_b.as_slice()),
            self.text_c.as_deref(),
            self.text_d.as_deref(),
        ];
        for field in optional_fields.iter().flatten() {
            if !field.is_empty() {
                fields.push(*field);
            }
        }
        fields
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn options(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| text.to_string()).collect()
    }

    #[test]
    fn mismatched_option_fields_are_rejected() {
        let result = MultipleChoiceExample::new(
            "train-0",
            options(&["a", "b", "c"]),
            options(&["end", "end"]),
            None,
            None,
            Some("0".to_string()),
        );
        assert!(matches!(result, Err(FinetuneError::ShapeError(_))));

        let result = MultipleChoiceExample::new(
            "train-0",
            options(&["a", "b"]),
            options(&["end", "end"]),
            Some(options(&["x"])),
            None,
            None,
        );
        assert!(matches!(result, Err(FinetuneError::ShapeError(_))));
    }

    #[test]
    fn fields_follow_declaration_order() -> anyhow::Result<()> {
        let example = MultipleChoiceExample::new(
            "train-0",
            options(&["a1", "a2"]),
            options(&["b1", "b2"]),
            None,
            Some(options(&["d1", "d2"])),
            Some("1".to_string()),
        )?;
        let fields = example.fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0][1], "a2");
        assert_eq!(fields[1][0], "b1");
        assert_eq!(fields[2][0], "d1");
        assert_eq!(example.num_options(), 2);
        assert_eq!(example.label(), Some("1"));
        Ok(())
    }
}
