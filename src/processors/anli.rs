//! # Abductive NLI JSON lines layouts
//!
//! Each record describes a story with a beginning (`InputSentence1`), an ending
//! (`InputSentence5`), candidate middle sentences (`RandomMiddleSentenceQuiz{k}`, 1-based) and
//! the 1-based index of the correct candidate (`AnswerRightEnding`). Knowledge-augmented records
//! also carry one `CSK{k}` text per candidate.

use crate::common::error::FinetuneError;
use crate::features::{InputExample, MultipleChoiceExample};
use serde_json::Value;

pub(crate) const OPTION_PREFIX: &str = "RandomMiddleSentenceQuiz";
const KNOWLEDGE_PREFIX: &str = "CSK";
const KNOWLEDGE_CONNECTOR: &str = " Because , ";

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

fn text_field<'a>(record: &'a Value, key: &str, index: usize) -> Result<&'a str, FinetuneError> {
    match record.get(key) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(FinetuneError::RecordError(format!(
            "record {}: field {} is not a string ({})",
            index, key, other
        ))),
        None => Err(FinetuneError::RecordError(format!(
            "record {}: missing field {}",
            index, key
        ))),
    }
}

/// Reads `AnswerRightEnding` as an integer, accepting JSON numbers and numeric strings
pub fn answer_right_ending(record: &Value, index: usize) -> Result<i64, FinetuneError> {
    let value = record.get("AnswerRightEnding").ok_or_else(|| {
        FinetuneError::RecordError(format!("record {}: missing field AnswerRightEnding", index))
    })?;
    let answer = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    answer.ok_or_else(|| {
        FinetuneError::RecordError(format!(
            "record {}: AnswerRightEnding {} is not an integer",
            index, value
        ))
    })
}

fn guid(set_type: &str, record: &Value, index: usize) -> Result<String, FinetuneError> {
    let story_id = record.get("InputStoryid").ok_or_else(|| {
        FinetuneError::RecordError(format!("record {}: missing field InputStoryid", index))
    })?;
    let ending = record
        .get("ending")
        .map(value_to_string)
        .unwrap_or_else(|| index.to_string());
    Ok(format!(
        "{}-{}-{}",
        set_type,
        value_to_string(story_id),
        ending
    ))
}

/// Number of candidate middle sentences, counted from the keys of the first record
pub(crate) fn option_count(records: &[Value]) -> usize {
    records
        .first()
        .and_then(Value::as_object)
        .map(|record| {
            record
                .keys()
                .filter(|key| key.starts_with(OPTION_PREFIX))
                .count()
        })
        .unwrap_or(0)
}

fn multiple_choice_example(
    record: &Value,
    index: usize,
    set_type: &str,
    num_options: usize,
    with_knowledge: bool,
) -> Result<MultipleChoiceExample, FinetuneError> {
    let beginning = text_field(record, "InputSentence1", index)?;
    let ending = text_field(record, "InputSentence5", index)?;

    let mut text_a = Vec::with_capacity(num_options);
    let mut text_b = Vec::with_capacity(num_options);
    for option in 1..=num_options {
        let middle = text_field(record, &format!("{}{}", OPTION_PREFIX, option), index)?;
        text_a.push(format!("{} {}", beginning, middle));
        if with_knowledge {
            let knowledge = text_field(record, &format!("{}{}", KNOWLEDGE_PREFIX, option), index)?;
            text_b.push(format!("{}{}{}", ending, KNOWLEDGE_CONNECTOR, knowledge));
        } else {
            text_b.push(ending.to_string());
        }
    }

    let label = (answer_right_ending(record, index)? - 1).to_string();
    MultipleChoiceExample::new(
        guid(set_type, record, index)?,
        text_a,
        text_b,
        None,
        None,
        Some(label),
    )
}

/// Examples with a fixed number of candidates, the ending being the second field of each option
pub(crate) fn anli_examples(
    records: &[Value],
    set_type: &str,
    num_options: usize,
) -> Result<Vec<MultipleChoiceExample>, FinetuneError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            multiple_choice_example(record, index, set_type, num_options, false)
        })
        .collect()
}

/// Knowledge-augmented examples. The number of candidates is inferred from the first record
/// and returned along with the examples.
pub(crate) fn anli_with_knowledge_examples(
    records: &[Value],
    set_type: &str,
) -> Result<(Vec<MultipleChoiceExample>, usize), FinetuneError> {
    let num_options = option_count(records);
    let examples = records
        .iter()
        .enumerate()
        .map(|(index, record)| multiple_choice_example(record, index, set_type, num_options, true))
        .collect::<Result<Vec<MultipleChoiceExample>, FinetuneError>>()?;
    Ok((examples, num_options))
}

/// Binary pair examples: the beginning against the first candidate followed by the ending.
/// The label is `AnswerRightEnding` as found in the record.
pub(crate) fn binary_anli_examples(
    records: &[Value],
    set_type: &str,
) -> Result<Vec<InputExample>, FinetuneError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let beginning = text_field(record, "InputSentence1", index)?;
            let ending = text_field(record, "InputSentence5", index)?;
            let middle = text_field(record, &format!("{}1", OPTION_PREFIX), index)?;
            let label = record.get("AnswerRightEnding").ok_or_else(|| {
                FinetuneError::RecordError(format!(
                    "record {}: missing field AnswerRightEnding",
                    index
                ))
            })?;
            Ok(InputExample::new(
                format!("{}-{}", set_type, index),
                beginning,
                Some(format!("{} {}", middle, ending)),
                Some(value_to_string(label)),
            ))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "InputStoryid": "s1",
            "ending": "e2",
            "InputSentence1": "Tom went out.",
            "InputSentence5": "He came back wet.",
            "RandomMiddleSentenceQuiz1": "It rained.",
            "RandomMiddleSentenceQuiz2": "It was sunny.",
            "CSK1": "rain makes things wet",
            "CSK2": "sun dries things",
            "AnswerRightEnding": 1
        })
    }

    #[test]
    fn two_option_record() -> anyhow::Result<()> {
        let examples = anli_examples(&[record()], "dev", 2)?;
        let example = &examples[0];
        assert_eq!(example.guid(), "dev-s1-e2");
        assert_eq!(
            example.text_a(),
            &["Tom went out. It rained.", "Tom went out. It was sunny."]
        );
        assert_eq!(example.text_b(), &["He came back wet.", "He came back wet."]);
        assert_eq!(example.label(), Some("0"));
        Ok(())
    }

    #[test]
    fn answer_as_string_and_missing_ending() -> anyhow::Result<()> {
        let mut value = record();
        value["AnswerRightEnding"] = json!("2");
        if let Some(object) = value.as_object_mut() {
            object.remove("ending");
        }
        let examples = anli_examples(&[record(), value], "train", 2)?;
        assert_eq!(examples[1].guid(), "train-s1-1");
        assert_eq!(examples[1].label(), Some("1"));
        Ok(())
    }

    #[test]
    fn invalid_records() {
        let mut value = record();
        value["AnswerRightEnding"] = json!("two");
        assert!(matches!(
            anli_examples(&[value], "train", 2),
            Err(FinetuneError::RecordError(_))
        ));
        assert!(matches!(
            anli_examples(&[record()], "train", 3),
            Err(FinetuneError::RecordError(_))
        ));
    }

    #[test]
    fn knowledge_is_appended_to_the_ending() -> anyhow::Result<()> {
        let (examples, num_options) = anli_with_knowledge_examples(&[record()], "test")?;
        assert_eq!(num_options, 2);
        assert_eq!(
            examples[0].text_b()[1],
            "He came back wet. Because , sun dries things"
        );
        Ok(())
    }

    #[test]
    fn binary_record() -> anyhow::Result<()> {
        let examples = binary_anli_examples(&[record()], "dev")?;
        assert_eq!(examples[0].guid, "dev-0");
        assert_eq!(examples[0].text_a, "Tom went out.");
        assert_eq!(
            examples[0].text_b.as_deref(),
            Some("It rained. He came back wet.")
        );
        assert_eq!(examples[0].label.as_deref(), Some("1"));
        Ok(())
    }
}
