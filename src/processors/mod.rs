//! # Dataset processors
//!
//! A `DataProcessor` knows the file names, the record layout and the label set of one
//! fine-tuning task. It turns the raw records of a dataset split into examples ready for
//! feature encoding.
//!
//! | Task name | Files (train / dev / test) | Labels | Examples |
//! |---|---|---|---|
//! | `cola` | `train.tsv` / `dev.tsv` / - | `0, 1` | single sentence |
//! | `mnli` | `train.tsv` / `dev_matched.tsv` / - | `contradiction, entailment, neutral` | sentence pair |
//! | `mrpc` | `train.tsv` / `dev.tsv` / - | `0, 1` | sentence pair |
//! | `anli` | `train.jsonl` / `valid.jsonl` / `test.jsonl` | `0, 1` | 2 options |
//! | `anli3` | `train.jsonl` / `valid.jsonl` / `test.jsonl` | `0, 1, 2` | 3 options |
//! | `anli_csk` | `train.jsonl` / `valid.jsonl` / `test.jsonl` | `0` to `15` | K options with knowledge |
//! | `bin_anli` | `train-binary.jsonl` / `valid-binary.jsonl` / - | `0, 1` | sentence pair |
//!
//! ```no_run
//! # fn main() -> Result<(), bert_finetune::FinetuneError> {
//! use bert_finetune::processors::{DataProcessor, DataSplit};
//!
//! let processor = DataProcessor::from_task_name("anli")?;
//! let examples = processor.get_examples(DataSplit::Dev, "path/to/anli")?;
//! println!("{} dev examples", examples.len());
//! # Ok(())
//! # }
//! ```

mod anli;
mod glue;
pub mod readers;

pub use anli::answer_right_ending;
pub use readers::{read_jsonl, read_tsv, write_jsonl};

use crate::common::error::FinetuneError;
use crate::features::{InputExample, LabelVocabulary, MultipleChoiceExample};
use std::path::Path;
use tracing::info;

/// Dataset split to load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSplit {
    Train,
    Dev,
    Test,
}

impl DataSplit {
    fn set_type(&self) -> &'static str {
        match self {
            DataSplit::Train => "train",
            DataSplit::Dev => "dev",
            DataSplit::Test => "test",
        }
    }
}

/// Examples produced by a processor. Multiple choice tasks produce `MultipleChoiceExample`s,
/// the other tasks `InputExample`s.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskExamples {
    Pair(Vec<InputExample>),
    MultipleChoice(Vec<MultipleChoiceExample>),
}

impl TaskExamples {
    pub fn len(&self) -> usize {
        match self {
            TaskExamples::Pair(examples) => examples.len(),
            TaskExamples::MultipleChoice(examples) => examples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels of the option slots found in the loaded file (`"0"` to `"K-1"`), `None` for pair tasks
    pub fn option_vocabulary(&self) -> Option<LabelVocabulary> {
        match self {
            TaskExamples::Pair(_) => None,
            TaskExamples::MultipleChoice(examples) => Some(LabelVocabulary::from_range(
                examples.first().map_or(0, MultipleChoiceExample::num_options),
            )),
        }
    }
}

/// # Supported fine-tuning tasks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataProcessor {
    /// CoLA, single sentence acceptability
    Cola,
    /// MultiNLI (matched dev set)
    Mnli,
    /// Microsoft Research Paraphrase Corpus
    Mrpc,
    /// Abductive NLI with two candidate hypotheses
    Anli,
    /// Abductive NLI with three candidate hypotheses
    AnliThreeOption,
    /// Abductive NLI with commonsense knowledge appended to each candidate, up to 16 candidates
    AnliWithCsk,
    /// Abductive NLI as a binary sentence pair task
    BinaryAnli,
}

impl DataProcessor {
    /// Looks a processor up by task name (case insensitive)
    pub fn from_task_name(task_name: &str) -> Result<DataProcessor, FinetuneError> {
        match task_name.to_lowercase().as_str() {
            "cola" => Ok(DataProcessor::Cola),
            "mnli" => Ok(DataProcessor::Mnli),
            "mrpc" => Ok(DataProcessor::Mrpc),
            "anli" => Ok(DataProcessor::Anli),
            "anli3" => Ok(DataProcessor::AnliThreeOption),
            "anli_csk" => Ok(DataProcessor::AnliWithCsk),
            "bin_anli" => Ok(DataProcessor::BinaryAnli),
            _ => Err(FinetuneError::InvalidConfigurationError(format!(
                "Task not found: {}",
                task_name
            ))),
        }
    }

    pub fn task_name(&self) -> &'static str {
        match self {
            DataProcessor::Cola => "cola",
            DataProcessor::Mnli => "mnli",
            DataProcessor::Mrpc => "mrpc",
            DataProcessor::Anli => "anli",
            DataProcessor::AnliThreeOption => "anli3",
            DataProcessor::AnliWithCsk => "anli_csk",
            DataProcessor::BinaryAnli => "bin_anli",
        }
    }

    /// True for the tasks encoded with one sequence per candidate option
    pub fn is_multiple_choice(&self) -> bool {
        matches!(
            self,
            DataProcessor::Anli | DataProcessor::AnliThreeOption | DataProcessor::AnliWithCsk
        )
    }

    /// Ordered labels of the task, the position of a label being its label id
    pub fn get_labels(&self) -> Vec<String> {
        let labels: Vec<&str> = match self {
            DataProcessor::Cola
            | DataProcessor::Mrpc
            | DataProcessor::Anli
            | DataProcessor::BinaryAnli => vec!["0", "1"],
            DataProcessor::Mnli => vec!["contradiction", "entailment", "neutral"],
            DataProcessor::AnliThreeOption => vec!["0", "1", "2"],
            DataProcessor::AnliWithCsk => return (0..16).map(|idx| idx.to_string()).collect(),
        };
        labels.into_iter().map(String::from).collect()
    }

    pub fn label_vocabulary(&self) -> Result<LabelVocabulary, FinetuneError> {
        LabelVocabulary::new(&self.get_labels())
    }

    /// Name of the data file holding a split
    pub fn data_file_name(&self, split: DataSplit) -> Result<&'static str, FinetuneError> {
        let file_name = match (self, split) {
            (DataProcessor::Cola, DataSplit::Train)
            | (DataProcessor::Mnli, DataSplit::Train)
            | (DataProcessor::Mrpc, DataSplit::Train) => "train.tsv",
            (DataProcessor::Cola, DataSplit::Dev) | (DataProcessor::Mrpc, DataSplit::Dev) => {
                "dev.tsv"
            }
            (DataProcessor::Mnli, DataSplit::Dev) => "dev_matched.tsv",
            (DataProcessor::BinaryAnli, DataSplit::Train) => "train-binary.jsonl",
            (DataProcessor::BinaryAnli, DataSplit::Dev) => "valid-binary.jsonl",
            (_, DataSplit::Train) => "train.jsonl",
            (_, DataSplit::Dev) => "valid.jsonl",
            (processor, DataSplit::Test) if processor.is_multiple_choice() => "test.jsonl",
            (processor, DataSplit::Test) => {
                return Err(FinetuneError::InvalidConfigurationError(format!(
                    "no test split is available for task {}",
                    processor.task_name()
                )));
            }
        };
        Ok(file_name)
    }

    fn set_type(&self, split: DataSplit) -> &'static str {
        match (self, split) {
            (DataProcessor::Mnli, DataSplit::Dev) => "dev_matched",
            _ => split.set_type(),
        }
    }

    fn create_examples(&self, path: &Path, set_type: &str) -> Result<TaskExamples, FinetuneError> {
        let examples = match self {
            DataProcessor::Cola => TaskExamples::Pair(glue::cola_examples(&read_tsv(path)?, set_type)?),
            DataProcessor::Mnli => TaskExamples::Pair(glue::mnli_examples(&read_tsv(path)?, set_type)?),
            DataProcessor::Mrpc => TaskExamples::Pair(glue::mrpc_examples(&read_tsv(path)?, set_type)?),
            DataProcessor::Anli => {
                TaskExamples::MultipleChoice(anli::anli_examples(&read_jsonl(path)?, set_type, 2)?)
            }
            DataProcessor::AnliThreeOption => {
                TaskExamples::MultipleChoice(anli::anli_examples(&read_jsonl(path)?, set_type, 3)?)
            }
            DataProcessor::AnliWithCsk => {
                let (examples, num_options) =
                    anli::anli_with_knowledge_examples(&read_jsonl(path)?, set_type)?;
                info!("{} candidate options per example", num_options);
                TaskExamples::MultipleChoice(examples)
            }
            DataProcessor::BinaryAnli => {
                TaskExamples::Pair(anli::binary_anli_examples(&read_jsonl(path)?, set_type)?)
            }
        };
        Ok(examples)
    }

    /// Loads the examples of a split from a data directory
    pub fn get_examples<P: AsRef<Path>>(
        &self,
        split: DataSplit,
        data_dir: P,
    ) -> Result<TaskExamples, FinetuneError> {
        let path = data_dir.as_ref().join(self.data_file_name(split)?);
        info!("LOOKING AT {}", path.display());
        self.create_examples(&path, self.set_type(split))
    }

    pub fn get_train_examples<P: AsRef<Path>>(&self, data_dir: P) -> Result<TaskExamples, FinetuneError> {
        self.get_examples(DataSplit::Train, data_dir)
    }

    pub fn get_dev_examples<P: AsRef<Path>>(&self, data_dir: P) -> Result<TaskExamples, FinetuneError> {
        self.get_examples(DataSplit::Dev, data_dir)
    }

    /// Test split, only available for the multiple choice tasks
    pub fn get_test_examples<P: AsRef<Path>>(&self, data_dir: P) -> Result<TaskExamples, FinetuneError> {
        self.get_examples(DataSplit::Test, data_dir)
    }

    /// Loads examples from an arbitrary file in the task layout, with the `to-pred` set type
    pub fn get_examples_from_file<P: AsRef<Path>>(
        &self,
        input_file: P,
    ) -> Result<TaskExamples, FinetuneError> {
        self.create_examples(input_file.as_ref(), "to-pred")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn task_names_round_trip() -> anyhow::Result<()> {
        for task_name in ["cola", "mnli", "mrpc", "anli", "anli3", "anli_csk", "bin_anli"].iter() {
            let processor = DataProcessor::from_task_name(task_name)?;
            assert_eq!(processor.task_name(), *task_name);
            assert_eq!(processor.is_multiple_choice(), task_name.starts_with("anli"));
        }
        assert_eq!(DataProcessor::from_task_name("MRPC")?, DataProcessor::Mrpc);
        assert!(matches!(
            DataProcessor::from_task_name("sst2"),
            Err(FinetuneError::InvalidConfigurationError(_))
        ));
        Ok(())
    }

    #[test]
    fn labels_per_task() -> anyhow::Result<()> {
        assert_eq!(
            DataProcessor::Mnli.get_labels(),
            vec!["contradiction", "entailment", "neutral"]
        );
        assert_eq!(DataProcessor::AnliThreeOption.get_labels(), vec!["0", "1", "2"]);
        let labels = DataProcessor::AnliWithCsk.label_vocabulary()?;
        assert_eq!(labels.len(), 16);
        assert_eq!(labels.id("15")?, 15);
        Ok(())
    }

    #[test]
    fn test_split_only_for_multiple_choice() {
        assert!(matches!(
            DataProcessor::Cola.get_test_examples("/tmp"),
            Err(FinetuneError::InvalidConfigurationError(_))
        ));
        assert!(matches!(
            DataProcessor::BinaryAnli.get_test_examples("/tmp"),
            Err(FinetuneError::InvalidConfigurationError(_))
        ));
        assert_eq!(
            DataProcessor::AnliThreeOption.data_file_name(DataSplit::Test).ok(),
            Some("test.jsonl")
        );
        assert_eq!(
            DataProcessor::Mnli.data_file_name(DataSplit::Dev).ok(),
            Some("dev_matched.tsv")
        );
    }
}
