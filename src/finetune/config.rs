use crate::common::error::FinetuneError;
use crate::features::MultiFieldTruncation;
use crate::pipelines::common::{ModelType, TokenizerOption};
use crate::processors::DataProcessor;
use crate::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tch::Device;

#[cfg(feature = "remote")]
use crate::{pipelines::common::BertVocabResources, resources::RemoteResource};

fn default_true() -> bool {
    true
}

fn default_max_seq_length() -> usize {
    128
}

fn default_train_batch_size() -> usize {
    32
}

fn default_eval_batch_size() -> usize {
    8
}

fn default_learning_rate() -> f64 {
    5e-5
}

fn default_num_train_epochs() -> f64 {
    3.0
}

fn default_warmup_proportion() -> f64 {
    0.1
}

fn default_weight_decay() -> f64 {
    0.01
}

fn default_seed() -> i64 {
    42
}

fn default_gradient_accumulation_steps() -> usize {
    1
}

/// # Configuration of a fine-tuning run
///
/// Only `data_dir`, `task_name` and `output_dir` are required when deserializing, the other
/// settings fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinetuneConfig {
    /// Directory holding the dataset files of the task
    pub data_dir: PathBuf,
    /// Task name (`cola`, `mnli`, `mrpc`, `anli`, `anli3`, `anli_csk` or `bin_anli`)
    pub task_name: String,
    /// Directory receiving the fine-tuned weights and the evaluation report
    pub output_dir: PathBuf,
    /// Tokenizer family
    #[serde(default)]
    pub model_type: ModelType,
    /// Local vocabulary file. The pretrained BERT vocabulary is downloaded if not set.
    #[serde(default)]
    pub vocab_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub lower_case: bool,
    #[serde(default)]
    pub strip_accents: Option<bool>,
    /// Length of every encoded sequence after tokenization, markers and padding included
    #[serde(default = "default_max_seq_length")]
    pub max_seq_length: usize,
    #[serde(default)]
    pub multi_field_truncation: MultiFieldTruncation,
    #[serde(default)]
    pub do_train: bool,
    #[serde(default)]
    pub do_eval: bool,
    /// Evaluate on `input_file_for_pred` and export the annotated records
    #[serde(default)]
    pub do_predict: bool,
    #[serde(default)]
    pub input_file_for_pred: Option<PathBuf>,
    /// Defaults to `predictions.jsonl` in the output directory
    #[serde(default)]
    pub output_file_for_pred: Option<PathBuf>,
    /// Effective training batch size, split over the gradient accumulation steps
    #[serde(default = "default_train_batch_size")]
    pub train_batch_size: usize,
    #[serde(default = "default_eval_batch_size")]
    pub eval_batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_num_train_epochs")]
    pub num_train_epochs: f64,
    /// Fraction of the training steps with a linearly increasing learning rate
    #[serde(default = "default_warmup_proportion")]
    pub warmup_proportion: f64,
    #[serde(default = "default_weight_decay")]
    pub weight_decay: f64,
    #[serde(default)]
    pub no_cuda: bool,
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default = "default_gradient_accumulation_steps")]
    pub gradient_accumulation_steps: usize,
}

impl Config for FinetuneConfig {}

impl FinetuneConfig {
    /// Creates a configuration with default settings for a task
    pub fn new<D, O>(task_name: &str, data_dir: D, output_dir: O) -> FinetuneConfig
    where
        D: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        FinetuneConfig {
            data_dir: data_dir.into(),
            task_name: task_name.to_string(),
            output_dir: output_dir.into(),
            model_type: ModelType::default(),
            vocab_path: None,
            lower_case: true,
            strip_accents: None,
            max_seq_length: default_max_seq_length(),
            multi_field_truncation: MultiFieldTruncation::default(),
            do_train: false,
            do_eval: false,
            do_predict: false,
            input_file_for_pred: None,
            output_file_for_pred: None,
            train_batch_size: default_train_batch_size(),
            eval_batch_size: default_eval_batch_size(),
            learning_rate: default_learning_rate(),
            num_train_epochs: default_num_train_epochs(),
            warmup_proportion: default_warmup_proportion(),
            weight_decay: default_weight_decay(),
            no_cuda: false,
            seed: default_seed(),
            gradient_accumulation_steps: default_gradient_accumulation_steps(),
        }
    }

    /// Checks the settings for consistency before any data is loaded
    pub fn validate(&self) -> Result<(), FinetuneError> {
        if self.gradient_accumulation_steps < 1 {
            return Err(FinetuneError::InvalidConfigurationError(format!(
                "Invalid gradient_accumulation_steps parameter: {}, should be >= 1",
                self.gradient_accumulation_steps
            )));
        }
        if !self.do_train && !self.do_eval {
            return Err(FinetuneError::InvalidConfigurationError(
                "At least one of `do_train` or `do_eval` must be True.".to_string(),
            ));
        }
        if self.max_seq_length < 3 {
            return Err(FinetuneError::InvalidConfigurationError(format!(
                "max_seq_length must be at least 3, got {}",
                self.max_seq_length
            )));
        }
        if self.train_batch_size == 0 || self.eval_batch_size == 0 {
            return Err(FinetuneError::InvalidConfigurationError(
                "batch sizes must be positive".to_string(),
            ));
        }
        if self.do_predict && self.input_file_for_pred.is_none() {
            return Err(FinetuneError::InvalidConfigurationError(
                "`do_predict` requires `input_file_for_pred`".to_string(),
            ));
        }
        self.processor()?;
        Ok(())
    }

    pub fn processor(&self) -> Result<DataProcessor, FinetuneError> {
        DataProcessor::from_task_name(&self.task_name)
    }

    pub fn device(&self) -> Device {
        if self.no_cuda {
            Device::Cpu
        } else {
            Device::cuda_if_available()
        }
    }

    /// Per-step batch size once the effective batch is split over accumulation steps
    pub fn step_batch_size(&self) -> usize {
        (self.train_batch_size / self.gradient_accumulation_steps.max(1)).max(1)
    }

    pub fn prediction_file(&self) -> PathBuf {
        self.output_file_for_pred
            .clone()
            .unwrap_or_else(|| self.output_dir.join("predictions.jsonl"))
    }

    /// Loads the tokenizer from `vocab_path`, or from the pretrained BERT vocabulary
    pub fn tokenizer(&self) -> Result<TokenizerOption, FinetuneError> {
        match &self.vocab_path {
            Some(vocab_path) => TokenizerOption::from_file(
                self.model_type,
                vocab_path,
                self.lower_case,
                self.strip_accents,
            ),
            None => self.pretrained_tokenizer(),
        }
    }

    #[cfg(feature = "remote")]
    fn pretrained_tokenizer(&self) -> Result<TokenizerOption, FinetuneError> {
        let vocab_resource = RemoteResource::from_pretrained(BertVocabResources::BERT);
        TokenizerOption::from_resource(
            self.model_type,
            &vocab_resource,
            self.lower_case,
            self.strip_accents,
        )
    }

    #[cfg(not(feature = "remote"))]
    fn pretrained_tokenizer(&self) -> Result<TokenizerOption, FinetuneError> {
        Err(FinetuneError::InvalidConfigurationError(
            "`vocab_path` is required when the `remote` feature is disabled".to_string(),
        ))
    }
}
