//! # Fine-tuning driver
//!
//! Batches encoded features into `tch` tensors, trains any model implementing
//! `ClassificationModel` with AdamW and a linear warmup schedule, evaluates it and exports
//! annotated predictions.
//!
//! ```no_run
//! # fn main() -> Result<(), bert_finetune::FinetuneError> {
//! use bert_finetune::finetune::{run, BagOfWordsClassifier, FinetuneConfig};
//! use bert_finetune::Config;
//!
//! let config = FinetuneConfig::from_file("path/to/finetune_config.json")?;
//! let output = run(&config, |p, shape| {
//!     Ok(BagOfWordsClassifier::new(p, 30522, 128, shape))
//! })?;
//! if let Some(evaluation) = output.evaluation {
//!     println!("accuracy: {}", evaluation.eval_accuracy);
//! }
//! # Ok(())
//! # }
//! ```

mod batch;
mod config;
mod evaluation;
pub mod grid_search;
mod model;
mod runner;
mod trainer;

pub use batch::{FeatureTensors, TaskFeatures};
pub use config::FinetuneConfig;
pub use evaluation::{
    accuracy, annotate_predictions, evaluate, write_predictions, EvalResults, EvaluationOutput,
};
pub use grid_search::{grid_search_runs, run_grid_search, GridSearchRun};
pub use model::{BagOfWordsClassifier, ClassificationModel, ClassifierShape};
pub use runner::{
    prepare_output_dir, run, run_with_tokenizer, FinetuneOutput, EVAL_RESULTS_FILE_NAME,
    MODEL_FILE_NAME,
};
pub use trainer::{num_train_steps, train, TrainingOutput, WarmupLinearSchedule};
