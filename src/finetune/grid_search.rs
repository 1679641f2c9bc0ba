//! # Hyper-parameter grid over batch size, learning rate and number of epochs
//!
//! Every run trains and evaluates a fresh model in its own output directory and exports its
//! development set predictions to `{predictions_dir}/{run_name}valid.out.jsonl`.

use crate::common::error::FinetuneError;
use crate::finetune::config::FinetuneConfig;
use crate::finetune::evaluation::EvalResults;
use crate::finetune::model::{ClassificationModel, ClassifierShape};
use crate::finetune::runner::run_with_tokenizer;
use crate::pipelines::common::TokenEncoder;
use crate::processors::DataSplit;
use std::fs;
use std::path::Path;
use tch::nn;
use tracing::info;

pub const BATCH_SIZES: [usize; 2] = [8, 16];
pub const LEARNING_RATES: [f64; 3] = [2e-5, 3e-5, 5e-5];
pub const NUM_EPOCHS: [usize; 2] = [3, 4];

/// One point of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchRun {
    /// `batch_{batch size}_lr_{learning rate}_epochs_{epochs}`
    pub name: String,
    pub config: FinetuneConfig,
}

/// Shortest round-trip decimal form of a float, switching to an exponent with a sign and at
/// least two digits outside of `[1e-4, 1e16)` (`2e-05`, `0.001`, `1.0`, `1e+20`).
pub fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if !value.is_finite() || value == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let text = value.to_string();
        return if !value.is_finite() || text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        };
    }
    let text = format!("{:e}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

pub fn run_name(batch_size: usize, learning_rate: f64, num_epochs: usize) -> String {
    format!(
        "batch_{}_lr_{}_epochs_{}",
        batch_size,
        format_float(learning_rate),
        num_epochs
    )
}

/// Derives the configuration of every grid point from `base`.
///
/// Each run trains and evaluates with its own output directory under `models_base_dir`, and
/// predicts on the development file of the task.
pub fn grid_search_runs(
    base: &FinetuneConfig,
    models_base_dir: &Path,
    predictions_dir: &Path,
) -> Result<Vec<GridSearchRun>, FinetuneError> {
    let processor = base.processor()?;
    let dev_file = base.data_dir.join(processor.data_file_name(DataSplit::Dev)?);

    let mut runs = Vec::with_capacity(BATCH_SIZES.len() * LEARNING_RATES.len() * NUM_EPOCHS.len());
    for batch_size in BATCH_SIZES.iter() {
        for learning_rate in LEARNING_RATES.iter() {
            for num_epochs in NUM_EPOCHS.iter() {
                let name = run_name(*batch_size, *learning_rate, *num_epochs);
                let mut config = base.clone();
                config.do_train = true;
                config.do_eval = true;
                config.do_predict = true;
                config.train_batch_size = *batch_size;
                config.learning_rate = *learning_rate;
                config.num_train_epochs = *num_epochs as f64;
                config.output_dir = models_base_dir.join(&name);
                config.input_file_for_pred = Some(dev_file.clone());
                config.output_file_for_pred =
                    Some(predictions_dir.join(format!("{}valid.out.jsonl", name)));
                runs.push(GridSearchRun { name, config });
            }
        }
    }
    Ok(runs)
}

/// Runs every grid point in turn and returns the evaluation results of each run
pub fn run_grid_search<T, M, F>(
    runs: &[GridSearchRun],
    tokenizer: &T,
    mut build_model: F,
) -> Result<Vec<(String, EvalResults)>, FinetuneError>
where
    T: TokenEncoder + ?Sized,
    M: ClassificationModel,
    F: FnMut(nn::Path, ClassifierShape) -> Result<M, FinetuneError>,
{
    let mut results = Vec::with_capacity(runs.len());
    for run in runs {
        info!("====Grid search run {}====", run.name);
        if let Some(predictions_file) = &run.config.output_file_for_pred {
            if let Some(predictions_dir) = predictions_file.parent() {
                fs::create_dir_all(predictions_dir)?;
            }
        }
        let output = run_with_tokenizer(&run.config, tokenizer, &mut build_model)?;
        if let Some(evaluation) = output.evaluation {
            results.push((run.name.clone(), evaluation));
        }
    }
    Ok(results)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grid_covers_all_combinations() -> anyhow::Result<()> {
        let base = FinetuneConfig::new("anli", "data/anli", "unused");
        let runs = grid_search_runs(&base, Path::new("models"), Path::new("predictions"))?;
        assert_eq!(runs.len(), 12);

        let first = &runs[0];
        assert_eq!(first.name, "batch_8_lr_2e-05_epochs_3");
        assert_eq!(first.config.output_dir, Path::new("models/batch_8_lr_2e-05_epochs_3"));
        assert_eq!(
            first.config.output_file_for_pred.as_deref(),
            Some(Path::new("predictions/batch_8_lr_2e-05_epochs_3valid.out.jsonl"))
        );
        assert_eq!(
            first.config.input_file_for_pred.as_deref(),
            Some(Path::new("data/anli/valid.jsonl"))
        );
        assert!(first.config.do_train && first.config.do_eval);

        let last = &runs[11];
        assert_eq!(last.name, "batch_16_lr_5e-05_epochs_4");
        assert_eq!(last.config.train_batch_size, 16);
        assert_eq!(last.config.num_train_epochs, 4.0);
        assert_eq!(runs[2].name, "batch_8_lr_3e-05_epochs_3");
        Ok(())
    }

    #[test]
    fn float_formatting_of_run_names() {
        assert_eq!(format_float(2e-5), "2e-05");
        assert_eq!(format_float(5e-5), "5e-05");
        assert_eq!(format_float(2.5e-7), "2.5e-07");
        assert_eq!(format_float(1e-4), "0.0001");
        assert_eq!(format_float(0.001), "0.001");
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(-3e-123), "-3e-123");
        assert_eq!(run_name(16, 3e-5, 4), "batch_16_lr_3e-05_epochs_4");
    }
}
