use crate::common::error::FinetuneError;
use crate::features::FeatureEncoder;
use crate::finetune::batch::TaskFeatures;
use crate::finetune::config::FinetuneConfig;
use crate::finetune::evaluation::{evaluate, write_predictions, EvalResults};
use crate::finetune::model::{ClassificationModel, ClassifierShape};
use crate::finetune::trainer::{train, TrainingOutput};
use crate::pipelines::common::TokenEncoder;
use crate::processors::read_jsonl;
use std::fs;
use std::path::Path;
use tch::nn;
use tracing::info;

/// File name of the fine-tuned weights in the output directory
pub const MODEL_FILE_NAME: &str = "bert-finetuned.ot";
/// File name of the evaluation report in the output directory
pub const EVAL_RESULTS_FILE_NAME: &str = "eval_results.txt";

/// Outcome of a fine-tuning run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinetuneOutput {
    pub training: Option<TrainingOutput>,
    pub evaluation: Option<EvalResults>,
}

/// Creates the output directory. A non-empty directory is refused when training, as its
/// content would be overwritten.
pub fn prepare_output_dir(output_dir: &Path, do_train: bool) -> Result<(), FinetuneError> {
    if do_train && output_dir.is_dir() && fs::read_dir(output_dir)?.next().is_some() {
        return Err(FinetuneError::InvalidConfigurationError(format!(
            "Output directory ({}) already exists and is not empty.",
            output_dir.display()
        )));
    }
    fs::create_dir_all(output_dir)?;
    Ok(())
}

/// Runs the training and evaluation requested by `config`, with the tokenizer it describes.
///
/// `build_model` creates the model under the root path of the variable store that is trained,
/// saved to and restored from `output_dir/bert-finetuned.ot`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), bert_finetune::FinetuneError> {
/// use bert_finetune::finetune::{run, BagOfWordsClassifier, FinetuneConfig};
///
/// let mut config = FinetuneConfig::new("anli", "path/to/anli", "path/to/output");
/// config.do_train = true;
/// config.do_eval = true;
/// let output = run(&config, |p, shape| Ok(BagOfWordsClassifier::new(p, 30522, 128, shape)))?;
/// # Ok(())
/// # }
/// ```
pub fn run<M, F>(config: &FinetuneConfig, build_model: F) -> Result<FinetuneOutput, FinetuneError>
where
    M: ClassificationModel,
    F: FnOnce(nn::Path, ClassifierShape) -> Result<M, FinetuneError>,
{
    config.validate()?;
    let tokenizer = config.tokenizer()?;
    run_with_tokenizer(config, &tokenizer, build_model)
}

/// Same as `run`, with an already loaded tokenizer
pub fn run_with_tokenizer<T, M, F>(
    config: &FinetuneConfig,
    tokenizer: &T,
    build_model: F,
) -> Result<FinetuneOutput, FinetuneError>
where
    T: TokenEncoder + ?Sized,
    M: ClassificationModel,
    F: FnOnce(nn::Path, ClassifierShape) -> Result<M, FinetuneError>,
{
    config.validate()?;
    prepare_output_dir(&config.output_dir, config.do_train)?;

    let processor = config.processor()?;
    let labels = processor.label_vocabulary()?;
    let encoder = FeatureEncoder::new(tokenizer, &labels, config.max_seq_length)?
        .with_multi_field_truncation(config.multi_field_truncation);
    let device = config.device();
    info!("task {} on device {:?}", processor.task_name(), device);

    tch::manual_seed(config.seed);
    let mut var_store = nn::VarStore::new(device);
    let shape = ClassifierShape {
        num_labels: labels.len() as i64,
        multiple_choice: processor.is_multiple_choice(),
    };
    let model = build_model(var_store.root(), shape)?;
    let model_path = config.output_dir.join(MODEL_FILE_NAME);

    let mut training = None;
    if config.do_train {
        let examples = processor.get_train_examples(&config.data_dir)?;
        let features = TaskFeatures::from_examples(&examples, &encoder)?;
        let tensors = features.to_tensors(tch::Device::Cpu)?;
        training = Some(train(&model, &var_store, &tensors, config)?);
        var_store.save(&model_path)?;
        info!("fine-tuned weights saved to {}", model_path.display());
    }

    let mut evaluation = None;
    if config.do_eval {
        if !config.do_train {
            load_weights(&mut var_store, &model_path)?;
        }
        let prediction_input = config
            .input_file_for_pred
            .as_ref()
            .filter(|_| config.do_predict);
        let examples = match prediction_input {
            Some(input_file) => processor.get_examples_from_file(input_file)?,
            None => processor.get_dev_examples(&config.data_dir)?,
        };
        let features = TaskFeatures::from_examples(&examples, &encoder)?;
        let tensors = features.to_tensors(tch::Device::Cpu)?;
        let output = evaluate(&model, &tensors, config.eval_batch_size, device)?;

        let results = EvalResults {
            eval_loss: output.eval_loss,
            eval_accuracy: output.eval_accuracy,
            global_step: training.map_or(0, |training: TrainingOutput| training.global_step),
            loss: training.map_or(0.0, |training: TrainingOutput| training.loss),
        };
        results.write(config.output_dir.join(EVAL_RESULTS_FILE_NAME))?;

        if let Some(input_file) = prediction_input {
            write_predictions(config.prediction_file(), read_jsonl(input_file)?, &output)?;
        }
        evaluation = Some(results);
    }

    Ok(FinetuneOutput {
        training,
        evaluation,
    })
}

fn load_weights(var_store: &mut nn::VarStore, model_path: &Path) -> Result<(), FinetuneError> {
    if !model_path.is_file() {
        return Err(FinetuneError::FileNotFound(format!(
            "no fine-tuned weights at {}",
            model_path.display()
        )));
    }
    info!("***** Loading model from: {} *****", model_path.display());
    var_store.load(model_path)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn non_empty_output_dir_is_refused_for_training() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let output_dir = dir.path().join("run");
        prepare_output_dir(&output_dir, true)?;
        fs::write(output_dir.join(MODEL_FILE_NAME), b"weights")?;
        assert!(matches!(
            prepare_output_dir(&output_dir, true),
            Err(FinetuneError::InvalidConfigurationError(_))
        ));
        prepare_output_dir(&output_dir, false)?;
        Ok(())
    }
}
