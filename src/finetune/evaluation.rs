use crate::common::error::FinetuneError;
use crate::finetune::batch::FeatureTensors;
use crate::finetune::model::ClassificationModel;
use crate::processors::{answer_right_ending, write_jsonl};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tch::{no_grad, Device, Kind, Tensor};
use tracing::info;

/// Predictions and metrics of an evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutput {
    /// Mean of the batch losses
    pub eval_loss: f64,
    /// Fraction of correctly classified examples
    pub eval_accuracy: f64,
    /// Arg-max prediction for each example, in example order
    pub predictions: Vec<i64>,
    /// Softmax over the logits of each example
    pub probabilities: Vec<Vec<f64>>,
}

/// Number of rows of `logits` whose arg-max equals the label
pub fn accuracy(logits: &Tensor, labels: &Tensor) -> i64 {
    logits
        .argmax(-1, false)
        .eq_tensor(labels)
        .sum(Kind::Int64)
        .int64_value(&[])
}

/// Runs the model over the evaluation tensors in order, without gradient tracking
pub fn evaluate<M: ClassificationModel>(
    model: &M,
    data: &FeatureTensors,
    batch_size: usize,
    device: Device,
) -> Result<EvaluationOutput, FinetuneError> {
    info!("***** Running evaluation *****");
    info!("  Num examples = {}", data.len());
    info!("  Batch size = {}", batch_size);

    let mut loss_sum = 0f64;
    let mut num_batches = 0usize;
    let mut num_correct = 0i64;
    let mut predictions = Vec::with_capacity(data.len() as usize);
    let mut probabilities = Vec::with_capacity(data.len() as usize);

    for batch in data.batches(batch_size, false) {
        let label_ids = batch.label_ids.to(device);
        let logits = no_grad(|| {
            model.forward_t(
                &batch.input_ids.to(device),
                &batch.input_mask.to(device),
                &batch.segment_ids.to(device),
                false,
            )
        })?;
        loss_sum += logits.cross_entropy_for_logits(&label_ids).double_value(&[]);
        num_correct += accuracy(&logits, &label_ids);
        num_batches += 1;

        predictions.extend(Vec::<i64>::try_from(&logits.argmax(-1, false))?);
        probabilities.extend(Vec::<Vec<f64>>::try_from(
            &logits.softmax(-1, Kind::Double),
        )?);
    }

    let num_examples = predictions.len();
    Ok(EvaluationOutput {
        eval_loss: if num_batches > 0 {
            loss_sum / num_batches as f64
        } else {
            0.0
        },
        eval_accuracy: if num_examples > 0 {
            num_correct as f64 / num_examples as f64
        } else {
            0.0
        },
        predictions,
        probabilities,
    })
}

/// # Metrics written to `eval_results.txt`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalResults {
    pub eval_loss: f64,
    pub eval_accuracy: f64,
    pub global_step: usize,
    /// Mean training loss of the last epoch, 0 without training
    pub loss: f64,
}

impl EvalResults {
    fn entries(&self) -> BTreeMap<&'static str, String> {
        let mut entries = BTreeMap::new();
        entries.insert("eval_loss", self.eval_loss.to_string());
        entries.insert("eval_accuracy", self.eval_accuracy.to_string());
        entries.insert("global_step", self.global_step.to_string());
        entries.insert("loss", self.loss.to_string());
        entries
    }

    /// Writes one `key = value` line per metric, sorted by key
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), FinetuneError> {
        let mut writer = BufWriter::new(File::create(path)?);
        info!("***** Eval results *****");
        for (key, value) in self.entries() {
            info!("  {} = {}", key, value);
            writeln!(writer, "{} = {}", key, value)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Adds `bert_prediction`, `bert_correct` and `bert_pred_probs` to each record. Records and
/// predictions are paired in order.
pub fn annotate_predictions(
    records: &mut [Value],
    predictions: &[i64],
    probabilities: &[Vec<f64>],
) -> Result<(), FinetuneError> {
    if records.len() != predictions.len() || records.len() != probabilities.len() {
        return Err(FinetuneError::ShapeError(format!(
            "{} records for {} predictions",
            records.len(),
            predictions.len()
        )));
    }
    for (index, ((record, prediction), probabilities)) in records
        .iter_mut()
        .zip(predictions.iter())
        .zip(probabilities.iter())
        .enumerate()
    {
        let answer = answer_right_ending(record, index)?;
        let record = record.as_object_mut().ok_or_else(|| {
            FinetuneError::RecordError(format!("record {} is not a JSON object", index))
        })?;
        record.insert("bert_prediction".to_string(), Value::from(*prediction));
        record.insert(
            "bert_correct".to_string(),
            Value::from(*prediction == answer - 1),
        );
        record.insert(
            "bert_pred_probs".to_string(),
            Value::from(probabilities.clone()),
        );
    }
    Ok(())
}

/// Annotates the records with their predictions and writes them as JSON lines
pub fn write_predictions<P: AsRef<Path>>(
    path: P,
    mut records: Vec<Value>,
    output: &EvaluationOutput,
) -> Result<(), FinetuneError> {
    info!("***** Eval predictions *****");
    annotate_predictions(&mut records, &output.predictions, &output.probabilities)?;
    write_jsonl(path, &records)
}
