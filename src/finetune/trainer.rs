use crate::common::error::FinetuneError;
use crate::finetune::batch::FeatureTensors;
use crate::finetune::config::FinetuneConfig;
use crate::finetune::model::ClassificationModel;
use tch::nn::{self, OptimizerConfig};
use tracing::{debug, info};

/// # Linear warmup followed by linear decay
///
/// The multiplier grows linearly from 0 to 1 over the first `warmup_proportion` of the
/// training steps, then decreases linearly to reach 0 at the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmupLinearSchedule {
    pub learning_rate: f64,
    pub warmup_proportion: f64,
    pub total_steps: usize,
}

impl WarmupLinearSchedule {
    pub fn learning_rate_at(&self, step: usize) -> f64 {
        if self.total_steps == 0 {
            return self.learning_rate;
        }
        let progress = step as f64 / self.total_steps as f64;
        let multiplier = if progress < self.warmup_proportion {
            progress / self.warmup_proportion
        } else {
            1.0 - progress
        };
        self.learning_rate * multiplier.max(0.0)
    }
}

/// Number of optimizer updates of a training run
pub fn num_train_steps(num_examples: usize, config: &FinetuneConfig) -> usize {
    (num_examples as f64
        / config.step_batch_size() as f64
        / config.gradient_accumulation_steps as f64
        * config.num_train_epochs) as usize
}

/// Summary of a training run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOutput {
    /// Number of optimizer updates performed
    pub global_step: usize,
    /// Mean (accumulation-scaled) batch loss over the last epoch
    pub loss: f64,
}

/// Fine-tunes the variables of `var_store` on the training tensors.
///
/// Each epoch visits the examples in a fresh random order drawn from the `tch` generator (seeded
/// with `config.seed`). Gradients are accumulated over `gradient_accumulation_steps` batches before
/// an AdamW update, the learning rate following a `WarmupLinearSchedule`. Gradients are only
/// cleared by an update: the batches left over at the end of an epoch are carried into the first
/// update of the next one.
pub fn train<M: ClassificationModel>(
    model: &M,
    var_store: &nn::VarStore,
    data: &FeatureTensors,
    config: &FinetuneConfig,
) -> Result<TrainingOutput, FinetuneError> {
    let device = var_store.device();
    let batch_size = config.step_batch_size();
    let accumulation_steps = config.gradient_accumulation_steps.max(1);
    let schedule = WarmupLinearSchedule {
        learning_rate: config.learning_rate,
        warmup_proportion: config.warmup_proportion,
        total_steps: num_train_steps(data.len() as usize, config),
    };

    info!("***** Running training *****");
    info!("  Num examples = {}", data.len());
    info!("  Batch size = {}", batch_size);
    info!("  Num steps = {}", schedule.total_steps);

    let mut optimizer = nn::AdamW {
        wd: config.weight_decay,
        ..Default::default()
    }
    .build(var_store, schedule.learning_rate_at(0))?;

    tch::manual_seed(config.seed);
    let mut global_step = 0;
    let mut epoch_loss = 0f64;
    let mut epoch_steps = 0usize;
    optimizer.zero_grad();
    for epoch in 0..config.num_train_epochs as usize {
        epoch_loss = 0.0;
        epoch_steps = 0;
        for (step, batch) in data.batches(batch_size, true).iter().enumerate() {
            let logits = model.forward_t(
                &batch.input_ids.to(device),
                &batch.input_mask.to(device),
                &batch.segment_ids.to(device),
                true,
            )?;
            let mut loss = logits.cross_entropy_for_logits(&batch.label_ids.to(device));
            if accumulation_steps > 1 {
                loss = loss / accumulation_steps as f64;
            }
            loss.backward();
            epoch_loss += loss.double_value(&[]);
            epoch_steps += 1;

            if (step + 1) % accumulation_steps == 0 {
                optimizer.set_lr(schedule.learning_rate_at(global_step));
                optimizer.step();
                optimizer.zero_grad();
                global_step += 1;
            }
            debug!(
                "epoch {} step {}: training loss {}",
                epoch,
                step,
                epoch_loss / epoch_steps as f64
            );
        }
        info!(
            "epoch {} done, mean training loss {}",
            epoch,
            epoch_loss / epoch_steps.max(1) as f64
        );
    }

    Ok(TrainingOutput {
        global_step,
        loss: epoch_loss / epoch_steps.max(1) as f64,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::features::InputFeatures;
    use tch::{Device, Kind, Tensor};

    struct LinearOverIds {
        linear: nn::Linear,
    }

    impl ClassificationModel for LinearOverIds {
        fn forward_t(
            &self,
            input_ids: &Tensor,
            _input_mask: &Tensor,
            _segment_ids: &Tensor,
            _train: bool,
        ) -> Result<Tensor, FinetuneError> {
            Ok(input_ids.to_kind(Kind::Float).apply(&self.linear))
        }
    }

    // One batch per epoch never completes an accumulation of 2, leaving only pending gradients
    fn pending_gradients(num_train_epochs: f64) -> anyhow::Result<Tensor> {
        tch::manual_seed(0);
        let var_store = nn::VarStore::new(Device::Cpu);
        let model = LinearOverIds {
            linear: nn::linear(var_store.root() / "classifier", 3, 2, Default::default()),
        };
        let features = vec![
            InputFeatures {
                input_ids: vec![2, 5, 3],
                input_mask: vec![1, 1, 1],
                segment_ids: vec![0, 0, 0],
                label_id: 1,
            },
            InputFeatures {
                input_ids: vec![2, 7, 3],
                input_mask: vec![1, 1, 1],
                segment_ids: vec![0, 0, 0],
                label_id: 0,
            },
        ];
        let data = FeatureTensors::from_features(&features, Device::Cpu)?;

        let mut config = FinetuneConfig::new("mrpc", "data", "out");
        config.train_batch_size = 4;
        config.gradient_accumulation_steps = 2;
        config.num_train_epochs = num_train_epochs;
        let output = train(&model, &var_store, &data, &config)?;
        assert_eq!(output.global_step, 0);
        Ok(model.linear.ws.grad())
    }

    #[test]
    fn partial_accumulation_carries_over_epochs() -> anyhow::Result<()> {
        let one_epoch = pending_gradients(1.0)?;
        let two_epochs = pending_gradients(2.0)?;
        assert!(one_epoch.abs().sum(Kind::Double).double_value(&[]) > 0.0);
        assert!(two_epochs.allclose(&(&one_epoch * 2.0), 1e-5, 1e-6, false));
        Ok(())
    }

    #[test]
    fn warmup_then_linear_decay() {
        let schedule = WarmupLinearSchedule {
            learning_rate: 1.0,
            warmup_proportion: 0.1,
            total_steps: 100,
        };
        assert_eq!(schedule.learning_rate_at(0), 0.0);
        assert!((schedule.learning_rate_at(5) - 0.5).abs() < 1e-9);
        assert!((schedule.learning_rate_at(10) - 0.9).abs() < 1e-9);
        assert!((schedule.learning_rate_at(50) - 0.5).abs() < 1e-9);
        assert_eq!(schedule.learning_rate_at(100), 0.0);
        assert_eq!(schedule.learning_rate_at(120), 0.0);
    }

    #[test]
    fn train_steps_follow_batching() {
        let mut config = FinetuneConfig::new("anli", "data", "out");
        config.train_batch_size = 8;
        config.num_train_epochs = 3.0;
        assert_eq!(num_train_steps(100, &config), 37);
        config.gradient_accumulation_steps = 2;
        assert_eq!(num_train_steps(100, &config), 37);
        config.num_train_epochs = 4.0;
        assert_eq!(num_train_steps(100, &config), 50);
    }
}
