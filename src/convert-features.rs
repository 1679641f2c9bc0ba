// Copyright 2019-present Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bert_finetune::features::FeatureEncoder;
use bert_finetune::finetune::TaskFeatures;
use bert_finetune::pipelines::common::{ModelType, TokenizerOption};
use bert_finetune::processors::{DataProcessor, DataSplit};
use bert_finetune::FinetuneError;
use tracing::info;

fn split_from_name(name: &str) -> Result<DataSplit, FinetuneError> {
    match name {
        "train" => Ok(DataSplit::Train),
        "dev" => Ok(DataSplit::Dev),
        "test" => Ok(DataSplit::Test),
        _ => Err(FinetuneError::InvalidConfigurationError(format!(
            "unknown split {}, expected train, dev or test",
            name
        ))),
    }
}

pub fn main() -> Result<(), FinetuneError> {
    tracing_subscriber::fmt::init();

    let args: Vec<_> = std::env::args().collect();
    if args.len() < 4 || args.len() > 6 {
        return Err(FinetuneError::InvalidConfigurationError(format!(
            "usage: {} task_name data_dir vocab.txt [max_seq_length] [train|dev|test]",
            args[0].as_str()
        )));
    }

    let processor = DataProcessor::from_task_name(&args[1])?;
    let data_dir = &args[2];
    let vocab_path = &args[3];
    let max_seq_length = match args.get(4) {
        Some(value) => value.parse::<usize>().map_err(|_| {
            FinetuneError::InvalidConfigurationError(format!(
                "max_seq_length must be a positive integer, got {}",
                value
            ))
        })?,
        None => 128,
    };
    let split = split_from_name(args.get(5).map_or("train", String::as_str))?;

    let tokenizer = TokenizerOption::from_file(ModelType::Bert, vocab_path, true, None)?;
    let labels = processor.label_vocabulary()?;
    let encoder = FeatureEncoder::new(&tokenizer, &labels, max_seq_length)?;

    let examples = processor.get_examples(split, data_dir)?;
    if let Some(option_labels) = examples.option_vocabulary() {
        info!("{} options per example", option_labels.len());
    }
    let features = TaskFeatures::from_examples(&examples, &encoder)?;
    info!(
        "{}: encoded {} examples into {} features",
        processor.task_name(),
        examples.len(),
        features.len()
    );
    println!("OK");
    Ok(())
}
