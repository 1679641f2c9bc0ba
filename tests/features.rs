extern crate anyhow;

use bert_finetune::features::{
    convert_examples_to_features, FeatureEncoder, FeatureTrace, InputExample, LabelVocabulary,
    MultipleChoiceExample,
};
use bert_finetune::pipelines::common::{ModelType, TokenEncoder, TokenizerOption};
use bert_finetune::processors::{DataProcessor, TaskExamples};
use std::fs;
use std::path::Path;

const VOCAB: [&str; 22] = [
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "the", "cat", "sat", "on", "mat", ".", "he",
    "went", "out", "it", "rained", "was", "sunny", "came", "back", "wet", "tom",
];

fn bert_tokenizer(dir: &Path) -> anyhow::Result<TokenizerOption> {
    let vocab_path = dir.join("vocab.txt");
    fs::write(&vocab_path, VOCAB.join("\n") + "\n")?;
    Ok(TokenizerOption::from_file(
        ModelType::Bert,
        vocab_path,
        true,
        None,
    )?)
}

#[test]
fn bert_tokenizer_paired_example() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tokenizer = bert_tokenizer(dir.path())?;
    let labels = LabelVocabulary::new(&["0", "1"])?;

    let examples = vec![InputExample::new(
        "dev-0",
        "The cat sat",
        Some("on the mat"),
        Some("1"),
    )];
    let features = convert_examples_to_features(&examples, &labels, 10, &tokenizer)?;

    assert_eq!(features.len(), 1);
    assert_eq!(features[0].input_ids, vec![2, 5, 6, 7, 3, 8, 5, 9, 3, 0]);
    assert_eq!(features[0].input_mask, vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 0]);
    assert_eq!(features[0].segment_ids, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 0]);
    assert_eq!(features[0].label_id, 1);
    Ok(())
}

#[test]
fn anli_file_to_features() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tokenizer = bert_tokenizer(dir.path())?;
    fs::write(
        dir.path().join("valid.jsonl"),
        r#"{"InputStoryid": "s1", "ending": "e1", "InputSentence1": "Tom went out.", "InputSentence5": "He came back wet.", "RandomMiddleSentenceQuiz1": "It rained.", "RandomMiddleSentenceQuiz2": "It was sunny.", "AnswerRightEnding": 2}
"#,
    )?;

    let processor = DataProcessor::from_task_name("anli")?;
    let labels = processor.label_vocabulary()?;
    let examples = match processor.get_dev_examples(dir.path())? {
        TaskExamples::MultipleChoice(examples) => examples,
        TaskExamples::Pair(_) => panic!("anli produces multiple choice examples"),
    };
    assert_eq!(examples[0].guid(), "dev-s1-e1");

    let mut traces: Vec<FeatureTrace> = vec![];
    let encoder = FeatureEncoder::new(&tokenizer, &labels, 16)?;
    let features = encoder.convert_multiple_choice_examples_to_features(&examples, &mut traces)?;

    let feature = &features[0];
    assert_eq!(feature.label_id, 1);
    assert_eq!(
        feature.input_ids[0],
        vec![2, 21, 12, 13, 10, 14, 15, 10, 3, 11, 18, 19, 20, 10, 3, 0]
    );
    assert_eq!(
        feature.segment_ids[0],
        vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 0]
    );
    assert_eq!(
        feature.input_ids[1],
        vec![2, 21, 12, 13, 10, 14, 16, 17, 10, 3, 11, 18, 19, 20, 10, 3]
    );
    assert_eq!(feature.input_mask[1], vec![1; 16]);

    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].options.len(), 2);
    assert_eq!(traces[0].options[0].tokens[1], "tom");
    assert_eq!(traces[0].label, "1");
    Ok(())
}

#[test]
fn mrpc_file_to_features() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tokenizer = bert_tokenizer(dir.path())?;
    fs::write(
        dir.path().join("train.tsv"),
        "Quality\t#1 ID\t#2 ID\t#1 String\t#2 String\n\
         1\t1\t2\tThe cat sat.\tThe cat sat on the mat.\n\
         0\t3\t4\tIt rained.\tIt was sunny.\n",
    )?;

    let processor = DataProcessor::from_task_name("mrpc")?;
    let labels = processor.label_vocabulary()?;
    let examples = match processor.get_train_examples(dir.path())? {
        TaskExamples::Pair(examples) => examples,
        TaskExamples::MultipleChoice(_) => panic!("mrpc produces pair examples"),
    };
    assert_eq!(examples.len(), 2);
    assert_eq!(examples[0].guid, "train-1");

    let features = convert_examples_to_features(&examples, &labels, 8, &tokenizer)?;
    assert_eq!(features[0].label_id, 1);
    assert_eq!(features[1].label_id, 0);
    // 4 + 7 tokens, longest-first down to 3 + 2
    assert_eq!(features[0].input_ids, vec![2, 5, 6, 7, 3, 5, 6, 3]);
    assert_eq!(features[0].segment_ids, vec![0, 0, 0, 0, 0, 1, 1, 1]);
    Ok(())
}

#[test]
fn encoded_sequences_have_fixed_length_and_prefix_mask() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tokenizer = bert_tokenizer(dir.path())?;
    let labels = LabelVocabulary::from_range(3);
    let words = &VOCAB[5..];

    for max_seq_length in [3usize, 5, 8, 13, 32].iter() {
        let encoder = FeatureEncoder::new(&tokenizer, &labels, *max_seq_length)?;
        for length_a in 0..12 {
            for length_b in 0..6 {
                let text_a = words[..length_a].join(" ");
                let text_b = words[words.len() - length_b..].join(" ");
                let example = InputExample::new("x", text_a, Some(text_b), Some("2"));
                let features = encoder.encode(&example)?;
                assert_eq!(features.input_ids.len(), *max_seq_length);
                assert_eq!(features.input_mask.len(), *max_seq_length);
                assert_eq!(features.segment_ids.len(), *max_seq_length);

                let num_tokens = features.input_mask.iter().filter(|m| **m == 1).count();
                assert!(features.input_mask[..num_tokens].iter().all(|m| *m == 1));
                assert!(features.input_ids[num_tokens..].iter().all(|id| *id == 0));
                assert!(features.segment_ids[num_tokens..].iter().all(|id| *id == 0));
                assert_eq!(features.input_ids[0], 2);
                assert_eq!(features.input_ids[num_tokens - 1], 3);
            }
        }
    }
    Ok(())
}

#[test]
fn multiple_choice_shape_with_sixteen_options() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tokenizer = bert_tokenizer(dir.path())?;
    let labels = DataProcessor::AnliWithCsk.label_vocabulary()?;

    let text_a: Vec<String> = (0..16).map(|idx| "tom went out . ".repeat(idx % 4 + 1)).collect();
    let text_b: Vec<String> = (0..16).map(|_| "he came back wet .".to_string()).collect();
    let example =
        MultipleChoiceExample::new("train-0", text_a, text_b, None, None, Some("15".to_string()))?;

    let encoder = FeatureEncoder::new(&tokenizer, &labels, 12)?;
    let features = encoder.encode_multiple_choice(&example)?;
    assert_eq!(features.num_options(), 16);
    assert_eq!(features.label_id, 15);
    for option in 0..16 {
        assert_eq!(features.input_ids[option].len(), 12);
        assert_eq!(features.segment_ids[option].len(), 12);
    }
    assert_eq!(tokenizer.sep_token(), "[SEP]");
    Ok(())
}
