//! # GLUE tab separated layouts (CoLA, MNLI, MRPC)

use crate::common::error::FinetuneError;
use crate::features::InputExample;

fn cell<'a>(row: &'a [String], column: usize, row_index: usize) -> Result<&'a str, FinetuneError> {
    row.get(column).map(String::as_str).ok_or_else(|| {
        FinetuneError::RecordError(format!(
            "row {} has {} columns, column {} is required",
            row_index,
            row.len(),
            column
        ))
    })
}

/// CoLA: no header, sentence in column 3, acceptability label in column 1
pub(crate) fn cola_examples(
    rows: &[Vec<String>],
    set_type: &str,
) -> Result<Vec<InputExample>, FinetuneError> {
    rows.iter()
        .enumerate()
        .map(|(row_index, row)| {
            Ok(InputExample::new(
                format!("{}-{}", set_type, row_index),
                cell(row, 3, row_index)?,
                None::<String>,
                Some(cell(row, 1, row_index)?),
            ))
        })
        .collect()
}

/// MNLI: header row, pair id in column 0, premise and hypothesis in columns 8 and 9,
/// gold label in the last column
pub(crate) fn mnli_examples(
    rows: &[Vec<String>],
    set_type: &str,
) -> Result<Vec<InputExample>, FinetuneError> {
    rows.iter()
        .enumerate()
        .skip(1)
        .map(|(row_index, row)| {
            let label = row.last().ok_or_else(|| {
                FinetuneError::RecordError(format!("row {} is empty", row_index))
            })?;
            Ok(InputExample::new(
                format!("{}-{}", set_type, cell(row, 0, row_index)?),
                cell(row, 8, row_index)?,
                Some(cell(row, 9, row_index)?),
                Some(label.as_str()),
            ))
        })
        .collect()
}

/// MRPC: header row, paraphrase label in column 0, sentences in columns 3 and 4
pub(crate) fn mrpc_examples(
    rows: &[Vec<String>],
    set_type: &str,
) -> Result<Vec<InputExample>, FinetuneError> {
    rows.iter()
        .enumerate()
        .skip(1)
        .map(|(row_index, row)| {
            Ok(InputExample::new(
                format!("{}-{}", set_type, row_index),
                cell(row, 3, row_index)?,
                Some(cell(row, 4, row_index)?),
                Some(cell(row, 0, row_index)?),
            ))
        })
        .collect()
}
