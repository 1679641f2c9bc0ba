//! # Human-readable traces of encoded examples
//!
//! The encoders hand a `FeatureTrace` for each of the first few examples they convert to a
//! `TraceRecorder` supplied by the caller. Traces are a debugging aid and are not part of
//! the encoded features.

use std::fmt::Display;
use tracing::info;

/// Number of leading examples traced by default
pub const DEFAULT_TRACE_LIMIT: usize = 5;

/// Encoded view of one option slot (paired examples have a single one)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionTrace {
    /// Tokens including the start and separator markers, without padding
    pub tokens: Vec<String>,
    pub input_ids: Vec<i64>,
    pub input_mask: Vec<i64>,
    pub segment_ids: Vec<i64>,
}

/// Encoded view of one example
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTrace {
    /// Position of the example in the converted sequence
    pub example_index: usize,
    pub guid: String,
    pub options: Vec<OptionTrace>,
    pub label: String,
    pub label_id: i64,
}

/// # Sink for the traces of the first converted examples
pub trait TraceRecorder {
    fn record(&mut self, trace: FeatureTrace);
}

/// Discards all traces
impl TraceRecorder for () {
    fn record(&mut self, _trace: FeatureTrace) {}
}

/// Collects traces in memory
impl TraceRecorder for Vec<FeatureTrace> {
    fn record(&mut self, trace: FeatureTrace) {
        self.push(trace);
    }
}

impl<R: TraceRecorder + ?Sized> TraceRecorder for &mut R {
    fn record(&mut self, trace: FeatureTrace) {
        R::record(self, trace)
    }
}

/// Emits each trace as `tracing` events at the `INFO` level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRecorder;

fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

impl TraceRecorder for LoggingRecorder {
    fn record(&mut self, trace: FeatureTrace) {
        info!("*** Example {} ***", trace.example_index);
        info!("guid: {}", trace.guid);
        let multiple_options = trace.options.len() > 1;
        for (option_index, option) in trace.options.iter().enumerate() {
            if multiple_options {
                info!("Option {}", option_index);
            }
            info!("tokens: {}", join(&option.tokens));
            info!("input_ids: {}", join(&option.input_ids));
            info!("input_mask: {}", join(&option.input_mask));
            info!("segment_ids: {}", join(&option.segment_ids));
        }
        info!("label: {} (id = {})", trace.label, trace.label_id);
    }
}
