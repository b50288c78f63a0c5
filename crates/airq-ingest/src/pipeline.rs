//! Backpressured batching of decoded records.
//!
//! The pipeline pulls records one at a time, fills a batch of fixed capacity
//! and awaits the consumer before pulling again. At most one batch is in
//! flight and at most one batch is being accumulated, so memory stays
//! bounded by the capacity regardless of input size.
//!
//! # States
//!
//! ```text
//! Idle -> Streaming -> Draining -> Completed
//!                   -> Flushed  -> Completed
//!      (any stage)  -> Failed
//! ```
//!
//! `Draining` is entered when input ends with a partial batch still to
//! deliver, `Flushed` when it ends with nothing buffered.

use std::fmt;
use std::future::Future;

use tracing::{debug, info, warn};

use airq_model::{Batch, Record};

use crate::error::{IngestError, Result};

/// Receives batches from the pipeline, one call at a time.
///
/// A returned error ends the run and is handed back to the caller as-is.
/// Implemented for any `FnMut(Batch) -> impl Future<Output = Result<(), E>>`.
pub trait BatchConsumer {
    type Error;

    fn consume(
        &mut self,
        batch: Batch,
    ) -> impl Future<Output = std::result::Result<(), Self::Error>>;
}

impl<F, Fut, E> BatchConsumer for F
where
    F: FnMut(Batch) -> Fut,
    Fut: Future<Output = std::result::Result<(), E>>,
{
    type Error = E;

    fn consume(&mut self, batch: Batch) -> impl Future<Output = std::result::Result<(), E>> {
        self(batch)
    }
}

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Created, not yet pulling.
    Idle,
    /// Pulling records and delivering full batches.
    Streaming,
    /// Input ended; delivering the final partial batch.
    Draining,
    /// Input ended with nothing left to deliver.
    Flushed,
    /// Every batch was accepted.
    Completed,
    /// The decoder or the consumer failed.
    Failed,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Streaming => "streaming",
            PipelineState::Draining => "draining",
            PipelineState::Flushed => "flushed",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives one run from a record source into a [`BatchConsumer`].
///
/// A pipeline runs once. The accumulator lives inside [`run`](Self::run),
/// so independent pipelines never share buffered records.
#[derive(Debug)]
pub struct BatchingPipeline {
    capacity: usize,
    state: PipelineState,
}

impl BatchingPipeline {
    /// Creates an idle pipeline. A zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(IngestError::InvalidOptions {
                reason: "batch capacity must be at least 1".to_string(),
            });
        }
        Ok(Self {
            capacity,
            state: PipelineState::Idle,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Pulls every record from `records` and delivers them in batches.
    ///
    /// Returns the first error: a decoder error converted into the
    /// consumer's error type, or the consumer's own error unchanged. No
    /// record is pulled and no batch is delivered after a failure. Batches
    /// accepted before the failure stay accepted.
    pub async fn run<I, C>(
        &mut self,
        records: I,
        consumer: &mut C,
    ) -> std::result::Result<(), C::Error>
    where
        I: IntoIterator<Item = Result<Record>>,
        C: BatchConsumer,
        C::Error: From<IngestError>,
    {
        if self.state != PipelineState::Idle {
            return Err(IngestError::PipelineReused { state: self.state }.into());
        }
        self.transition(PipelineState::Streaming);

        let mut accumulator: Vec<Record> = Vec::with_capacity(self.capacity);
        let mut batch_number = 0usize;

        for item in records {
            let record = match item {
                Ok(record) => record,
                Err(err) => {
                    warn!(error = %err, batches = batch_number, "record source failed");
                    self.transition(PipelineState::Failed);
                    return Err(err.into());
                }
            };
            accumulator.push(record);

            if accumulator.len() == self.capacity {
                batch_number += 1;
                let batch = Batch::new(std::mem::take(&mut accumulator));
                self.deliver(consumer, batch, batch_number).await?;
                accumulator.reserve(self.capacity);
            }
        }

        if accumulator.is_empty() {
            self.transition(PipelineState::Flushed);
        } else {
            self.transition(PipelineState::Draining);
            batch_number += 1;
            let batch = Batch::new(accumulator);
            self.deliver(consumer, batch, batch_number).await?;
        }

        self.transition(PipelineState::Completed);
        info!(batches = batch_number, "ingestion completed");
        Ok(())
    }

    async fn deliver<C>(
        &mut self,
        consumer: &mut C,
        batch: Batch,
        batch_number: usize,
    ) -> std::result::Result<(), C::Error>
    where
        C: BatchConsumer,
    {
        let size = batch.len();
        debug!(batch = batch_number, size, "handing batch to consumer");
        match consumer.consume(batch).await {
            Ok(()) => {
                debug!(batch = batch_number, size, "batch accepted");
                Ok(())
            }
            Err(err) => {
                warn!(batch = batch_number, size, "batch consumer failed");
                self.transition(PipelineState::Failed);
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "pipeline state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airq_model::Value;

    fn record(n: usize) -> Record {
        let mut record = Record::new();
        record.insert("n", Value::Number(n as f64));
        record
    }

    fn numbers(batch: &Batch) -> Vec<usize> {
        batch
            .iter()
            .filter_map(|r| r.get("n").and_then(Value::as_number))
            .map(|n| n as usize)
            .collect()
    }

    #[derive(Debug, PartialEq)]
    enum TestError {
        Ingest(String),
        Rejected(usize),
    }

    impl From<IngestError> for TestError {
        fn from(err: IngestError) -> Self {
            TestError::Ingest(err.to_string())
        }
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(BatchingPipeline::new(0).is_err());
    }

    #[test]
    fn test_batches_in_order_with_partial_tail() {
        let mut seen: Vec<Vec<usize>> = Vec::new();
        let mut consumer = |batch: Batch| {
            seen.push(numbers(&batch));
            async { Ok::<(), TestError>(()) }
        };
        let mut pipeline = BatchingPipeline::new(2).unwrap();
        let records = (1..=5).map(|n| Ok(record(n)));

        block_on(pipeline.run(records, &mut consumer)).unwrap();

        assert_eq!(pipeline.state(), PipelineState::Completed);
        assert_eq!(seen, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let mut sizes = Vec::new();
        let mut consumer = |batch: Batch| {
            sizes.push(batch.len());
            async { Ok::<(), TestError>(()) }
        };
        let mut pipeline = BatchingPipeline::new(2).unwrap();

        block_on(pipeline.run((0..4).map(|n| Ok(record(n))), &mut consumer)).unwrap();

        assert_eq!(sizes, vec![2, 2]);
    }

    #[test]
    fn test_empty_source_never_calls_consumer() {
        let mut calls = 0;
        let mut consumer = |_batch: Batch| {
            calls += 1;
            async { Ok::<(), TestError>(()) }
        };
        let mut pipeline = BatchingPipeline::new(3).unwrap();

        block_on(pipeline.run(std::iter::empty(), &mut consumer)).unwrap();

        assert_eq!(calls, 0);
        assert_eq!(pipeline.state(), PipelineState::Completed);
    }

    #[test]
    fn test_consumer_error_returned_verbatim() {
        let mut calls = 0usize;
        let mut consumer = |_batch: Batch| {
            calls += 1;
            let call = calls;
            async move {
                if call == 2 {
                    Err(TestError::Rejected(call))
                } else {
                    Ok(())
                }
            }
        };
        let mut pipeline = BatchingPipeline::new(2).unwrap();

        let result = block_on(pipeline.run((0..6).map(|n| Ok(record(n))), &mut consumer));

        assert_eq!(result, Err(TestError::Rejected(2)));
        assert_eq!(calls, 2);
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_source_error_stops_pulling() {
        let mut pulled = 0usize;
        let records = (0..10).map(|n| {
            pulled += 1;
            if n == 3 {
                Err(IngestError::Decode {
                    line: 5,
                    message: "bad row".to_string(),
                })
            } else {
                Ok(record(n))
            }
        });
        let mut sizes = Vec::new();
        let mut consumer = |batch: Batch| {
            sizes.push(batch.len());
            async { Ok::<(), TestError>(()) }
        };
        let mut pipeline = BatchingPipeline::new(2).unwrap();

        let result = block_on(pipeline.run(records, &mut consumer));

        assert!(matches!(result, Err(TestError::Ingest(_))));
        assert_eq!(sizes, vec![2]);
        assert_eq!(pulled, 4);
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_pipeline_runs_once() {
        let mut consumer = |_batch: Batch| async { Ok::<(), TestError>(()) };
        let mut pipeline = BatchingPipeline::new(2).unwrap();
        block_on(pipeline.run(std::iter::empty(), &mut consumer)).unwrap();

        let again = block_on(pipeline.run(std::iter::empty(), &mut consumer));
        assert_eq!(
            again,
            Err(TestError::Ingest(
                "pipeline cannot run from state completed".to_string()
            ))
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::Draining.to_string(), "draining");
        assert_eq!(PipelineState::Completed.to_string(), "completed");
    }
}
