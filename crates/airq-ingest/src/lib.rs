//! Streaming ingestion of delimited sensor readings.
//!
//! A sensor file is decoded one row at a time, each field is normalized and
//! coerced, and the resulting records are handed to an asynchronous consumer
//! in fixed-size batches. Reading pauses while a batch is being consumed, so
//! memory stays bounded by the batch capacity.
//!
//! # Example
//!
//! ```ignore
//! use airq_ingest::{IngestOptions, ingest};
//! use airq_model::Batch;
//!
//! let options = IngestOptions::default().with_batch_capacity(500);
//! let mut store = |batch: Batch| async move {
//!     // write the batch somewhere durable
//!     Ok::<(), anyhow::Error>(())
//! };
//! ingest("AirQualityUCI.csv", &mut store, &options).await?;
//! ```

mod codec;
mod decoder;
mod error;
mod options;
mod pipeline;
mod source;

// === Error Types ===
pub use error::{IngestError, Result};

// === Configuration ===
pub use options::{DEFAULT_BATCH_CAPACITY, DEFAULT_MISSING_SENTINEL, IngestOptions};

// === Field Codec ===
pub use codec::{FieldCodec, normalize_header, normalize_time, parse_number};

// === Record Decoding ===
pub use decoder::{HeaderColumn, RecordDecoder};

// === Batching ===
pub use pipeline::{BatchConsumer, BatchingPipeline, PipelineState};

// === Entry Points ===
pub use source::{ingest, ingest_reader, open_decoder};
