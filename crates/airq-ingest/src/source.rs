//! Entry points that own the input source for the length of a run.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{Instrument, info_span};

use crate::decoder::RecordDecoder;
use crate::error::IngestError;
use crate::options::IngestOptions;
use crate::pipeline::{BatchConsumer, BatchingPipeline};

/// Opens the file at `path` for decoding.
///
/// Missing or unreadable files, and files whose header row cannot be read,
/// fail with [`IngestError::SourceOpen`] before any record is produced.
pub fn open_decoder(
    path: &Path,
    options: &IngestOptions,
) -> crate::Result<RecordDecoder<BufReader<File>>> {
    options.validate()?;
    let file = File::open(path).map_err(|source| IngestError::SourceOpen {
        path: path.to_path_buf(),
        source,
    })?;
    RecordDecoder::new(BufReader::new(file), options).map_err(|err| match err {
        IngestError::SourceIo { source, .. } => IngestError::SourceOpen {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Streams the sensor file at `path` into `consumer`, one batch at a time.
///
/// The file is opened here and closed when the run ends, whatever the
/// outcome. See [`BatchingPipeline::run`] for delivery and failure rules.
pub async fn ingest<C>(
    path: impl AsRef<Path>,
    consumer: &mut C,
    options: &IngestOptions,
) -> Result<(), C::Error>
where
    C: BatchConsumer,
    C::Error: From<IngestError>,
{
    let path = path.as_ref();
    let span = info_span!(
        "ingest",
        path = %path.display(),
        batch_capacity = options.batch_capacity
    );
    let decoder = span.in_scope(|| open_decoder(path, options))?;
    let mut pipeline = BatchingPipeline::new(options.batch_capacity)?;
    pipeline.run(decoder, consumer).instrument(span).await
}

/// Streams an already-open byte source into `consumer`.
///
/// The reader is dropped when the run ends.
pub async fn ingest_reader<R, C>(
    source: R,
    consumer: &mut C,
    options: &IngestOptions,
) -> Result<(), C::Error>
where
    R: Read,
    C: BatchConsumer,
    C::Error: From<IngestError>,
{
    let span = info_span!("ingest", batch_capacity = options.batch_capacity);
    let decoder = span.in_scope(|| RecordDecoder::new(source, options))?;
    let mut pipeline = BatchingPipeline::new(options.batch_capacity)?;
    pipeline.run(decoder, consumer).instrument(span).await
}
