use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{Instrument, info, info_span};

use airq_cli::store::{CountingSink, JsonLinesStore};
use airq_ingest::{BatchingPipeline, IngestOptions, open_decoder};

use crate::cli::{InspectArgs, LoadArgs, SourceArgs};
use crate::types::{InspectResult, LoadResult};

pub fn run_load(args: &LoadArgs) -> Result<LoadResult> {
    let options = resolve_options(&args.source, args.batch_size)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("start async runtime")?;
    runtime.block_on(load(args, &options))
}

async fn load(args: &LoadArgs, options: &IngestOptions) -> Result<LoadResult> {
    let input = &args.source.input;
    let span = info_span!(
        "load",
        source = %input.display(),
        batch_capacity = options.batch_capacity,
        dry_run = args.dry_run
    );
    let started = Instant::now();

    if !(args.dry_run || args.append || args.truncate)
        && JsonLinesStore::has_data(&args.store).await?
    {
        span.in_scope(|| {
            info!(
                store = %args.store.display(),
                "store already holds data, skipping load"
            );
        });
        return Ok(LoadResult {
            source: input.clone(),
            store: Some(args.store.clone()),
            skipped: true,
            batch_capacity: options.batch_capacity,
            batches: 0,
            records: 0,
            elapsed: started.elapsed(),
        });
    }

    // The source is opened first so a missing file never touches the store.
    let decoder = span.in_scope(|| open_decoder(input, options))?;
    let mut pipeline = BatchingPipeline::new(options.batch_capacity)?;

    let (store, batches, records) = if args.dry_run {
        let mut sink = CountingSink::default();
        pipeline
            .run(decoder, &mut sink)
            .instrument(span.clone())
            .await
            .with_context(|| format!("load {}", input.display()))?;
        (None, sink.batches(), sink.records())
    } else {
        let mut store = JsonLinesStore::open(&args.store, args.truncate).await?;
        pipeline
            .run(decoder, &mut store)
            .instrument(span.clone())
            .await
            .with_context(|| format!("load {} into {}", input.display(), args.store.display()))?;
        (
            Some(store.path().to_path_buf()),
            store.batches(),
            store.records(),
        )
    };

    let elapsed = started.elapsed();
    span.in_scope(|| {
        info!(
            batches,
            records,
            elapsed_ms = elapsed.as_millis() as u64,
            "load finished"
        );
    });
    Ok(LoadResult {
        source: input.clone(),
        store,
        skipped: false,
        batch_capacity: options.batch_capacity,
        batches,
        records,
        elapsed,
    })
}

pub fn run_inspect(args: &InspectArgs) -> Result<InspectResult> {
    let options = resolve_options(&args.source, None)?;
    let input = &args.source.input;
    let decoder = open_decoder(input, &options)?;
    let columns = decoder.columns().to_vec();
    let records = decoder
        .take(args.limit)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("decode {}", input.display()))?;
    Ok(InspectResult {
        source: input.clone(),
        columns,
        records,
    })
}

/// Builds ingest options from the config file (if any) overlaid with flags.
fn resolve_options(source: &SourceArgs, batch_size: Option<usize>) -> Result<IngestOptions> {
    let mut options = match &source.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("open config {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => IngestOptions::default(),
    };

    if let Some(delimiter) = source.delimiter {
        options = options.with_delimiter(delimiter);
    }
    if let Some(size) = batch_size {
        options = options.with_batch_capacity(size);
    }
    if let Some(sentinel) = &source.sentinel {
        options = options.with_missing_sentinel(sentinel.as_str());
    }
    if let Some(name) = &source.date_column {
        options = options.with_date_column(name.as_str());
    }
    if let Some(name) = &source.time_column {
        options = options.with_time_column(name.as_str());
    }
    if let Some(name) = &source.timestamp_column {
        options = options.with_timestamp_column(name.as_str());
    }
    if let Some(format) = &source.date_format {
        options = options.with_date_format(format.as_str());
    }
    if source.no_quoting {
        options = options.with_quoting(false);
    }

    options.validate()?;
    Ok(options)
}
