use std::path::PathBuf;
use std::time::Duration;

use airq_ingest::HeaderColumn;
use airq_model::Record;

/// Outcome of a completed `load` run.
#[derive(Debug)]
pub struct LoadResult {
    pub source: PathBuf,
    /// `None` for a dry run.
    pub store: Option<PathBuf>,
    /// The store already held data and nothing was loaded.
    pub skipped: bool,
    pub batch_capacity: usize,
    pub batches: usize,
    pub records: usize,
    pub elapsed: Duration,
}

/// Header mapping and the first decoded records of a file.
#[derive(Debug)]
pub struct InspectResult {
    pub source: PathBuf,
    pub columns: Vec<HeaderColumn>,
    pub records: Vec<Record>,
}
