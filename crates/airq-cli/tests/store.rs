//! JSON-lines store behavior as a batch consumer.

use std::io::Write;

use tempfile::NamedTempFile;

use airq_cli::store::{CountingSink, JsonLinesStore};
use airq_ingest::{BatchConsumer, IngestOptions, ingest};
use airq_model::{Batch, Record, Value};

fn batch(values: &[f64]) -> Batch {
    Batch::new(
        values
            .iter()
            .map(|&v| Record::from_iter([("co_gt", Value::Number(v))]))
            .collect(),
    )
}

#[tokio::test]
async fn test_each_batch_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readings.jsonl");
    let mut store = JsonLinesStore::open(&path, false).await.unwrap();

    store.consume(batch(&[1.0, 2.5])).await.unwrap();
    store.consume(batch(&[3.0])).await.unwrap();

    assert_eq!(store.batches(), 2);
    assert_eq!(store.records(), 3);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "{\"co_gt\":1.0}\n{\"co_gt\":2.5}\n{\"co_gt\":3.0}\n"
    );
}

#[tokio::test]
async fn test_reopen_appends_unless_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readings.jsonl");

    let mut store = JsonLinesStore::open(&path, false).await.unwrap();
    store.consume(batch(&[1.0])).await.unwrap();
    drop(store);

    let mut store = JsonLinesStore::open(&path, false).await.unwrap();
    store.consume(batch(&[2.0])).await.unwrap();
    drop(store);
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);

    let mut store = JsonLinesStore::open(&path, true).await.unwrap();
    store.consume(batch(&[3.0])).await.unwrap();
    drop(store);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{\"co_gt\":3.0}\n"
    );
}

#[tokio::test]
async fn test_open_fails_for_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent").join("readings.jsonl");

    let err = JsonLinesStore::open(&path, false).await.unwrap_err();

    assert!(err.to_string().starts_with("open store"));
}

#[tokio::test]
async fn test_ingest_into_store() {
    let mut input = NamedTempFile::new().unwrap();
    write!(
        input,
        "Date;Time;CO(GT);T;;\n\
         10/03/2004;18.00.00;2,6;13,6;;\n\
         10/03/2004;19.00.00;-200;13,3;;\n\
         ;;;;;\n"
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readings.jsonl");
    let mut store = JsonLinesStore::open(&path, true).await.unwrap();

    ingest(input.path(), &mut store, &IngestOptions::default().with_batch_capacity(1))
        .await
        .unwrap();

    assert_eq!(store.batches(), 2);
    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["timestamp"], "2004-03-10T18:00:00");
    assert_eq!(lines[1]["co_gt"], serde_json::Value::Null);
    assert_eq!(lines[1]["t"], 13.3);
}

#[tokio::test]
async fn test_counting_sink_persists_nothing() {
    let mut sink = CountingSink::default();

    sink.consume(batch(&[1.0, 2.0])).await.unwrap();
    sink.consume(batch(&[])).await.unwrap();

    assert_eq!(sink.batches(), 2);
    assert_eq!(sink.records(), 2);
}

#[tokio::test]
async fn test_has_data_reports_populated_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readings.jsonl");
    assert!(!JsonLinesStore::has_data(&path).await.unwrap());

    let mut store = JsonLinesStore::open(&path, false).await.unwrap();
    assert!(!JsonLinesStore::has_data(&path).await.unwrap());

    store.consume(batch(&[1.0])).await.unwrap();
    assert!(JsonLinesStore::has_data(&path).await.unwrap());
}
