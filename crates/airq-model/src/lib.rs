pub mod batch;
pub mod record;
pub mod value;

pub use batch::Batch;
pub use record::Record;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_serializes_as_record_array() {
        let mut record = Record::new();
        record.insert("co_gt", Value::Number(2.6));
        record.insert("nmhc_gt", Value::Null);
        let batch = Batch::new(vec![record]);
        let json = serde_json::to_string(&batch).expect("serialize batch");
        assert_eq!(json, r#"[{"co_gt":2.6,"nmhc_gt":null}]"#);
    }
}
