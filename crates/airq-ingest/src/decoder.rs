//! Lazy record decoding over a delimited byte stream.

use std::io::Read;

use csv::{ByteRecord, Reader, ReaderBuilder};
use tracing::{info, trace};

use airq_model::Record;

use crate::codec::{FieldCodec, normalize_header};
use crate::error::{IngestError, Result};
use crate::options::IngestOptions;

/// One input column: the header as written and the field name it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderColumn {
    pub raw: String,
    /// `None` when the header normalized to nothing and the column is dropped.
    pub name: Option<String>,
}

/// Forward-only iterator of records decoded from a delimited source.
///
/// The header row is read on construction; each call to `next` reads at
/// most as many rows as it takes to produce one record that is not entirely
/// null. After an error or end of input the iterator is exhausted.
pub struct RecordDecoder<R> {
    reader: Reader<R>,
    columns: Vec<HeaderColumn>,
    codec: FieldCodec,
    row: ByteRecord,
    finished: bool,
}

impl<R: Read> RecordDecoder<R> {
    /// Wraps `source` and reads its header row.
    ///
    /// A failure to read the header row is reported as [`IngestError::SourceIo`]
    /// at line 1; callers that know the source path turn it into
    /// [`IngestError::SourceOpen`].
    pub fn new(source: R, options: &IngestOptions) -> Result<Self> {
        options.validate()?;
        let mut reader = ReaderBuilder::new()
            .delimiter(options.delimiter_byte())
            .has_headers(true)
            .flexible(true)
            .quoting(options.quoting)
            .from_reader(source);

        let columns: Vec<HeaderColumn> = reader
            .byte_headers()
            .map_err(IngestError::from_csv)?
            .iter()
            .map(|field| {
                let raw = String::from_utf8_lossy(field).into_owned();
                let name = normalize_header(&raw);
                HeaderColumn { raw, name }
            })
            .collect();

        let kept: Vec<&str> = columns.iter().filter_map(|c| c.name.as_deref()).collect();
        info!(
            columns = columns.len(),
            kept = kept.len(),
            headers = %kept.join(", "),
            "read header row"
        );

        Ok(Self {
            reader,
            columns,
            codec: FieldCodec::new(options),
            row: ByteRecord::new(),
            finished: false,
        })
    }

    /// Header columns in input order, including dropped ones.
    pub fn columns(&self) -> &[HeaderColumn] {
        &self.columns
    }

    /// Normalized field names that records can carry, in input order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| c.name.as_deref())
    }

    fn decode_row(&self) -> Record {
        let mut record = Record::new();
        for (column, field) in self.columns.iter().zip(self.row.iter()) {
            let Some(name) = column.name.as_deref() else {
                continue;
            };
            let raw = String::from_utf8_lossy(field);
            record.insert(name, self.codec.coerce_value(name, &raw));
        }
        self.codec.compose_timestamp(&mut record);
        self.codec.sweep_sentinels(&mut record);
        record
    }

    /// Line number of the most recently read row.
    fn line(&self) -> u64 {
        self.row.position().map_or(0, csv::Position::line)
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.reader.read_byte_record(&mut self.row) {
                Ok(true) => {
                    let record = self.decode_row();
                    if record.is_all_null() {
                        trace!(line = self.line(), "skipping record with only null values");
                        continue;
                    }
                    return Some(Ok(record));
                }
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(IngestError::from_csv(err)));
                }
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for RecordDecoder<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use airq_model::Value;
    use std::io;

    const AIR_QUALITY: &str = "\
Date;Time;CO(GT);PT08.S1(CO);NMHC(GT);T;RH;;
10/03/2004;18.00.00;2,6;1360;150;13,6;48,9;;
10/03/2004;19.00.00;2;1292;112;13,3;47,7;;
;;;;;;;;
10/03/2004;20.00.00;-200;1402;88;11,9;54,0;;
";

    fn decode(input: &str, options: &IngestOptions) -> Vec<Record> {
        RecordDecoder::new(input.as_bytes(), options)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_decodes_air_quality_rows() {
        let records = decode(AIR_QUALITY, &IngestOptions::default());
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.get("co_gt"), Some(&Value::Number(2.6)));
        assert_eq!(first.get("pt08_s1_co"), Some(&Value::Number(1360.0)));
        assert_eq!(first.get("t"), Some(&Value::Number(13.6)));
        assert!(first.get("timestamp").and_then(Value::as_timestamp).is_some());
        assert!(!first.contains("date"));
        assert!(!first.contains("time"));

        assert_eq!(records[2].get("co_gt"), Some(&Value::Null));
    }

    #[test]
    fn test_header_columns() {
        let decoder =
            RecordDecoder::new(AIR_QUALITY.as_bytes(), &IngestOptions::default()).unwrap();
        let names: Vec<&str> = decoder.field_names().collect();
        assert_eq!(
            names,
            vec!["date", "time", "co_gt", "pt08_s1_co", "nmhc_gt", "t", "rh"]
        );
        assert_eq!(decoder.columns().len(), 9);
        assert_eq!(decoder.columns()[8].name, None);
    }

    #[test]
    fn test_blank_row_skipped() {
        let input = "a;b\n1;2\n;\n3;4\n";
        let records = decode(input, &IngestOptions::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("a"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_sentinel_only_row_skipped() {
        let input = "a;b\n-200;-200\n1;-200,0\n-200,0;\n";
        let records = decode(input, &IngestOptions::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_ragged_rows() {
        let input = "a;b;c\n1\n1;2;3;4\n";
        let records = decode(input, &IngestOptions::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[1].len(), 3);
    }

    #[test]
    fn test_custom_delimiter() {
        let input = "name,age,city\nJohn,30,New York\n";
        let options = IngestOptions::default().with_delimiter(',');
        let records = decode(input, &options);
        assert_eq!(records[0].get("name"), Some(&Value::Text("John".into())));
        assert_eq!(records[0].get("age"), Some(&Value::Number(30.0)));
    }

    #[test]
    fn test_empty_input() {
        let records = decode("", &IngestOptions::default());
        assert!(records.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let input: &[u8] = b"a;b\n\xff\xfe;1\n";
        let records: Vec<Record> = RecordDecoder::new(input, &IngestOptions::default())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].get("a").and_then(Value::as_text).is_some());
    }

    struct FailingReader {
        data: io::Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::other("device detached"));
            }
            Ok(n)
        }
    }

    #[test]
    fn test_io_error_ends_iteration() {
        let reader = FailingReader {
            data: io::Cursor::new(b"a;b\n1;2\n".to_vec()),
        };
        let mut decoder = RecordDecoder::new(reader, &IngestOptions::default()).unwrap();
        assert!(matches!(decoder.next(), Some(Ok(_))));
        assert!(matches!(decoder.next(), Some(Err(IngestError::SourceIo { .. }))));
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = IngestOptions::default().with_batch_capacity(0);
        let result = RecordDecoder::new("a\n1\n".as_bytes(), &options);
        assert!(matches!(result, Err(IngestError::InvalidOptions { .. })));
    }
}
