// src/decode/mod.rs

//! Record pipeline: assemble physical lines into logical records, decode
//! fields, reconcile against the stream schema.

pub mod assemble;
pub mod field;
pub mod scan;

use std::collections::VecDeque;
use std::io::{self, BufRead};

use tracing::{debug, warn};

use crate::record::Record;
use crate::schema::SchemaState;

use self::assemble::LineAssembler;

/// Incremental CSV decoder. Feed physical lines one at a time; each call
/// returns the records completed by that line (usually zero or one, two when
/// a parked header candidate is released as data). Delimiter and quote
/// character are fixed at comma and double-quote.
#[derive(Debug, Default)]
pub struct CsvDecoder {
    assembler: LineAssembler,
    schema: SchemaState,
}

impl CsvDecoder {
    pub fn new() -> Self {
        CsvDecoder {
            assembler: LineAssembler::new(),
            schema: SchemaState::new(),
        }
    }

    /// Process one physical line. Lines should arrive without their line
    /// terminator; a terminator left over from upstream splitting is
    /// trimmed after assembly.
    pub fn push_line(&mut self, line: &str) -> Vec<Record> {
        let mut out = Vec::new();

        let Some((mut logical, count)) = self.assembler.push(line) else {
            debug!("quoted region still open, buffering line");
            return out;
        };
        if !self.schema.admits(count) {
            return out;
        }

        trim_line_end(&mut logical);
        let values = scan::fields(&logical)
            .map(|f| field::decode_field(&f))
            .collect();
        self.schema.accept(values, &mut out);
        out
    }

    /// Signal end of stream, flushing a parked header row. An unterminated
    /// quoted record is dropped.
    pub fn finish(&mut self) -> Vec<Record> {
        if let Some(dropped) = self.assembler.take_pending() {
            warn!(
                bytes = dropped.len(),
                "dropping unterminated quoted record at end of stream"
            );
        }
        let mut out = Vec::new();
        self.schema.finish(&mut out);
        out
    }

    /// Cumulative count of dropped lines.
    pub fn rejected(&self) -> u64 {
        self.schema.rejected()
    }
}

/// Trim one trailing newline (and carriage return) left over from upstream
/// line splitting.
fn trim_line_end(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
    }
    if line.ends_with('\r') {
        line.pop();
    }
}

/// Line-by-line driver over any buffered reader, yielding decoded records.
pub struct CsvReader<R> {
    reader: R,
    decoder: CsvDecoder,
    queued: VecDeque<Record>,
    done: bool,
}

impl<R: BufRead> CsvReader<R> {
    pub fn new(reader: R) -> Self {
        CsvReader {
            reader,
            decoder: CsvDecoder::new(),
            queued: VecDeque::new(),
            done: false,
        }
    }

    /// Dropped-line count so far.
    pub fn rejected(&self) -> u64 {
        self.decoder.rejected()
    }
}

impl<R: BufRead> Iterator for CsvReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<io::Result<Record>> {
        loop {
            if let Some(record) = self.queued.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.done = true;
                    self.queued.extend(self.decoder.finish());
                }
                Ok(_) => {
                    trim_line_end(&mut line);
                    self.queued.extend(self.decoder.push_line(&line));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use std::io::Cursor;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,csvflow=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn ints(items: &[i64]) -> Vec<Value> {
        items.iter().map(|i| Value::Int(*i)).collect()
    }

    fn strs(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::Str((*s).into())).collect()
    }

    #[test]
    fn header_then_data() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        assert!(dec.push_line("a,b,c").is_empty());

        let out = dec.push_line("1,2,3");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values(), &ints(&[1, 2, 3])[..]);
        assert_eq!(out[0].header().unwrap().names(), ["a", "b", "c"]);
        assert!(dec.finish().is_empty());
    }

    #[test]
    fn numeric_first_line_means_no_header() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        let out = dec.push_line("1,2,3");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values(), &ints(&[1, 2, 3])[..]);
        assert!(out[0].header().is_none());

        let out = dec.push_line("4,5,6");
        assert_eq!(out[0].values(), &ints(&[4, 5, 6])[..]);
        assert!(out[0].header().is_none());
    }

    #[test]
    fn quoted_comma_stays_in_one_field() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        assert!(dec.push_line("a,\"b,c\"").is_empty());
        let out = dec.finish();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values(), &strs(&["a", "b,c"])[..]);
    }

    #[test]
    fn quoted_newline_spans_physical_lines() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        assert!(dec.push_line("\"line1").is_empty());
        assert!(dec.push_line("line2\",x").is_empty());
        let out = dec.finish();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values(), &strs(&["line1\nline2", "x"])[..]);
    }

    #[test]
    fn type_mismatch_drops_the_line() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        dec.push_line("1,2");
        let out = dec.push_line("7,foo");
        assert!(out.is_empty());
        assert_eq!(dec.rejected(), 1);

        // the stream keeps going
        let out = dec.push_line("8,9");
        assert_eq!(out[0].values(), &ints(&[8, 9])[..]);
    }

    #[test]
    fn field_count_mismatch_drops_the_line() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        dec.push_line("1,2,3");
        assert!(dec.push_line("4,5").is_empty());
        assert_eq!(dec.rejected(), 1);

        let out = dec.push_line("6,7,8");
        assert_eq!(out[0].values(), &ints(&[6, 7, 8])[..]);
    }

    #[test]
    fn string_columns_coerce_numbers_to_text() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        dec.push_line("name,score");
        dec.push_line("alice,3");
        let out = dec.push_line("7,4");
        assert_eq!(
            out[0].values(),
            &[Value::Str("7".into()), Value::Int(4)][..]
        );
    }

    #[test]
    fn sole_header_is_flushed_at_end_of_stream() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        assert!(dec.push_line("a,b,c").is_empty());
        let out = dec.finish();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values(), &strs(&["a", "b", "c"])[..]);
        assert!(out[0].header().is_none());
    }

    #[test]
    fn header_is_never_emitted_twice() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        let mut all = Vec::new();
        for line in ["a,b", "c,d", "e,f", "1,2"] {
            all.extend(dec.push_line(line));
        }
        all.extend(dec.finish());

        // the numeric line is coerced into the all-string schema, nothing is
        // duplicated
        assert_eq!(all.len(), 4);
        let firsts = all
            .iter()
            .filter(|r| r.values() == &strs(&["a", "b"])[..])
            .count();
        assert_eq!(firsts, 1);
    }

    #[test]
    fn unterminated_record_is_dropped_at_end_of_stream() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        dec.push_line("1,2");
        assert!(dec.push_line("\"still open").is_empty());
        assert!(dec.finish().is_empty());
    }

    #[test]
    fn trailing_terminators_are_trimmed() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        let out = dec.push_line("1,2\r\n");
        assert_eq!(out[0].values(), &ints(&[1, 2])[..]);
    }

    #[test]
    fn roundtrip_plain_records() {
        init_test_logging();
        let mut dec = CsvDecoder::new();

        let line = "7,apple,2.5";
        let out = dec.push_line(line);
        let rendered: Vec<String> = out[0].values().iter().map(|v| v.render()).collect();
        assert_eq!(rendered.join(","), line);
    }

    #[test]
    fn reader_drains_a_buffered_source() {
        init_test_logging();
        let input = "name,score\nalice,3\nbob,4\n";
        let reader = CsvReader::new(Cursor::new(input));
        let records: Vec<Record> = reader.map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].values(),
            &[Value::Str("alice".into()), Value::Int(3)][..]
        );
        assert_eq!(records[1].header().unwrap().names(), ["name", "score"]);
    }
}
