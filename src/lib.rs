//! Streaming CSV decoder for line-oriented pipelines.
//!
//! Feeds on physical text lines one at a time and emits typed,
//! schema-consistent records. A logical record may span several physical
//! lines when a quoted field contains newlines; the decoder buffers the
//! partial record until the closing quote arrives. The first row is parked
//! as a header candidate when every field decodes as a string, and the
//! second row decides whether it was a header or plain data. Column types
//! are fixed by the first data row and enforced for the rest of the stream;
//! lines that disagree are dropped, the stream keeps going.
//!
//! ```
//! use csvflow::CsvDecoder;
//!
//! let mut decoder = CsvDecoder::new();
//! assert!(decoder.push_line("city,population").is_empty());
//! let records = decoder.push_line("Osaka,2691000");
//! assert_eq!(records[0].header().unwrap().names(), ["city", "population"]);
//! ```

pub mod decode;
pub mod error;
pub mod record;
pub mod schema;
pub mod stream;

pub use decode::{CsvDecoder, CsvReader};
pub use error::Reject;
pub use record::{ColumnType, Header, Record, Value};
pub use stream::{RecordStream, StreamTransform, TransformRegistry};
