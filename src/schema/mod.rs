// src/schema/mod.rs

//! Header-row detection and per-column type enforcement across the record
//! stream.
//!
//! Whether the first row is headers or data can only be decided after seeing
//! the second row, so discovery advances through an explicit three-phase
//! state instead of boolean flags: `Undetermined -> HeaderPending ->
//! Established`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Reject;
use crate::record::{ColumnType, Header, Record, Value};

#[derive(Debug)]
enum Phase {
    /// No line parsed yet.
    Undetermined,
    /// First line decoded to all strings; header or data is still unknown.
    HeaderPending(Vec<Value>),
    /// Column types fixed by the first data line.
    Established {
        types: Vec<ColumnType>,
        header: Option<Arc<Header>>,
    },
}

/// Per-stream schema state, exclusively owned by one decoder instance and
/// mutated on every accepted line.
#[derive(Debug)]
pub struct SchemaState {
    phase: Phase,
    field_count: usize,
    rejected: u64,
}

impl Default for SchemaState {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaState {
    pub fn new() -> Self {
        SchemaState {
            phase: Phase::Undetermined,
            field_count: 0,
            rejected: 0,
        }
    }

    /// Established field count; 0 until the first line is accepted.
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Cumulative count of dropped lines.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Field-count precheck, run before field decoding. A mismatching line
    /// is dropped; the stream continues.
    pub fn admits(&mut self, count: usize) -> bool {
        if self.field_count > 0 && count != self.field_count {
            self.reject(Reject::FieldCountMismatch {
                expected: self.field_count,
                got: count,
            });
            return false;
        }
        true
    }

    /// Reconcile one decoded row against the stream schema, pushing zero,
    /// one or two records onto `out` (two when a parked header candidate
    /// turns out to have been plain data).
    pub fn accept(&mut self, values: Vec<Value>, out: &mut Vec<Record>) {
        let all_str = values.iter().all(Value::is_str);

        match std::mem::replace(&mut self.phase, Phase::Undetermined) {
            Phase::Undetermined => {
                self.field_count = values.len();
                if all_str {
                    debug!(columns = values.len(), "all-string first line parked as header candidate");
                    self.phase = Phase::HeaderPending(values);
                } else {
                    let types = column_types(&values);
                    self.phase = Phase::Established {
                        types,
                        header: None,
                    };
                    out.push(Record::new(values, None));
                }
            }
            Phase::HeaderPending(candidate) => {
                let types = column_types(&values);
                let labels = Arc::new(Header::new(
                    candidate
                        .iter()
                        .map(|v| match v {
                            Value::Str(s) => s.clone(),
                            other => other.render(),
                        })
                        .collect(),
                ));
                // the first data record carries the header association in
                // both branches
                if all_str {
                    // two all-string lines in a row: the parked one was plain
                    // data, release it ahead of the current line
                    debug!("header candidate released as data");
                    out.push(Record::new(candidate, None));
                    out.push(Record::new(values, Some(labels)));
                    self.phase = Phase::Established {
                        types,
                        header: None,
                    };
                } else {
                    debug!(header = ?labels.names(), "header row interned as column labels");
                    out.push(Record::new(values, Some(labels.clone())));
                    self.phase = Phase::Established {
                        types,
                        header: Some(labels),
                    };
                }
            }
            Phase::Established { types, header } => {
                match coerce(values, &types) {
                    Ok(values) => out.push(Record::new(values, header.clone())),
                    Err(reject) => self.reject(reject),
                }
                self.phase = Phase::Established { types, header };
            }
        }
    }

    /// End of stream: a parked header row that no data line ever
    /// disambiguated is released as a plain record, so a sole-header input
    /// still produces output.
    pub fn finish(&mut self, out: &mut Vec<Record>) {
        match std::mem::replace(&mut self.phase, Phase::Undetermined) {
            Phase::HeaderPending(candidate) => {
                debug!("flushing parked header row at end of stream");
                out.push(Record::new(candidate, None));
            }
            other => self.phase = other,
        }
    }

    fn reject(&mut self, reject: Reject) {
        self.rejected += 1;
        warn!(%reject, "line dropped");
    }
}

/// Column-wise check of a row against the established types, coercing
/// numbers to their decimal rendering where the column is string-typed.
fn coerce(mut values: Vec<Value>, types: &[ColumnType]) -> Result<Vec<Value>, Reject> {
    for (column, (value, &expected)) in values.iter_mut().zip(types).enumerate() {
        let got = value.column_type();
        if got == expected {
            continue;
        }
        if expected == ColumnType::Str {
            *value = Value::Str(value.render());
        } else {
            return Err(Reject::TypeMismatch {
                column,
                expected,
                got,
            });
        }
    }
    Ok(values)
}

fn column_types(values: &[Value]) -> Vec<ColumnType> {
    values.iter().map(Value::column_type).collect()
}
