// src/error.rs

use thiserror::Error;

use crate::record::ColumnType;

/// Why a logical line was dropped. Per-line rejects are absorbed (the stream
/// continues); they surface only through `tracing` and the decoder's
/// rejected-line counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Reject {
    #[error("field count mismatch: expected {expected}, got {got}")]
    FieldCountMismatch { expected: usize, got: usize },

    #[error("type mismatch in column {column}: expected {expected}, got {got}")]
    TypeMismatch {
        column: usize,
        expected: ColumnType,
        got: ColumnType,
    },
}
