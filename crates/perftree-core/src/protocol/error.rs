//! プロトコルのエラー型

use crate::position::{CodecError, FenError};

/// タスク・結果バイナリのデコードエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("payload truncated while reading {0}")]
    Truncated(&'static str),
    #[error("negative length {0} in payload")]
    NegativeLength(i32),
    #[error("statistics vector must have {expected} elements, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("statistics checksum mismatch: expected {expected:#018x}, got {actual:#018x}")]
    Checksum { expected: u64, actual: u64 },
    #[error("fast results must be (task id, nodes) pairs, got {0} values")]
    OddFastResults(usize),
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
    #[error("board text is not valid UTF-8")]
    Utf8,
    #[error("invalid FEN board: {0}")]
    Fen(#[from] FenError),
    #[error("invalid compact board: {0}")]
    Codec(#[from] CodecError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
