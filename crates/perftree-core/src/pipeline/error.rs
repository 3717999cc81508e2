//! パイプラインのエラー型

use crate::leaf::LeafError;
use crate::position::CodecError;

/// 外部ソート・マージのエラー
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    #[error("invalid board record: {0}")]
    Codec(#[from] CodecError),
    #[error("record count exceeds the u32 header: {0}")]
    TooManyRecords(u64),
    #[error("occurrence count overflow for hash {0:016x}")]
    OccurrenceOverflow(u64),
}

impl From<LeafError> for PipelineError {
    fn from(e: LeafError) -> Self {
        match e {
            LeafError::OccurrenceOverflow(hash) => PipelineError::OccurrenceOverflow(hash),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
