//! タスク配布と結果提出のバイナリ形式
//!
//! - 圧縮統計ベクトル（15要素、チェックサム付き）
//! - タスク記述子リスト
//! - 統計結果バッチ・高速（ノード数）結果バッチ
//!
//! 数値は全てリトルエンディアン。ペイロードの不足はエラーにする。

mod error;
mod results;
mod stats_vector;
mod tasks;
mod wire;

pub use error::{ProtocolError, ProtocolResult};
pub use results::{
    FastResultBatch, FullResultBatch, WorkerHeader, decode_fast_results, decode_full_results,
    encode_fast_results, encode_full_results,
};
pub use stats_vector::{STATS_VECTOR_LEN, compress_summary, decompress_summary};
pub use tasks::{TaskDescriptor, decode_tasks, encode_tasks, parse_board};
