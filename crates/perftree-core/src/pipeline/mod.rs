//! 末端局面の外部ソート・マージ
//!
//! メモリに収まらない末端局面集合を、ディスク上の2パスで重複除去して初出順に並べる。
//!
//! - フェーズA `generate_batches`: フロンティアを並列展開し、ハッシュ順バッチファイルを書き出す
//! - フェーズB `external_merge_sort`: バッチ群をハッシュで k-way マージし、同一局面の出現回数を合計
//! - フェーズC `sort_merged_file_by_order`: 初出順に並べ直し、order を振り直して分割出力
//!
//! ファイル形式は全て「u32 レコード数ヘッダ + 固定長レコード列」（リトルエンディアン）。

mod error;
mod file;
mod generate;
mod merge;
mod record;
mod reorder;

pub use error::{PipelineError, PipelineResult};
pub use file::{BatchWriter, RecordReader, RecordWriter, read_records, write_batch, write_records};
pub use generate::{BatchOptions, DEFAULT_BATCH_SIZE, batch_file_name, generate_batches, launch_frontier};
pub use merge::external_merge_sort;
pub use record::{BoardRecord, OrderedRecord, Record};
pub use reorder::{output_file_name, sort_merged_file_by_order};
