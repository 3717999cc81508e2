//! perft エンジン
//!
//! - `BulkPerft`: 末端局面数
//! - `StatsPerft`: 末端の指し手の分類集計（取る手・アンパッサン・キャスリング・成り・王手・詰み）
//! - `UniquePerft`: ユニーク局面数
//!
//! 各エンジンは自分の置換表を持つ。並列実行ではワーカーごとにエンジンを作る。

mod bulk;
mod stats;
mod unique;

pub use bulk::BulkPerft;
pub use stats::{SUMMARY_FIELDS, StatsPerft, Summary, SummaryOverflow};
pub use unique::UniquePerft;
