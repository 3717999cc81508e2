//! perftree コアライブラリ
//!
//! チェスの perft（合法手列挙）を大規模に分散実行するための列挙・重複除去エンジン。
//!
//! - `types`: 手番・升・駒・指し手・キャスリング権
//! - `bitboard`: 64bit盤面表現と利きテーブル
//! - `position`: 局面、FEN、Zobristハッシュ、26バイトのコンパクト表現
//! - `movegen`: 合法手生成
//! - `tt`: 深さ付き置換表
//! - `perft`: バルク計数・統計・ユニーク局面の3種類の perft
//! - `leaf`: 末端局面の列挙と集約
//! - `pipeline`: 末端局面バッチの外部ソート・マージ
//! - `protocol`: タスク記述子と結果バッチのバイナリ形式
//! - `task`: 統計タスクのサブタスク分割と実行

pub mod bitboard;
pub mod leaf;
pub mod movegen;
pub mod perft;
pub mod pipeline;
pub mod position;
pub mod protocol;
pub mod task;
pub mod tt;
pub mod types;

/// perft の最大探索深さ
pub const MAX_DEPTH: u32 = 32;
