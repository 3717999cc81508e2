//! 置換表モジュール
//!
//! perft の部分木の結果を (ハッシュ, 残り深さ) でキャッシュする。
//!
//! - キー: ハッシュ ^ 占有 Bitboard
//! - インデックス: ハッシュの下位ビット
//! - 置換方針: 常に上書き
//!
//! `verified-tt` フィーチャーではエントリに局面のコンパクト表現を保持し、
//! ヒット時に局面の一致も確認する（ハッシュ衝突を排除する代わりにメモリを使う）。

mod table;

pub use table::HashTable;
