//! ビットボードモジュール
//!
//! 64マスの盤面を64bitで表現し、高速なビット演算を提供する。
//!
//! - `Bitboard`: 64bit盤面表現
//! - 利き計算テーブル
//! - 飛び駒の利き計算

mod core;
mod sliders;
mod tables;

pub use self::core::Bitboard;
pub use self::core::BitboardIter;
pub use sliders::*;
pub use tables::{
    KING_ATTACKS, KNIGHT_ATTACKS, PAWN_ATTACKS, aligned, between_bb, king_attacks,
    knight_attacks, line_bb, pawn_attacks,
};
