//! 局面モジュール
//!
//! - `Position`: 盤面状態と指し手の適用・取り消し
//! - FEN の読み書き
//! - Zobristハッシュ
//! - 26バイトのコンパクト表現（`codec`）

mod board;
pub mod codec;
mod fen;
mod zobrist;

pub use board::{Position, PositionError, UndoInfo};
pub use codec::{COMPACT_BOARD_SIZE, CodecError, CompactBoard};
pub use fen::{FenError, START_FEN};
pub use zobrist::{ZOBRIST, Zobrist, zobrist_castling, zobrist_en_passant, zobrist_psq, zobrist_side};

pub(crate) use board::castling_rook_squares;
