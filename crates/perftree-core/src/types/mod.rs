//! 基本型
//!
//! - `Color`: 手番
//! - `Square`: 升
//! - `PieceType` / `Piece`: 駒種と駒
//! - `Move` / `MoveKind`: 指し手
//! - `CastlingRights`: キャスリング権

mod castling;
mod color;
mod moves;
mod piece;
mod square;

pub use castling::CastlingRights;
pub use color::Color;
pub use moves::{Move, MoveKind};
pub use piece::{Piece, PieceType};
pub use square::Square;
