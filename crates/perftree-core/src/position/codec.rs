//! 局面のコンパクト表現（26バイト）
//!
//! ```text
//! byte  0..16  駒のニブル（占有升を a1 から昇順に、下位ニブルが先）
//!              1..=6 = 白ポーン..キング、7..=12 = 黒ポーン..キング
//! byte 16..24  占有 Bitboard（リトルエンディアン）
//! byte 24      bit0..3 = キャスリング権、bit7 = 黒番
//! byte 25      アンパッサンの筋（0..=7、なしは 8）
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::board::{Position, PositionError};
use crate::bitboard::Bitboard;
use crate::types::{CastlingRights, Color, Piece};

/// コンパクト表現のバイト数
pub const COMPACT_BOARD_SIZE: usize = 26;

/// コンパクト表現
pub type CompactBoard = [u8; COMPACT_BOARD_SIZE];

const OCCUPANCY_OFFSET: usize = 16;
const FLAGS_OFFSET: usize = 24;
const EP_OFFSET: usize = 25;
const BLACK_TO_MOVE: u8 = 0x80;
const NO_EP_FILE: u8 = 8;

/// デコードエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("too many occupied squares: {0}")]
    TooManyPieces(u32),
    #[error("invalid piece nibble {0} at index {1}")]
    InvalidPiece(u8, usize),
    #[error("invalid en passant byte: {0}")]
    InvalidEnPassant(u8),
    #[error("invalid base64 board: {0}")]
    Base64(String),
    #[error("decoded board must be {COMPACT_BOARD_SIZE} bytes, got {0}")]
    Length(usize),
    #[error("invalid position: {0}")]
    Invalid(#[from] PositionError),
}

/// 局面をコンパクト表現にする（アンパッサン筋は局面が持つ値のまま）
pub fn serialize(pos: &Position) -> CompactBoard {
    encode(pos, pos.ep_file())
}

/// 実際に指せないアンパッサン筋を落としてコンパクト表現にする
pub fn serialize_normalized(pos: &Position) -> CompactBoard {
    encode(pos, pos.executable_ep_file())
}

fn encode(pos: &Position, ep_file: Option<u8>) -> CompactBoard {
    let mut out = [0u8; COMPACT_BOARD_SIZE];
    let occupied = pos.occupied();
    for (i, sq) in occupied.iter().enumerate() {
        let nibble = pos.piece_on(sq).raw();
        out[i / 2] |= if i % 2 == 0 { nibble } else { nibble << 4 };
    }
    out[OCCUPANCY_OFFSET..FLAGS_OFFSET].copy_from_slice(&occupied.bits().to_le_bytes());
    let mut flags = pos.castling_rights().bits();
    if pos.side_to_move() == Color::Black {
        flags |= BLACK_TO_MOVE;
    }
    out[FLAGS_OFFSET] = flags;
    out[EP_OFFSET] = ep_file.unwrap_or(NO_EP_FILE);
    out
}

/// コンパクト表現から局面を復元（手数は 0 と 1）
pub fn deserialize(bytes: &CompactBoard) -> Result<Position, CodecError> {
    let mut occ_bytes = [0u8; 8];
    occ_bytes.copy_from_slice(&bytes[OCCUPANCY_OFFSET..FLAGS_OFFSET]);
    let occupied = Bitboard::new(u64::from_le_bytes(occ_bytes));
    if occupied.count() > 32 {
        return Err(CodecError::TooManyPieces(occupied.count()));
    }

    let mut pos = Position::empty();
    for (i, sq) in occupied.iter().enumerate() {
        let byte = bytes[i / 2];
        let nibble = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };
        let pc = Piece::from_u8(nibble).ok_or(CodecError::InvalidPiece(nibble, i))?;
        pos.put_piece(pc, sq);
    }

    let flags = bytes[FLAGS_OFFSET];
    pos.set_castling_rights(CastlingRights::from_bits(flags));
    pos.set_side_to_move(if flags & BLACK_TO_MOVE != 0 { Color::Black } else { Color::White });

    let ep = bytes[EP_OFFSET];
    match ep {
        0..=7 => pos.set_ep_file(Some(ep)),
        NO_EP_FILE => pos.set_ep_file(None),
        _ => return Err(CodecError::InvalidEnPassant(ep)),
    }

    pos.finish_setup()?;
    Ok(pos)
}

/// コンパクト表現を base64 文字列にする
pub fn to_base64(board: &CompactBoard) -> String {
    STANDARD.encode(board)
}

/// base64 文字列からコンパクト表現を取り出す
pub fn from_base64(text: &str) -> Result<CompactBoard, CodecError> {
    let bytes = STANDARD.decode(text.trim()).map_err(|e| CodecError::Base64(e.to_string()))?;
    bytes.as_slice().try_into().map_err(|_| CodecError::Length(bytes.len()))
}
