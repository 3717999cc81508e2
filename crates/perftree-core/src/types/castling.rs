//! キャスリング権

use std::fmt;

use super::{Color, Square};

/// キャスリング権（4bit）
///
/// bit0 = 白キングサイド、bit1 = 白クイーンサイド、
/// bit2 = 黒キングサイド、bit3 = 黒クイーンサイド。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KING: CastlingRights = CastlingRights(1);
    pub const WHITE_QUEEN: CastlingRights = CastlingRights(2);
    pub const BLACK_KING: CastlingRights = CastlingRights(4);
    pub const BLACK_QUEEN: CastlingRights = CastlingRights(8);
    pub const ALL: CastlingRights = CastlingRights(15);

    /// 組み合わせの数（Zobrist テーブル用）
    pub const NUM: usize = 16;

    /// 下位4bitから生成
    #[inline]
    pub const fn from_bits(bits: u8) -> CastlingRights {
        CastlingRights(bits & 15)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: CastlingRights) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: CastlingRights) {
        self.0 |= other.0;
    }

    /// mask で指定された権利だけを残す
    #[inline]
    pub fn retain(&mut self, mask: CastlingRights) {
        self.0 &= mask.0;
    }

    /// 手番側のキングサイド権
    #[inline]
    pub const fn king_side(color: Color) -> CastlingRights {
        match color {
            Color::White => Self::WHITE_KING,
            Color::Black => Self::BLACK_KING,
        }
    }

    /// 手番側のクイーンサイド権
    #[inline]
    pub const fn queen_side(color: Color) -> CastlingRights {
        match color {
            Color::White => Self::WHITE_QUEEN,
            Color::Black => Self::BLACK_QUEEN,
        }
    }

    /// 駒がこの升から動く/この升で取られたときに残る権利のマスク
    #[inline]
    pub const fn mask_for(sq: Square) -> CastlingRights {
        CastlingRights(CASTLING_MASK[sq.index()])
    }

    /// FEN のキャスリング欄を解析
    pub fn from_fen(s: &str) -> Option<CastlingRights> {
        if s == "-" {
            return Some(CastlingRights::NONE);
        }
        let mut rights = CastlingRights::NONE;
        for c in s.chars() {
            let r = match c {
                'K' => Self::WHITE_KING,
                'Q' => Self::WHITE_QUEEN,
                'k' => Self::BLACK_KING,
                'q' => Self::BLACK_QUEEN,
                _ => return None,
            };
            if rights.contains(r) {
                return None;
            }
            rights.insert(r);
        }
        if rights.is_empty() { None } else { Some(rights) }
    }
}

const CASTLING_MASK: [u8; 64] = {
    let mut table = [15u8; 64];
    table[Square::E1.index()] = 15 & !3;
    table[Square::H1.index()] = 15 & !1;
    table[Square::A1.index()] = 15 & !2;
    table[Square::E8.index()] = 15 & !12;
    table[Square::H8.index()] = 15 & !4;
    table[Square::A8.index()] = 15 & !8;
    table
};

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (right, c) in [
            (Self::WHITE_KING, 'K'),
            (Self::WHITE_QUEEN, 'Q'),
            (Self::BLACK_KING, 'k'),
            (Self::BLACK_QUEEN, 'q'),
        ] {
            if self.contains(right) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}
