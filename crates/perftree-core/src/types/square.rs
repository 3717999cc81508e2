//! 升（Square）
//!
//! a1 = 0, b1 = 1, ..., h1 = 7, a2 = 8, ..., h8 = 63 の順に並べる。

use std::fmt;

/// 升（0..64）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// 升の数
    pub const NUM: usize = 64;

    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const E2: Square = Square(12);
    pub const E4: Square = Square(28);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    /// インデックスから生成（範囲外は None）
    #[inline]
    pub const fn new(index: u8) -> Option<Square> {
        if (index as usize) < Self::NUM { Some(Square(index)) } else { None }
    }

    /// 筋と段から生成（どちらも 0..8）
    #[inline]
    pub const fn from_file_rank(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 { Some(Square(rank * 8 + file)) } else { None }
    }

    /// インデックスから生成（範囲チェックなし、下位6bitのみ使用）
    #[inline]
    pub const fn from_u8_masked(index: u8) -> Square {
        Square(index & 63)
    }

    /// 筋（a=0 .. h=7）
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    /// 段（1段目=0 .. 8段目=7）
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 升を delta だけずらす（盤外なら None）
    ///
    /// 筋の回り込みは検出しないので、呼び出し側で筋差を確認すること。
    #[inline]
    pub const fn offset(self, delta: i8) -> Option<Square> {
        let idx = self.0 as i16 + delta as i16;
        if idx >= 0 && idx < Self::NUM as i16 { Some(Square(idx as u8)) } else { None }
    }

    /// 代数表記（"e4" など）から生成
    pub fn from_algebraic(s: &str) -> Option<Square> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::from_file_rank(file, rank)
    }

    /// 全升を a1 から順に列挙
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::NUM as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}
