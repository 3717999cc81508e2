//! 駒種（PieceType）と駒（Piece）

use super::Color;

/// 駒種
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    /// 駒種の数
    pub const NUM: usize = 6;

    /// 全駒種
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// 成り先として選べる駒種（生成順）
    pub const PROMOTIONS: [PieceType; 4] =
        [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 数値から生成（0..6 以外は None）
    #[inline]
    pub const fn from_u8(v: u8) -> Option<PieceType> {
        match v {
            0 => Some(PieceType::Pawn),
            1 => Some(PieceType::Knight),
            2 => Some(PieceType::Bishop),
            3 => Some(PieceType::Rook),
            4 => Some(PieceType::Queen),
            5 => Some(PieceType::King),
            _ => None,
        }
    }

    /// 小文字の駒文字（UCI の成り表記にも使う）
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }
}

/// 駒（手番付き）
///
/// 0 = 駒なし、1..=6 = 白のポーン..キング、7..=12 = 黒のポーン..キング。
/// コンパクト表現のニブル値と一致する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Piece(u8);

impl Piece {
    /// 駒なし
    pub const NONE: Piece = Piece(0);

    /// 駒値の種類数（NONE を含む）
    pub const NUM: usize = 13;

    #[inline]
    pub const fn new(color: Color, pt: PieceType) -> Piece {
        Piece(1 + color as u8 * 6 + pt as u8)
    }

    /// 数値から生成（1..=12 以外は None）
    #[inline]
    pub const fn from_u8(v: u8) -> Option<Piece> {
        if v >= 1 && v <= 12 { Some(Piece(v)) } else { None }
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// 手番（NONE に対しては呼ばないこと）
    #[inline]
    pub const fn color(self) -> Color {
        if self.0 >= 7 { Color::Black } else { Color::White }
    }

    /// 駒種（NONE に対しては呼ばないこと）
    #[inline]
    pub const fn piece_type(self) -> PieceType {
        match PieceType::from_u8((self.0.wrapping_sub(1)) % 6) {
            Some(pt) => pt,
            None => PieceType::Pawn,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// FEN の駒文字から生成（白は大文字、黒は小文字）
    pub fn from_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        let pt = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some(Piece::new(color, pt))
    }

    /// FEN の駒文字
    pub fn to_char(self) -> char {
        if self.is_none() {
            return '.';
        }
        let c = self.piece_type().to_char();
        match self.color() {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_encoding() {
        assert_eq!(Piece::new(Color::White, PieceType::Pawn).raw(), 1);
        assert_eq!(Piece::new(Color::White, PieceType::King).raw(), 6);
        assert_eq!(Piece::new(Color::Black, PieceType::Pawn).raw(), 7);
        assert_eq!(Piece::new(Color::Black, PieceType::King).raw(), 12);
    }

    #[test]
    fn test_piece_color_and_type() {
        for color in [Color::White, Color::Black] {
            for pt in PieceType::ALL {
                let pc = Piece::new(color, pt);
                assert_eq!(pc.color(), color);
                assert_eq!(pc.piece_type(), pt);
            }
        }
    }

    #[test]
    fn test_piece_chars() {
        for c in "PNBRQKpnbrqk".chars() {
            let pc = Piece::from_char(c).unwrap();
            assert_eq!(pc.to_char(), c);
        }
        assert!(Piece::from_char('x').is_none());
        assert_eq!(Piece::from_u8(13), None);
        assert_eq!(Piece::from_u8(0), None);
    }
}
