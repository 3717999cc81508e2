//! 利きテーブル（コンパイル時に生成）

use super::Bitboard;
use crate::types::{Color, Square};

/// 方向（筋の増分, 段の増分）
///
/// 0..4 が飛車方向（北・南・東・西）、4..8 が角方向（北東・南西・北西・南東）。
/// `dir ^ 1` が逆方向になるように並べている。
pub(crate) const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
];

/// 升番号が増える向きの方向か（最初の遮蔽駒を lsb で取れる）
pub(crate) const POSITIVE_DIRECTION: [bool; 8] = [true, false, true, false, true, false, true, false];

const KNIGHT_DELTAS: [(i8, i8); 8] =
    [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];

const KING_DELTAS: [(i8, i8); 8] =
    [(0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1)];

const fn offset_square(sq: usize, df: i8, dr: i8) -> Option<usize> {
    let file = (sq % 8) as i8 + df;
    let rank = (sq / 8) as i8 + dr;
    if file >= 0 && file < 8 && rank >= 0 && rank < 8 {
        Some((rank * 8 + file) as usize)
    } else {
        None
    }
}

const fn leaper_table(deltas: &[(i8, i8); 8]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let mut bits = 0u64;
        let mut i = 0;
        while i < 8 {
            if let Some(to) = offset_square(sq, deltas[i].0, deltas[i].1) {
                bits |= 1u64 << to;
            }
            i += 1;
        }
        table[sq] = Bitboard::new(bits);
        sq += 1;
    }
    table
}

const fn pawn_table() -> [[Bitboard; 64]; Color::NUM] {
    let mut table = [[Bitboard::EMPTY; 64]; Color::NUM];
    let mut sq = 0;
    while sq < 64 {
        let mut white = 0u64;
        let mut black = 0u64;
        if let Some(to) = offset_square(sq, -1, 1) {
            white |= 1u64 << to;
        }
        if let Some(to) = offset_square(sq, 1, 1) {
            white |= 1u64 << to;
        }
        if let Some(to) = offset_square(sq, -1, -1) {
            black |= 1u64 << to;
        }
        if let Some(to) = offset_square(sq, 1, -1) {
            black |= 1u64 << to;
        }
        table[Color::White.index()][sq] = Bitboard::new(white);
        table[Color::Black.index()][sq] = Bitboard::new(black);
        sq += 1;
    }
    table
}

const fn ray_table() -> [[Bitboard; 64]; 8] {
    let mut table = [[Bitboard::EMPTY; 64]; 8];
    let mut dir = 0;
    while dir < 8 {
        let mut sq = 0;
        while sq < 64 {
            let mut bits = 0u64;
            let mut cur = sq;
            while let Some(next) = offset_square(cur, DIRECTIONS[dir].0, DIRECTIONS[dir].1) {
                bits |= 1u64 << next;
                cur = next;
            }
            table[dir][sq] = Bitboard::new(bits);
            sq += 1;
        }
        dir += 1;
    }
    table
}

/// 2升間の関係テーブル（between: 両端を含まない、line: 両端を含む直線全体）
const fn between_line_tables() -> ([[Bitboard; 64]; 64], [[Bitboard; 64]; 64]) {
    let rays = ray_table();
    let mut between = [[Bitboard::EMPTY; 64]; 64];
    let mut line = [[Bitboard::EMPTY; 64]; 64];
    let mut from = 0;
    while from < 64 {
        let mut dir = 0;
        while dir < 8 {
            let (df, dr) = DIRECTIONS[dir];
            let mut path = 0u64;
            let mut cur = from;
            while let Some(next) = offset_square(cur, df, dr) {
                between[from][next] = Bitboard::new(path);
                // 直線全体 = 両方向の ray + 自分
                let back = rays[dir ^ 1][from].bits();
                line[from][next] = Bitboard::new(rays[dir][from].bits() | back | 1u64 << from);
                path |= 1u64 << next;
                cur = next;
            }
            dir += 1;
        }
        from += 1;
    }
    (between, line)
}

/// ナイトの利き [升]
pub static KNIGHT_ATTACKS: [Bitboard; 64] = leaper_table(&KNIGHT_DELTAS);

/// キングの利き [升]
pub static KING_ATTACKS: [Bitboard; 64] = leaper_table(&KING_DELTAS);

/// ポーンの取りの利き [手番][升]
pub static PAWN_ATTACKS: [[Bitboard; 64]; Color::NUM] = pawn_table();

/// 方向ごとの盤端までの ray [方向][升]（始点を含まない）
pub(crate) static RAYS: [[Bitboard; 64]; 8] = ray_table();

static BETWEEN_LINE: ([[Bitboard; 64]; 64], [[Bitboard; 64]; 64]) = between_line_tables();

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index()]
}

/// color 側のポーンが sq から利く升
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.index()]
}

/// 2升の間の升（両端を含まない、同一直線上でなければ空）
#[inline]
pub fn between_bb(a: Square, b: Square) -> Bitboard {
    BETWEEN_LINE.0[a.index()][b.index()]
}

/// 2升を通る直線全体（同一直線上でなければ空）
#[inline]
pub fn line_bb(a: Square, b: Square) -> Bitboard {
    BETWEEN_LINE.1[a.index()][b.index()]
}

/// 3升が同一直線上にあるか
#[inline]
pub fn aligned(a: Square, b: Square, c: Square) -> bool {
    line_bb(a, b).contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn test_knight_attacks() {
        assert_eq!(knight_attacks(sq("a1")).count(), 2);
        assert_eq!(knight_attacks(sq("d4")).count(), 8);
        assert!(knight_attacks(sq("g1")).contains(sq("f3")));
        assert!(knight_attacks(sq("g1")).contains(sq("h3")));
        assert!(knight_attacks(sq("g1")).contains(sq("e2")));
    }

    #[test]
    fn test_king_attacks() {
        assert_eq!(king_attacks(sq("a1")).count(), 3);
        assert_eq!(king_attacks(sq("e4")).count(), 8);
        assert_eq!(king_attacks(sq("h5")).count(), 5);
    }

    #[test]
    fn test_pawn_attacks() {
        let w = pawn_attacks(Color::White, sq("e4"));
        assert!(w.contains(sq("d5")) && w.contains(sq("f5")));
        assert_eq!(w.count(), 2);
        let b = pawn_attacks(Color::Black, sq("a5"));
        assert_eq!(b, Bitboard::from_square(sq("b4")));
    }

    #[test]
    fn test_between_and_line() {
        let b = between_bb(sq("a1"), sq("d4"));
        assert_eq!(b.count(), 2);
        assert!(b.contains(sq("b2")) && b.contains(sq("c3")));
        assert!(between_bb(sq("a1"), sq("b3")).is_empty());
        assert!(between_bb(sq("e1"), sq("e2")).is_empty());
        assert_eq!(between_bb(sq("h1"), sq("a1")).count(), 6);
        assert_eq!(line_bb(sq("c3"), sq("e5")).count(), 8);
        assert!(line_bb(sq("a1"), sq("b3")).is_empty());
        assert!(aligned(sq("e1"), sq("e4"), sq("e8")));
        assert!(!aligned(sq("e1"), sq("e4"), sq("d8")));
    }
}
