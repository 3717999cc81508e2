//! 飛び駒（ビショップ・ルーク・クイーン）の利き計算
//!
//! 方向ごとの ray と最初の遮蔽駒から利きを求める古典的な方式。

use super::tables::{POSITIVE_DIRECTION, RAYS};
use super::Bitboard;
use crate::types::Square;

#[inline]
fn ray_attacks(dir: usize, sq: Square, occupied: Bitboard) -> Bitboard {
    let ray = RAYS[dir][sq.index()];
    let blockers = ray & occupied;
    if blockers.is_empty() {
        return ray;
    }
    let first = if POSITIVE_DIRECTION[dir] {
        blockers.lsb_unchecked()
    } else {
        blockers.msb_unchecked()
    };
    ray ^ RAYS[dir][first.index()]
}

/// ルークの利き
#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(0, sq, occupied)
        | ray_attacks(1, sq, occupied)
        | ray_attacks(2, sq, occupied)
        | ray_attacks(3, sq, occupied)
}

/// ビショップの利き
#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(4, sq, occupied)
        | ray_attacks(5, sq, occupied)
        | ray_attacks(6, sq, occupied)
        | ray_attacks(7, sq, occupied)
}

/// クイーンの利き
#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

/// 盤上に駒がないときのルークの利き
#[inline]
pub fn rook_pseudo_attacks(sq: Square) -> Bitboard {
    rook_attacks(sq, Bitboard::EMPTY)
}

/// 盤上に駒がないときのビショップの利き
#[inline]
pub fn bishop_pseudo_attacks(sq: Square) -> Bitboard {
    bishop_attacks(sq, Bitboard::EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn test_rook_attacks_empty_board() {
        assert_eq!(rook_pseudo_attacks(sq("a1")).count(), 14);
        assert_eq!(rook_pseudo_attacks(sq("e4")).count(), 14);
    }

    #[test]
    fn test_rook_attacks_blocked() {
        let occ = Bitboard::from_square(sq("a4")) | Bitboard::from_square(sq("c1"));
        let att = rook_attacks(sq("a1"), occ);
        // a2, a3, a4 と b1, c1
        assert_eq!(att.count(), 5);
        assert!(att.contains(sq("a4")));
        assert!(!att.contains(sq("a5")));
        assert!(att.contains(sq("c1")));
        assert!(!att.contains(sq("d1")));
    }

    #[test]
    fn test_bishop_attacks_blocked() {
        assert_eq!(bishop_pseudo_attacks(sq("d4")).count(), 13);
        let occ = Bitboard::from_square(sq("f6")) | Bitboard::from_square(sq("b2"));
        let att = bishop_attacks(sq("d4"), occ);
        assert!(att.contains(sq("f6")));
        assert!(!att.contains(sq("g7")));
        assert!(att.contains(sq("b2")));
        assert!(!att.contains(sq("a1")));
        assert!(att.contains(sq("a7")));
        assert!(att.contains(sq("g1")));
    }

    #[test]
    fn test_queen_attacks() {
        assert_eq!(queen_attacks(sq("d4"), Bitboard::EMPTY).count(), 27);
    }
}
