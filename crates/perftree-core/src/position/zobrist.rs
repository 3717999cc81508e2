//! Zobristハッシュ
//!
//! キーは Polyglot 形式のオープニングブックと同じ値を使う（`shakmaty::zobrist` の表）。
//! 手番キーは Polyglot に合わせて白番のときに XOR する。

use std::sync::LazyLock;

use shakmaty::zobrist::{Zobrist64, ZobristValue};
use shakmaty::{CastlingSide, File};

use crate::types::{CastlingRights, Color, Piece, PieceType, Square};

/// Zobristハッシュ用キーテーブル
pub struct Zobrist {
    /// 駒×升 [Piece.index()][Square.index()]（Piece::NONE の行は常に0）
    pub psq: [[u64; Square::NUM]; Piece::NUM],
    /// キャスリング権 [CastlingRights.index()]（立っているビットのキーの XOR）
    pub castling: [u64; CastlingRights::NUM],
    /// アンパッサン可能な筋 [筋]
    pub en_passant: [u64; 8],
    /// 白番のときに XOR するキー
    pub side: u64,
}

fn polyglot_color(color: Color) -> shakmaty::Color {
    match color {
        Color::White => shakmaty::Color::White,
        Color::Black => shakmaty::Color::Black,
    }
}

fn polyglot_role(pt: PieceType) -> shakmaty::Role {
    match pt {
        PieceType::Pawn => shakmaty::Role::Pawn,
        PieceType::Knight => shakmaty::Role::Knight,
        PieceType::Bishop => shakmaty::Role::Bishop,
        PieceType::Rook => shakmaty::Role::Rook,
        PieceType::Queen => shakmaty::Role::Queen,
        PieceType::King => shakmaty::Role::King,
    }
}

impl Zobrist {
    /// テーブル初期化
    pub fn init() -> Self {
        let mut zobrist = Zobrist {
            psq: [[0; Square::NUM]; Piece::NUM],
            castling: [0; CastlingRights::NUM],
            en_passant: [0; 8],
            side: Zobrist64::zobrist_for_white_turn().0,
        };

        // 駒×升（Piece::NONE の行は 0 のまま）
        for color in [Color::White, Color::Black] {
            for pt in PieceType::ALL {
                let piece = shakmaty::Piece {
                    color: polyglot_color(color),
                    role: polyglot_role(pt),
                };
                let row = &mut zobrist.psq[Piece::new(color, pt).index()];
                for (sq, key) in row.iter_mut().enumerate() {
                    *key = Zobrist64::zobrist_for_piece(shakmaty::Square::new(sq as u32), piece).0;
                }
            }
        }

        // キャスリング権は1bitずつのキーから16通りの組み合わせを展開
        let bit_keys = [
            (CastlingRights::WHITE_KING, shakmaty::Color::White, CastlingSide::KingSide),
            (CastlingRights::WHITE_QUEEN, shakmaty::Color::White, CastlingSide::QueenSide),
            (CastlingRights::BLACK_KING, shakmaty::Color::Black, CastlingSide::KingSide),
            (CastlingRights::BLACK_QUEEN, shakmaty::Color::Black, CastlingSide::QueenSide),
        ]
        .map(|(right, color, side)| (right, Zobrist64::zobrist_for_castling_right(color, side).0));
        for (index, key) in zobrist.castling.iter_mut().enumerate() {
            let rights = CastlingRights::from_bits(index as u8);
            *key = bit_keys
                .iter()
                .filter(|(right, _)| rights.contains(*right))
                .fold(0, |acc, (_, k)| acc ^ k);
        }

        for (file, key) in zobrist.en_passant.iter_mut().enumerate() {
            *key = Zobrist64::zobrist_for_en_passant_file(File::new(file as u32)).0;
        }

        zobrist
    }
}

/// グローバルZobristテーブル
pub static ZOBRIST: LazyLock<Zobrist> = LazyLock::new(Zobrist::init);

/// 駒と升のハッシュを取得
#[inline]
pub fn zobrist_psq(pc: Piece, sq: Square) -> u64 {
    ZOBRIST.psq[pc.index()][sq.index()]
}

/// キャスリング権のハッシュを取得
#[inline]
pub fn zobrist_castling(rights: CastlingRights) -> u64 {
    ZOBRIST.castling[rights.index()]
}

/// アンパッサン筋のハッシュを取得
#[inline]
pub fn zobrist_en_passant(file: u8) -> u64 {
    ZOBRIST.en_passant[file as usize & 7]
}

/// 手番のハッシュを取得
#[inline]
pub fn zobrist_side() -> u64 {
    ZOBRIST.side
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_zobrist_keys_unique() {
        let mut seen = HashSet::new();
        for pc in 1..Piece::NUM {
            for sq in 0..Square::NUM {
                assert!(seen.insert(ZOBRIST.psq[pc][sq]));
            }
        }
        for file in 0..8 {
            assert!(seen.insert(ZOBRIST.en_passant[file]));
        }
        assert!(seen.insert(ZOBRIST.side));
        assert!(!seen.contains(&0));
    }

    #[test]
    fn test_zobrist_none_row_is_zero() {
        assert!(ZOBRIST.psq[0].iter().all(|&k| k == 0));
        assert_eq!(zobrist_castling(CastlingRights::NONE), 0);
    }

    #[test]
    fn test_zobrist_castling_combination() {
        let k = zobrist_castling(CastlingRights::WHITE_KING);
        let q = zobrist_castling(CastlingRights::BLACK_QUEEN);
        let both = zobrist_castling(CastlingRights::from_bits(1 | 8));
        assert_eq!(k ^ q, both);
    }

    #[test]
    fn test_zobrist_polyglot_keys() {
        // Polyglot の Random64 表の先頭（黒ポーン a1）、白番キー、白のキング側キャスリング
        let pc = Piece::new(Color::Black, PieceType::Pawn);
        assert_eq!(zobrist_psq(pc, Square::A1), 0x9d39_247e_3377_6d41);
        assert_eq!(zobrist_side(), 0xf8d6_26aa_af27_8509);
        assert_eq!(zobrist_castling(CastlingRights::WHITE_KING), 0x31d7_1dce_64b2_c310);
    }
}
