//! 指し手（Move）
//!
//! 32bit にパックした指し手表現。
//!
//! ```text
//! bit  0..6   移動元
//! bit  6..12  移動先
//! bit 12..15  動かした駒種
//! bit 15..18  取った駒種（7 = なし）
//! bit 18..21  成り先の駒種（7 = なし）
//! bit 21..24  種別（MoveKind）
//! ```

use std::fmt;

use super::{PieceType, Square};

/// 指し手の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveKind {
    Normal = 0,
    DoublePush = 1,
    EnPassant = 2,
    CastleKing = 3,
    CastleQueen = 4,
    Promotion = 5,
}

impl MoveKind {
    #[inline]
    const fn from_u8(v: u8) -> MoveKind {
        match v {
            1 => MoveKind::DoublePush,
            2 => MoveKind::EnPassant,
            3 => MoveKind::CastleKing,
            4 => MoveKind::CastleQueen,
            5 => MoveKind::Promotion,
            _ => MoveKind::Normal,
        }
    }
}

/// 指し手
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(u32);

impl Move {
    /// 無効な指し手
    pub const NONE: Move = Move(0);

    const SQ_MASK: u32 = 0x3F;
    const PT_MASK: u32 = 0x7;
    const NO_PIECE: u32 = 7;
    const TO_SHIFT: u32 = 6;
    const PIECE_SHIFT: u32 = 12;
    const CAPTURED_SHIFT: u32 = 15;
    const PROMOTION_SHIFT: u32 = 18;
    const KIND_SHIFT: u32 = 21;

    /// 指し手を生成
    #[inline]
    pub const fn new(
        from: Square,
        to: Square,
        piece: PieceType,
        captured: Option<PieceType>,
        promotion: Option<PieceType>,
        kind: MoveKind,
    ) -> Move {
        let captured = match captured {
            Some(pt) => pt as u32,
            None => Self::NO_PIECE,
        };
        let promotion = match promotion {
            Some(pt) => pt as u32,
            None => Self::NO_PIECE,
        };
        Move(
            from.raw() as u32
                | (to.raw() as u32) << Self::TO_SHIFT
                | (piece as u32) << Self::PIECE_SHIFT
                | captured << Self::CAPTURED_SHIFT
                | promotion << Self::PROMOTION_SHIFT
                | (kind as u32) << Self::KIND_SHIFT,
        )
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_u8_masked((self.0 & Self::SQ_MASK) as u8)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_u8_masked(((self.0 >> Self::TO_SHIFT) & Self::SQ_MASK) as u8)
    }

    /// 動かした駒種
    #[inline]
    pub const fn piece(self) -> PieceType {
        match PieceType::from_u8(((self.0 >> Self::PIECE_SHIFT) & Self::PT_MASK) as u8) {
            Some(pt) => pt,
            None => PieceType::Pawn,
        }
    }

    /// 取った駒種（アンパッサンではポーン）
    #[inline]
    pub const fn captured(self) -> Option<PieceType> {
        PieceType::from_u8(((self.0 >> Self::CAPTURED_SHIFT) & Self::PT_MASK) as u8)
    }

    /// 成り先の駒種
    #[inline]
    pub const fn promotion(self) -> Option<PieceType> {
        PieceType::from_u8(((self.0 >> Self::PROMOTION_SHIFT) & Self::PT_MASK) as u8)
    }

    #[inline]
    pub const fn kind(self) -> MoveKind {
        MoveKind::from_u8(((self.0 >> Self::KIND_SHIFT) & Self::PT_MASK) as u8)
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        self.captured().is_some()
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        matches!(self.kind(), MoveKind::EnPassant)
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self.kind(), MoveKind::CastleKing | MoveKind::CastleQueen)
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        matches!(self.kind(), MoveKind::Promotion)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// UCI 表記（"e2e4", "e7e8q"）
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(pt) = self.promotion() {
            write!(f, "{}", pt.to_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self}, {:?}, {:?})", self.piece(), self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_fields() {
        let mv = Move::new(
            Square::E2,
            Square::E4,
            PieceType::Pawn,
            None,
            None,
            MoveKind::DoublePush,
        );
        assert_eq!(mv.from(), Square::E2);
        assert_eq!(mv.to(), Square::E4);
        assert_eq!(mv.piece(), PieceType::Pawn);
        assert_eq!(mv.captured(), None);
        assert_eq!(mv.promotion(), None);
        assert_eq!(mv.kind(), MoveKind::DoublePush);
        assert!(!mv.is_capture());
        assert_eq!(mv.to_uci(), "e2e4");
    }

    #[test]
    fn test_move_capture_promotion() {
        let from = Square::from_algebraic("b7").unwrap();
        let to = Square::from_algebraic("a8").unwrap();
        let mv = Move::new(
            from,
            to,
            PieceType::Pawn,
            Some(PieceType::Rook),
            Some(PieceType::Knight),
            MoveKind::Promotion,
        );
        assert!(mv.is_capture());
        assert!(mv.is_promotion());
        assert_eq!(mv.captured(), Some(PieceType::Rook));
        assert_eq!(mv.promotion(), Some(PieceType::Knight));
        assert_eq!(mv.to_uci(), "b7a8n");
    }

    #[test]
    fn test_move_castle_flags() {
        let mv = Move::new(
            Square::E1,
            Square::G1,
            PieceType::King,
            None,
            None,
            MoveKind::CastleKing,
        );
        assert!(mv.is_castle());
        assert!(!mv.is_en_passant());
        assert_ne!(mv, Move::NONE);
    }
}
