//! 指し手リスト

use crate::types::Move;

/// 1局面の合法手の最大数（理論上の最大 218 を上回る固定長）
pub const MAX_MOVES: usize = 256;

/// 指し手生成バッファ
///
/// 固定長配列でヒープ確保を避け、再帰の各深さで使い回す。
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    /// 空のMoveListを作成
    #[inline]
    pub const fn new() -> Self {
        Self {
            moves: [Move::NONE; MAX_MOVES],
            len: 0,
        }
    }

    /// 指し手の数
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// 空かどうか
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// 指し手を追加
    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES, "MoveList overflow");
        self.moves[self.len] = mv;
        self.len += 1;
    }

    /// イテレータを取得
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves[..self.len].iter()
    }

    /// スライスとして取得
    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    /// 指定された指し手が含まれているか
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    /// i番目の指し手を取得
    #[inline]
    pub fn at(&self, i: usize) -> Move {
        debug_assert!(i < self.len);
        self.moves[i]
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MoveKind, PieceType, Square};

    #[test]
    fn test_movelist_push_and_clear() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        let mv = Move::new(Square::E2, Square::E4, PieceType::Pawn, None, None, MoveKind::DoublePush);
        list.push(mv);
        assert_eq!(list.len(), 1);
        assert_eq!(list.at(0), mv);
        assert!(list.contains(mv));
        assert_eq!(list.as_slice(), &[mv]);
        list.clear();
        assert!(list.is_empty());
        assert!(!list.contains(mv));
    }
}
