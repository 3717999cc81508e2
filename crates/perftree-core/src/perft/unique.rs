//! ユニーク局面数を数える perft

use std::collections::HashSet;

use crate::MAX_DEPTH;
use crate::movegen::{MoveList, generate_moves};
use crate::position::Position;
use crate::tt::HashTable;

/// ユニーク perft
///
/// 末端局面の正規化ハッシュを集合に集め、その大きさを返す。
/// 同じ (ハッシュ, 残り深さ) の部分木は末端集合が同一なので、置換表で2回目以降を飛ばす。
pub struct UniquePerft {
    table: HashTable<()>,
    seen: HashSet<u64>,
}

impl UniquePerft {
    /// 置換表サイズ（MB）を指定して作成
    pub fn new(hash_mb: usize) -> Self {
        Self {
            table: HashTable::new(hash_mb),
            seen: HashSet::new(),
        }
    }

    /// 置換表と集合をクリア
    pub fn clear(&mut self) {
        self.table.clear();
        self.seen.clear();
    }

    /// depth 手ちょうどで到達するユニーク局面の数（depth 0 は 0）
    pub fn count(&mut self, pos: &mut Position, depth: u32) -> u64 {
        debug_assert!(depth <= MAX_DEPTH);
        self.clear();
        if depth == 0 {
            return 0;
        }
        self.visit(pos, depth);
        log::debug!("unique perft depth {depth}: {} positions", self.seen.len());
        self.seen.len() as u64
    }

    fn visit(&mut self, pos: &mut Position, depth: u32) {
        if depth == 0 {
            self.seen.insert(pos.normalized_hash());
            return;
        }
        if self.table.probe(pos, depth).is_some() {
            return;
        }

        let mut list = MoveList::new();
        generate_moves(pos, &mut list);
        for &mv in &list {
            let undo = pos.do_move(mv);
            self.visit(pos, depth - 1);
            pos.undo_move(mv, undo);
        }
        self.table.store(pos, depth, ());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_startpos_shallow() {
        let mut engine = UniquePerft::new(16);
        let mut pos = Position::startpos();
        let expected = [0, 20, 400, 5362];
        for (depth, &count) in expected.iter().enumerate() {
            assert_eq!(engine.count(&mut pos, depth as u32), count, "depth {depth}");
        }
        assert_eq!(pos, Position::startpos());
    }

    #[test]
    fn test_unique_is_repeatable() {
        let mut engine = UniquePerft::new(1);
        let mut pos = Position::startpos();
        let first = engine.count(&mut pos, 3);
        assert_eq!(engine.count(&mut pos, 3), first);
    }
}
