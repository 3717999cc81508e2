//! ノード数のみを数える perft

use crate::MAX_DEPTH;
use crate::movegen::{MoveList, generate_moves};
use crate::position::Position;
use crate::tt::HashTable;
use crate::types::Move;

/// バルク計数 perft
///
/// 残り深さ1では合法手の数をそのまま返し、2以上の部分木を置換表にキャッシュする。
pub struct BulkPerft {
    table: HashTable<u64>,
}

impl BulkPerft {
    /// 置換表サイズ（MB）を指定して作成
    pub fn new(hash_mb: usize) -> Self {
        Self {
            table: HashTable::new(hash_mb),
        }
    }

    /// 置換表をクリア
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// depth 手先の末端局面数
    pub fn perft(&mut self, pos: &mut Position, depth: u32) -> u64 {
        debug_assert!(depth <= MAX_DEPTH);
        if depth == 0 {
            return 1;
        }
        if depth >= 2 {
            if let Some(nodes) = self.table.probe(pos, depth) {
                return nodes;
            }
        }

        let mut list = MoveList::new();
        generate_moves(pos, &mut list);
        if depth == 1 {
            return list.len() as u64;
        }

        let mut nodes = 0;
        for &mv in &list {
            let undo = pos.do_move(mv);
            nodes += self.perft(pos, depth - 1);
            pos.undo_move(mv, undo);
        }
        self.table.store(pos, depth, nodes);
        nodes
    }

    /// ルートの指し手ごとの末端局面数
    pub fn divide(&mut self, pos: &mut Position, depth: u32) -> Vec<(Move, u64)> {
        if depth == 0 {
            return Vec::new();
        }
        let mut list = MoveList::new();
        generate_moves(pos, &mut list);
        list.iter()
            .map(|&mv| {
                let undo = pos.do_move(mv);
                let nodes = self.perft(pos, depth - 1);
                pos.undo_move(mv, undo);
                (mv, nodes)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_startpos_shallow() {
        let mut engine = BulkPerft::new(16);
        let mut pos = Position::startpos();
        let expected = [1, 20, 400, 8902, 197_281];
        for (depth, &nodes) in expected.iter().enumerate() {
            assert_eq!(engine.perft(&mut pos, depth as u32), nodes, "depth {depth}");
        }
        assert_eq!(pos, Position::startpos());
    }

    #[test]
    fn test_bulk_divide_sums_to_perft() {
        let mut engine = BulkPerft::new(16);
        let mut pos = Position::startpos();
        let divide = engine.divide(&mut pos, 3);
        assert_eq!(divide.len(), 20);
        assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 8902);
        assert!(divide.iter().any(|(mv, n)| mv.to_uci() == "e2e4" && *n == 600));
    }

    #[test]
    fn test_bulk_cached_result_matches_after_clear() {
        let mut engine = BulkPerft::new(1);
        let mut pos = Position::startpos();
        let first = engine.perft(&mut pos, 4);
        let cached = engine.perft(&mut pos, 4);
        engine.clear();
        let fresh = engine.perft(&mut pos, 4);
        assert_eq!(first, cached);
        assert_eq!(first, fresh);
    }
}
