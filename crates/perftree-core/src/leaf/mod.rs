//! 末端局面の列挙と集約
//!
//! - `generate_leaf_nodes`: 重複を含めた末端局面の列挙
//! - `LeafAccumulator`: 正規化ハッシュごとにコンパクト表現・初出順・出現回数を集約
//! - `compressed_unique_leaf_nodes`: 末端局面を LeafAccumulator に集約

use std::collections::HashMap;

use thiserror::Error;

use crate::movegen::{MoveList, generate_moves};
use crate::pipeline::BoardRecord;
use crate::position::{CompactBoard, Position, codec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LeafError {
    #[error("occurrence count overflow for hash {0:016x}")]
    OccurrenceOverflow(u64),
}

pub type LeafResult<T> = Result<T, LeafError>;

/// depth 手ちょうどの末端局面を全て列挙（重複除去なし、depth 0 は空）
pub fn generate_leaf_nodes(pos: &mut Position, depth: u32) -> Vec<Position> {
    let mut leaves = Vec::new();
    if depth > 0 {
        collect_leaves(pos, depth, &mut leaves);
    }
    leaves
}

fn collect_leaves(pos: &mut Position, depth: u32, leaves: &mut Vec<Position>) {
    if depth == 0 {
        leaves.push(pos.clone());
        return;
    }
    let mut list = MoveList::new();
    generate_moves(pos, &mut list);
    for &mv in &list {
        let undo = pos.do_move(mv);
        collect_leaves(pos, depth - 1, leaves);
        pos.undo_move(mv, undo);
    }
}

/// 集約エントリ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafEntry {
    pub board: CompactBoard,
    /// 初出順（0 から連番）
    pub order: u64,
    pub occurrences: u32,
}

/// 末端局面の集約器
///
/// 初めて見たハッシュには `order = next_order` を振り、以降の訪問では出現回数を加算する。
#[derive(Debug)]
pub struct LeafAccumulator {
    entries: HashMap<u64, LeafEntry>,
    next_order: u64,
    occurrences: u32,
}

impl LeafAccumulator {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_order: 0,
            occurrences: 1,
        }
    }

    /// 以降の visit で加算する出現回数（親局面の出現回数）
    pub fn set_occurrences(&mut self, occurrences: u32) {
        self.occurrences = occurrences;
    }

    /// 局面を記録（出現回数が u32 を超えるとエラー）
    pub fn visit(&mut self, pos: &Position) -> LeafResult<()> {
        let occurrences = self.occurrences;
        let hash = pos.normalized_hash();
        match self.entries.get_mut(&hash) {
            Some(entry) => add_occurrences(entry, hash, occurrences),
            None => {
                let board = codec::serialize_normalized(pos);
                self.insert_new(hash, board, occurrences);
                Ok(())
            }
        }
    }

    /// 他の集約結果を取り込む（出現回数は加算、初出順はこちらで振り直す）
    pub fn absorb(&mut self, hash: u64, board: CompactBoard, occurrences: u32) -> LeafResult<()> {
        match self.entries.get_mut(&hash) {
            Some(entry) => add_occurrences(entry, hash, occurrences),
            None => {
                self.insert_new(hash, board, occurrences);
                Ok(())
            }
        }
    }

    fn insert_new(&mut self, hash: u64, board: CompactBoard, occurrences: u32) {
        self.entries.insert(
            hash,
            LeafEntry {
                board,
                order: self.next_order,
                occurrences,
            },
        );
        self.next_order += 1;
    }

    pub fn get(&self, hash: u64) -> Option<&LeafEntry> {
        self.entries.get(&hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 次に振られる初出順
    pub fn next_order(&self) -> u64 {
        self.next_order
    }

    /// 全レコードをハッシュ順で取り出す（next_order は保持）
    pub fn drain(&mut self) -> Vec<BoardRecord> {
        let mut records: Vec<BoardRecord> = self
            .entries
            .drain()
            .map(|(hash, e)| BoardRecord::new(hash, e.order, e.occurrences, e.board))
            .collect();
        records.sort_unstable_by_key(|r| r.hash);
        records
    }

    /// 全レコードを初出順で返す
    pub fn into_discovered(self) -> Vec<BoardRecord> {
        let mut records: Vec<BoardRecord> = self
            .entries
            .into_iter()
            .map(|(hash, e)| BoardRecord::new(hash, e.order, e.occurrences, e.board))
            .collect();
        records.sort_unstable_by_key(|r| r.order);
        records
    }

    /// 全てリセット
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_order = 0;
        self.occurrences = 1;
    }
}

fn add_occurrences(entry: &mut LeafEntry, hash: u64, occurrences: u32) -> LeafResult<()> {
    entry.occurrences = entry
        .occurrences
        .checked_add(occurrences)
        .ok_or(LeafError::OccurrenceOverflow(hash))?;
    Ok(())
}

impl Default for LeafAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// depth 手先の末端局面を正規化ハッシュで集約する
///
/// 出現回数を保つため、部分木の置換表は使わずに全展開する。
/// エラーで抜けた場合も局面は元に戻る。
pub fn compressed_unique_leaf_nodes(
    pos: &mut Position,
    depth: u32,
    acc: &mut LeafAccumulator,
) -> LeafResult<()> {
    if depth == 0 {
        return Ok(());
    }
    accumulate(pos, depth, acc)
}

fn accumulate(pos: &mut Position, depth: u32, acc: &mut LeafAccumulator) -> LeafResult<()> {
    if depth == 0 {
        return acc.visit(pos);
    }
    let mut list = MoveList::new();
    generate_moves(pos, &mut list);
    for &mv in &list {
        let undo = pos.do_move(mv);
        let result = accumulate(pos, depth - 1, acc);
        pos.undo_move(mv, undo);
        result?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_leaf_nodes_counts() {
        let mut pos = Position::startpos();
        assert!(generate_leaf_nodes(&mut pos, 0).is_empty());
        assert_eq!(generate_leaf_nodes(&mut pos, 1).len(), 20);
        let leaves = generate_leaf_nodes(&mut pos, 3);
        assert_eq!(leaves.len(), 8902);
        assert_eq!(pos, Position::startpos());
    }

    #[test]
    fn test_compressed_unique_leaves_startpos_depth3() {
        let mut pos = Position::startpos();
        let mut acc = LeafAccumulator::new();
        compressed_unique_leaf_nodes(&mut pos, 3, &mut acc).unwrap();
        assert_eq!(acc.len(), 5362);
        let total: u64 = acc.drain().iter().map(|r| r.occurrences as u64).sum();
        assert_eq!(total, 8902);
        assert!(acc.is_empty());
        assert_eq!(acc.next_order(), 5362);
    }

    #[test]
    fn test_accumulator_orders_and_multiplier() {
        let mut pos = Position::startpos();
        let mut acc = LeafAccumulator::new();
        acc.set_occurrences(3);
        compressed_unique_leaf_nodes(&mut pos, 1, &mut acc).unwrap();
        acc.set_occurrences(2);
        compressed_unique_leaf_nodes(&mut pos, 1, &mut acc).unwrap();

        let records = acc.into_discovered();
        assert_eq!(records.len(), 20);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.order, i as u64);
            assert_eq!(r.occurrences, 5);
        }
    }

    #[test]
    fn test_accumulator_boards_decode_to_leaves() {
        let mut pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let mut acc = LeafAccumulator::new();
        compressed_unique_leaf_nodes(&mut pos, 2, &mut acc).unwrap();
        assert_eq!(acc.len(), 2038);

        let records = acc.drain();
        assert!(records.windows(2).all(|w| w[0].hash < w[1].hash));
        for r in records.iter().take(50) {
            let leaf = codec::deserialize(&r.board).unwrap();
            assert_eq!(leaf.hash(), r.hash);
            assert_eq!(leaf.normalized_hash(), r.hash);
        }
    }

    #[test]
    fn test_accumulator_absorb_and_clear() {
        let board = codec::serialize(&Position::startpos());
        let mut acc = LeafAccumulator::new();
        acc.absorb(7, board, 3).unwrap();
        acc.absorb(7, board, 5).unwrap();
        acc.absorb(1, board, 1).unwrap();
        assert_eq!(acc.get(7).unwrap().occurrences, 8);
        assert_eq!(acc.get(7).unwrap().order, 0);
        assert_eq!(acc.get(1).unwrap().order, 1);
        acc.clear();
        assert!(acc.is_empty());
        assert_eq!(acc.next_order(), 0);
    }

    #[test]
    fn test_accumulator_occurrence_overflow() {
        let pos = Position::startpos();
        let mut acc = LeafAccumulator::new();
        acc.set_occurrences(u32::MAX);
        acc.visit(&pos).unwrap();
        assert_eq!(
            acc.visit(&pos),
            Err(LeafError::OccurrenceOverflow(pos.normalized_hash()))
        );
        // 失敗した加算は記録されない
        assert_eq!(acc.get(pos.normalized_hash()).unwrap().occurrences, u32::MAX);

        let board = codec::serialize(&pos);
        acc.absorb(3, board, u32::MAX - 1).unwrap();
        acc.absorb(3, board, 1).unwrap();
        assert_eq!(acc.absorb(3, board, 1), Err(LeafError::OccurrenceOverflow(3)));
    }

    #[test]
    fn test_overflowing_expansion_restores_position() {
        let mut pos = Position::startpos();
        let mut acc = LeafAccumulator::new();
        acc.set_occurrences(u32::MAX);
        compressed_unique_leaf_nodes(&mut pos, 1, &mut acc).unwrap();
        assert!(compressed_unique_leaf_nodes(&mut pos, 1, &mut acc).is_err());
        assert_eq!(pos, Position::startpos());
    }
}
