//! タスクのサブタスク分割と実行
//!
//! 浅いタスクはタスク局面そのものを1つのサブタスクにする。
//! 深いタスクは 2 手先のユニーク局面に分割し、各局面を `launch_depth - 2` で数える。
//! 結果は出現回数で重み付けして合算する。
//!
//! - 統計タスク（`StatsTask`）: launch_depth 5 以上で分割、`StatsPerft` で数える
//! - ノード数タスク（`NodesTask`）: launch_depth 6 以上で分割、`BulkPerft` で数える

mod cache;

pub use cache::SubTaskCache;

use std::collections::VecDeque;
use std::fmt::Debug;
use std::marker::PhantomData;

use thiserror::Error;

use crate::MAX_DEPTH;
use crate::leaf::{LeafAccumulator, LeafError, compressed_unique_leaf_nodes};
use crate::perft::{BulkPerft, StatsPerft, Summary, SummaryOverflow};
use crate::position::{CodecError, Position, codec};
use crate::protocol::{ProtocolError, STATS_VECTOR_LEN, TaskDescriptor, compress_summary};

/// 分割時に展開する手数
pub const SPLIT_DEPTH: u32 = 2;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid task board: {0}")]
    Board(#[from] ProtocolError),

    #[error("corrupt sub-task board: {0}")]
    Codec(#[from] CodecError),

    #[error("launch depth out of range: {0}")]
    InvalidDepth(i32),

    #[error("failed to split task: {0}")]
    Split(#[from] LeafError),

    #[error(transparent)]
    Overflow(#[from] SummaryOverflow),
}

/// タスクの種類ごとの探索と集計
pub trait TaskKind {
    /// サブタスク1つの結果
    type Output: Copy + Default + PartialEq + Debug;
    /// スレッドごとに持つ探索エンジン
    type Engine;
    /// launch_depth がこの値以上なら分割する
    const SPLIT_THRESHOLD: u32;

    fn search(engine: &mut Self::Engine, pos: &mut Position, depth: u32) -> Self::Output;

    /// total に result を occurrences 倍して加える
    fn accumulate(total: &mut Self::Output, result: &Self::Output, occurrences: u32) -> Result<(), SummaryOverflow>;
}

/// 統計タスク
#[derive(Debug)]
pub struct Stats;

impl TaskKind for Stats {
    type Output = Summary;
    type Engine = StatsPerft;
    const SPLIT_THRESHOLD: u32 = 5;

    fn search(engine: &mut StatsPerft, pos: &mut Position, depth: u32) -> Summary {
        engine.perft(pos, depth)
    }

    fn accumulate(total: &mut Summary, result: &Summary, occurrences: u32) -> Result<(), SummaryOverflow> {
        total.add_scaled(result, u64::from(occurrences))
    }
}

/// ノード数タスク
#[derive(Debug)]
pub struct Nodes;

impl TaskKind for Nodes {
    type Output = u64;
    type Engine = BulkPerft;
    const SPLIT_THRESHOLD: u32 = 6;

    fn search(engine: &mut BulkPerft, pos: &mut Position, depth: u32) -> u64 {
        engine.perft(pos, depth)
    }

    fn accumulate(total: &mut u64, result: &u64, occurrences: u32) -> Result<(), SummaryOverflow> {
        *total = result
            .checked_mul(u64::from(occurrences))
            .and_then(|scaled| total.checked_add(scaled))
            .ok_or(SummaryOverflow)?;
        Ok(())
    }
}

/// 1つのサブタスク
#[derive(Debug, Clone)]
pub struct SubTask {
    pub position: Position,
    /// 正規化ハッシュ（キャッシュキー）
    pub hash: u64,
    /// 分割元の局面から何通りで到達するか
    pub occurrences: u32,
}

/// サブタスクに分割済みのタスク
#[derive(Debug)]
pub struct PerftTask<K: TaskKind> {
    task_id: i64,
    sub_task_depth: u32,
    sub_task_count: usize,
    cached_sub_task_count: usize,
    pending: VecDeque<SubTask>,
    completed: usize,
    total: K::Output,
    _kind: PhantomData<K>,
}

pub type StatsTask = PerftTask<Stats>;
pub type NodesTask = PerftTask<Nodes>;

impl<K: TaskKind> PerftTask<K> {
    /// 記述子から分割し、キャッシュ済みのサブタスクは即座に完了させる
    pub fn from_descriptor(desc: &TaskDescriptor, cache: &SubTaskCache<K::Output>) -> Result<Self, TaskError> {
        let launch_depth = u32::try_from(desc.launch_depth)
            .ok()
            .filter(|&d| d <= MAX_DEPTH)
            .ok_or(TaskError::InvalidDepth(desc.launch_depth))?;
        let mut pos = desc.position()?;

        let (sub_task_depth, sub_tasks) = if launch_depth < K::SPLIT_THRESHOLD {
            let hash = pos.normalized_hash();
            let sub = SubTask {
                position: pos,
                hash,
                occurrences: 1,
            };
            (launch_depth, vec![sub])
        } else {
            let mut acc = LeafAccumulator::new();
            compressed_unique_leaf_nodes(&mut pos, SPLIT_DEPTH, &mut acc)?;
            let subs = acc
                .into_discovered()
                .into_iter()
                .map(|record| {
                    Ok(SubTask {
                        position: codec::deserialize(&record.board)?,
                        hash: record.hash,
                        occurrences: record.occurrences,
                    })
                })
                .collect::<Result<Vec<_>, CodecError>>()?;
            (launch_depth - SPLIT_DEPTH, subs)
        };

        let mut task = Self {
            task_id: desc.task_id,
            sub_task_depth,
            sub_task_count: sub_tasks.len(),
            cached_sub_task_count: 0,
            pending: VecDeque::with_capacity(sub_tasks.len()),
            completed: 0,
            total: K::Output::default(),
            _kind: PhantomData,
        };
        for sub in sub_tasks {
            match cache.get(sub.hash, sub_task_depth) {
                Some(result) => {
                    task.cached_sub_task_count += 1;
                    task.complete_sub_task(&result, sub.occurrences)?;
                }
                None => task.pending.push_back(sub),
            }
        }
        log::debug!(
            "task {}: {} sub-tasks at depth {} ({} cached)",
            task.task_id,
            task.sub_task_count,
            sub_task_depth,
            task.cached_sub_task_count
        );
        Ok(task)
    }

    pub fn task_id(&self) -> i64 {
        self.task_id
    }

    pub fn sub_task_depth(&self) -> u32 {
        self.sub_task_depth
    }

    pub fn sub_task_count(&self) -> usize {
        self.sub_task_count
    }

    /// キャッシュで完了したサブタスク数
    pub fn cached_sub_task_count(&self) -> usize {
        self.cached_sub_task_count
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// 次に数えるサブタスクを取り出す
    pub fn next_sub_task(&mut self) -> Option<SubTask> {
        self.pending.pop_front()
    }

    /// サブタスクの結果を出現回数倍して加算する
    pub fn complete_sub_task(&mut self, result: &K::Output, occurrences: u32) -> Result<(), TaskError> {
        K::accumulate(&mut self.total, result, occurrences)?;
        self.completed += 1;
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.completed == self.sub_task_count
    }

    /// 重み付き合計（未完了なら途中経過）
    pub fn total(&self) -> &K::Output {
        &self.total
    }

    /// 残りのサブタスクを全て数え、結果をキャッシュに入れる
    pub fn run(&mut self, engine: &mut K::Engine, cache: &SubTaskCache<K::Output>) -> Result<(), TaskError> {
        while let Some(mut sub) = self.next_sub_task() {
            let result = match cache.get(sub.hash, self.sub_task_depth) {
                Some(result) => result,
                None => {
                    let result = K::search(engine, &mut sub.position, self.sub_task_depth);
                    cache.insert(sub.hash, self.sub_task_depth, result);
                    result
                }
            };
            self.complete_sub_task(&result, sub.occurrences)?;
        }
        Ok(())
    }
}

impl PerftTask<Stats> {
    /// 提出用の統計ベクトル（全サブタスク完了時のみ）
    pub fn to_submission(&self) -> Option<[u64; STATS_VECTOR_LEN]> {
        if !self.is_completed() {
            return None;
        }
        Some(compress_summary(self.task_id as u64, &self.total))
    }
}

impl PerftTask<Nodes> {
    /// 提出用の (task_id, ノード数)（全サブタスク完了時のみ）
    pub fn to_submission(&self) -> Option<(u64, u64)> {
        if !self.is_completed() {
            return None;
        }
        Some((self.task_id as u64, self.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;
    use crate::protocol::decompress_summary;

    const POSITION3_FEN: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

    fn descriptor(fen: &str, launch_depth: i32) -> TaskDescriptor {
        TaskDescriptor {
            task_id: 17,
            board: fen.to_string(),
            depth: launch_depth,
            launch_depth,
        }
    }

    #[test]
    fn test_shallow_task_is_single_sub_task() {
        let cache = SubTaskCache::new(16);
        let task = StatsTask::from_descriptor(&descriptor(START_FEN, 3), &cache).unwrap();
        assert_eq!(task.sub_task_count(), 1);
        assert_eq!(task.sub_task_depth(), 3);
        assert!(!task.is_completed());
        assert!(task.to_submission().is_none());
    }

    #[test]
    fn test_split_matches_direct_count() {
        let cache = SubTaskCache::new(1024);
        let mut engine = StatsPerft::new(4);
        let mut task = StatsTask::from_descriptor(&descriptor(START_FEN, 5), &cache).unwrap();
        // 2 手先のユニーク局面は 400 個
        assert_eq!(task.sub_task_count(), 400);
        assert_eq!(task.sub_task_depth(), 3);
        task.run(&mut engine, &cache).unwrap();
        assert!(task.is_completed());

        let mut pos = Position::startpos();
        let direct = StatsPerft::new(4).perft(&mut pos, 5);
        assert_eq!(task.total().nodes, 4_865_609);
        assert_eq!(*task.total(), direct);

        let submission = task.to_submission().unwrap();
        assert_eq!(decompress_summary(&submission).unwrap(), (17, direct));
    }

    #[test]
    fn test_split_weights_transpositions() {
        let cache = SubTaskCache::new(4096);
        let mut engine = StatsPerft::new(4);
        let mut task = StatsTask::from_descriptor(&descriptor(POSITION3_FEN, 5), &cache).unwrap();
        assert!(task.sub_task_count() <= 191);
        task.run(&mut engine, &cache).unwrap();

        let mut pos = Position::from_fen(POSITION3_FEN).unwrap();
        let direct = StatsPerft::new(4).perft(&mut pos, 5);
        assert_eq!(task.total().nodes, 674_624);
        assert_eq!(*task.total(), direct);
    }

    #[test]
    fn test_cached_sub_tasks_complete_immediately() {
        let cache = SubTaskCache::new(1024);
        let mut engine = StatsPerft::new(4);
        let mut first = StatsTask::from_descriptor(&descriptor(START_FEN, 5), &cache).unwrap();
        first.run(&mut engine, &cache).unwrap();
        assert_eq!(cache.len(), 400);

        let second = StatsTask::from_descriptor(&descriptor(START_FEN, 5), &cache).unwrap();
        assert_eq!(second.cached_sub_task_count(), 400);
        assert_eq!(second.remaining(), 0);
        assert!(second.is_completed());
        assert_eq!(second.total(), first.total());
    }

    #[test]
    fn test_manual_sub_task_loop() {
        let cache = SubTaskCache::new(0);
        let mut engine = StatsPerft::new(1);
        let mut task = StatsTask::from_descriptor(&descriptor(START_FEN, 2), &cache).unwrap();
        while let Some(mut sub) = task.next_sub_task() {
            let summary = engine.perft(&mut sub.position, task.sub_task_depth());
            task.complete_sub_task(&summary, sub.occurrences).unwrap();
        }
        assert!(task.is_completed());
        assert_eq!(task.total().nodes, 400);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalid_descriptors() {
        let cache = SubTaskCache::new(1);
        assert!(matches!(
            StatsTask::from_descriptor(&descriptor(START_FEN, -1), &cache),
            Err(TaskError::InvalidDepth(-1))
        ));
        assert!(matches!(
            StatsTask::from_descriptor(&descriptor("bogus", 3), &cache),
            Err(TaskError::Board(_))
        ));
        let cache = SubTaskCache::<u64>::new(1);
        assert!(matches!(
            NodesTask::from_descriptor(&descriptor(START_FEN, 99), &cache),
            Err(TaskError::InvalidDepth(99))
        ));
    }

    #[test]
    fn test_nodes_task_split_threshold() {
        let cache = SubTaskCache::new(16);
        // ノード数タスクは 5 手までは分割しない
        let task = NodesTask::from_descriptor(&descriptor(START_FEN, 5), &cache).unwrap();
        assert_eq!(task.sub_task_count(), 1);
        assert_eq!(task.sub_task_depth(), 5);

        let mut engine = BulkPerft::new(4);
        let mut task = NodesTask::from_descriptor(&descriptor(START_FEN, 3), &cache).unwrap();
        task.run(&mut engine, &cache).unwrap();
        assert_eq!(task.to_submission(), Some((17, 8_902)));
    }

    #[test]
    fn test_nodes_task_split_matches_bulk_count() {
        let cache = SubTaskCache::new(4096);
        let mut engine = BulkPerft::new(4);
        let mut task = NodesTask::from_descriptor(&descriptor(POSITION3_FEN, 6), &cache).unwrap();
        assert_eq!(task.sub_task_depth(), 4);
        assert!(task.sub_task_count() <= 191);
        assert!(task.to_submission().is_none());
        task.run(&mut engine, &cache).unwrap();

        let mut pos = Position::from_fen(POSITION3_FEN).unwrap();
        let direct = BulkPerft::new(4).perft(&mut pos, 6);
        assert_eq!(direct, 11_030_083);
        assert_eq!(task.to_submission(), Some((17, direct)));

        // 2回目は全てキャッシュから埋まる
        let again = NodesTask::from_descriptor(&descriptor(POSITION3_FEN, 6), &cache).unwrap();
        assert_eq!(again.cached_sub_task_count(), again.sub_task_count());
        assert_eq!(again.to_submission(), Some((17, direct)));
    }

    #[test]
    fn test_weighted_total_overflow_is_error() {
        let cache = SubTaskCache::<u64>::new(1);
        let mut task = NodesTask::from_descriptor(&descriptor(START_FEN, 1), &cache).unwrap();
        assert!(matches!(
            task.complete_sub_task(&u64::MAX, 2),
            Err(TaskError::Overflow(SummaryOverflow))
        ));
        assert!(!task.is_completed());
    }
}
