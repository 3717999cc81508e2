//! サブタスク結果のキャッシュ

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use crate::perft::Summary;

struct Inner<V> {
    map: HashMap<(u64, u32), V>,
    /// 挿入順（先頭が最古）
    order: VecDeque<(u64, u32)>,
}

/// (正規化ハッシュ, 深さ) → サブタスク結果 の容量付き FIFO キャッシュ
///
/// ワーカースレッド間で共有する。既存キーは上書きしない。
/// 値は統計タスクなら `Summary`、ノード数タスクなら `u64`。
pub struct SubTaskCache<V = Summary> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
}

impl<V: Copy> SubTaskCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, hash: u64, depth: u32) -> Option<V> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.map.get(&(hash, depth)).copied()
    }

    /// 新しいキーを追加し、容量を超えたら最古のキーを捨てる
    pub fn insert(&self, hash: u64, depth: u32, value: V) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (hash, depth);
        if inner.map.contains_key(&key) {
            return;
        }
        inner.map.insert(key, value);
        inner.order.push_back(key);
        while inner.map.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.map.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(nodes: u64) -> Summary {
        Summary {
            nodes,
            ..Summary::default()
        }
    }

    #[test]
    fn test_cache_fifo_eviction() {
        let cache = SubTaskCache::<Summary>::new(2);
        cache.insert(1, 3, summary(10));
        cache.insert(2, 3, summary(20));
        cache.insert(3, 3, summary(30));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1, 3), None);
        assert_eq!(cache.get(2, 3), Some(summary(20)));
        assert_eq!(cache.get(3, 3), Some(summary(30)));
    }

    #[test]
    fn test_cache_does_not_replace_or_refresh() {
        let cache = SubTaskCache::<Summary>::new(2);
        cache.insert(1, 3, summary(10));
        cache.insert(2, 3, summary(20));
        // 既存キーの再挿入は値も順序も変えない
        cache.insert(1, 3, summary(99));
        assert_eq!(cache.get(1, 3), Some(summary(10)));
        cache.insert(4, 3, summary(40));
        assert_eq!(cache.get(1, 3), None);
        assert_eq!(cache.get(2, 3), Some(summary(20)));
    }

    #[test]
    fn test_cache_depth_is_part_of_key() {
        let cache = SubTaskCache::<Summary>::new(4);
        cache.insert(1, 3, summary(10));
        assert_eq!(cache.get(1, 4), None);
        assert!(!cache.is_empty());
        assert_eq!(cache.capacity(), 4);
    }

    #[test]
    fn test_cache_shared_between_threads() {
        let cache = SubTaskCache::<Summary>::new(1000);
        std::thread::scope(|scope| {
            for t in 0..4u64 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..100 {
                        cache.insert(t * 1000 + i, 2, summary(i));
                    }
                });
            }
        });
        assert_eq!(cache.len(), 400);
    }

    #[test]
    fn test_cache_holds_node_counts() {
        let cache = SubTaskCache::<u64>::new(1);
        cache.insert(9, 4, 197_281);
        assert_eq!(cache.get(9, 4), Some(197_281));
        cache.insert(10, 4, 1);
        assert_eq!(cache.get(9, 4), None);
        assert_eq!(cache.len(), 1);
    }
}
