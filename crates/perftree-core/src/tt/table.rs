//! HashTable本体

use crate::position::Position;
#[cfg(feature = "verified-tt")]
use crate::position::{COMPACT_BOARD_SIZE, CompactBoard, codec};

/// エントリ
///
/// depth == 0 は空きエントリ。
#[derive(Clone, Copy)]
struct Entry<T: Copy + Default> {
    key: u64,
    depth: u8,
    value: T,
    #[cfg(feature = "verified-tt")]
    board: CompactBoard,
}

impl<T: Copy + Default> Entry<T> {
    fn empty() -> Self {
        Self {
            key: 0,
            depth: 0,
            value: T::default(),
            #[cfg(feature = "verified-tt")]
            board: [0; COMPACT_BOARD_SIZE],
        }
    }
}

/// 深さ付き置換表
///
/// エントリ数は2のべき乗で、インデックスはハッシュの下位ビット。
/// 常に上書きし、チェインも自動リサイズもしない。
pub struct HashTable<T: Copy + Default> {
    entries: Vec<Entry<T>>,
    mask: usize,
}

impl<T: Copy + Default> HashTable<T> {
    /// 新しい置換表を作成（サイズはMB単位）
    pub fn new(mb_size: usize) -> Self {
        let count = Self::entry_count(mb_size);
        log::debug!(
            "allocating hash table: {count} entries x {} bytes ({mb_size} MB budget)",
            std::mem::size_of::<Entry<T>>()
        );
        Self {
            entries: vec![Entry::empty(); count],
            mask: count - 1,
        }
    }

    /// MB予算に収まる最大の2のべき乗エントリ数
    fn entry_count(mb_size: usize) -> usize {
        let bytes = mb_size.saturating_mul(1024 * 1024);
        let count = (bytes / std::mem::size_of::<Entry<T>>()).max(1);
        1 << (usize::BITS - 1 - count.leading_zeros())
    }

    /// サイズを変更（内容は破棄される）
    pub fn resize(&mut self, mb_size: usize) {
        let count = Self::entry_count(mb_size);
        if count != self.entries.len() {
            *self = Self::new(mb_size);
        } else {
            self.clear();
        }
    }

    /// 全エントリを空にする
    pub fn clear(&mut self) {
        self.entries.fill(Entry::empty());
    }

    /// エントリ数
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn key_of(pos: &Position) -> u64 {
        pos.hash() ^ pos.occupied().bits()
    }

    #[inline]
    fn index_of(&self, pos: &Position) -> usize {
        (pos.hash() as usize) & self.mask
    }

    /// 置換表を検索（キーと残り深さの両方が一致した場合のみヒット）
    #[inline]
    pub fn probe(&self, pos: &Position, depth: u32) -> Option<T> {
        debug_assert!(depth > 0 && depth <= u8::MAX as u32);
        let entry = &self.entries[self.index_of(pos)];
        if entry.depth as u32 != depth || entry.key != Self::key_of(pos) {
            return None;
        }
        #[cfg(feature = "verified-tt")]
        if entry.board != codec::serialize(pos) {
            return None;
        }
        Some(entry.value)
    }

    /// 値を書き込む（常に上書き）
    #[inline]
    pub fn store(&mut self, pos: &Position, depth: u32, value: T) {
        debug_assert!(depth > 0 && depth <= u8::MAX as u32);
        let index = self.index_of(pos);
        self.entries[index] = Entry {
            key: Self::key_of(pos),
            depth: depth as u8,
            value,
            #[cfg(feature = "verified-tt")]
            board: codec::serialize(pos),
        };
    }

    /// 使用中エントリの1000分率（先頭1000エントリの標本）
    pub fn hashfull(&self) -> usize {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample].iter().filter(|e| e.depth != 0).count();
        used * 1000 / sample
    }
}
