//! ハッシュ順の k-way マージ（フェーズB）

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::error::{PipelineError, PipelineResult};
use super::file::{RecordReader, RecordWriter};
use super::record::{BoardRecord, OrderedRecord};

/// バッチファイル群をハッシュ順にマージし、同じハッシュを1レコードにまとめる
///
/// 出現回数は合計し、初出順は最小値を残す。出力はハッシュを落とした `OrderedRecord`
/// （ハッシュ昇順）。戻り値は出力レコード数。
pub fn external_merge_sort(inputs: &[PathBuf], output: &Path) -> PipelineResult<u64> {
    let mut readers: Vec<RecordReader<BufReader<File>, BoardRecord>> = inputs
        .iter()
        .map(|path| RecordReader::open(path))
        .collect::<PipelineResult<_>>()?;

    // 各リーダーの先頭レコード
    let mut heads: Vec<Option<BoardRecord>> = Vec::with_capacity(readers.len());
    let mut heap = BinaryHeap::new();
    for (i, reader) in readers.iter_mut().enumerate() {
        let head = reader.next_record()?;
        if let Some(record) = &head {
            heap.push(Reverse((record.hash, i)));
        }
        heads.push(head);
    }

    let mut writer = RecordWriter::<OrderedRecord>::create(output)?;
    let mut pending: Option<BoardRecord> = None;

    while let Some(Reverse((_, i))) = heap.pop() {
        let Some(record) = heads[i].take() else {
            continue;
        };
        if let Some(next) = readers[i].next_record()? {
            heap.push(Reverse((next.hash, i)));
            heads[i] = Some(next);
        }

        match pending.as_mut() {
            Some(last) if last.hash == record.hash => {
                last.occurrences = last
                    .occurrences
                    .checked_add(record.occurrences)
                    .ok_or(PipelineError::OccurrenceOverflow(record.hash))?;
                last.order = last.order.min(record.order);
            }
            _ => {
                if let Some(last) = pending.replace(record) {
                    writer.push(&last.to_ordered())?;
                    if writer.count() % 1_000_000 == 0 {
                        log::debug!("phase B: {} records merged", writer.count());
                    }
                }
            }
        }
    }
    if let Some(last) = pending {
        writer.push(&last.to_ordered())?;
    }

    let count = writer.finish()?;
    log::info!("phase B: merged {} batch files into {count} records", inputs.len());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{read_records, write_batch};
    use crate::position::COMPACT_BOARD_SIZE;

    fn rec(hash: u64, order: u64, occurrences: u32) -> BoardRecord {
        BoardRecord::new(hash, order, occurrences, [hash as u8; COMPACT_BOARD_SIZE])
    }

    #[test]
    fn test_merge_aggregates_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        write_batch(&a, &[rec(1, 4, 3), rec(5, 0, 1)]).unwrap();
        write_batch(&b, &[rec(1, 2, 5), rec(3, 1, 2), rec(9, 3, 1)]).unwrap();

        let out = dir.path().join("merged.bin");
        let count = external_merge_sort(&[a, b], &out).unwrap();
        assert_eq!(count, 4);

        let merged: Vec<OrderedRecord> = read_records(&out).unwrap();
        assert_eq!(
            merged,
            vec![
                OrderedRecord::new(2, 8, [1; COMPACT_BOARD_SIZE]),
                OrderedRecord::new(1, 2, [3; COMPACT_BOARD_SIZE]),
                OrderedRecord::new(0, 1, [5; COMPACT_BOARD_SIZE]),
                OrderedRecord::new(3, 1, [9; COMPACT_BOARD_SIZE]),
            ]
        );
    }

    #[test]
    fn test_merge_empty_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        write_batch(&a, &[]).unwrap();
        let out = dir.path().join("merged.bin");
        assert_eq!(external_merge_sort(&[a], &out).unwrap(), 0);
        assert_eq!(external_merge_sort(&[], &out).unwrap(), 0);
    }

    #[test]
    fn test_merge_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("merged.bin");
        let result = external_merge_sort(&[dir.path().join("missing.bin")], &out);
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }

    #[test]
    fn test_merge_overflow_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        write_batch(&a, &[rec(2, 0, 1), rec(5, 1, u32::MAX)]).unwrap();
        write_batch(&b, &[rec(5, 2, 1)]).unwrap();

        let out = dir.path().join("merged.bin");
        let result = external_merge_sort(&[a, b], &out);
        assert!(matches!(result, Err(PipelineError::OccurrenceOverflow(5))));
        assert!(!out.exists());
    }
}
