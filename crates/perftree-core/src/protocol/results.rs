//! 結果バッチ
//!
//! 共通ヘッダ: `i32 worker_id | i32 allocated_mb | i32 threads | f32 mips`
//!
//! - 統計結果: `i32 rows`、各行 `i32 len | len x u64`（行は統計ベクトル）
//! - 高速結果: `i32 len | len x u64`（`task_id, nodes` の組の並び）

use serde::{Deserialize, Serialize};

use super::error::{ProtocolError, ProtocolResult};
use super::wire::{Decoder, put_f32, put_i32, put_len, put_u64};

/// ワーカー情報ヘッダ
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkerHeader {
    pub worker_id: i32,
    pub allocated_mb: i32,
    pub threads: i32,
    /// 秒間百万ノード
    pub mips: f32,
}

impl WorkerHeader {
    fn encode(&self, out: &mut Vec<u8>) {
        put_i32(out, self.worker_id);
        put_i32(out, self.allocated_mb);
        put_i32(out, self.threads);
        put_f32(out, self.mips);
    }

    fn decode(d: &mut Decoder<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            worker_id: d.i32("worker id")?,
            allocated_mb: d.i32("allocated mb")?,
            threads: d.i32("threads")?,
            mips: d.f32("mips")?,
        })
    }
}

/// 統計タスクの結果バッチ
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FullResultBatch {
    pub header: WorkerHeader,
    /// 統計ベクトルの並び
    pub results: Vec<Vec<u64>>,
}

/// ノード数タスクの結果バッチ
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FastResultBatch {
    pub header: WorkerHeader,
    /// (task_id, nodes)
    pub results: Vec<(u64, u64)>,
}

fn read_u64s(d: &mut Decoder<'_>, what: &'static str) -> ProtocolResult<Vec<u64>> {
    let len = d.length(what)?;
    let mut values = Vec::with_capacity(len.min(d.remaining() / 8));
    for _ in 0..len {
        values.push(d.u64(what)?);
    }
    Ok(values)
}

pub fn encode_full_results(batch: &FullResultBatch) -> Vec<u8> {
    let mut out = Vec::new();
    batch.header.encode(&mut out);
    put_len(&mut out, batch.results.len());
    for row in &batch.results {
        put_len(&mut out, row.len());
        for &v in row {
            put_u64(&mut out, v);
        }
    }
    out
}

pub fn decode_full_results(data: &[u8]) -> ProtocolResult<FullResultBatch> {
    let mut d = Decoder::new(data);
    let header = WorkerHeader::decode(&mut d)?;
    let rows = d.length("row count")?;
    let mut results = Vec::with_capacity(rows.min(d.remaining() / 4));
    for _ in 0..rows {
        results.push(read_u64s(&mut d, "result row")?);
    }
    d.finish()?;
    Ok(FullResultBatch { header, results })
}

pub fn encode_fast_results(batch: &FastResultBatch) -> Vec<u8> {
    let mut out = Vec::new();
    batch.header.encode(&mut out);
    put_len(&mut out, batch.results.len() * 2);
    for &(task_id, nodes) in &batch.results {
        put_u64(&mut out, task_id);
        put_u64(&mut out, nodes);
    }
    out
}

pub fn decode_fast_results(data: &[u8]) -> ProtocolResult<FastResultBatch> {
    let mut d = Decoder::new(data);
    let header = WorkerHeader::decode(&mut d)?;
    let values = read_u64s(&mut d, "fast results")?;
    d.finish()?;
    if values.len() % 2 != 0 {
        return Err(ProtocolError::OddFastResults(values.len()));
    }
    let results = values.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
    Ok(FastResultBatch { header, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perft::Summary;
    use crate::protocol::{compress_summary, decompress_summary};

    fn header() -> WorkerHeader {
        WorkerHeader {
            worker_id: 3,
            allocated_mb: 1024,
            threads: 8,
            mips: 123.5,
        }
    }

    #[test]
    fn test_full_results_roundtrip() {
        let summary = Summary {
            nodes: 8902,
            captures: 34,
            direct_checks: 12,
            ..Summary::default()
        };
        let batch = FullResultBatch {
            header: header(),
            results: vec![compress_summary(1, &summary).to_vec(), compress_summary(2, &summary).to_vec()],
        };
        let data = encode_full_results(&batch);
        assert_eq!(data.len(), 16 + 4 + 2 * (4 + 15 * 8));
        let decoded = decode_full_results(&data).unwrap();
        assert_eq!(decoded, batch);
        assert_eq!(decompress_summary(&decoded.results[1]).unwrap(), (2, summary));
    }

    #[test]
    fn test_fast_results_roundtrip() {
        let batch = FastResultBatch {
            header: header(),
            results: vec![(10, 119_060_324), (11, 3_195_901_860)],
        };
        let data = encode_fast_results(&batch);
        assert_eq!(&data[16..20], &4i32.to_le_bytes());
        assert_eq!(decode_fast_results(&data).unwrap(), batch);
    }

    #[test]
    fn test_results_truncated_and_odd() {
        let batch = FastResultBatch {
            header: header(),
            results: vec![(1, 2)],
        };
        let data = encode_fast_results(&batch);
        assert!(matches!(
            decode_fast_results(&data[..data.len() - 3]),
            Err(ProtocolError::Truncated(_))
        ));
        assert!(matches!(decode_full_results(&data[..10]), Err(ProtocolError::Truncated(_))));

        let mut odd = Vec::new();
        header().encode(&mut odd);
        put_len(&mut odd, 1);
        put_u64(&mut odd, 5);
        assert_eq!(decode_fast_results(&odd), Err(ProtocolError::OddFastResults(1)));
    }
}
