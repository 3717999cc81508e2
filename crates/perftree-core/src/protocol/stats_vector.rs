//! 圧縮統計ベクトル
//!
//! `[task_id, nodes, captures, ..., double_discovered_mates, checksum]` の15要素。
//! checksum は要素 1..=13 の XOR。

use super::error::{ProtocolError, ProtocolResult};
use crate::perft::{SUMMARY_FIELDS, Summary};

/// 統計ベクトルの要素数
pub const STATS_VECTOR_LEN: usize = SUMMARY_FIELDS + 2;

fn checksum(values: &[u64]) -> u64 {
    values.iter().fold(0, |acc, v| acc ^ v)
}

/// 集計結果を統計ベクトルにする
pub fn compress_summary(task_id: u64, summary: &Summary) -> [u64; STATS_VECTOR_LEN] {
    let mut out = [0u64; STATS_VECTOR_LEN];
    out[0] = task_id;
    out[1..=SUMMARY_FIELDS].copy_from_slice(&summary.to_array());
    out[STATS_VECTOR_LEN - 1] = checksum(&out[1..=SUMMARY_FIELDS]);
    out
}

/// 統計ベクトルを検証して (task_id, 集計結果) に戻す
pub fn decompress_summary(values: &[u64]) -> ProtocolResult<(u64, Summary)> {
    if values.len() != STATS_VECTOR_LEN {
        return Err(ProtocolError::Length {
            expected: STATS_VECTOR_LEN,
            actual: values.len(),
        });
    }
    let expected = checksum(&values[1..=SUMMARY_FIELDS]);
    let actual = values[STATS_VECTOR_LEN - 1];
    if expected != actual {
        return Err(ProtocolError::Checksum { expected, actual });
    }
    let mut fields = [0u64; SUMMARY_FIELDS];
    fields.copy_from_slice(&values[1..=SUMMARY_FIELDS]);
    Ok((values[0], Summary::from_array(fields)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Summary {
        Summary::from_array([197_281, 1576, 0, 0, 0, 461, 0, 0, 0, 8, 0, 0, 0])
    }

    #[test]
    fn test_compress_layout() {
        let v = compress_summary(42, &sample());
        assert_eq!(v.len(), 15);
        assert_eq!(v[0], 42);
        assert_eq!(v[1], 197_281);
        assert_eq!(v[14], 197_281 ^ 1576 ^ 461 ^ 8);
    }

    #[test]
    fn test_decompress_roundtrip() {
        let v = compress_summary(7, &sample());
        assert_eq!(decompress_summary(&v), Ok((7, sample())));
    }

    #[test]
    fn test_decompress_rejects_corruption() {
        let v = compress_summary(7, &sample());
        // task_id は checksum の対象外
        for i in 1..STATS_VECTOR_LEN {
            let mut bad = v;
            bad[i] ^= 1 << (i % 64);
            assert!(
                matches!(decompress_summary(&bad), Err(ProtocolError::Checksum { .. })),
                "element {i}"
            );
        }
        let mut id_changed = v;
        id_changed[0] = 8;
        assert_eq!(decompress_summary(&id_changed).unwrap().0, 8);
    }

    #[test]
    fn test_decompress_rejects_length() {
        let v = compress_summary(1, &sample());
        assert_eq!(
            decompress_summary(&v[..14]),
            Err(ProtocolError::Length {
                expected: 15,
                actual: 14
            })
        );
    }
}
