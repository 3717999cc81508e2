//! バッチ生成（フェーズA）
//!
//! ルートから launch_depth 手先のユニーク局面（フロンティア）を求め、
//! 各フロンティア局面の残り手数先の末端局面を集約してハッシュ順バッチファイルに書き出す。

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::error::{PipelineError, PipelineResult};
use super::file::write_batch;
use super::record::BoardRecord;
use crate::MAX_DEPTH;
use crate::leaf::{LeafAccumulator, compressed_unique_leaf_nodes};
use crate::position::{Position, codec};

/// 1バッチファイルの最大レコード数の既定値
pub const DEFAULT_BATCH_SIZE: usize = 500_000;

/// バッチ生成の設定
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// 1ファイルの最大レコード数
    pub batch_size: usize,
    /// 並列ワーカー数の上限
    pub max_workers: usize,
    /// 1ワーカーがまとめて処理するフロンティア局面数
    pub chunk_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            chunk_size: 64,
        }
    }
}

/// バッチファイル名（5桁ゼロ埋めの連番）
pub fn batch_file_name(index: usize) -> String {
    format!("batch_{index:05}.bin")
}

/// フロンティア（launch_depth 手先のユニーク局面、初出順）
pub fn launch_frontier(root: &Position, launch_depth: u32) -> PipelineResult<Vec<BoardRecord>> {
    if launch_depth == 0 {
        return Ok(vec![BoardRecord::new(
            root.normalized_hash(),
            0,
            1,
            codec::serialize_normalized(root),
        )]);
    }
    let mut acc = LeafAccumulator::new();
    compressed_unique_leaf_nodes(&mut root.clone(), launch_depth, &mut acc)?;
    Ok(acc.into_discovered())
}

/// フロンティアの一部を展開して初出順のレコードを返す
fn expand_chunk(chunk: &[BoardRecord], depth: u32) -> PipelineResult<Vec<BoardRecord>> {
    let mut acc = LeafAccumulator::new();
    for record in chunk {
        let mut pos = codec::deserialize(&record.board)?;
        acc.set_occurrences(record.occurrences);
        if depth == 0 {
            acc.visit(&pos)?;
        } else {
            compressed_unique_leaf_nodes(&mut pos, depth, &mut acc)?;
        }
    }
    Ok(acc.into_discovered())
}

/// 末端局面のバッチファイルを生成する
///
/// チャンクの結果はフロンティア順に集約器へ取り込むため、初出順はワーカー数によらず一定。
/// 集約器が batch_size 件に達するたびにファイルへ書き出す。
pub fn generate_batches(
    root: &Position,
    launch_depth: u32,
    total_depth: u32,
    options: &BatchOptions,
    out_dir: &Path,
) -> PipelineResult<Vec<PathBuf>> {
    if launch_depth > total_depth || total_depth > MAX_DEPTH {
        return Err(PipelineError::InvalidParameter(format!(
            "launch depth {launch_depth} and total depth {total_depth} must satisfy launch <= total <= {MAX_DEPTH}"
        )));
    }
    if options.batch_size == 0 || options.max_workers == 0 || options.chunk_size == 0 {
        return Err(PipelineError::InvalidParameter(format!(
            "batch size, workers and chunk size must be positive: {options:?}"
        )));
    }
    std::fs::create_dir_all(out_dir)?;

    let frontier = launch_frontier(root, launch_depth)?;
    let search_depth = total_depth - launch_depth;
    log::info!(
        "phase A: {} frontier positions at depth {launch_depth}, expanding {search_depth} more plies",
        frontier.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.max_workers)
        .build()
        .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;

    let mut batch = LeafAccumulator::new();
    let mut files = Vec::new();
    let wave = options.chunk_size * options.max_workers;

    for (wave_index, positions) in frontier.chunks(wave).enumerate() {
        let results: Vec<Vec<BoardRecord>> = pool.install(|| {
            positions
                .par_chunks(options.chunk_size)
                .map(|chunk| expand_chunk(chunk, search_depth))
                .collect::<PipelineResult<_>>()
        })?;

        for record in results.into_iter().flatten() {
            batch.absorb(record.hash, record.board, record.occurrences)?;
            if batch.len() >= options.batch_size {
                files.push(flush_batch(&mut batch, out_dir, files.len())?);
            }
        }
        log::debug!("phase A: wave {wave_index} done, {} records pending", batch.len());
    }

    if !batch.is_empty() {
        files.push(flush_batch(&mut batch, out_dir, files.len())?);
    }
    log::info!(
        "phase A: wrote {} batch files, {} distinct discoveries",
        files.len(),
        batch.next_order()
    );
    Ok(files)
}

fn flush_batch(batch: &mut LeafAccumulator, out_dir: &Path, index: usize) -> PipelineResult<PathBuf> {
    let path = out_dir.join(batch_file_name(index));
    let records = batch.drain();
    let count = write_batch(&path, &records)?;
    log::debug!("wrote {count} records to {}", path.display());
    Ok(path)
}
