//! 初出順への並べ替えと分割（フェーズC）

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::error::{PipelineError, PipelineResult};
use super::file::{RecordReader, RecordWriter, write_records};
use super::record::OrderedRecord;

/// 出力ファイル名（連番は 1 から）
pub fn output_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index}.bin")
}

/// マージ済みファイルを初出順に並べ替え、最大 max_records_per_output_file 件ずつのファイルに分割する
///
/// 1. 入力を max_records_per_chunk 件ずつ読み、order で並べて一時ファイルへ書き出す
/// 2. 一時ファイル群を order で k-way マージし、order を 0 から振り直して出力する
///
/// 一時ファイルは output_dir 内の一時ディレクトリに置き、どの経路で抜けても削除される。
/// レコードが1件もない出力ファイルは削除する。
pub fn sort_merged_file_by_order(
    input: &Path,
    output_dir: &Path,
    prefix: &str,
    max_records_per_chunk: usize,
    max_records_per_output_file: usize,
) -> PipelineResult<Vec<PathBuf>> {
    if max_records_per_chunk == 0 || max_records_per_output_file == 0 {
        return Err(PipelineError::InvalidParameter(format!(
            "chunk size ({max_records_per_chunk}) and output file size ({max_records_per_output_file}) must be positive"
        )));
    }
    std::fs::create_dir_all(output_dir)?;
    let temp_dir = tempfile::Builder::new()
        .prefix("perftree-sort-")
        .tempdir_in(output_dir)?;

    // 1. 整列済みチャンクの書き出し
    let mut reader = RecordReader::<_, OrderedRecord>::open(input)?;
    let mut chunk_files = Vec::new();
    let mut chunk = Vec::with_capacity(max_records_per_chunk.min(1 << 20));
    loop {
        let record = reader.next_record()?;
        let exhausted = record.is_none();
        if let Some(record) = record {
            chunk.push(record);
        }
        if chunk.len() >= max_records_per_chunk || (exhausted && !chunk.is_empty()) {
            chunk.sort_unstable_by_key(|r: &OrderedRecord| r.order);
            let path = temp_dir.path().join(format!("chunk_{}.bin", chunk_files.len()));
            write_records(&path, &chunk)?;
            chunk_files.push(path);
            chunk.clear();
        }
        if exhausted {
            break;
        }
    }
    log::debug!("phase C: spilled {} sorted chunks", chunk_files.len());

    // 2. order による k-way マージ
    let mut readers: Vec<RecordReader<BufReader<File>, OrderedRecord>> = chunk_files
        .iter()
        .map(|path| RecordReader::open(path))
        .collect::<PipelineResult<_>>()?;
    let mut heads: Vec<Option<OrderedRecord>> = Vec::with_capacity(readers.len());
    let mut heap = BinaryHeap::new();
    for (i, reader) in readers.iter_mut().enumerate() {
        let head = reader.next_record()?;
        if let Some(record) = &head {
            heap.push(Reverse((record.order, i)));
        }
        heads.push(head);
    }

    let mut outputs = Vec::new();
    let written = write_outputs(
        &mut readers,
        heads,
        heap,
        output_dir,
        prefix,
        max_records_per_output_file,
        &mut outputs,
    );
    let next_order = match written {
        Ok(n) => n,
        Err(e) => {
            // 書き終えた出力も残さない
            for path in &outputs {
                if let Err(remove) = std::fs::remove_file(path) {
                    log::warn!("failed to remove {}: {remove}", path.display());
                }
            }
            return Err(e);
        }
    };

    log::info!("phase C: wrote {next_order} records into {} files", outputs.len());
    Ok(outputs)
}

/// order 順にマージして出力ファイルへ分割し、書き終えたファイルを outputs に積む
fn write_outputs(
    readers: &mut [RecordReader<BufReader<File>, OrderedRecord>],
    mut heads: Vec<Option<OrderedRecord>>,
    mut heap: BinaryHeap<Reverse<(u64, usize)>>,
    output_dir: &Path,
    prefix: &str,
    max_records_per_output_file: usize,
    outputs: &mut Vec<PathBuf>,
) -> PipelineResult<u64> {
    let mut index = 1;
    let mut writer = RecordWriter::<OrderedRecord>::create(
        output_dir.join(output_file_name(prefix, index)),
    )?;
    let mut next_order = 0u64;

    while let Some(Reverse((_, i))) = heap.pop() {
        let Some(mut record) = heads[i].take() else {
            continue;
        };
        if let Some(next) = readers[i].next_record()? {
            heap.push(Reverse((next.order, i)));
            heads[i] = Some(next);
        }

        record.order = next_order;
        next_order += 1;
        writer.push(&record)?;

        if writer.count() >= max_records_per_output_file as u64 {
            let path = writer.path().to_path_buf();
            writer.finish()?;
            outputs.push(path);
            index += 1;
            writer = RecordWriter::create(output_dir.join(output_file_name(prefix, index)))?;
        }
    }

    if writer.count() > 0 {
        let path = writer.path().to_path_buf();
        writer.finish()?;
        outputs.push(path);
    }
    // 0 件の writer は finish せずに破棄するとファイルごと消える
    Ok(next_order)
}
