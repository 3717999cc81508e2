//! merge_batches - バッチファイルを統合し、初出順の出力ファイルに分割する（フェーズB・C）
//!
//! ```bash
//! cargo run --release -p perftree-tools --bin merge_batches -- \
//!   --input-dir work/batches --output-dir work/out --prefix d7
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use perftree_core::pipeline::{external_merge_sort, sort_merged_file_by_order};
use perftree_tools::progress;

#[derive(Parser, Debug)]
#[command(name = "merge_batches", version, about = "バッチファイルの外部マージと並べ替え")]
struct Cli {
    /// generate_batches の出力ディレクトリ
    #[arg(short, long)]
    input_dir: PathBuf,

    /// 出力ディレクトリ
    #[arg(short, long)]
    output_dir: PathBuf,

    /// 出力ファイル名の接頭辞（`{prefix}_{n}.bin`）
    #[arg(long, default_value = "leaves")]
    prefix: String,

    /// 並べ替えで一度にメモリに載せるレコード数
    #[arg(long, default_value_t = 1_000_000)]
    chunk_records: usize,

    /// 出力1ファイルあたりの最大レコード数
    #[arg(long, default_value_t = 500_000)]
    records_per_file: usize,

    /// マージ途中のファイルを残す
    #[arg(long, default_value_t = false)]
    keep_merged: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut inputs: Vec<PathBuf> = std::fs::read_dir(&cli.input_dir)
        .with_context(|| format!("Failed to read {}", cli.input_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("batch_") && n.ends_with(".bin"))
        })
        .collect();
    inputs.sort();
    if inputs.is_empty() {
        bail!("no batch files in {}", cli.input_dir.display());
    }
    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("Failed to create {}", cli.output_dir.display()))?;

    let merged = cli.output_dir.join(format!("{}_merged.bin", cli.prefix));
    let spinner = progress::spinner("merging batches")?;
    let unique = external_merge_sort(&inputs, &merged).context("Failed to merge batch files")?;
    spinner.finish_with_message(format!("{} batch files -> {unique} unique positions", inputs.len()));

    let spinner = progress::spinner("sorting by discovery order")?;
    let outputs = sort_merged_file_by_order(
        &merged,
        &cli.output_dir,
        &cli.prefix,
        cli.chunk_records,
        cli.records_per_file,
    )
    .context("Failed to reorder merged file")?;
    spinner.finish_with_message(format!("{} output files", outputs.len()));

    if !cli.keep_merged {
        std::fs::remove_file(&merged).with_context(|| format!("Failed to remove {}", merged.display()))?;
    }
    for path in &outputs {
        println!("{}", path.display());
    }
    Ok(())
}
