//! generate_batches - 末端局面をハッシュ順のバッチファイルに書き出す（フェーズA）
//!
//! ```bash
//! cargo run --release -p perftree-tools --bin generate_batches -- \
//!   --launch-depth 3 --depth 7 --out-dir work/batches --config worker.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use perftree_core::pipeline::{BatchOptions, generate_batches};
use perftree_core::position::{Position, START_FEN};
use perftree_tools::config::{ConfigOverrides, load_config_file, merge_config};
use perftree_tools::progress;

#[derive(Parser, Debug)]
#[command(name = "generate_batches", version, about = "末端局面のバッチファイルを生成する")]
struct Cli {
    /// 開始局面の FEN
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// 並列展開を始める深さ
    #[arg(long)]
    launch_depth: u32,

    /// 末端の深さ
    #[arg(short, long)]
    depth: u32,

    /// バッチファイルの出力先
    #[arg(short, long)]
    out_dir: PathBuf,

    /// 1ファイルの最大レコード数
    #[arg(long)]
    batch_size: Option<usize>,

    /// 並列数
    #[arg(long)]
    max_workers: Option<usize>,

    /// 1ワーカーがまとめて処理する局面数
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// ワーカー設定ファイル
    #[arg(long, default_value = "worker.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        batch_size: cli.batch_size,
        max_workers: cli.max_workers,
        ..ConfigOverrides::default()
    };
    let config = merge_config(load_config_file(&cli.config)?, &overrides);
    let root = Position::from_fen(&cli.fen).with_context(|| format!("Invalid FEN: {}", cli.fen))?;
    let options = BatchOptions {
        batch_size: config.batch_size,
        max_workers: config.max_workers,
        chunk_size: cli.chunk_size,
    };

    let spinner = progress::spinner("expanding leaves")?;
    let files = generate_batches(&root, cli.launch_depth, cli.depth, &options, &cli.out_dir)
        .with_context(|| format!("Failed to generate batches into {}", cli.out_dir.display()))?;
    spinner.finish_with_message(format!("{} batch files", files.len()));

    for file in &files {
        println!("{}", file.display());
    }
    Ok(())
}
