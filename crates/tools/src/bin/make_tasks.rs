//! make_tasks - 局面を分割してタスク記述子ファイルを作る
//!
//! split_depth 手先のユニーク局面それぞれを1タスクにし、残り `depth - split_depth` 手を数えさせる。
//! 各タスクの出現回数は JSON マニフェストに記録する。
//!
//! ```bash
//! cargo run --release -p perftree-tools --bin make_tasks -- \
//!   --depth 7 --split-depth 2 --output work/tasks.bin
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use perftree_core::MAX_DEPTH;
use perftree_core::pipeline::launch_frontier;
use perftree_core::position::{Position, START_FEN, codec};
use perftree_core::protocol::{TaskDescriptor, encode_tasks};
use perftree_tools::io::write_all;
use perftree_tools::manifest::{TaskManifest, TaskWeight};

#[derive(Parser, Debug)]
#[command(name = "make_tasks", version, about = "局面を分割してタスクファイルを作る")]
struct Cli {
    /// 開始局面の FEN
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// 開始局面からの総深さ
    #[arg(short, long)]
    depth: u32,

    /// 分割する深さ
    #[arg(long, default_value_t = 2)]
    split_depth: u32,

    /// 最初のタスクID
    #[arg(long, default_value_t = 1)]
    first_id: i64,

    /// タスクファイル（`.gz` なら圧縮）
    #[arg(short, long)]
    output: PathBuf,

    /// マニフェスト（省略時はタスクファイルの拡張子を .json にしたもの）
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.split_depth > cli.depth || cli.depth > MAX_DEPTH {
        bail!(
            "split depth {} and depth {} must satisfy split <= depth <= {MAX_DEPTH}",
            cli.split_depth,
            cli.depth
        );
    }
    let root = Position::from_fen(&cli.fen).with_context(|| format!("Invalid FEN: {}", cli.fen))?;
    let launch_depth = i32::try_from(cli.depth - cli.split_depth)?;

    let frontier = launch_frontier(&root, cli.split_depth)?;
    let mut tasks = Vec::with_capacity(frontier.len());
    let mut weights = Vec::with_capacity(frontier.len());
    for (task_id, record) in (cli.first_id..).zip(&frontier) {
        tasks.push(TaskDescriptor {
            task_id,
            board: codec::to_base64(&record.board),
            depth: i32::try_from(cli.depth)?,
            launch_depth,
        });
        weights.push(TaskWeight {
            task_id,
            occurrences: record.occurrences,
        });
    }

    write_all(&cli.output, &encode_tasks(&tasks))
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    let manifest_path = cli.manifest.unwrap_or_else(|| TaskManifest::default_path(&cli.output));
    let manifest = TaskManifest {
        fen: root.to_fen(),
        depth: cli.depth,
        split_depth: cli.split_depth,
        tasks: weights,
    };
    manifest.save(&manifest_path)?;

    log::info!(
        "{} tasks ({} paths) written to {}",
        tasks.len(),
        frontier.iter().map(|r| u64::from(r.occurrences)).sum::<u64>(),
        cli.output.display()
    );
    println!("{}", cli.output.display());
    println!("{}", manifest_path.display());
    Ok(())
}
