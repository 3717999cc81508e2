//! run_tasks - タスク記述子ファイルを実行して結果バッチを書き出す
//!
//! 各スレッドが自分の perft エンジン（置換表）を持ち、共有カウンタからタスクを取る。
//! 深いタスクはサブタスクに分割し、サブタスク結果はスレッド間で共有するキャッシュに入れる。
//!
//! ```bash
//! cargo run --release -p perftree-tools --bin run_tasks -- \
//!   --tasks work/tasks.bin --output work/results.bin --config worker.toml
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use perftree_core::perft::{BulkPerft, StatsPerft, Summary};
use perftree_core::protocol::{
    FastResultBatch, FullResultBatch, TaskDescriptor, WorkerHeader, decode_tasks, decompress_summary,
    encode_fast_results, encode_full_results,
};
use perftree_core::task::{NodesTask, StatsTask, SubTaskCache};
use perftree_tools::config::{ConfigOverrides, TaskType, WorkerConfig, load_config_file, merge_config};
use perftree_tools::io::{read_all, write_all};
use perftree_tools::manifest::TaskManifest;
use perftree_tools::progress;

#[derive(Parser, Debug)]
#[command(name = "run_tasks", version, about = "タスクファイルを実行して結果バッチを書き出す")]
struct Cli {
    /// タスク記述子ファイル（`.gz` 可）
    #[arg(short, long)]
    tasks: PathBuf,

    /// 結果バッチの出力先（`.gz` なら圧縮）
    #[arg(short, long)]
    output: PathBuf,

    /// ワーカー設定ファイル
    #[arg(long, default_value = "worker.toml")]
    config: PathBuf,

    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    hash_mb: Option<usize>,

    #[arg(long)]
    sub_task_cache_size: Option<usize>,

    #[arg(long, value_enum)]
    task_type: Option<TaskType>,

    /// make_tasks のマニフェスト。指定すると分割前の局面の合計を表示する
    #[arg(long)]
    manifest: Option<PathBuf>,
}

/// 全スレッドで tasks を分け合って処理し、入力順の結果を返す
fn run_parallel<E, R>(
    config: &WorkerConfig,
    tasks: &[TaskDescriptor],
    make_engine: impl Fn() -> E + Sync,
    run: impl Fn(&mut E, &TaskDescriptor) -> Result<R> + Sync,
) -> Result<Vec<R>>
where
    R: Send,
{
    let pool = rayon::ThreadPoolBuilder::new().num_threads(config.workers).build()?;
    let progress = progress::bar(tasks.len() as u64, "tasks")?;
    let next = AtomicUsize::new(0);

    let per_thread: Vec<Result<Vec<(usize, R)>>> = pool.broadcast(|_| -> Result<Vec<(usize, R)>> {
        let mut engine = make_engine();
        let mut done = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            let Some(desc) = tasks.get(index) else {
                break;
            };
            done.push((index, run(&mut engine, desc)?));
            progress.inc(1);
        }
        Ok(done)
    });
    progress.finish();

    let mut results = Vec::with_capacity(tasks.len());
    for part in per_thread {
        results.extend(part?);
    }
    results.sort_unstable_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, r)| r).collect())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        workers: cli.workers,
        hash_mb: cli.hash_mb,
        sub_task_cache_size: cli.sub_task_cache_size,
        task_type: cli.task_type,
        ..ConfigOverrides::default()
    };
    let config = merge_config(load_config_file(&cli.config)?, &overrides);
    log::info!("config: {config:?}");

    let data = read_all(&cli.tasks).with_context(|| format!("Failed to read {}", cli.tasks.display()))?;
    let tasks = decode_tasks(&data).with_context(|| format!("Failed to decode {}", cli.tasks.display()))?;
    log::info!("{} tasks loaded", tasks.len());

    let start = Instant::now();
    let header = |nodes: u64| WorkerHeader {
        worker_id: config.worker_id,
        allocated_mb: i32::try_from(config.hash_mb * config.workers).unwrap_or(i32::MAX),
        threads: i32::try_from(config.workers).unwrap_or(i32::MAX),
        mips: (nodes as f64 / start.elapsed().as_secs_f64().max(1e-9) / 1e6) as f32,
    };

    let totals: Vec<(i64, Summary)> = match config.task_type {
        TaskType::Stats => {
            let cache = SubTaskCache::<Summary>::new(config.sub_task_cache_size);
            let rows = run_parallel(
                &config,
                &tasks,
                || StatsPerft::new(config.hash_mb),
                |engine, desc| {
                    let mut task = StatsTask::from_descriptor(desc, &cache)
                        .with_context(|| format!("task {}", desc.task_id))?;
                    task.run(engine, &cache)
                        .with_context(|| format!("task {}", desc.task_id))?;
                    let row = task
                        .to_submission()
                        .with_context(|| format!("task {} did not complete", desc.task_id))?;
                    Ok(row.to_vec())
                },
            )?;
            let mut totals = Vec::with_capacity(rows.len());
            for row in &rows {
                let (task_id, summary) = decompress_summary(row)?;
                totals.push((task_id as i64, summary));
            }
            let nodes = totals.iter().map(|(_, s)| s.nodes).sum();
            let batch = FullResultBatch {
                header: header(nodes),
                results: rows,
            };
            write_all(&cli.output, &encode_full_results(&batch))
                .with_context(|| format!("Failed to write {}", cli.output.display()))?;
            totals
        }
        TaskType::Nodes => {
            let cache = SubTaskCache::<u64>::new(config.sub_task_cache_size);
            let results = run_parallel(
                &config,
                &tasks,
                || BulkPerft::new(config.hash_mb),
                |engine, desc| {
                    let mut task = NodesTask::from_descriptor(desc, &cache)
                        .with_context(|| format!("task {}", desc.task_id))?;
                    task.run(engine, &cache)
                        .with_context(|| format!("task {}", desc.task_id))?;
                    task.to_submission()
                        .with_context(|| format!("task {} did not complete", desc.task_id))
                },
            )?;
            let nodes = results.iter().map(|(_, n)| n).sum();
            let totals: Vec<(i64, Summary)> = results
                .iter()
                .map(|&(task_id, nodes)| {
                    let summary = Summary {
                        nodes,
                        ..Summary::default()
                    };
                    (task_id as i64, summary)
                })
                .collect();
            let batch = FastResultBatch {
                header: header(nodes),
                results,
            };
            write_all(&cli.output, &encode_fast_results(&batch))
                .with_context(|| format!("Failed to write {}", cli.output.display()))?;
            totals
        }
    };

    let elapsed = start.elapsed();
    eprintln!(
        "{} tasks in {:.2}s -> {}",
        totals.len(),
        elapsed.as_secs_f64(),
        cli.output.display()
    );

    if let Some(path) = &cli.manifest {
        let manifest = TaskManifest::load(path)?;
        let total = manifest.combine(totals.iter().map(|(id, s)| (*id, s)))?;
        println!("fen: {}", manifest.fen);
        println!("depth: {}", manifest.depth);
        println!("nodes: {}", total.nodes);
        if config.task_type == TaskType::Stats {
            println!("{}", serde_json::to_string_pretty(&total)?);
        }
    }
    Ok(())
}
