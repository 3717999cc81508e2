//! perft - 局面の合法手列挙数を数える
//!
//! ```bash
//! cargo run --release -p perftree-tools --bin perft -- --depth 6
//! cargo run --release -p perftree-tools --bin perft -- \
//!   --fen "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1" \
//!   --depth 4 --mode stats --json
//! ```

use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use perftree_core::MAX_DEPTH;
use perftree_core::leaf::{LeafAccumulator, compressed_unique_leaf_nodes};
use perftree_core::perft::{BulkPerft, StatsPerft, Summary, UniquePerft};
use perftree_core::position::{Position, START_FEN};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
enum Mode {
    /// 末端局面数
    Bulk,
    /// 末端の指し手の分類集計
    Stats,
    /// 末端のユニーク局面数
    Unique,
    /// 末端局面の集約（ユニーク数と出現回数の合計）
    Leaves,
}

#[derive(Parser, Debug)]
#[command(name = "perft", version, about = "局面の perft を数える")]
struct Cli {
    /// 開始局面の FEN
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// 探索深さ
    #[arg(short, long)]
    depth: u32,

    #[arg(long, value_enum, default_value_t = Mode::Bulk)]
    mode: Mode,

    /// 置換表サイズ（MB）
    #[arg(long, default_value_t = 256)]
    hash_mb: usize,

    /// ルートの指し手ごとの内訳を出す（bulk のみ）
    #[arg(long, default_value_t = false)]
    divide: bool,

    /// 結果を JSON で出力
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    fen: String,
    depth: u32,
    mode: Mode,
    nodes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    unique: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    divide: Vec<(String, u64)>,
    hash: String,
    elapsed_ms: u128,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.depth > MAX_DEPTH {
        bail!("depth {} exceeds the maximum {MAX_DEPTH}", cli.depth);
    }
    if cli.divide && cli.mode != Mode::Bulk {
        bail!("--divide is only supported with --mode bulk");
    }
    let mut pos = Position::from_fen(&cli.fen).with_context(|| format!("Invalid FEN: {}", cli.fen))?;

    let start = Instant::now();
    let mut report = Report {
        fen: pos.to_fen(),
        depth: cli.depth,
        mode: cli.mode,
        nodes: 0,
        unique: None,
        summary: None,
        divide: Vec::new(),
        hash: pos.hash_hex(),
        elapsed_ms: 0,
    };

    match cli.mode {
        Mode::Bulk => {
            let mut engine = BulkPerft::new(cli.hash_mb);
            if cli.divide && cli.depth > 0 {
                for (mv, nodes) in engine.divide(&mut pos, cli.depth) {
                    report.nodes += nodes;
                    report.divide.push((mv.to_uci(), nodes));
                }
            } else {
                report.nodes = engine.perft(&mut pos, cli.depth);
            }
        }
        Mode::Stats => {
            let summary = StatsPerft::new(cli.hash_mb).perft(&mut pos, cli.depth);
            report.nodes = summary.nodes;
            report.summary = Some(summary);
        }
        Mode::Unique => {
            report.unique = Some(UniquePerft::new(cli.hash_mb).count(&mut pos, cli.depth));
        }
        Mode::Leaves => {
            let mut acc = LeafAccumulator::new();
            compressed_unique_leaf_nodes(&mut pos, cli.depth, &mut acc)?;
            let records = acc.into_discovered();
            report.nodes = records.iter().map(|r| u64::from(r.occurrences)).sum();
            report.unique = Some(records.len() as u64);
        }
    }
    report.elapsed_ms = start.elapsed().as_millis();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (mv, nodes) in &report.divide {
        println!("{mv}: {nodes}");
    }
    println!("fen: {}", report.fen);
    println!("hash: {}", report.hash);
    if report.mode != Mode::Unique {
        println!("nodes: {}", report.nodes);
    }
    if let Some(unique) = report.unique {
        println!("unique: {unique}");
    }
    if let Some(s) = &report.summary {
        println!("captures: {}", s.captures);
        println!("enpassants: {}", s.enpassants);
        println!("castles: {}", s.castles);
        println!("promotions: {}", s.promotions);
        println!(
            "checks: {} (direct {}, discovered {}, direct+discovered {}, double discovered {})",
            s.total_checks(),
            s.direct_checks,
            s.single_discovered_checks,
            s.direct_discovered_checks,
            s.double_discovered_checks
        );
        println!(
            "mates: {} (direct {}, discovered {}, direct+discovered {}, double discovered {})",
            s.total_mates(),
            s.direct_mates,
            s.single_discovered_mates,
            s.direct_discovered_mates,
            s.double_discovered_mates
        );
    }
    let secs = start.elapsed().as_secs_f64().max(1e-9);
    eprintln!("time: {} ms ({:.0} nps)", report.elapsed_ms, report.nodes as f64 / secs);
    Ok(())
}
