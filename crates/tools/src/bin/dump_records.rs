//! dump_records - バッチファイル・出力ファイルのレコードを FEN で表示する
//!
//! ```bash
//! cargo run -p perftree-tools --bin dump_records -- --input work/out/leaves_1.bin --limit 20
//! cargo run -p perftree-tools --bin dump_records -- --input work/batches/batch_00000.bin --kind batch
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use perftree_core::pipeline::{BoardRecord, OrderedRecord, RecordReader};
use perftree_core::position::codec;
use perftree_tools::io::{open_reader, open_writer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    /// フェーズAのバッチファイル（ハッシュ付き）
    Batch,
    /// フェーズB・Cのファイル
    Ordered,
}

#[derive(Parser, Debug)]
#[command(name = "dump_records", version, about = "レコードファイルを FEN で表示する")]
struct Cli {
    /// 入力ファイル（`.gz` は自動展開）
    #[arg(short, long)]
    input: PathBuf,

    #[arg(long, value_enum, default_value_t = Kind::Ordered)]
    kind: Kind,

    /// 表示件数の上限
    #[arg(long)]
    limit: Option<usize>,

    /// 出力先（既定は標準出力）
    #[arg(short, long, default_value = "-")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let limit = cli.limit.unwrap_or(usize::MAX);

    let reader = open_reader(&cli.input).with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let mut out = open_writer(&cli.output)?;

    match cli.kind {
        Kind::Batch => {
            let records = RecordReader::<_, BoardRecord>::new(reader)?;
            writeln!(out, "# {} records", records.header())?;
            for record in records.take(limit) {
                let record = record?;
                let pos = codec::deserialize(&record.board)?;
                writeln!(
                    out,
                    "{:016x} {} {} {}",
                    record.hash,
                    record.order,
                    record.occurrences,
                    pos.to_fen()
                )?;
            }
        }
        Kind::Ordered => {
            let records = RecordReader::<_, OrderedRecord>::new(reader)?;
            writeln!(out, "# {} records", records.header())?;
            for record in records.take(limit) {
                let record = record?;
                let pos = codec::deserialize(&record.board)?;
                writeln!(out, "{} {} {}", record.order, record.occurrences, pos.to_fen())?;
            }
        }
    }
    out.close()?;
    Ok(())
}
