//! ワーカー設定（TOML）
//!
//! 設定ファイルの値をコマンドライン引数で上書きし、最小値を下回る値は警告して引き上げる。
//!
//! ```toml
//! worker_id = 0
//! workers = 8
//! hash_mb = 2048
//! sub_task_cache_size = 4096
//! task_type = "stats"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use perftree_core::MAX_DEPTH;
use perftree_core::pipeline::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};

pub const MIN_HASH_MB: usize = 256;
pub const MIN_SUB_TASK_CACHE_SIZE: usize = 256;

/// 実行するタスクの種類
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// 統計付き（全結果バッチ）
    #[default]
    Stats,
    /// ノード数のみ（高速結果バッチ）
    Nodes,
}

/// 設定ファイルの内容（未指定の項目は既定値）
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfigFile {
    #[serde(default)]
    pub worker_id: Option<i32>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub hash_mb: Option<usize>,
    #[serde(default)]
    pub sub_task_cache_size: Option<usize>,
    #[serde(default)]
    pub sub_task_launch_depth: Option<u32>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub max_workers: Option<usize>,
    #[serde(default)]
    pub task_type: Option<TaskType>,
}

/// コマンドラインからの上書き
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub workers: Option<usize>,
    pub hash_mb: Option<usize>,
    pub sub_task_cache_size: Option<usize>,
    pub batch_size: Option<usize>,
    pub max_workers: Option<usize>,
    pub task_type: Option<TaskType>,
}

/// 確定した設定
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub worker_id: i32,
    /// タスク実行スレッド数
    pub workers: usize,
    /// スレッドごとの置換表サイズ
    pub hash_mb: usize,
    /// サブタスクキャッシュのエントリ数
    pub sub_task_cache_size: usize,
    pub sub_task_launch_depth: u32,
    /// フェーズAの1ファイルあたりレコード数
    pub batch_size: usize,
    /// フェーズAの並列数
    pub max_workers: usize,
    pub task_type: TaskType,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: 0,
            workers: 4,
            hash_mb: 1024,
            sub_task_cache_size: 1024,
            sub_task_launch_depth: 3,
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: 4,
            task_type: TaskType::Stats,
        }
    }
}

/// 設定ファイルを読む。存在しなければ None
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<Option<WorkerConfigFile>> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("config {} not found, using defaults", path.display());
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file = toml::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(file))
}

/// 既定値 < 設定ファイル < コマンドライン の順で決める
pub fn merge_config(file: Option<WorkerConfigFile>, cli: &ConfigOverrides) -> WorkerConfig {
    let mut out = WorkerConfig::default();
    let mut max_workers = None;
    if let Some(f) = file {
        if let Some(x) = f.worker_id {
            out.worker_id = x;
        }
        if let Some(x) = f.workers {
            out.workers = x;
        }
        if let Some(x) = f.hash_mb {
            out.hash_mb = x;
        }
        if let Some(x) = f.sub_task_cache_size {
            out.sub_task_cache_size = x;
        }
        if let Some(x) = f.sub_task_launch_depth {
            out.sub_task_launch_depth = x;
        }
        if let Some(x) = f.batch_size {
            out.batch_size = x;
        }
        if let Some(x) = f.task_type {
            out.task_type = x;
        }
        max_workers = f.max_workers;
    }
    if let Some(x) = cli.workers {
        out.workers = x;
    }
    if let Some(x) = cli.hash_mb {
        out.hash_mb = x;
    }
    if let Some(x) = cli.sub_task_cache_size {
        out.sub_task_cache_size = x;
    }
    if let Some(x) = cli.batch_size {
        out.batch_size = x;
    }
    if let Some(x) = cli.task_type {
        out.task_type = x;
    }
    // 未指定なら workers に合わせる
    out.max_workers = cli.max_workers.or(max_workers).unwrap_or(out.workers);
    validate(&mut out);
    out
}

fn validate(c: &mut WorkerConfig) {
    macro_rules! at_least {
        ($name:ident, $min:expr) => {
            if c.$name < $min {
                log::warn!("{}={} is below the minimum; raised to {}", stringify!($name), c.$name, $min);
                c.$name = $min;
            }
        };
    }
    at_least!(workers, 1);
    at_least!(max_workers, 1);
    at_least!(batch_size, 1);
    at_least!(hash_mb, MIN_HASH_MB);
    at_least!(sub_task_cache_size, MIN_SUB_TASK_CACHE_SIZE);
    if c.sub_task_launch_depth > MAX_DEPTH {
        log::warn!("sub_task_launch_depth={} exceeds {MAX_DEPTH}; clamped", c.sub_task_launch_depth);
        c.sub_task_launch_depth = MAX_DEPTH;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = load_config_file(dir.path().join("worker.toml")).unwrap();
        assert!(file.is_none());
        assert_eq!(merge_config(file, &ConfigOverrides::default()), WorkerConfig::default());
    }

    #[test]
    fn test_parse_file_and_cli_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.toml");
        std::fs::write(
            &path,
            "worker_id = 7\nworkers = 8\nhash_mb = 2048\nsub_task_cache_size = 4096\ntask_type = \"nodes\"\n",
        )
        .unwrap();
        let file = load_config_file(&path).unwrap();
        let cli = ConfigOverrides {
            hash_mb: Some(512),
            ..ConfigOverrides::default()
        };
        let cfg = merge_config(file, &cli);
        assert_eq!(cfg.worker_id, 7);
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.max_workers, 8);
        assert_eq!(cfg.hash_mb, 512);
        assert_eq!(cfg.sub_task_cache_size, 4096);
        assert_eq!(cfg.task_type, TaskType::Nodes);
    }

    #[test]
    fn test_minimums_are_enforced() {
        let file = WorkerConfigFile {
            workers: Some(0),
            hash_mb: Some(16),
            sub_task_cache_size: Some(10),
            sub_task_launch_depth: Some(99),
            ..WorkerConfigFile::default()
        };
        let cfg = merge_config(Some(file), &ConfigOverrides::default());
        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.max_workers, 1);
        assert_eq!(cfg.hash_mb, MIN_HASH_MB);
        assert_eq!(cfg.sub_task_cache_size, MIN_SUB_TASK_CACHE_SIZE);
        assert_eq!(cfg.sub_task_launch_depth, MAX_DEPTH);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.toml");
        std::fs::write(&path, "api_key = \"x\"\n").unwrap();
        assert!(load_config_file(&path).is_err());
    }
}
