//! タスクファイルに添える JSON マニフェスト
//!
//! 分割前の局面と、各タスクがそこから何通りで到達するかを記録する。
//! 結果を出現回数倍して足し合わせると元局面の perft になる。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use perftree_core::perft::Summary;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWeight {
    pub task_id: i64,
    pub occurrences: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskManifest {
    pub fen: String,
    pub depth: u32,
    pub split_depth: u32,
    pub tasks: Vec<TaskWeight>,
}

impl TaskManifest {
    /// タスクファイルの隣に置く既定のパス（`tasks.bin` → `tasks.json`）
    pub fn default_path(tasks_path: &Path) -> PathBuf {
        tasks_path.with_extension("json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// (task_id, 結果) を出現回数で重み付けして合算する。全タスクの結果が必要
    pub fn combine<'a, I>(&self, results: I) -> Result<Summary>
    where
        I: IntoIterator<Item = (i64, &'a Summary)>,
    {
        let weights: HashMap<i64, u32> = self.tasks.iter().map(|t| (t.task_id, t.occurrences)).collect();
        let mut total = Summary::default();
        let mut seen = 0usize;
        for (task_id, summary) in results {
            let Some(&occurrences) = weights.get(&task_id) else {
                bail!("task {task_id} is not in the manifest");
            };
            total
                .add_scaled(summary, u64::from(occurrences))
                .with_context(|| format!("Failed to weight task {task_id}"))?;
            seen += 1;
        }
        if seen != self.tasks.len() {
            bail!("expected {} task results, got {seen}", self.tasks.len());
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> TaskManifest {
        TaskManifest {
            fen: "startpos".into(),
            depth: 4,
            split_depth: 2,
            tasks: vec![
                TaskWeight {
                    task_id: 1,
                    occurrences: 1,
                },
                TaskWeight {
                    task_id: 2,
                    occurrences: 3,
                },
            ],
        }
    }

    #[test]
    fn test_combine_weights_results() {
        let a = Summary {
            nodes: 10,
            captures: 1,
            ..Summary::default()
        };
        let b = Summary {
            nodes: 20,
            ..Summary::default()
        };
        let total = manifest().combine([(1, &a), (2, &b)]).unwrap();
        assert_eq!(total.nodes, 70);
        assert_eq!(total.captures, 1);
    }

    #[test]
    fn test_combine_rejects_missing_or_unknown() {
        let s = Summary::default();
        assert!(manifest().combine([(1, &s)]).is_err());
        assert!(manifest().combine([(1, &s), (9, &s)]).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = TaskManifest::default_path(&dir.path().join("tasks.bin"));
        assert_eq!(path.file_name().unwrap(), "tasks.json");
        manifest().save(&path).unwrap();
        assert_eq!(TaskManifest::load(&path).unwrap(), manifest());
    }
}
