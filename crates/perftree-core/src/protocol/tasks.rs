//! タスク記述子リスト
//!
//! ```text
//! i32 count
//! count x { i64 task_id | i32 len | len bytes UTF-8 board | i32 depth | i32 launch_depth }
//! ```

use serde::{Deserialize, Serialize};

use super::error::{ProtocolError, ProtocolResult};
use super::wire::{Decoder, put_i32, put_i64, put_len};
use crate::position::{Position, codec};

/// base64 化したコンパクト表現の文字数
const BASE64_BOARD_LEN: usize = 36;

/// 配布される1タスク
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub task_id: i64,
    /// FEN またはコンパクト表現の base64
    pub board: String,
    pub depth: i32,
    pub launch_depth: i32,
}

impl TaskDescriptor {
    /// 局面を取り出す（36文字で空白を含まなければ base64、それ以外は FEN）
    pub fn position(&self) -> ProtocolResult<Position> {
        parse_board(&self.board)
    }
}

/// タスクの局面文字列を解釈
pub fn parse_board(text: &str) -> ProtocolResult<Position> {
    let text = text.trim();
    if text.len() == BASE64_BOARD_LEN && !text.contains(char::is_whitespace) {
        let board = codec::from_base64(text)?;
        return Ok(codec::deserialize(&board)?);
    }
    Ok(Position::from_fen(text)?)
}

/// タスク列をバイナリにする
pub fn encode_tasks(tasks: &[TaskDescriptor]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + tasks.len() * 80);
    put_len(&mut out, tasks.len());
    for task in tasks {
        put_i64(&mut out, task.task_id);
        put_len(&mut out, task.board.len());
        out.extend_from_slice(task.board.as_bytes());
        put_i32(&mut out, task.depth);
        put_i32(&mut out, task.launch_depth);
    }
    out
}

/// バイナリからタスク列を復元
pub fn decode_tasks(data: &[u8]) -> ProtocolResult<Vec<TaskDescriptor>> {
    let mut d = Decoder::new(data);
    let count = d.length("task count")?;
    // 1タスクは最低 20 バイト
    let mut tasks = Vec::with_capacity(count.min(d.remaining() / 20));
    for _ in 0..count {
        let task_id = d.i64("task id")?;
        let len = d.length("board length")?;
        let bytes = d.bytes(len, "board")?;
        let board = std::str::from_utf8(bytes).map_err(|_| ProtocolError::Utf8)?.to_string();
        let depth = d.i32("depth")?;
        let launch_depth = d.i32("launch depth")?;
        tasks.push(TaskDescriptor {
            task_id,
            board,
            depth,
            launch_depth,
        });
    }
    d.finish()?;
    Ok(tasks)
}
