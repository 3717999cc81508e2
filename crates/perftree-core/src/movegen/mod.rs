//! 合法手生成

mod generator;
mod movelist;

pub use generator::{find_uci_move, generate_moves, legal_moves};
pub use movelist::{MAX_MOVES, MoveList};
