//! perftree のコマンドラインツール群の共通部品

pub mod config;
pub mod io;
pub mod manifest;
pub mod progress;
