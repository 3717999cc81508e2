//! 進捗表示

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec}) {msg}";
const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner} {msg}";

/// 件数の分かっている処理用
pub fn bar(len: u64, msg: &'static str) -> Result<ProgressBar> {
    let progress = ProgressBar::new(len);
    progress.set_style(ProgressStyle::default_bar().template(BAR_TEMPLATE)?);
    progress.set_message(msg);
    Ok(progress)
}

/// 件数の分からない処理用
pub fn spinner(msg: &'static str) -> Result<ProgressBar> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::default_spinner().template(SPINNER_TEMPLATE)?);
    progress.set_message(msg);
    progress.enable_steady_tick(std::time::Duration::from_millis(200));
    Ok(progress)
}
