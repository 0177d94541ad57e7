//! # correct 子命令 CLI 定义
//!
//! 对能量表单独应用修正方案的参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/correct.rs`

use crate::correction::SchemeKind;
use clap::Args;
use std::path::PathBuf;

/// correct 子命令参数
#[derive(Args, Debug)]
pub struct CorrectArgs {
    /// Input CSV (columns: entry_id, formula, energy_ev, run_type)
    pub input: PathBuf,

    /// Energy correction scheme to apply
    #[arg(long, value_enum, default_value = "mp2020")]
    pub scheme: SchemeKind,

    /// Save corrected energies as a CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
