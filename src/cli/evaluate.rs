//! # evaluate 子命令 CLI 定义
//!
//! 评估管线统一入口的参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/evaluate.rs`
//! - 使用 `matcher/`, `correction/`, `relax/` 的种类枚举与常量

use crate::correction::SchemeKind;
use crate::matcher::MatcherKind;
use crate::relax::DEFAULT_ENGINE;
use clap::Args;
use std::path::PathBuf;

/// evaluate 子命令参数
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Input: structure file or directory containing structure files
    pub structures: PathBuf,

    /// Skip relaxation and score the input structures as-is
    #[arg(long, default_value_t = false)]
    pub no_relax: bool,

    /// CSV file with externally computed energies (column: energy_ev).
    /// Mutually exclusive with relaxation.
    #[arg(long)]
    pub energies: Option<PathBuf>,

    /// Structure matcher to use
    #[arg(long, value_enum, default_value = "disordered")]
    pub matcher: MatcherKind,

    /// Energy correction scheme. Must match the reference dataset's basis.
    #[arg(long, value_enum, default_value = "mp2020")]
    pub scheme: SchemeKind,

    /// Save the metrics report as a CSV file
    #[arg(long)]
    pub save_as: Option<PathBuf>,

    /// Reference dataset directory (default: built-in dataset)
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// ML potential identifier passed to the relaxation engine
    #[arg(long)]
    pub potential: Option<String>,

    /// Compute device passed to the relaxation engine
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Relaxation engine executable
    #[arg(long, default_value = DEFAULT_ENGINE)]
    pub engine: String,

    /// Directory to save relaxed structures
    #[arg(long)]
    pub structures_output: Option<PathBuf>,

    /// Save a scatter plot of energy above reference (PNG)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Glob pattern for input files (directory mode)
    #[arg(long, default_value = "POSCAR*,*.vasp,*.poscar")]
    pub pattern: String,

    /// Recurse into subdirectories (directory mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel matching jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
