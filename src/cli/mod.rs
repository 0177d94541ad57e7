//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `evaluate`: 评估生成结构（弛豫 → 能量修正 → 匹配 → 指标）
//! - `correct`: 对能量表单独应用修正方案
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: correct, evaluate

pub mod correct;
pub mod evaluate;

use clap::{Parser, Subcommand};

/// cryseval - 生成晶体结构评估工具
#[derive(Parser)]
#[command(name = "cryseval")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Evaluate generated crystal structures against reference datasets", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate structures: relax, correct energies, match against a reference dataset
    Evaluate(evaluate::EvaluateArgs),

    /// Apply an energy correction scheme to a CSV of computed energies
    Correct(correct::CorrectArgs),
}
