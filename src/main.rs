//! # cryseval - 生成晶体结构评估工具
//!
//! 将生成模型产出的候选晶体结构与已知材料参考数据集比对，
//! 按结构相似度与能量稳定性打分。
//!
//! ## 子命令
//! - `evaluate` - 评估管线：（可选）弛豫 → 能量修正 → 结构匹配 → 指标
//! - `correct`  - 对能量表单独应用修正方案
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── pipeline/   (评估编排器)
//!   │     ├── metrics/    (指标计算引擎)
//!   │     ├── correction/ (能量修正方案)
//!   │     ├── matcher/    (结构匹配器)
//!   │     ├── reference/  (参考数据集)
//!   │     ├── relax/      (弛豫调用器)
//!   │     └── parsers/    (格式解析器)
//!   ├── models/     (数据模型)
//!   ├── batch/      (文件收集)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod correction;
mod error;
mod matcher;
mod metrics;
mod models;
mod parsers;
mod pipeline;
mod reference;
mod relax;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
