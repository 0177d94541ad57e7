//! # 工具函数模块
//!
//! ## 依赖关系
//! - 被 `commands/`, `metrics/`, `relax/` 使用
//! - 子模块: output, progress

pub mod output;
pub mod progress;
