//! # 批量文件处理模块
//!
//! 收集待评估的结构文件。
//!
//! ## 依赖关系
//! - 被 `commands/evaluate.rs` 使用
//! - 子模块: collector

pub mod collector;

pub use collector::FileCollector;
