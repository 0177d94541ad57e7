//! # 数据模型模块
//!
//! 定义评估管线使用的核心数据结构。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `correction/`, `matcher/`, `metrics/` 使用
//! - 子模块: structure, entry, formula

pub mod entry;
pub mod formula;
pub mod structure;

pub use entry::{ComputedEntry, EnergyAdjustment, RunType};
pub use structure::{Atom, Crystal, Lattice};
