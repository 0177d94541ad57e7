//! # 参考数据集模块
//!
//! 加载与持有候选结构所比对的已知材料集合。
//!
//! ## 依赖关系
//! - 被 `pipeline/`, `metrics/`, `commands/` 使用
//! - 子模块: dataset

pub mod dataset;

pub use dataset::{ReferenceDataset, ReferenceEntry};
