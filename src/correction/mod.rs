//! # 能量修正方案模块
//!
//! 将原始 DFT/ML 总能量修正为跨计算设置可比的能量。
//!
//! ## 设计
//! 每个方案实现 `CorrectionScheme`：输入一条计算能量记录，输出加性修正项
//! 列表，或以兼容性拒绝（`EvalError::Compatibility`）拒绝该记录。方案自身
//! 无可变状态，修正表为编译期常量，并发调用无需加锁。
//!
//! 拒绝是"丢弃该记录"的信号而非崩溃：调用方必须将被拒记录从比较集合中
//! 剔除，而不能当作零修正继续使用。
//!
//! ## 依赖关系
//! - 被 `metrics/`, `commands/` 使用
//! - 使用 `models/entry.rs`, `error.rs`
//! - 子模块: identity, mp2020, tri2024

pub mod identity;
pub mod mp2020;
pub mod tri2024;

pub use identity::IdentityCorrection;
pub use mp2020::Mp2020Correction;
pub use tri2024::Tri2024Correction;

use crate::error::Result;
use crate::models::{ComputedEntry, EnergyAdjustment};

/// 能量修正方案接口
pub trait CorrectionScheme: Send + Sync {
    /// 方案名称，同时用作参考数据集的修正基准标签
    fn name(&self) -> &'static str;

    /// 计算一条记录的加性修正项
    ///
    /// 记录与方案不兼容时返回 `EvalError::Compatibility`，携带记录标识
    /// 与违规的 run type，且在任何修正计算之前触发。
    fn adjustments_for(&self, entry: &ComputedEntry) -> Result<Vec<EnergyAdjustment>>;

    /// 修正后总能量：原始能量 + Σ 修正项
    fn corrected_energy(&self, entry: &ComputedEntry) -> Result<f64> {
        let adjustments = self.adjustments_for(entry)?;
        Ok(entry.corrected_energy(&adjustments))
    }
}

/// 修正方案种类（CLI 解析目标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemeKind {
    /// No correction, compare raw energies
    Identity,
    /// Materials Project 2020 style compatibility
    Mp2020,
    /// TRI 2024 linear correction scheme
    Tri2024,
}

/// 按种类构造修正方案（每次调用新建实例，不共享默认对象）
pub fn make_scheme(kind: SchemeKind) -> Box<dyn CorrectionScheme> {
    match kind {
        SchemeKind::Identity => Box::new(IdentityCorrection),
        SchemeKind::Mp2020 => Box::new(Mp2020Correction),
        SchemeKind::Tri2024 => Box::new(Tri2024Correction),
    }
}
