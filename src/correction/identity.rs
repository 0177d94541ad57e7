//! # 恒等修正方案
//!
//! 不做任何修正，用于直接比较原始能量。
//!
//! ## 依赖关系
//! - 被 `correction/mod.rs` 导出

use crate::correction::CorrectionScheme;
use crate::error::Result;
use crate::models::{ComputedEntry, EnergyAdjustment};

/// 恒等方案：对任意 run type 都返回空修正列表，从不拒绝
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCorrection;

impl CorrectionScheme for IdentityCorrection {
    fn name(&self) -> &'static str {
        "Identity"
    }

    fn adjustments_for(&self, _entry: &ComputedEntry) -> Result<Vec<EnergyAdjustment>> {
        Ok(Vec::new())
    }
}
