//! # 计算能量记录数据模型
//!
//! 存储单个结构的 DFT/ML 总能量及其修正项。
//!
//! ## 不变量
//! - `ComputedEntry` 的组分非空，总能量有限，构造时校验
//! - 多个 `EnergyAdjustment` 线性求和：修正后能量 = 原始能量 + Σ 修正项
//!
//! ## 依赖关系
//! - 被 `correction/`, `metrics/`, `commands/` 使用
//! - 使用 `models/structure.rs`, `error.rs`

use crate::error::{EvalError, Result};
use crate::models::Crystal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 计算方法标签，决定哪些能量修正适用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunType {
    /// 广义梯度近似 (PBE)
    Gga,
    /// GGA + Hubbard U
    GgaU,
    /// 其他方法（HSE, SCAN 等），原样保留标签
    Other(String),
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunType::Gga => write!(f, "GGA"),
            RunType::GgaU => write!(f, "GGA+U"),
            RunType::Other(tag) => write!(f, "{}", tag),
        }
    }
}

impl FromStr for RunType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim() {
            "GGA" => RunType::Gga,
            "GGA+U" => RunType::GgaU,
            other => RunType::Other(other.to_string()),
        })
    }
}

/// 命名的加性能量修正项 (eV)，值可为负
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyAdjustment {
    pub name: String,
    pub value_ev: f64,
}

impl EnergyAdjustment {
    pub fn new(name: impl Into<String>, value_ev: f64) -> Self {
        EnergyAdjustment {
            name: name.into(),
            value_ev,
        }
    }
}

/// 单个结构的计算能量记录（不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedEntry {
    /// 可选标识符，用于错误信息定位
    pub entry_id: Option<String>,

    /// 总能量 (eV)
    pub total_energy_ev: f64,

    /// 组分：元素 → 原胞内原子绝对数目
    pub composition: BTreeMap<String, f64>,

    /// 计算方法标签，未知时为 None
    pub run_type: Option<RunType>,
}

impl ComputedEntry {
    /// 创建记录并校验不变量：组分非空、计数非负、能量有限
    pub fn new(
        entry_id: Option<String>,
        total_energy_ev: f64,
        composition: BTreeMap<String, f64>,
        run_type: Option<RunType>,
    ) -> Result<Self> {
        if !total_energy_ev.is_finite() {
            return Err(EvalError::InvalidArgument(format!(
                "Total energy must be finite, got {}",
                total_energy_ev
            )));
        }
        if composition.is_empty() {
            return Err(EvalError::InvalidArgument(
                "Composition must not be empty".to_string(),
            ));
        }
        if let Some((el, count)) = composition.iter().find(|(_, c)| **c < 0.0) {
            return Err(EvalError::InvalidArgument(format!(
                "Negative atom count {} for element {}",
                count, el
            )));
        }

        Ok(ComputedEntry {
            entry_id,
            total_energy_ev,
            composition,
            run_type,
        })
    }

    /// 从晶体结构和能量构造记录
    pub fn from_crystal(crystal: &Crystal, energy_ev: f64, run_type: Option<RunType>) -> Result<Self> {
        ComputedEntry::new(
            Some(crystal.name.clone()),
            energy_ev,
            crystal.composition(),
            run_type,
        )
    }

    /// 记录标识（无 id 时为 "unknown"）
    pub fn id(&self) -> &str {
        self.entry_id.as_deref().unwrap_or("unknown")
    }

    /// 记录的方法标签文本（未设置时为 "none"）
    pub fn run_type_label(&self) -> String {
        match &self.run_type {
            Some(rt) => rt.to_string(),
            None => "none".to_string(),
        }
    }

    /// 总原子数
    pub fn num_atoms(&self) -> f64 {
        self.composition.values().sum()
    }

    /// 修正后能量：原始能量 + Σ 修正项（线性求和不变量）
    pub fn corrected_energy(&self, adjustments: &[EnergyAdjustment]) -> f64 {
        self.total_energy_ev + adjustments.iter().map(|a| a.value_ev).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::formula::parse_formula;

    fn entry(formula: &str, energy: f64, run_type: Option<RunType>) -> ComputedEntry {
        ComputedEntry::new(
            Some("test".to_string()),
            energy,
            parse_formula(formula).unwrap(),
            run_type,
        )
        .unwrap()
    }

    #[test]
    fn test_run_type_parse_and_display() {
        assert_eq!("GGA".parse::<RunType>().unwrap(), RunType::Gga);
        assert_eq!("GGA+U".parse::<RunType>().unwrap(), RunType::GgaU);
        assert_eq!(
            "HSE".parse::<RunType>().unwrap(),
            RunType::Other("HSE".to_string())
        );
        assert_eq!(RunType::GgaU.to_string(), "GGA+U");
    }

    #[test]
    fn test_entry_rejects_empty_composition() {
        let result = ComputedEntry::new(None, -1.0, BTreeMap::new(), Some(RunType::Gga));
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_rejects_non_finite_energy() {
        let mut comp = BTreeMap::new();
        comp.insert("Fe".to_string(), 1.0);
        let result = ComputedEntry::new(None, f64::NAN, comp, Some(RunType::Gga));
        assert!(result.is_err());
    }

    #[test]
    fn test_corrected_energy_sums_linearly() {
        let e = entry("FeO", -10.0, Some(RunType::GgaU));
        let adjustments = vec![
            EnergyAdjustment::new("a", -1.08),
            EnergyAdjustment::new("b", -3.189),
        ];

        assert!((e.corrected_energy(&adjustments) - (-14.269)).abs() < 1e-10);
        // 空修正列表等于原始能量
        assert!((e.corrected_energy(&[]) - (-10.0)).abs() < 1e-12);
    }

    #[test]
    fn test_run_type_label_for_unset() {
        let e = entry("Si", -5.0, None);
        assert_eq!(e.run_type_label(), "none");
    }
}
