//! # MP2020 风格修正方案
//!
//! 基于 Materials Project 2020 兼容性方案的固定修正表：阴离子按原子数
//! 加性修正，GGA+U 过渡金属在氧化物/氟化物中附加 +U 混合修正。
//!
//! 完整的 MP2020 方案还依据氧化态区分过氧化物/超氧化物等子类；此处按
//! 组分表驱动的主表实现，门控与拒绝语义同 TRI-2024。
//!
//! ## 依赖关系
//! - 被 `correction/mod.rs` 导出
//! - 使用 `models/entry.rs`, `error.rs`

use crate::correction::CorrectionScheme;
use crate::error::{EvalError, Result};
use crate::models::{ComputedEntry, EnergyAdjustment, RunType};

/// 阴离子组分修正，单位 eV，按原子计
const ANION_CORRECTION: [(&str, f64); 8] = [
    ("O", -0.687),
    ("S", -0.503),
    ("F", -0.462),
    ("Cl", -0.614),
    ("Br", -0.534),
    ("I", -0.379),
    ("N", -0.361),
    ("H", -0.179),
];

/// GGA/GGA+U 混合修正（过渡金属，氧化物与氟化物），单位 eV，按原子计
const U_CORRECTION: [(&str, f64); 8] = [
    ("V", -1.700),
    ("Cr", -1.999),
    ("Mn", -1.668),
    ("Fe", -2.256),
    ("Co", -1.638),
    ("Ni", -2.541),
    ("Mo", -3.202),
    ("W", -4.438),
];

/// MP2020 风格修正方案（无状态，修正表为编译期常量）
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp2020Correction;

impl Mp2020Correction {
    fn table_value(table: &[(&str, f64)], element: &str) -> Option<f64> {
        table
            .iter()
            .find(|(el, _)| *el == element)
            .map(|(_, v)| *v)
    }
}

impl CorrectionScheme for Mp2020Correction {
    fn name(&self) -> &'static str {
        "MP2020"
    }

    fn adjustments_for(&self, entry: &ComputedEntry) -> Result<Vec<EnergyAdjustment>> {
        let run_type = match entry.run_type {
            Some(RunType::Gga) => RunType::Gga,
            Some(RunType::GgaU) => RunType::GgaU,
            _ => {
                return Err(EvalError::Compatibility {
                    entry_id: entry.id().to_string(),
                    run_type: entry.run_type_label(),
                });
            }
        };

        let mut adjustments = Vec::new();

        let anion_correction: f64 = entry
            .composition
            .iter()
            .filter_map(|(el, count)| Self::table_value(&ANION_CORRECTION, el).map(|v| count * v))
            .sum();
        if anion_correction != 0.0 {
            adjustments.push(EnergyAdjustment::new(
                "MP2020 anion correction",
                anion_correction,
            ));
        }

        // +U 混合修正只适用于含 O 或 F 的 GGA+U 计算
        let has_u_host = entry.composition.contains_key("O") || entry.composition.contains_key("F");
        if run_type == RunType::GgaU && has_u_host {
            let u_correction: f64 = entry
                .composition
                .iter()
                .filter_map(|(el, count)| Self::table_value(&U_CORRECTION, el).map(|v| count * v))
                .sum();
            if u_correction != 0.0 {
                adjustments.push(EnergyAdjustment::new(
                    "MP2020 GGA/GGA+U mixing correction",
                    u_correction,
                ));
            }
        }

        Ok(adjustments)
    }
}
