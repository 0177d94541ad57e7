//! # TRI-2024 线性修正方案
//!
//! 实现发表于
//!
//! A Simple Linear Relation Solves Unphysical DFT Energy Corrections
//! B. A. Rohr, S. K. Suram, J. S. Bakander, ChemRxiv,
//! 10.26434/chemrxiv-2024-q5058, (2024)
//!
//! 的能量修正方案。
//!
//! ## 算法
//! 1. run type 不是 GGA / GGA+U 时立即拒绝（先于任何修正计算）
//! 2. GGA 与 GGA+U：乘性重标度 `E' = E * 1.108`，以加性项
//!    `E * (1.108 - 1)` 表达（下游能量模型只支持修正项线性求和）
//! 3. GGA+U 额外：对出现在固定 8 元素修正表中的元素，
//!    按原子绝对数目 × 表值求和
//!
//! ## 依赖关系
//! - 被 `correction/mod.rs` 导出
//! - 使用 `models/entry.rs`, `error.rs`

use crate::correction::CorrectionScheme;
use crate::error::{EvalError, Result};
use crate::models::{ComputedEntry, EnergyAdjustment, RunType};

/// 见文章补充材料 Section 2.1
const PBE_CORRECTION: f64 = 1.108;

/// 见文章补充材料 Table 1，单位 eV，按原子计
const U_CORRECTION: [(&str, f64); 8] = [
    ("Co", -2.275),
    ("Cr", -2.707),
    ("Fe", -3.189),
    ("Mn", -2.28),
    ("Mo", -4.93),
    ("Ni", -3.361),
    ("V", -2.774),
    ("W", -6.261),
];

/// TRI-2024 线性修正方案（无状态，修正表为编译期常量）
#[derive(Debug, Clone, Copy, Default)]
pub struct Tri2024Correction;

impl Tri2024Correction {
    fn u_correction_for(element: &str) -> Option<f64> {
        U_CORRECTION
            .iter()
            .find(|(el, _)| *el == element)
            .map(|(_, v)| *v)
    }
}

impl CorrectionScheme for Tri2024Correction {
    fn name(&self) -> &'static str {
        "TRI2024"
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

        // 所有 PBE / PBE+U 计算的乘性重标度，改写为加性项
        adjustments.push(EnergyAdjustment::new(
            "TRI110PBE",
            entry.total_energy_ev * (PBE_CORRECTION - 1.0),
        ));

        if run_type == RunType::GgaU {
            // 表值按原子计，乘以组分中的原子绝对数目而非分数组分
            let u_correction: f64 = entry
                .composition
                .iter()
                .filter_map(|(el, count)| Self::u_correction_for(el).map(|v| count * v))
                .sum();

            adjustments.push(EnergyAdjustment::new("TRI110PBE_U", u_correction));
        }

        Ok(adjustments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::formula::parse_formula;

    fn entry(formula: &str, energy: f64, run_type: Option<RunType>) -> ComputedEntry {
        ComputedEntry::new(
            Some("tri-test".to_string()),
            energy,
            parse_formula(formula).unwrap(),
            run_type,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_foreign_run_types() {
        let scheme = Tri2024Correction;
        let cases = [
            Some(RunType::Other("PBE".to_string())),
            Some(RunType::Other("HSE".to_string())),
            None,
        ];

        for run_type in cases {
            let err = scheme
                .adjustments_for(&entry("Fe2O3", -10.0, run_type))
                .unwrap_err();
            assert!(err.is_compatibility_rejection());
        }
    }

    #[test]
    fn test_rejection_carries_entry_context() {
        let scheme = Tri2024Correction;
        let err = scheme
            .adjustments_for(&entry("Si", -5.0, Some(RunType::Other("HSE".to_string()))))
            .unwrap_err();

        match err {
            EvalError::Compatibility { entry_id, run_type } => {
                assert_eq!(entry_id, "tri-test");
                assert_eq!(run_type, "HSE");
            }
            other => panic!("Expected Compatibility error, got {:?}", other),
        }
    }

    #[test]
    fn test_gga_multiplicative_reframing() {
        let scheme = Tri2024Correction;
        let e = entry("Si2", -12.0, Some(RunType::Gga));

        let adjustments = scheme.adjustments_for(&e).unwrap();
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].name, "TRI110PBE");
        assert!((adjustments[0].value_ev - (-12.0 * 0.108)).abs() < 1e-12);

        // 加性改写与乘性原式闭合：E + E*(k-1) == E*k
        let corrected = scheme.corrected_energy(&e).unwrap();
        assert!((corrected - (-12.0 * 1.108)).abs() < 1e-10);
    }

    #[test]
    fn test_gga_u_element_table() {
        let scheme = Tri2024Correction;
        // Fe 在表中 (-3.189)，O 不在表中，贡献为零
        let e = entry("Fe2O3", -30.0, Some(RunType::GgaU));

        let adjustments = scheme.adjustments_for(&e).unwrap();
        assert_eq!(adjustments.len(), 2);
        assert_eq!(adjustments[1].name, "TRI110PBE_U");
        assert!((adjustments[1].value_ev - 2.0 * (-3.189)).abs() < 1e-12);
    }

    #[test]
    fn test_u_correction_uses_absolute_counts() {
        let scheme = Tri2024Correction;
        // Fe4O6 与 Fe2O3 分数组分相同，但 +U 修正必须翻倍
        let small = entry("Fe2O3", -30.0, Some(RunType::GgaU));
        let big = entry("Fe4O6", -60.0, Some(RunType::GgaU));

        let u_small = scheme.adjustments_for(&small).unwrap()[1].value_ev;
        let u_big = scheme.adjustments_for(&big).unwrap()[1].value_ev;

        assert!((u_big - 2.0 * u_small).abs() < 1e-12);
    }

    #[test]
    fn test_multiple_table_elements_sum() {
        let scheme = Tri2024Correction;
        let e = entry("FeNi2O4", -40.0, Some(RunType::GgaU));

        let adjustments = scheme.adjustments_for(&e).unwrap();
        let expected = 1.0 * (-3.189) + 2.0 * (-3.361);
        assert!((adjustments[1].value_ev - expected).abs() < 1e-12);
    }

    #[test]
    fn test_end_to_end_feo_example() {
        let scheme = Tri2024Correction;
        let e = entry("FeO", -10.0, Some(RunType::GgaU));

        let adjustments = scheme.adjustments_for(&e).unwrap();
        assert_eq!(adjustments.len(), 2);
        assert!((adjustments[0].value_ev - (-1.08)).abs() < 1e-10);
        assert!((adjustments[1].value_ev - (-3.189)).abs() < 1e-12);

        let corrected = scheme.corrected_energy(&e).unwrap();
        assert!((corrected - (-14.269)).abs() < 1e-10);
    }
}
