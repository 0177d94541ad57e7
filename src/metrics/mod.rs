//! # 指标计算引擎
//!
//! 由弛豫结构、能量、原始结构、参考数据集、匹配器与修正方案构造，
//! 聚合出命名指标映射。
//!
//! ## 指标集合
//! 结构指标总是可用；能量指标只在调用方提供能量时列出：
//! - `num_structures` — 评估的结构数
//! - `frac_matched_to_reference` — 与参考数据集匹配的比例
//! - `frac_novel` — 未匹配任何参考条目的比例
//! - `avg_structural_drift` — 原始 → 弛豫的平均分数坐标位移
//! - `frac_incompatible` — 被修正方案拒绝的记录比例
//! - `avg_corrected_energy_per_atom` — 修正后每原子能量均值 (eV)
//! - `avg_energy_above_reference` — 相对同式参考最低能量的均值 (eV/atom)
//! - `frac_stable` — 高于参考不超过 0.1 eV/atom 的比例
//!
//! ## 拒绝策略
//! 单条记录的兼容性拒绝只将该记录从所有能量指标的分母中剔除并计入
//! `frac_incompatible`，绝不中止整个批次；其他错误原样上报。
//!
//! ## 依赖关系
//! - 被 `pipeline/`, `commands/` 使用
//! - 使用 `correction/`, `matcher/`, `reference/`, `models/`
//! - 使用 `rayon` 做候选×参考的并行匹配
//! - 子模块: report, plot

pub mod plot;
pub mod report;

use crate::correction::CorrectionScheme;
use crate::error::{EvalError, Result};
use crate::matcher::StructureMatcher;
use crate::models::{ComputedEntry, Crystal, RunType};
use crate::reference::ReferenceDataset;
use crate::utils::progress;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// 稳定性阈值 (eV/atom)
const STABILITY_THRESHOLD_EV: f64 = 0.1;

/// 含 Hubbard U 修正的过渡金属：出现即视为 GGA+U 计算
const U_ELEMENTS: [&str; 8] = ["V", "Cr", "Mn", "Fe", "Co", "Ni", "Mo", "W"];

/// 基础指标（总是可用）
const STRUCTURE_METRICS: [&str; 4] = [
    "num_structures",
    "frac_matched_to_reference",
    "frac_novel",
    "avg_structural_drift",
];

/// 能量指标（提供能量时可用）
const ENERGY_METRICS: [&str; 4] = [
    "frac_incompatible",
    "avg_corrected_energy_per_atom",
    "avg_energy_above_reference",
    "frac_stable",
];

/// 由组分推断计算方法标签：含 +U 过渡金属即 GGA+U，否则 GGA
pub fn run_type_for(crystal: &Crystal) -> RunType {
    let has_u = crystal
        .composition()
        .keys()
        .any(|el| U_ELEMENTS.contains(&el.as_str()));
    if has_u {
        RunType::GgaU
    } else {
        RunType::Gga
    }
}

/// 单个结构的能量聚合结果
#[derive(Debug, Clone)]
enum EnergyOutcome {
    /// 修正成功：每原子修正后能量 + 相对参考的能量（参考缺同式条目时为 None）
    Corrected {
        per_atom_ev: f64,
        above_reference_ev: Option<f64>,
    },
    /// 被修正方案拒绝，剔除出能量指标
    Rejected,
}

/// 指标计算引擎
pub struct MetricsEvaluator {
    relaxed: Vec<Crystal>,
    energies: Option<Vec<f64>>,
    original: Vec<Crystal>,
    reference: ReferenceDataset,
    matcher: Box<dyn StructureMatcher>,
    scheme: Box<dyn CorrectionScheme>,
    /// 匹配并行度（0 = 自动）
    jobs: usize,
}

impl MetricsEvaluator {
    /// 从结构与能量构造引擎，校验输入长度一致
    pub fn from_structures_and_energies(
        relaxed: Vec<Crystal>,
        energies: Option<Vec<f64>>,
        original: Vec<Crystal>,
        reference: ReferenceDataset,
        matcher: Box<dyn StructureMatcher>,
        scheme: Box<dyn CorrectionScheme>,
        jobs: usize,
    ) -> Result<Self> {
        if relaxed.len() != original.len() {
            return Err(EvalError::Configuration(format!(
                "Got {} relaxed structures for {} original structures",
                relaxed.len(),
                original.len()
            )));
        }
        if let Some(energies) = &energies {
            if energies.len() != relaxed.len() {
                return Err(EvalError::Configuration(format!(
                    "Got {} energies for {} structures",
                    energies.len(),
                    relaxed.len()
                )));
            }
        }

        Ok(MetricsEvaluator {
            relaxed,
            energies,
            original,
            reference,
            matcher,
            scheme,
            jobs,
        })
    }

    /// 当前输入下可计算的全部指标名
    pub fn available_metrics(&self) -> Vec<&'static str> {
        let mut metrics: Vec<&'static str> = STRUCTURE_METRICS.to_vec();
        if self.energies.is_some() {
            metrics.extend_from_slice(&ENERGY_METRICS);
        }
        metrics
    }

    /// 计算指定指标；`save_as` 指定时持久化报告，`pretty_print` 打印表格
    pub fn compute_metrics(
        &self,
        metrics: &[&str],
        save_as: Option<&Path>,
        pretty_print: bool,
    ) -> Result<BTreeMap<String, f64>> {
        let available = self.available_metrics();
        if let Some(unknown) = metrics.iter().find(|m| !available.contains(m)) {
            return Err(EvalError::InvalidArgument(format!(
                "Unknown or unavailable metric: {}",
                unknown
            )));
        }

        let matched = self.match_against_reference();
        let outcomes = self.energy_outcomes()?;

        let n = self.relaxed.len() as f64;
        let mut result = BTreeMap::new();

        for &metric in metrics {
            let value = match metric {
                "num_structures" => n,
                "frac_matched_to_reference" => {
                    matched.iter().filter(|m| **m).count() as f64 / n
                }
                "frac_novel" => matched.iter().filter(|m| !**m).count() as f64 / n,
                "avg_structural_drift" => {
                    let total: f64 = self
                        .original
                        .iter()
                        .zip(self.relaxed.iter())
                        .map(|(o, r)| structural_drift(o, r))
                        .sum();
                    total / n
                }
                "frac_incompatible" => {
                    let outcomes = outcomes.as_ref().expect("energy metric requires energies");
                    outcomes
                        .iter()
                        .filter(|o| matches!(o, EnergyOutcome::Rejected))
                        .count() as f64
                        / n
                }
                "avg_corrected_energy_per_atom" => {
                    let values: Vec<f64> = outcomes
                        .as_ref()
                        .expect("energy metric requires energies")
                        .iter()
                        .filter_map(|o| match o {
                            EnergyOutcome::Corrected { per_atom_ev, .. } => Some(*per_atom_ev),
                            EnergyOutcome::Rejected => None,
                        })
                        .collect();
                    mean(&values)
                }
                "avg_energy_above_reference" => {
                    let values: Vec<f64> = outcomes
                        .as_ref()
                        .expect("energy metric requires energies")
                        .iter()
                        .filter_map(|o| match o {
                            EnergyOutcome::Corrected {
                                above_reference_ev, ..
                            } => *above_reference_ev,
                            EnergyOutcome::Rejected => None,
                        })
                        .collect();
                    mean(&values)
                }
                "frac_stable" => {
                    let values: Vec<f64> = outcomes
                        .as_ref()
                        .expect("energy metric requires energies")
                        .iter()
                        .filter_map(|o| match o {
                            EnergyOutcome::Corrected {
                                above_reference_ev, ..
                            } => *above_reference_ev,
                            EnergyOutcome::Rejected => None,
                        })
                        .collect();
                    if values.is_empty() {
                        f64::NAN
                    } else {
                        values
                            .iter()
                            .filter(|e| **e <= STABILITY_THRESHOLD_EV)
                            .count() as f64
                            / values.len() as f64
                    }
                }
                _ => unreachable!("metric availability checked above"),
            };
            result.insert(metric.to_string(), value);
        }

        if let Some(path) = save_as {
            report::save(&result, path)?;
        }
        if pretty_print {
            report::print_table(&result);
        }

        Ok(result)
    }

    /// 每个弛豫结构相对参考的能量 (eV/atom)；用于绘图
    ///
    /// None 表示该结构被拒绝或参考中无同式条目。
    pub fn energies_above_reference(&self) -> Result<Vec<Option<f64>>> {
        match self.energy_outcomes()? {
            None => Ok(vec![None; self.relaxed.len()]),
            Some(outcomes) => Ok(outcomes
                .into_iter()
                .map(|o| match o {
                    EnergyOutcome::Corrected {
                        above_reference_ev, ..
                    } => above_reference_ev,
                    EnergyOutcome::Rejected => None,
                })
                .collect()),
        }
    }

    /// 候选 × 参考的并行匹配
    fn match_against_reference(&self) -> Vec<bool> {
        let jobs = if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        };

        let pb = progress::create_progress_bar(self.relaxed.len() as u64, "Matching");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .expect("rayon thread pool");

        let matched: Vec<bool> = pool.install(|| {
            self.relaxed
                .par_iter()
                .map(|candidate| {
                    let found = self
                        .reference
                        .entries()
                        .iter()
                        .any(|entry| self.matcher.is_match(candidate, &entry.crystal));
                    pb.inc(1);
                    found
                })
                .collect()
        });

        pb.finish_and_clear();
        matched
    }

    /// 对每条记录应用修正方案；兼容性拒绝剔除记录，其他错误上报
    fn energy_outcomes(&self) -> Result<Option<Vec<EnergyOutcome>>> {
        let energies = match &self.energies {
            Some(energies) => energies,
            None => return Ok(None),
        };

        let mut outcomes = Vec::with_capacity(self.relaxed.len());

        for (crystal, &energy) in self.relaxed.iter().zip(energies.iter()) {
            let entry =
                ComputedEntry::from_crystal(crystal, energy, Some(run_type_for(crystal)))?;

            match self.scheme.corrected_energy(&entry) {
                Ok(corrected) => {
                    let per_atom_ev = corrected / entry.num_atoms();
                    let above_reference_ev = self
                        .reference
                        .min_energy_per_atom(&crystal.reduced_formula())
                        .map(|ref_min| per_atom_ev - ref_min);
                    outcomes.push(EnergyOutcome::Corrected {
                        per_atom_ev,
                        above_reference_ev,
                    });
                }
                Err(err) if err.is_compatibility_rejection() => {
                    outcomes.push(EnergyOutcome::Rejected);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Some(outcomes))
    }
}

/// 原始 → 弛豫的平均分数坐标位移（最小镜像约定）
fn structural_drift(original: &Crystal, relaxed: &Crystal) -> f64 {
    if original.atoms.len() != relaxed.atoms.len() || original.atoms.is_empty() {
        return f64::NAN;
    }

    let total: f64 = original
        .atoms
        .iter()
        .zip(relaxed.atoms.iter())
        .map(|(a, b)| {
            let mut sq = 0.0;
            for k in 0..3 {
                let mut d = b.position[k] - a.position[k];
                // 周期性边界下取最近镜像
                d -= d.round();
                sq += d * d;
            }
            sq.sqrt()
        })
        .sum();

    total / original.atoms.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
