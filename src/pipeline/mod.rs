//! # 评估编排器
//!
//! 单次评估调用的顶层流程：校验输入组合 → （可选）调用弛豫 →
//! 构造指标引擎（修正方案在其内部对候选与参考能量一致应用）→
//! 计算全部可用指标。
//!
//! ## 输入约束
//! - `relax = true` 与显式能量互斥：二者是获取能量的两条途径，同时给出
//!   视为配置错误，在任何计算开始前拒绝
//! - 参考数据集的修正基准必须与所选修正方案一致，进入时检查
//!
//! ## 副作用
//! 仅在调用方给出路径时发生：指标报告由本层写出，弛豫结构由弛豫
//! 调用器写出。除此之外整个调用无持久状态，可重入。
//!
//! ## 依赖关系
//! - 被 `commands/evaluate.rs` 调用
//! - 使用 `relax/`, `reference/`, `metrics/`, `matcher/`, `correction/`

use crate::correction::CorrectionScheme;
use crate::error::{EvalError, Result};
use crate::matcher::StructureMatcher;
use crate::metrics::MetricsEvaluator;
use crate::models::Crystal;
use crate::reference::ReferenceDataset;
use crate::relax::{self, RelaxOptions};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 单次评估的全部配置
pub struct EvaluateOptions {
    /// 是否先弛豫再评分
    pub relax: bool,
    /// 外部已算好的能量（与 `relax` 互斥；可缺省，仅按相似度评分）
    pub energies: Option<Vec<f64>>,
    /// 参考数据集，缺省时加载内置数据集
    pub reference: Option<ReferenceDataset>,
    /// 结构匹配器
    pub matcher: Box<dyn StructureMatcher>,
    /// 能量修正方案
    pub scheme: Box<dyn CorrectionScheme>,
    /// 指标报告保存路径
    pub save_as: Option<PathBuf>,
    /// 能量散点图保存路径
    pub plot: Option<PathBuf>,
    /// 弛豫调用配置
    pub relax_options: RelaxOptions,
    /// 匹配并行度（0 = 自动）
    pub jobs: usize,
    /// 是否打印指标表格
    pub pretty_print: bool,
}

/// 评估一批候选结构，返回指标名 → 数值的映射
pub fn evaluate(structures: Vec<Crystal>, options: EvaluateOptions) -> Result<BTreeMap<String, f64>> {
    if structures.is_empty() {
        return Err(EvalError::Configuration(
            "No structures to evaluate".to_string(),
        ));
    }

    let (relaxed, energies) = obtain_relaxed(
        &structures,
        options.relax,
        options.energies,
        &options.relax_options,
    )?;

    let reference = match options.reference {
        Some(reference) => reference,
        None => ReferenceDataset::load(None)?,
    };

    // 参考数据集与修正方案的基准一致性是显式前置条件
    if reference.correction_scheme != options.scheme.name() {
        return Err(EvalError::ReferenceSchemeMismatch {
            dataset: reference.name.clone(),
            dataset_scheme: reference.correction_scheme.clone(),
            requested_scheme: options.scheme.name().to_string(),
        });
    }

    let evaluator = MetricsEvaluator::from_structures_and_energies(
        relaxed,
        energies,
        structures,
        reference,
        options.matcher,
        options.scheme,
        options.jobs,
    )?;

    let metrics = evaluator.available_metrics();
    let result =
        evaluator.compute_metrics(&metrics, options.save_as.as_deref(), options.pretty_print)?;

    if let Some(path) = &options.plot {
        let values = evaluator.energies_above_reference()?;
        crate::metrics::plot::plot_energy_above_reference(&values, path)?;
    }

    Ok(result)
}

/// 获取弛豫结构与能量
///
/// - `relax = true`：调用外部引擎，引擎产出的能量取代一切调用方输入
///   （互斥校验保证此时没有调用方输入）
/// - `relax = false`：输入结构原样充当弛豫结构，能量原样透传
fn obtain_relaxed(
    structures: &[Crystal],
    relax: bool,
    energies: Option<Vec<f64>>,
    relax_options: &RelaxOptions,
) -> Result<(Vec<Crystal>, Option<Vec<f64>>)> {
    if relax && energies.is_some() {
        return Err(EvalError::Configuration(
            "Cannot accept energies if relax is true".to_string(),
        ));
    }

    if relax {
        let (relaxed, derived) = relax::relax_structures(structures, relax_options)?;
        return Ok((relaxed, Some(derived)));
    }

    if let Some(energies) = &energies {
        if energies.len() != structures.len() {
            return Err(EvalError::Configuration(format!(
                "Got {} energies for {} structures",
                energies.len(),
                structures.len()
            )));
        }
    }

    Ok((structures.to_vec(), energies))
}
