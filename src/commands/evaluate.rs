//! # evaluate 子命令实现
//!
//! 加载结构与能量，解析匹配器/修正方案，调用评估编排器并输出指标。
//!
//! ## 依赖关系
//! - 使用 `cli/evaluate.rs` 定义的参数
//! - 使用 `batch/collector.rs` 收集结构文件
//! - 使用 `pipeline/` 执行评估
//! - 使用 `utils/output.rs`

use crate::batch::FileCollector;
use crate::cli::evaluate::EvaluateArgs;
use crate::correction::make_scheme;
use crate::error::{EvalError, Result};
use crate::matcher::make_matcher;
use crate::models::Crystal;
use crate::parsers::parse_structure_file;
use crate::pipeline::{self, EvaluateOptions};
use crate::reference::ReferenceDataset;
use crate::relax::RelaxOptions;
use crate::utils::output;
use serde::Deserialize;
use std::path::Path;

/// 能量 CSV 的行格式（顺序与收集到的结构文件一致）
#[derive(Debug, Deserialize)]
struct EnergyRow {
    energy_ev: f64,
}

/// 执行评估
pub fn execute(args: EvaluateArgs) -> Result<()> {
    output::print_header("Evaluating Generated Structures");

    let structures = load_structures(&args)?;
    output::print_info(&format!("Loaded {} structures", structures.len()));

    let energies = args
        .energies
        .as_deref()
        .map(load_energies)
        .transpose()?;

    let reference = args
        .reference
        .as_deref()
        .map(|dir| ReferenceDataset::load_from_dir(dir))
        .transpose()?;
    if let Some(reference) = &reference {
        output::print_info(&format!(
            "Reference dataset '{}' ({} entries, {} basis)",
            reference.name,
            reference.len(),
            reference.correction_scheme
        ));
    }

    let options = EvaluateOptions {
        relax: !args.no_relax,
        energies,
        reference,
        matcher: make_matcher(args.matcher),
        scheme: make_scheme(args.scheme),
        save_as: args.save_as.clone(),
        plot: args.plot.clone(),
        relax_options: RelaxOptions {
            engine: args.engine.clone(),
            device: args.device.clone(),
            potential: args.potential.clone(),
            output_path: args.structures_output.clone(),
        },
        jobs: args.jobs,
        pretty_print: true,
    };

    pipeline::evaluate(structures, options)?;

    if let Some(path) = &args.save_as {
        output::print_success(&format!("Metrics report saved to '{}'", path.display()));
    }
    if let Some(path) = &args.structures_output {
        output::print_success(&format!("Relaxed structures saved to '{}'", path.display()));
    }
    if let Some(path) = &args.plot {
        output::print_success(&format!("Energy plot saved to '{}'", path.display()));
    }

    Ok(())
}

/// 收集并解析输入结构
fn load_structures(args: &EvaluateArgs) -> Result<Vec<Crystal>> {
    let files = FileCollector::new(args.structures.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect()?;

    files.iter().map(|f| parse_structure_file(f)).collect()
}

/// 加载外部能量表
fn load_energies(path: &Path) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut energies = Vec::new();

    for row in reader.deserialize() {
        let row: EnergyRow = row?;
        if !row.energy_ev.is_finite() {
            return Err(EvalError::InvalidArgument(format!(
                "Non-finite energy in '{}'",
                path.display()
            )));
        }
        energies.push(row.energy_ev);
    }

    Ok(energies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_energies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energies.csv");
        fs::write(&path, "energy_ev\n-10.84\n-9.2\n").unwrap();

        let energies = load_energies(&path).unwrap();
        assert_eq!(energies.len(), 2);
        assert!((energies[0] - (-10.84)).abs() < 1e-12);
    }

    #[test]
    fn test_load_energies_rejects_non_finite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energies.csv");
        fs::write(&path, "energy_ev\nNaN\n").unwrap();

        assert!(load_energies(&path).is_err());
    }
}
