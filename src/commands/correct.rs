//! # correct 子命令实现
//!
//! 对一张计算能量表逐行应用修正方案：打印每条记录的修正项合计与
//! 修正后能量，被拒绝的记录以 [SKIP] 报告并从输出中剔除。
//!
//! ## 依赖关系
//! - 使用 `cli/correct.rs` 定义的参数
//! - 使用 `correction/`, `models/formula.rs`
//! - 使用 `utils/output.rs`

use crate::cli::correct::CorrectArgs;
use crate::correction::{make_scheme, CorrectionScheme};
use crate::error::{EvalError, Result};
use crate::models::formula::parse_formula;
use crate::models::{ComputedEntry, RunType};
use crate::utils::output;
use serde::Deserialize;
use std::path::Path;
use tabled::{Table, Tabled};

/// 输入 CSV 的行格式
#[derive(Debug, Deserialize)]
struct InputRow {
    entry_id: String,
    formula: String,
    energy_ev: f64,
    run_type: String,
}

/// 修正结果行
#[derive(Debug, Clone, Tabled)]
struct CorrectedRow {
    #[tabled(rename = "Entry")]
    entry_id: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Run type")]
    run_type: String,
    #[tabled(rename = "Raw (eV)")]
    raw: String,
    #[tabled(rename = "Correction (eV)")]
    correction: String,
    #[tabled(rename = "Corrected (eV)")]
    corrected: String,
}

/// 执行能量修正
pub fn execute(args: CorrectArgs) -> Result<()> {
    let scheme = make_scheme(args.scheme);
    output::print_header(&format!("Applying {} Energy Corrections", scheme.name()));

    let rows = read_rows(&args.input)?;
    if rows.is_empty() {
        output::print_warning("No entries found in input CSV.");
        return Ok(());
    }

    let (corrected, skipped) = correct_rows(&rows, scheme.as_ref());

    for message in &skipped {
        output::print_skip(message);
    }

    if corrected.is_empty() {
        output::print_warning("All entries were rejected by the correction scheme.");
        return Ok(());
    }

    println!("{}", Table::new(&corrected));
    output::print_info(&format!(
        "{} corrected, {} skipped",
        corrected.len(),
        skipped.len()
    ));

    if let Some(path) = &args.output {
        save_corrected(&corrected, path)?;
        output::print_success(&format!("Corrected energies saved to '{}'", path.display()));
    }

    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<InputRow>> {
    if !path.exists() {
        return Err(EvalError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// 逐行应用修正方案；任何单行失败（兼容性拒绝、非法化学式）收集为
/// [SKIP] 消息，不中止整表处理
fn correct_rows(
    rows: &[InputRow],
    scheme: &dyn CorrectionScheme,
) -> (Vec<CorrectedRow>, Vec<String>) {
    let mut corrected = Vec::new();
    let mut skipped = Vec::new();

    for row in rows {
        let result = parse_formula(&row.formula)
            .and_then(|composition| {
                let run_type = row.run_type.parse::<RunType>().ok();
                ComputedEntry::new(
                    Some(row.entry_id.clone()),
                    row.energy_ev,
                    composition,
                    run_type,
                )
            })
            .and_then(|entry| scheme.corrected_energy(&entry));

        match result {
            Ok(value) => corrected.push(CorrectedRow {
                entry_id: row.entry_id.clone(),
                formula: row.formula.clone(),
                run_type: row.run_type.clone(),
                raw: format!("{:.6}", row.energy_ev),
                correction: format!("{:.6}", value - row.energy_ev),
                corrected: format!("{:.6}", value),
            }),
            Err(err) => skipped.push(format!("{}: {}", row.entry_id, err)),
        }
    }

    (corrected, skipped)
}

fn save_corrected(rows: &[CorrectedRow], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["entry_id", "formula", "run_type", "energy_ev", "corrected_energy_ev"])?;
    for row in rows {
        wtr.write_record([
            row.entry_id.as_str(),
            row.formula.as_str(),
            row.run_type.as_str(),
            row.raw.as_str(),
            row.corrected.as_str(),
        ])?;
    }

    wtr.flush().map_err(|e| EvalError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::Tri2024Correction;

    fn row(entry_id: &str, formula: &str, energy_ev: f64, run_type: &str) -> InputRow {
        InputRow {
            entry_id: entry_id.to_string(),
            formula: formula.to_string(),
            energy_ev,
            run_type: run_type.to_string(),
        }
    }

    #[test]
    fn test_correct_rows_applies_scheme() {
        let rows = vec![row("mp-1", "FeO", -10.0, "GGA+U")];
        let (corrected, skipped) = correct_rows(&rows, &Tri2024Correction);

        assert_eq!(corrected.len(), 1);
        assert!(skipped.is_empty());
        assert_eq!(corrected[0].corrected, "-14.269000");
    }

    #[test]
    fn test_correct_rows_skips_incompatible() {
        let rows = vec![
            row("mp-1", "Si2", -10.0, "GGA"),
            row("mp-2", "Si2", -10.0, "HSE"),
        ];
        let (corrected, skipped) = correct_rows(&rows, &Tri2024Correction);

        assert_eq!(corrected.len(), 1);
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].contains("mp-2"));
    }

    #[test]
    fn test_correct_rows_skips_bad_formula() {
        let rows = vec![row("mp-1", "not a formula", -10.0, "GGA")];
        let (corrected, skipped) = correct_rows(&rows, &Tri2024Correction);

        assert!(corrected.is_empty());
        assert_eq!(skipped.len(), 1);
    }
}
