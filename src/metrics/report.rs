//! # 指标报告持久化
//!
//! 指标映射的 CSV 保存/加载与终端表格打印。保存的报告可由 `load`
//! 读回为与 `compute_metrics` 返回值相同的映射类型。
//!
//! ## 依赖关系
//! - 被 `metrics/mod.rs`, `commands/` 使用
//! - 使用 `csv`, `tabled` crate

use crate::error::{EvalError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tabled::{Table, Tabled};

/// 报告行
#[derive(Debug, Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    metric: String,
    value: f64,
}

/// 保存指标映射为 CSV 报告（列：metric, value）
pub fn save(metrics: &BTreeMap<String, f64>, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["metric", "value"])?;
    for (metric, value) in metrics {
        wtr.write_record([metric.as_str(), &format!("{:.10}", value)])?;
    }

    wtr.flush().map_err(|e| EvalError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 从 CSV 报告读回指标映射
pub fn load(path: &Path) -> Result<BTreeMap<String, f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut metrics = BTreeMap::new();

    for row in reader.deserialize() {
        let row: CsvRow = row?;
        metrics.insert(row.metric, row.value);
    }

    Ok(metrics)
}

/// 以表格形式打印指标
pub fn print_table(metrics: &BTreeMap<String, f64>) {
    let rows: Vec<MetricRow> = metrics
        .iter()
        .map(|(metric, value)| MetricRow {
            metric: metric.clone(),
            value: format!("{:.6}", value),
        })
        .collect();

    println!("{}", Table::new(&rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut metrics = BTreeMap::new();
        metrics.insert("num_structures".to_string(), 10.0);
        metrics.insert("frac_novel".to_string(), 0.3);
        metrics.insert("avg_energy_above_reference".to_string(), -0.0125);

        save(&metrics, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.len(), 3);
        for (key, value) in &metrics {
            assert!((loaded[key] - value).abs() < 1e-9);
        }
    }
}
