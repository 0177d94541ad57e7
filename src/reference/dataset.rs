//! # 参考数据集
//!
//! 已知材料的（结构，修正后能量）条目集合，一次评估内不可变。
//!
//! ## 磁盘格式
//! 数据集目录包含 `energies.csv`（列：structure, energy_ev, run_type,
//! correction_scheme）以及每行对应的结构文件。`correction_scheme` 列必须
//! 全列一致，作为数据集的修正基准标签由编排器检查。
//!
//! ## 依赖关系
//! - 被 `pipeline/`, `metrics/` 使用
//! - 使用 `parsers/`, `models/`, `error.rs`

use crate::error::{EvalError, Result};
use crate::models::Crystal;
use crate::parsers::{parse_structure_file, poscar};
use serde::Deserialize;
use std::path::Path;

/// 参考条目：已知结构及其修正后能量 (eV)
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    pub crystal: Crystal,
    pub energy_ev: f64,
}

impl ReferenceEntry {
    /// 每原子修正后能量
    pub fn energy_per_atom(&self) -> f64 {
        self.energy_ev / self.crystal.num_atoms() as f64
    }
}

/// 参考数据集（加载后不可变）
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    /// 数据集名称（目录名或 "builtin"）
    pub name: String,

    /// 数据集能量的修正基准（修正方案名称）
    pub correction_scheme: String,

    /// 条目，保持加载顺序
    entries: Vec<ReferenceEntry>,
}

/// energies.csv 的行格式
#[derive(Debug, Deserialize)]
struct EnergyRow {
    structure: String,
    energy_ev: f64,
    #[allow(dead_code)]
    run_type: String,
    correction_scheme: String,
}

impl ReferenceDataset {
    pub fn new(
        name: impl Into<String>,
        correction_scheme: impl Into<String>,
        entries: Vec<ReferenceEntry>,
    ) -> Self {
        ReferenceDataset {
            name: name.into(),
            correction_scheme: correction_scheme.into(),
            entries,
        }
    }

    /// 加载数据集；路径缺省时返回内置数据集
    pub fn load(path: Option<&Path>) -> Result<ReferenceDataset> {
        match path {
            Some(dir) => Self::load_from_dir(dir),
            None => Ok(Self::builtin()),
        }
    }

    /// 从数据集目录加载
    pub fn load_from_dir(dir: &Path) -> Result<ReferenceDataset> {
        if !dir.is_dir() {
            return Err(EvalError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }

        let csv_path = dir.join("energies.csv");
        if !csv_path.exists() {
            return Err(EvalError::FileNotFound {
                path: csv_path.display().to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&csv_path)?;
        let mut entries = Vec::new();
        let mut scheme: Option<String> = None;

        for row in reader.deserialize() {
            let row: EnergyRow = row?;

            // 修正基准必须全列一致
            match &scheme {
                None => scheme = Some(row.correction_scheme.clone()),
                Some(s) if *s == row.correction_scheme => {}
                Some(s) => {
                    return Err(EvalError::Configuration(format!(
                        "Reference dataset mixes correction schemes '{}' and '{}'",
                        s, row.correction_scheme
                    )));
                }
            }

            let crystal = parse_structure_file(&dir.join(&row.structure))?;
            entries.push(ReferenceEntry {
                crystal,
                energy_ev: row.energy_ev,
            });
        }

        let scheme = scheme.ok_or_else(|| {
            EvalError::Configuration(format!(
                "Reference dataset '{}' contains no entries",
                dir.display()
            ))
        })?;

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("reference")
            .to_string();

        Ok(ReferenceDataset::new(name, scheme, entries))
    }

    /// 内置默认数据集：常见二元/单质相，MP2020 修正基准
    pub fn builtin() -> ReferenceDataset {
        let fixtures: [(&str, f64); 4] = [
            (
                r#"NaCl
1.0
5.69 0.0 0.0
0.0 5.69 0.0
0.0 0.0 5.69
Na Cl
4 4
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.5 0.0 0.0
0.0 0.5 0.0
0.0 0.0 0.5
0.5 0.5 0.5
"#,
                -26.62,
            ),
            (
                r#"Si
1.0
5.47 0.0 0.0
0.0 5.47 0.0
0.0 0.0 5.47
Si
8
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.25 0.25 0.25
0.75 0.75 0.25
0.75 0.25 0.75
0.25 0.75 0.75
"#,
                -43.36,
            ),
            (
                r#"MgO
1.0
4.25 0.0 0.0
0.0 4.25 0.0
0.0 0.0 4.25
Mg O
4 4
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.5 0.0 0.0
0.0 0.5 0.0
0.0 0.0 0.5
0.5 0.5 0.5
"#,
                -47.92,
            ),
            (
                r#"Fe2O3
1.0
5.03 0.0 0.0
0.0 5.03 0.0
0.0 0.0 5.03
Fe O
4 6
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.25 0.25 0.25
0.75 0.75 0.25
0.75 0.25 0.75
0.25 0.75 0.75
0.5 0.5 0.5
0.25 0.25 0.75
"#,
                -66.95,
            ),
        ];

        let entries = fixtures
            .iter()
            .map(|(content, energy)| {
                // 内置 fixture 为合法 POSCAR，解析失败属程序缺陷
                let crystal =
                    poscar::parse_poscar_content(content, "builtin").expect("builtin fixture");
                ReferenceEntry {
                    crystal,
                    energy_ev: *energy,
                }
            })
            .collect();

        ReferenceDataset::new("builtin", "MP2020", entries)
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 给定约化化学式下参考条目的最低每原子能量
    pub fn min_energy_per_atom(&self, reduced_formula: &str) -> Option<f64> {
        self.entries
            .iter()
            .filter(|e| e.crystal.reduced_formula() == reduced_formula)
            .map(|e| e.energy_per_atom())
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_builtin_dataset() {
        let dataset = ReferenceDataset::builtin();
        assert_eq!(dataset.correction_scheme, "MP2020");
        assert_eq!(dataset.len(), 4);

        // NaCl: -26.62 eV / 8 atoms
        let e = dataset.min_energy_per_atom("ClNa").unwrap();
        assert!((e - (-26.62 / 8.0)).abs() < 1e-10);
    }

    #[test]
    fn test_min_energy_per_atom_missing_formula() {
        let dataset = ReferenceDataset::builtin();
        assert!(dataset.min_energy_per_atom("Xe").is_none());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();

        fs::write(
            dir.path().join("POSCAR_si"),
            "Si\n1.0\n5.47 0.0 0.0\n0.0 5.47 0.0\n0.0 0.0 5.47\nSi\n2\nDirect\n0.0 0.0 0.0\n0.25 0.25 0.25\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("energies.csv"),
            "structure,energy_ev,run_type,correction_scheme\nPOSCAR_si,-10.84,GGA,TRI2024\n",
        )
        .unwrap();

        let dataset = ReferenceDataset::load(Some(dir.path())).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.correction_scheme, "TRI2024");
        assert!((dataset.entries()[0].energy_ev - (-10.84)).abs() < 1e-12);
    }

    #[test]
    fn test_load_rejects_mixed_schemes() {
        let dir = tempfile::tempdir().unwrap();

        let poscar = "Si\n1.0\n5.47 0.0 0.0\n0.0 5.47 0.0\n0.0 0.0 5.47\nSi\n2\nDirect\n0.0 0.0 0.0\n0.25 0.25 0.25\n";
        fs::write(dir.path().join("POSCAR_a"), poscar).unwrap();
        fs::write(dir.path().join("POSCAR_b"), poscar).unwrap();
        fs::write(
            dir.path().join("energies.csv"),
            "structure,energy_ev,run_type,correction_scheme\n\
             POSCAR_a,-10.84,GGA,TRI2024\n\
             POSCAR_b,-10.80,GGA,MP2020\n",
        )
        .unwrap();

        assert!(ReferenceDataset::load(Some(dir.path())).is_err());
    }

    #[test]
    fn test_load_default_when_path_omitted() {
        let dataset = ReferenceDataset::load(None).unwrap();
        assert_eq!(dataset.name, "builtin");
        assert!(!dataset.is_empty());
    }
}
