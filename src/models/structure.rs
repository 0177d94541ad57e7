//! # 晶体结构数据模型
//!
//! 定义统一的晶体结构表示：晶格、原子与组分统计。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `matcher/`, `metrics/`, `reference/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let alpha_rad = alpha.to_radians();
        let beta_rad = beta.to_radians();
        let gamma_rad = gamma.to_radians();

        let cos_alpha = alpha_rad.cos();
        let cos_beta = beta_rad.cos();
        let cos_gamma = gamma_rad.cos();
        let sin_gamma = gamma_rad.sin();

        let a_vec = [a, 0.0, 0.0];
        let b_vec = [b * cos_gamma, b * sin_gamma, 0.0];

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();
        let c_vec = [c1, c2, c3];

        Lattice {
            matrix: [a_vec, b_vec, c_vec],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let a_vec = self.matrix[0];
        let b_vec = self.matrix[1];
        let c_vec = self.matrix[2];

        let a = norm(&a_vec);
        let b = norm(&b_vec);
        let c = norm(&c_vec);

        let alpha = (dot(&b_vec, &c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(&a_vec, &c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(&a_vec, &b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积
    pub fn volume(&self) -> f64 {
        let a = self.matrix[0];
        let b = self.matrix[1];
        let c = self.matrix[2];

        // 行列式计算
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }
}

fn dot(x: &[f64; 3], y: &[f64; 3]) -> f64 {
    x[0] * y[0] + x[1] * y[1] + x[2] * y[2]
}

fn norm(x: &[f64; 3]) -> f64 {
    dot(x, x).sqrt()
}

/// 原子信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 能量 (eV)，由弛豫引擎或外部计算提供
    pub energy: Option<f64>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
            energy: None,
        }
    }

    /// 原子数
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// 组分统计：元素 → 原胞内原子绝对数目
    ///
    /// 能量修正按原子数（而非分数组分）线性缩放，此处必须返回绝对计数。
    pub fn composition(&self) -> BTreeMap<String, f64> {
        let mut counts: BTreeMap<String, f64> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.clone()).or_insert(0.0) += 1.0;
        }
        counts
    }

    /// 分数组分：元素 → 原子数占比
    pub fn fractional_composition(&self) -> BTreeMap<String, f64> {
        let total = self.atoms.len() as f64;
        self.composition()
            .into_iter()
            .map(|(el, n)| (el, n / total))
            .collect()
    }

    /// 化学式（元素按字母序，如 "Fe2O3"）
    pub fn formula(&self) -> String {
        self.composition()
            .into_iter()
            .map(|(el, count)| {
                if (count - 1.0).abs() < f64::EPSILON {
                    el
                } else {
                    format!("{}{}", el, count as usize)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 约化化学式（计数除以最大公约数，如 Fe4O6 -> Fe2O3）
    pub fn reduced_formula(&self) -> String {
        let counts: Vec<(String, usize)> = self
            .composition()
            .into_iter()
            .map(|(el, n)| (el, n as usize))
            .collect();

        let gcd_all = counts.iter().fold(0usize, |acc, (_, n)| gcd(acc, *n));
        let gcd_all = gcd_all.max(1);

        counts
            .into_iter()
            .map(|(el, count)| {
                let reduced = count / gcd_all;
                if reduced == 1 {
                    el
                } else {
                    format!("{}{}", el, reduced)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 计算每原子体积
    pub fn volume_per_atom(&self) -> f64 {
        self.lattice.volume().abs() / self.atoms.len() as f64
    }

    /// 计算每原子能量
    pub fn energy_per_atom(&self) -> Option<f64> {
        self.energy.map(|e| e / self.atoms.len() as f64)
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nacl() -> Crystal {
        let lattice = Lattice::from_parameters(5.64, 5.64, 5.64, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Na", [0.0, 0.0, 0.0]),
            Atom::new("Na", [0.5, 0.5, 0.0]),
            Atom::new("Na", [0.5, 0.0, 0.5]),
            Atom::new("Na", [0.0, 0.5, 0.5]),
            Atom::new("Cl", [0.5, 0.0, 0.0]),
            Atom::new("Cl", [0.0, 0.5, 0.0]),
            Atom::new("Cl", [0.0, 0.0, 0.5]),
            Atom::new("Cl", [0.5, 0.5, 0.5]),
        ];
        Crystal::new("NaCl", lattice, atoms)
    }

    #[test]
    fn test_lattice_from_parameters_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 5.0).abs() < 1e-6);
        assert!((b - 5.0).abs() < 1e-6);
        assert!((c - 5.0).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((beta - 90.0).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_volume_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let vol = lattice.volume().abs();

        // 5^3 = 125
        assert!((vol - 125.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_hexagonal() {
        let lattice = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let (a, b, c, _, _, gamma) = lattice.parameters();

        assert!((a - 3.0).abs() < 0.01);
        assert!((b - 3.0).abs() < 0.01);
        assert!((c - 5.0).abs() < 0.01);
        assert!((gamma - 120.0).abs() < 0.01);
    }

    #[test]
    fn test_composition_absolute_counts() {
        let crystal = nacl();
        let comp = crystal.composition();

        assert!((comp["Na"] - 4.0).abs() < 1e-12);
        assert!((comp["Cl"] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_fractional_composition() {
        let crystal = nacl();
        let frac = crystal.fractional_composition();

        assert!((frac["Na"] - 0.5).abs() < 1e-12);
        assert!((frac["Cl"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reduced_formula() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let mut atoms = Vec::new();
        for _ in 0..4 {
            atoms.push(Atom::new("Fe", [0.0, 0.0, 0.0]));
        }
        for _ in 0..6 {
            atoms.push(Atom::new("O", [0.5, 0.5, 0.5]));
        }
        let crystal = Crystal::new("fe4o6", lattice, atoms);

        assert_eq!(crystal.formula(), "Fe4O6");
        assert_eq!(crystal.reduced_formula(), "Fe2O3");
    }

    #[test]
    fn test_energy_per_atom() {
        let mut crystal = nacl();
        crystal.energy = Some(-16.0);

        let e = crystal.energy_per_atom().unwrap();
        assert!((e - (-2.0)).abs() < 1e-12);
    }
}
