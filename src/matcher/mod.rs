//! # 结构匹配器模块
//!
//! 判定两个晶体结构是否表示同一材料。作为评估管线的外部协作者，
//! 匹配器以不透明比较器的形式被消费，内部算法刻意保持简单：
//! 约化化学式/组分比较 + 晶格参数容差比较。
//!
//! ## 设计
//! 匹配器按调用构造（工厂函数），不持有跨调用可变状态。
//!
//! ## 依赖关系
//! - 被 `metrics/`, `commands/` 使用
//! - 使用 `models/structure.rs`

use crate::models::Crystal;

/// 默认容差：晶格长度（分数）、每原子体积（分数）、角度（度）
/// 取值与 pymatgen StructureMatcher 的默认值对齐
const DEFAULT_LTOL: f64 = 0.2;
const DEFAULT_STOL: f64 = 0.3;
const DEFAULT_ANGLE_TOL: f64 = 5.0;

/// 结构匹配策略接口
pub trait StructureMatcher: Send + Sync {
    /// 匹配器名称
    fn name(&self) -> &'static str;

    /// 判定两个结构是否为同一材料
    fn is_match(&self, a: &Crystal, b: &Crystal) -> bool;
}

/// 有序匹配器：要求约化化学式一致且晶格在容差内匹配
#[derive(Debug, Clone)]
pub struct OrderedMatcher {
    pub ltol: f64,
    pub stol: f64,
    pub angle_tol: f64,
}

impl Default for OrderedMatcher {
    fn default() -> Self {
        OrderedMatcher {
            ltol: DEFAULT_LTOL,
            stol: DEFAULT_STOL,
            angle_tol: DEFAULT_ANGLE_TOL,
        }
    }
}

impl StructureMatcher for OrderedMatcher {
    fn name(&self) -> &'static str {
        "ordered"
    }

    fn is_match(&self, a: &Crystal, b: &Crystal) -> bool {
        if a.reduced_formula() != b.reduced_formula() {
            return false;
        }
        lattice_match(a, b, self.ltol, self.angle_tol) && volume_match(a, b, self.stol)
    }
}

/// 无序匹配器：比较分数组分（容许无序占位计数差异）与晶格
#[derive(Debug, Clone)]
pub struct DisorderedMatcher {
    pub ltol: f64,
    pub stol: f64,
    pub angle_tol: f64,
    /// 分数组分逐元素容差
    pub comp_tol: f64,
}

impl Default for DisorderedMatcher {
    fn default() -> Self {
        DisorderedMatcher {
            ltol: DEFAULT_LTOL,
            stol: DEFAULT_STOL,
            angle_tol: DEFAULT_ANGLE_TOL,
            comp_tol: 0.1,
        }
    }
}

impl StructureMatcher for DisorderedMatcher {
    fn name(&self) -> &'static str {
        "disordered"
    }

    fn is_match(&self, a: &Crystal, b: &Crystal) -> bool {
        let comp_a = a.fractional_composition();
        let comp_b = b.fractional_composition();

        if comp_a.len() != comp_b.len() {
            return false;
        }
        for (el, frac_a) in &comp_a {
            match comp_b.get(el) {
                Some(frac_b) if (frac_a - frac_b).abs() <= self.comp_tol => {}
                _ => return false,
            }
        }

        volume_match(a, b, self.stol) && lattice_match(a, b, self.ltol, self.angle_tol)
    }
}

/// 晶格长度与角度容差比较
fn lattice_match(a: &Crystal, b: &Crystal, ltol: f64, angle_tol: f64) -> bool {
    // 归一到每原子尺度，容许超胞
    let scale = (b.num_atoms() as f64 / a.num_atoms() as f64).cbrt();

    let (a1, b1, c1, al1, be1, ga1) = a.lattice.parameters();
    let (a2, b2, c2, al2, be2, ga2) = b.lattice.parameters();

    let mut len_a = [a1 * scale, b1 * scale, c1 * scale];
    let mut len_b = [a2, b2, c2];
    len_a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    len_b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));

    for (la, lb) in len_a.iter().zip(len_b.iter()) {
        if (la - lb).abs() / lb > ltol {
            return false;
        }
    }

    let mut ang_a = [al1, be1, ga1];
    let mut ang_b = [al2, be2, ga2];
    ang_a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    ang_b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));

    ang_a
        .iter()
        .zip(ang_b.iter())
        .all(|(x, y)| (x - y).abs() <= angle_tol)
}

/// 每原子体积容差比较
fn volume_match(a: &Crystal, b: &Crystal, stol: f64) -> bool {
    let va = a.volume_per_atom();
    let vb = b.volume_per_atom();
    (va - vb).abs() / vb <= stol
}

/// 匹配器种类（CLI 解析目标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MatcherKind {
    /// Ordered structure matching
    Ordered,
    /// Disordered-occupancy structure matching
    Disordered,
}

/// 按种类构造匹配器（每次调用新建实例，不共享默认对象）
pub fn make_matcher(kind: MatcherKind) -> Box<dyn StructureMatcher> {
    match kind {
        MatcherKind::Ordered => Box::new(OrderedMatcher::default()),
        MatcherKind::Disordered => Box::new(DisorderedMatcher::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn rocksalt(name: &str, a: f64) -> Crystal {
        let lattice = Lattice::from_parameters(a, a, a, 90.0, 90.0, 90.0);
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
        Crystal::new(name, lattice, atoms)
    }

    #[test]
    fn test_ordered_matches_near_identical() {
        let matcher = OrderedMatcher::default();
        let a = rocksalt("a", 5.64);
        let b = rocksalt("b", 5.70);
        assert!(matcher.is_match(&a, &b));
    }

    #[test]
    fn test_ordered_rejects_different_formula() {
        let matcher = OrderedMatcher::default();
        let a = rocksalt("a", 5.64);
        let lattice = Lattice::from_parameters(5.64, 5.64, 5.64, 90.0, 90.0, 90.0);
        let b = Crystal::new(
            "b",
            lattice,
            vec![
                Atom::new("K", [0.0, 0.0, 0.0]),
                Atom::new("Cl", [0.5, 0.5, 0.5]),
            ],
        );
        assert!(!matcher.is_match(&a, &b));
    }

    #[test]
    fn test_ordered_rejects_large_lattice_deviation() {
        let matcher = OrderedMatcher::default();
        let a = rocksalt("a", 5.64);
        let b = rocksalt("b", 8.5);
        assert!(!matcher.is_match(&a, &b));
    }

    #[test]
    fn test_disordered_tolerates_composition_noise() {
        let matcher = DisorderedMatcher::default();
        let a = rocksalt("a", 5.64);

        // 7 Na + 9 Cl（16 原子超胞）：分数组分偏差 ~0.06，在无序容差内，
        // 但约化化学式不同，有序匹配必须拒绝
        let lattice = Lattice::from_parameters(7.105, 7.105, 7.105, 90.0, 90.0, 90.0);
        let mut atoms = Vec::new();
        for i in 0..7 {
            atoms.push(Atom::new("Na", [0.0, 0.0, i as f64 * 0.05]));
        }
        for i in 0..9 {
            atoms.push(Atom::new("Cl", [0.5, 0.5, i as f64 * 0.05]));
        }
        let b = Crystal::new("b", lattice, atoms);

        assert!(matcher.is_match(&a, &b));
        assert!(!OrderedMatcher::default().is_match(&a, &b));
    }

    #[test]
    fn test_make_matcher_constructs_fresh_instances() {
        assert_eq!(make_matcher(MatcherKind::Ordered).name(), "ordered");
        assert_eq!(make_matcher(MatcherKind::Disordered).name(), "disordered");
    }
}
