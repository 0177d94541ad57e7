//! # 化学式解析
//!
//! 将 "Fe2O3" 形式的化学式解析为元素 → 原子数映射。
//!
//! ## 依赖关系
//! - 被 `commands/correct.rs`, `reference/` 使用
//! - 使用 `regex` crate

use crate::error::{EvalError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// 元素符号 + 可选计数（支持小数计数，如无序占位 "Fe0.5"）
fn formula_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z][a-z]?)([0-9]*\.?[0-9]*)").unwrap())
}

/// 解析化学式字符串
///
/// 省略的计数视为 1；同一元素多次出现时计数累加。
pub fn parse_formula(formula: &str) -> Result<BTreeMap<String, f64>> {
    let formula = formula.trim();
    if formula.is_empty() {
        return Err(EvalError::InvalidFormula(formula.to_string()));
    }

    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    let mut matched_len = 0;

    for cap in formula_regex().captures_iter(formula) {
        let whole = cap.get(0).map(|m| m.as_str()).unwrap_or("");
        if whole.is_empty() {
            continue;
        }
        matched_len += whole.len();

        let element = &cap[1];
        let count: f64 = if cap[2].is_empty() {
            1.0
        } else {
            cap[2]
                .parse()
                .map_err(|_| EvalError::InvalidFormula(formula.to_string()))?
        };

        *counts.entry(element.to_string()).or_insert(0.0) += count;
    }

    // 未被任何捕获覆盖的字符意味着非法输入（如小写开头、括号）
    if matched_len != formula.len() || counts.is_empty() {
        return Err(EvalError::InvalidFormula(formula.to_string()));
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_formula() {
        let comp = parse_formula("Fe2O3").unwrap();
        assert!((comp["Fe"] - 2.0).abs() < 1e-12);
        assert!((comp["O"] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_implicit_count() {
        let comp = parse_formula("NaCl").unwrap();
        assert!((comp["Na"] - 1.0).abs() < 1e-12);
        assert!((comp["Cl"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_two_letter_elements() {
        let comp = parse_formula("LiCoO2").unwrap();
        assert!((comp["Li"] - 1.0).abs() < 1e-12);
        assert!((comp["Co"] - 1.0).abs() < 1e-12);
        assert!((comp["O"] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_fractional_count() {
        let comp = parse_formula("Fe0.5Ni0.5").unwrap();
        assert!((comp["Fe"] - 0.5).abs() < 1e-12);
        assert!((comp["Ni"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parse_repeated_element_accumulates() {
        let comp = parse_formula("FeOFe").unwrap();
        assert!((comp["Fe"] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_formula("").is_err());
        assert!(parse_formula("fe2o3").is_err());
        assert!(parse_formula("Fe(OH)2").is_err());
    }
}
