//! # 解析器模块
//!
//! 结构文件格式的读取与写出。
//!
//! ## 依赖关系
//! - 被 `commands/`, `reference/`, `relax/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar

pub mod poscar;

use crate::error::{EvalError, Result};
use crate::models::Crystal;
use std::path::Path;

/// 从文件路径推断格式并解析
///
/// 候选结构由生成模型以 VASP 风格文件导出：POSCAR/CONTCAR 命名或
/// `.vasp`/`.poscar` 扩展名。
pub fn parse_structure_file(path: &Path) -> Result<Crystal> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    if matches!(ext.as_str(), "vasp" | "poscar") {
        return poscar::parse_poscar_file(path);
    }

    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if name.starts_with("POSCAR") || name.starts_with("CONTCAR") {
            return poscar::parse_poscar_file(path);
        }
    }

    Err(EvalError::UnsupportedFormat(format!(
        "Cannot determine format for: {}",
        path.display()
    )))
}
