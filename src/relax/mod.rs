//! # 弛豫调用器
//!
//! 调用外部 ML 势引擎对结构做弛豫并取回最终能量。引擎本身（设备管理、
//! 批量推理、物理细节）对本层不透明：这里只负责写入输入结构、阻塞等待
//! 外部命令、读回弛豫结构与能量。
//!
//! ## 引擎约定
//! `<engine> --input <dir> --output <dir> --device <dev> [--potential <id>]`
//! 输入目录为 `POSCAR_<i>` 文件；引擎在输出目录写入同名弛豫结构及
//! `energies.csv`（列：structure, energy_ev）。
//!
//! ## 失败语义
//! 引擎缺失或失败原样上报（CommandNotFound / CommandFailed），不做重试；
//! 本层不暴露超时，需要取消的调用方应在整个 evaluate 调用外层实现。
//!
//! ## 依赖关系
//! - 被 `pipeline/` 使用
//! - 使用 `parsers/poscar.rs`, `utils/progress.rs`, `error.rs`

use crate::error::{EvalError, Result};
use crate::models::Crystal;
use crate::parsers::poscar;
use crate::utils::progress;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 默认引擎可执行文件名
pub const DEFAULT_ENGINE: &str = "crysrelax";

/// 弛豫调用配置
#[derive(Debug, Clone)]
pub struct RelaxOptions {
    /// 引擎可执行文件（名称或路径）
    pub engine: String,
    /// 推理设备（"cpu", "cuda:0" 等，原样传给引擎）
    pub device: String,
    /// ML 势标识符，缺省时由引擎自选
    pub potential: Option<String>,
    /// 弛豫结构的持久化目录（副作用归调用器，不归编排器）
    pub output_path: Option<PathBuf>,
}

impl Default for RelaxOptions {
    fn default() -> Self {
        RelaxOptions {
            engine: DEFAULT_ENGINE.to_string(),
            device: "cpu".to_string(),
            potential: None,
            output_path: None,
        }
    }
}

/// energies.csv 的行格式
#[derive(Debug, Deserialize)]
struct EnergyRow {
    structure: String,
    energy_ev: f64,
}

/// 输入目录中第 i 个结构的文件名
fn structure_filename(index: usize) -> String {
    format!("POSCAR_{:05}", index)
}

/// 弛豫一批结构，返回（弛豫结构，最终能量），顺序与输入一致
pub fn relax_structures(
    structures: &[Crystal],
    options: &RelaxOptions,
) -> Result<(Vec<Crystal>, Vec<f64>)> {
    let scratch = std::env::temp_dir().join(format!("cryseval-relax-{}", std::process::id()));
    let in_dir = scratch.join("in");
    let out_dir = scratch.join("out");

    for dir in [&in_dir, &out_dir] {
        fs::create_dir_all(dir).map_err(|e| EvalError::FileWriteError {
            path: dir.display().to_string(),
            source: e,
        })?;
    }

    let result = run_engine(structures, options, &in_dir, &out_dir);

    // 引擎失败时也要清理暂存目录
    fs::remove_dir_all(&scratch).ok();

    result
}

fn run_engine(
    structures: &[Crystal],
    options: &RelaxOptions,
    in_dir: &Path,
    out_dir: &Path,
) -> Result<(Vec<Crystal>, Vec<f64>)> {
    for (i, crystal) in structures.iter().enumerate() {
        let path = in_dir.join(structure_filename(i));
        fs::write(&path, poscar::to_poscar_string(crystal)).map_err(|e| {
            EvalError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            }
        })?;
    }

    let spinner = progress::create_spinner(&format!(
        "Relaxing {} structures with '{}'",
        structures.len(),
        options.engine
    ));

    let mut command = Command::new(&options.engine);
    command
        .arg("--input")
        .arg(in_dir)
        .arg("--output")
        .arg(out_dir)
        .arg("--device")
        .arg(&options.device);
    if let Some(potential) = &options.potential {
        command.arg("--potential").arg(potential);
    }

    let output = command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EvalError::CommandNotFound {
                command: options.engine.clone(),
            }
        } else {
            EvalError::CommandFailed {
                command: options.engine.clone(),
                stderr: e.to_string(),
            }
        }
    })?;

    spinner.finish_and_clear();

    if !output.status.success() {
        return Err(EvalError::CommandFailed {
            command: options.engine.clone(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let (relaxed, energies) = read_engine_output(structures, out_dir)?;

    if let Some(output_path) = &options.output_path {
        persist_structures(&relaxed, output_path)?;
    }

    Ok((relaxed, energies))
}

/// 读回弛豫结构与能量，校验条目数与输入一致
fn read_engine_output(structures: &[Crystal], out_dir: &Path) -> Result<(Vec<Crystal>, Vec<f64>)> {
    let csv_path = out_dir.join("energies.csv");
    if !csv_path.exists() {
        return Err(EvalError::FileNotFound {
            path: csv_path.display().to_string(),
        });
    }

    let mut reader = csv::Reader::from_path(&csv_path)?;
    let mut energy_by_file: HashMap<String, f64> = HashMap::new();
    for row in reader.deserialize() {
        let row: EnergyRow = row?;
        energy_by_file.insert(row.structure, row.energy_ev);
    }

    if energy_by_file.len() != structures.len() {
        return Err(EvalError::Configuration(format!(
            "Relaxation engine returned {} energies for {} structures",
            energy_by_file.len(),
            structures.len()
        )));
    }

    let mut relaxed = Vec::with_capacity(structures.len());
    let mut energies = Vec::with_capacity(structures.len());

    for (i, original) in structures.iter().enumerate() {
        let filename = structure_filename(i);
        let energy = *energy_by_file
            .get(&filename)
            .ok_or_else(|| EvalError::FileNotFound {
                path: format!("energies.csv entry for {}", filename),
            })?;

        let mut crystal = poscar::parse_poscar_file(&out_dir.join(&filename))?;
        crystal.name = original.name.clone();
        crystal.energy = Some(energy);

        relaxed.push(crystal);
        energies.push(energy);
    }

    Ok((relaxed, energies))
}

/// 将弛豫结构写入调用方指定目录
fn persist_structures(structures: &[Crystal], output_path: &Path) -> Result<()> {
    fs::create_dir_all(output_path).map_err(|e| EvalError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    for (i, crystal) in structures.iter().enumerate() {
        let path = output_path.join(structure_filename(i));
        fs::write(&path, poscar::to_poscar_string(crystal)).map_err(|e| {
            EvalError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            }
        })?;
    }

    Ok(())
}
