//! # 统一错误处理模块
//!
//! 定义 cryseval 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 配置错误：调用方输入组合非法，在任何计算开始前立即失败
//! - 兼容性拒绝：单条能量记录与修正方案不兼容，逐条上报，由聚合层决定去留
//! - 外部依赖失败：弛豫引擎调用失败，原样向上传播，不做重试
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// cryseval 统一错误类型
#[derive(Error, Debug)]
pub enum EvalError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid chemical formula: {0}")]
    InvalidFormula(String),

    // ─────────────────────────────────────────────────────────────
    // 评估配置错误（致命，计算开始前触发）
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error(
        "Reference dataset '{dataset}' was corrected under scheme '{dataset_scheme}', \
         but correction scheme '{requested_scheme}' was requested"
    )]
    ReferenceSchemeMismatch {
        dataset: String,
        dataset_scheme: String,
        requested_scheme: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 兼容性拒绝（逐条记录，非致命）
    // ─────────────────────────────────────────────────────────────
    #[error("Entry {entry_id} has invalid run type {run_type}. Must be GGA or GGA+U. Discarding.")]
    Compatibility { entry_id: String, run_type: String },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误（弛豫引擎）
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

impl EvalError {
    /// 判断是否为兼容性拒绝（聚合层应剔除该记录而非中止批次）
    pub fn is_compatibility_rejection(&self) -> bool {
        matches!(self, EvalError::Compatibility { .. })
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, EvalError>;
