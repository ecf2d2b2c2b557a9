// ==========================================
// UBP 环境负荷计算系统 - API层错误类型
// ==========================================
// 职责: 定义报告/导出接口错误，转换流水线错误为用户可读信息
// ==========================================

use crate::config::error::ConfigError;
use crate::engine::error::PipelineError;
use crate::importer::error::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入 / 配置错误（致命）
    // ==========================================
    #[error("输入表格错误: {0}")]
    MalformedInput(String),

    #[error("映射配置错误: {0}")]
    Configuration(String),

    #[error("无效参数: {0}")]
    InvalidInput(String),

    // ==========================================
    // 导出错误
    // ==========================================
    #[error("CSV 导出失败: {0}")]
    CsvExport(#[from] csv::Error),

    #[error("JSON 序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),
}

// ==========================================
// 从 PipelineError 转换
// ==========================================
impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Import(e) => ApiError::from(e),
            PipelineError::Config(e) => ApiError::from(e),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::MalformedInput(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Configuration(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
