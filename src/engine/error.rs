// ==========================================
// UBP 环境负荷计算系统 - 流水线错误类型
// ==========================================
// 致命错误: 输入表结构不符 / 映射规则冲突，立即中止且不输出部分结果
// 非致命情况（未匹配、缺量）不在此处，见 domain::RowWarning
// ==========================================

use crate::config::error::ConfigError;
use crate::importer::error::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("输入数据错误: {0}")]
    Import(#[from] ImportError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;
