// ==========================================
// UBP 环境负荷计算系统 - 配置错误类型
// ==========================================
// 红线: 规则冲突在加载时报错，任何计算开始前必须修正
// ==========================================

use crate::domain::{PrecedenceLevel, UnitKind};
use thiserror::Error;

/// 配置 / 映射规则错误
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 文件 =====
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件解析失败 ({path}): {message}")]
    ParseError { path: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    // ===== 映射规则 =====
    #[error("映射规则冲突 ({level}): {subject} 同时映射到 {first} 与 {second}")]
    RuleConflict {
        level: PrecedenceLevel,
        subject: String,
        first: String,
        second: String,
    },

    #[error("同义词冲突: {alias} 同时指向 {first} 与 {second}")]
    SynonymConflict {
        alias: String,
        first: String,
        second: String,
    },

    #[error("同义词链: {alias} → {canonical} → {next}（同义词只允许一步，{canonical} 本身是别名）")]
    SynonymChain {
        alias: String,
        canonical: String,
        next: String,
    },

    #[error("映射规则引用了不存在的参考条目: {rule} → {key}")]
    UnknownReference { rule: String, key: String },

    #[error("不支持的几何限定: {material} / {qualifier}（仅支持 profile / sheet）")]
    InvalidQualifier { material: String, qualifier: String },

    #[error("涂层规则目标单位错误: {rule} → {key}（{unit_kind}，涂层必须按面积计）")]
    CoatingUnitMismatch {
        rule: String,
        key: String,
        unit_kind: UnitKind,
    },

    #[error("映射规则含空键: {0}")]
    EmptyToken(String),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
